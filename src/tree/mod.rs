//! The model tree: node arena, capabilities, property registry, path
//! expressions and navigation queries.

pub mod arena;
pub mod model;
pub mod navigator;
pub mod path;
pub mod value;

pub use arena::{ModelTree, Node};
pub use model::{array, number, AsAny, Capability, Model, Properties, Property};
pub use navigator::Target;
pub use path::{is_valid_segment, PathExpr};
pub use value::Value;
