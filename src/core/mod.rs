pub mod config;
pub mod error;
pub mod types;

pub use config::RunConfig;
pub use error::{Result, SimError, UnresolvedLink};
pub use types::{NodeId, RunId, Step};
