//! Host models: containers, the clock, output collectors and example
//! leaves that functions read from.

pub mod clock;
pub mod containers;
pub mod phenology;
pub mod report;
pub mod simple_tree;
pub mod soil;
pub mod summary;

pub use clock::Clock;
pub use containers::{Folder, Simulation, Zone};
pub use phenology::Phenology;
pub use report::Report;
pub use simple_tree::SimpleTree;
pub use soil::Soil;
pub use summary::{Message, MessageLevel, Summary};
