//! Lifecycle notifications.
//!
//! The orchestrator announces named events; models subscribe by listing the
//! event names in [`Model::subscriptions`](crate::tree::Model::subscriptions).
//! Handlers run synchronously in registration order.

mod bus;

pub use bus::LifecycleBus;

use crate::core::types::{NodeId, Step};
use crate::datastore::DataStore;
use crate::tree::ModelTree;

/// Event names announced by the runner
pub mod events {
    /// Assembly is complete and links are bound
    pub const COMMENCING: &str = "Commencing";
    /// Start of a step
    pub const DO_DAILY_INITIALISATION: &str = "DoDailyInitialisation";
    /// End of a step
    pub const END_OF_DAY: &str = "EndOfDay";
    /// The run is over
    pub const COMPLETED: &str = "Completed";

    pub const ALL: [&str; 4] = [COMMENCING, DO_DAILY_INITIALISATION, END_OF_DAY, COMPLETED];
}

/// What a handler can see and touch while an event is dispatched.
///
/// For model handlers `node` is the handling node, whose own model is
/// detached from `tree` for the duration of the call.
pub struct EventContext<'a> {
    pub tree: &'a mut ModelTree,
    pub node: NodeId,
    pub step: Step,
    pub store: &'a mut dyn DataStore,
}

impl EventContext<'_> {
    /// Name of the root node, used as the simulation key in the data store
    pub fn simulation_name(&self) -> String {
        self.tree
            .root()
            .map(|root| self.tree.name(root).to_string())
            .unwrap_or_default()
    }

    /// Absolute path of the handling node
    pub fn path(&self) -> String {
        self.tree.path(self.node)
    }
}
