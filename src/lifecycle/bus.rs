use ahash::AHashMap;

use crate::core::error::{Result, SimError};
use crate::core::types::{NodeId, Step};
use crate::datastore::DataStore;
use crate::lifecycle::EventContext;
use crate::tree::ModelTree;

type Callback = Box<dyn FnMut(&mut EventContext<'_>) -> Result<()>>;

enum Subscriber {
    Model(NodeId),
    Callback { label: String, callback: Callback },
}

/// Event name -> subscribers, in registration order
#[derive(Default)]
pub struct LifecycleBus {
    handlers: AHashMap<String, Vec<Subscriber>>,
}

impl LifecycleBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every node's subscriptions, walking the tree in pre-order.
    /// Returns the number of registrations.
    pub fn subscribe_models(&mut self, tree: &ModelTree) -> usize {
        let mut count = 0;
        for node in tree.preorder() {
            let Some(model) = tree.model(node) else {
                continue;
            };
            for event in model.subscriptions() {
                self.handlers
                    .entry(event.to_string())
                    .or_default()
                    .push(Subscriber::Model(node));
                count += 1;
            }
        }
        tracing::debug!(subscriptions = count, "models subscribed");
        count
    }

    /// Register an orchestrator callback. `label` names it in errors.
    pub fn subscribe_fn<F>(&mut self, event: &str, label: impl Into<String>, callback: F)
    where
        F: FnMut(&mut EventContext<'_>) -> Result<()> + 'static,
    {
        self.handlers
            .entry(event.to_string())
            .or_default()
            .push(Subscriber::Callback {
                label: label.into(),
                callback: Box::new(callback),
            });
    }

    pub fn subscriber_count(&self, event: &str) -> usize {
        self.handlers.get(event).map_or(0, Vec::len)
    }

    /// Run every handler for `event`. The first failure stops dispatch and
    /// is returned wrapped with the event and the failing node.
    pub fn dispatch(
        &mut self,
        event: &str,
        tree: &mut ModelTree,
        step: Step,
        store: &mut dyn DataStore,
    ) -> Result<()> {
        let Some(subscribers) = self.handlers.get_mut(event) else {
            return Ok(());
        };
        tracing::trace!(event, step, subscribers = subscribers.len(), "dispatch");

        for subscriber in subscribers.iter_mut() {
            match subscriber {
                Subscriber::Model(node) => {
                    let node = *node;
                    let path = tree.path(node);
                    tree.with_detached(node, |model, tree| {
                        let mut ctx = EventContext {
                            tree,
                            node,
                            step,
                            store: &mut *store,
                        };
                        model.handle_event(event, &mut ctx)
                    })
                    .and_then(|outcome| outcome)
                    .map_err(|source| wrap(event, path, source))?;
                }
                Subscriber::Callback { label, callback } => {
                    let root = tree.root().ok_or_else(|| SimError::Configuration {
                        node: label.clone(),
                        message: "the tree has no root".into(),
                    })?;
                    let mut ctx = EventContext {
                        tree: &mut *tree,
                        node: root,
                        step,
                        store: &mut *store,
                    };
                    callback(&mut ctx).map_err(|source| wrap(event, label.clone(), source))?;
                }
            }
        }
        Ok(())
    }
}

fn wrap(event: &str, node: String, source: SimError) -> SimError {
    SimError::Handler {
        event: event.to_string(),
        node,
        source: Box::new(source),
    }
}
