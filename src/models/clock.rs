use serde::Deserialize;

use crate::core::error::Result;
use crate::core::types::Step;
use crate::lifecycle::{events, EventContext};
use crate::tree::{Model, Properties, Property, Value};

/// Simulation clock. `today` is `start_step` before the first step and
/// `start_step + step - 1` during step `step`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Clock {
    pub start_step: Step,
    pub end_step: Step,
    #[serde(skip)]
    today: Option<Step>,
}

impl Clock {
    pub fn new(start_step: Step, end_step: Step) -> Self {
        Self {
            start_step,
            end_step,
            today: None,
        }
    }

    pub fn today(&self) -> Step {
        self.today.unwrap_or(self.start_step)
    }

    /// True once `today` has reached `end_step`
    pub fn is_finished(&self) -> bool {
        self.today() >= self.end_step
    }
}

impl Model for Clock {
    fn kind(&self) -> &'static str {
        "Clock"
    }

    fn subscriptions(&self) -> &'static [&'static str] {
        &[events::COMMENCING, events::DO_DAILY_INITIALISATION]
    }

    fn handle_event(&mut self, event: &str, ctx: &mut EventContext<'_>) -> Result<()> {
        match event {
            events::COMMENCING => self.today = None,
            events::DO_DAILY_INITIALISATION => {
                let today = self.start_step.saturating_add(ctx.step.saturating_sub(1));
                if today > self.end_step {
                    tracing::warn!(today, end_step = self.end_step, "clock is past its end step");
                }
                self.today = Some(today);
            }
            _ => {}
        }
        Ok(())
    }
}

const CLOCK_PROPERTIES: &[Property<Clock>] = &[
    Property::read_only("Today", |c: &Clock| Value::Number(c.today() as f64)),
    Property::read_only("StartStep", |c: &Clock| Value::Number(c.start_step as f64)),
    Property::read_only("EndStep", |c: &Clock| Value::Number(c.end_step as f64)),
    Property::read_only("Finished", |c: &Clock| Value::Bool(c.is_finished())),
];

impl Properties for Clock {
    fn property_table() -> &'static [Property<Self>] {
        CLOCK_PROPERTIES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastore::MemoryDataStore;
    use crate::lifecycle::LifecycleBus;
    use crate::models::Simulation;
    use crate::tree::ModelTree;

    #[test]
    fn test_today_follows_step() {
        let mut tree = ModelTree::new();
        let root = tree.add_root("Simulation", Simulation::default()).unwrap();
        let clock = tree.add_child(root, "Clock", Clock::new(100, 102)).unwrap();
        let mut bus = LifecycleBus::new();
        bus.subscribe_models(&tree);
        let mut store = MemoryDataStore::new();

        assert_eq!(tree.get_property(clock, "Today"), Some(Value::Number(100.0)));
        for step in 1..=3 {
            bus.dispatch(events::DO_DAILY_INITIALISATION, &mut tree, step, &mut store)
                .unwrap();
        }
        assert_eq!(tree.get_property(clock, "Today"), Some(Value::Number(102.0)));
        assert_eq!(tree.get_property(clock, "Finished"), Some(Value::Bool(true)));

        bus.dispatch(events::COMMENCING, &mut tree, 0, &mut store).unwrap();
        assert_eq!(tree.model_as::<Clock>(clock).unwrap().today(), 100);
    }

    #[test]
    fn test_today_saturates_at_step_limit() {
        let mut tree = ModelTree::new();
        let clock = tree
            .add_root("Clock", Clock::new(Step::MAX - 1, Step::MAX))
            .unwrap();
        let mut bus = LifecycleBus::new();
        bus.subscribe_models(&tree);
        let mut store = MemoryDataStore::new();

        bus.dispatch(events::DO_DAILY_INITIALISATION, &mut tree, 5, &mut store)
            .unwrap();
        let clock = tree.model_as::<Clock>(clock).unwrap();
        assert_eq!(clock.today(), Step::MAX);
        assert!(clock.is_finished());
    }

    #[test]
    fn test_today_is_read_only() {
        let mut tree = ModelTree::new();
        let clock = tree.add_root("Clock", Clock::new(1, 5)).unwrap();
        assert!(tree.set_property(clock, "Today", Value::Number(3.0)).is_err());
    }
}
