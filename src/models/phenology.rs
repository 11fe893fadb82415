use serde::Deserialize;

use crate::core::error::Result;
use crate::lifecycle::{events, EventContext};
use crate::tree::{number, Model, Properties, Property, Value};

/// Minimal development model: `stage` grows by `rate` at the start of every
/// step. Phase-gated functions read its `Stage`.
///
/// The stage seen at the first `Commencing` is restored on every later one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Phenology {
    pub stage: f64,
    pub rate: f64,
    #[serde(skip)]
    initial_stage: Option<f64>,
}

impl Phenology {
    pub fn new(stage: f64, rate: f64) -> Self {
        Self {
            stage,
            rate,
            initial_stage: None,
        }
    }
}

impl Model for Phenology {
    fn kind(&self) -> &'static str {
        "Phenology"
    }

    fn subscriptions(&self) -> &'static [&'static str] {
        &[events::COMMENCING, events::DO_DAILY_INITIALISATION]
    }

    fn handle_event(&mut self, event: &str, _ctx: &mut EventContext<'_>) -> Result<()> {
        match event {
            events::COMMENCING => match self.initial_stage {
                Some(stage) => self.stage = stage,
                None => self.initial_stage = Some(self.stage),
            },
            events::DO_DAILY_INITIALISATION => self.stage += self.rate,
            _ => {}
        }
        Ok(())
    }
}

const PHENOLOGY_PROPERTIES: &[Property<Phenology>] = &[
    Property::read_write(
        "Stage",
        |p: &Phenology| Value::Number(p.stage),
        |p: &mut Phenology, v: Value| {
            p.stage = number(v)?;
            Ok(())
        },
    ),
    Property::read_write(
        "Rate",
        |p: &Phenology| Value::Number(p.rate),
        |p: &mut Phenology, v: Value| {
            p.rate = number(v)?;
            Ok(())
        },
    ),
];

impl Properties for Phenology {
    fn property_table() -> &'static [Property<Self>] {
        PHENOLOGY_PROPERTIES
    }
}
