//! Message log for a simulation.
//!
//! Models write messages and warnings through [`write`]; on `Completed` the
//! log is stored as the `Messages` table of the simulation, replacing any
//! earlier content.

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::types::{NodeId, Step};
use crate::datastore::{DataStore, Table};
use crate::lifecycle::{events, EventContext};
use crate::links::{LinkScope, LinkSpec};
use crate::tree::navigator;
use crate::tree::{Model, Properties, Property, Target, Value};

pub const MESSAGES_TABLE: &str = "Messages";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageLevel {
    Information,
    Warning,
    Error,
}

impl MessageLevel {
    fn code(self) -> f64 {
        match self {
            MessageLevel::Error => 1.0,
            MessageLevel::Warning => 2.0,
            MessageLevel::Information => 3.0,
        }
    }

    fn from_code(code: f64) -> Self {
        match code as i64 {
            1 => MessageLevel::Error,
            2 => MessageLevel::Warning,
            _ => MessageLevel::Information,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Writer's path relative to the simulation
    pub component: String,
    pub step: Step,
    pub text: String,
    pub level: MessageLevel,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Summary {
    #[serde(skip)]
    clock: Option<NodeId>,
    #[serde(skip)]
    messages: Vec<Message>,
}

impl Summary {
    pub fn clock(&self) -> Option<NodeId> {
        self.clock
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new(["ComponentName", "Step", "Message", "MessageType"]);
        for m in &self.messages {
            table.push_row(vec![
                Some(Value::Text(m.component.clone())),
                Some(Value::Number(m.step as f64)),
                Some(Value::Text(m.text.clone())),
                Some(Value::Number(m.level.code())),
            ]);
        }
        table
    }
}

/// Append a message from `ctx.node` to the summary at `summary`, stamped
/// with the summary's clock.
pub fn write(
    ctx: &mut EventContext<'_>,
    summary: NodeId,
    level: MessageLevel,
    text: impl Into<String>,
) -> Result<()> {
    let component = match ctx.tree.root() {
        Some(root) => navigator::relative_path(ctx.tree, ctx.node, root),
        None => ctx.path(),
    };
    let clock = ctx
        .tree
        .model_as::<Summary>(summary)
        .ok_or_else(|| SimError::Configuration {
            node: ctx.tree.path(summary),
            message: "summary link does not point to a Summary".into(),
        })?
        .clock;
    let step = clock
        .and_then(|c| ctx.tree.get_property(c, "Today"))
        .and_then(|v| v.as_f64())
        .map_or(ctx.step, |today| today as Step);
    let text = text.into();
    match level {
        MessageLevel::Information => tracing::info!(component = %component, step, "{}", text),
        MessageLevel::Warning => tracing::warn!(component = %component, step, "{}", text),
        MessageLevel::Error => tracing::error!(component = %component, step, "{}", text),
    }
    if let Some(model) = ctx.tree.model_as_mut::<Summary>(summary) {
        model.push(Message {
            component,
            step,
            text,
            level,
        });
    }
    Ok(())
}

/// Text log of a stored `Messages` table: one block per (step, component)
/// with warnings and errors prefixed.
pub fn render_log(store: &dyn DataStore, simulation: &str) -> String {
    let mut out = String::from("SIMULATION LOG:\n---------------\n");
    let Some(table) = store.table(simulation, MESSAGES_TABLE) else {
        return out;
    };
    let mut previous: Option<String> = None;
    for row in &table.rows {
        let cell = |i: usize| row.get(i).and_then(|c| c.as_ref());
        let component = cell(0).map(|v| v.to_string()).unwrap_or_default();
        let step = cell(1).map(|v| v.to_string()).unwrap_or_default();
        let text = cell(2).map(|v| v.to_string()).unwrap_or_default();
        let level = cell(3)
            .and_then(|v| v.as_f64())
            .map_or(MessageLevel::Information, MessageLevel::from_code);

        let heading = format!("Step {} {}", step, component);
        if previous.as_deref() != Some(heading.as_str()) {
            out.push_str(&heading);
            out.push('\n');
            previous = Some(heading);
        }
        let prefix = match level {
            MessageLevel::Error => "FATAL ERROR: ",
            MessageLevel::Warning => "WARNING: ",
            MessageLevel::Information => "",
        };
        out.push_str(&format!("    {}{}\n", prefix, text));
    }
    out
}

impl Model for Summary {
    fn kind(&self) -> &'static str {
        "Summary"
    }

    fn links(&self) -> Vec<LinkSpec> {
        vec![LinkSpec::required(
            "clock",
            Target::Kind("Clock"),
            LinkScope::Nearest,
        )]
    }

    fn bind_link(&mut self, slot: &str, target: Option<NodeId>) {
        if slot == "clock" {
            self.clock = target;
        }
    }

    fn subscriptions(&self) -> &'static [&'static str] {
        &[events::COMMENCING, events::COMPLETED]
    }

    fn handle_event(&mut self, event: &str, ctx: &mut EventContext<'_>) -> Result<()> {
        match event {
            events::COMMENCING => self.messages.clear(),
            events::COMPLETED => {
                let simulation = ctx.simulation_name();
                ctx.store.delete_table(&simulation, MESSAGES_TABLE);
                ctx.store
                    .write_table(&simulation, MESSAGES_TABLE, self.to_table());
            }
            _ => {}
        }
        Ok(())
    }
}

const SUMMARY_PROPERTIES: &[Property<Summary>] = &[Property::read_only(
    "MessageCount",
    |s: &Summary| Value::Number(s.messages.len() as f64),
)];

impl Properties for Summary {
    fn property_table() -> &'static [Property<Self>] {
        SUMMARY_PROPERTIES
    }
}
