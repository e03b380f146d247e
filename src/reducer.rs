//! Reducer: (Configuration, UiEvent) -> Vec<Command>
//!
//! Applies the configuration update rule matching the event, then decides
//! which follow-up work the session should run. No I/O happens here.

use crate::config::Configuration;
use crate::events::{Command, UiEvent};
use crate::logging::{debug, obj, v_num, v_str, Domain};
use crate::probas::Probabilities;

/// When a PDF is built without an explicit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildPolicy {
    /// Only on demand.
    #[default]
    Manual,
    /// Once every declared variable is constrained.
    WhenComplete,
    /// After every change; the server fills the missing options.
    Always,
}

impl BuildPolicy {
    fn wants_build(self, config: &Configuration, variable_count: usize) -> bool {
        match self {
            BuildPolicy::Manual => false,
            BuildPolicy::WhenComplete => variable_count > 0 && config.len() >= variable_count,
            BuildPolicy::Always => true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReducerContext<'a> {
    /// Last applied probabilities, used to skip refreshes for number
    /// slides that stay within one interval.
    pub probas: &'a Probabilities,
    pub build_policy: BuildPolicy,
    pub variable_count: usize,
}

pub fn reduce(config: &mut Configuration, event: &UiEvent, ctx: &ReducerContext<'_>) -> Vec<Command> {
    let mut commands = Vec::new();

    match event {
        UiEvent::Selected { name, new, .. } => {
            config.apply_selection(name, new.as_ref());
            commands.push(Command::Predict);
        }
        UiEvent::GroupSelected { new, old, .. } => {
            config.apply_group_selection(new.as_deref(), old.as_deref());
            commands.push(Command::Predict);
        }
        UiEvent::NumberChanged { name, new, old } => {
            config.apply_number(name, *new);
            if ctx.probas.crosses_limit(name, *old, *new) {
                commands.push(Command::Predict);
            } else {
                debug(
                    Domain::Predict,
                    "refresh_skipped",
                    obj(&[("name", v_str(name)), ("old", v_num(*old)), ("new", v_num(*new))]),
                );
            }
        }
        UiEvent::NumberToggled { name, enabled, value } => {
            config.apply_number_toggle(name, *enabled, *value);
            commands.push(Command::Predict);
        }
    }

    if ctx.build_policy.wants_build(config, ctx.variable_count) {
        commands.push(Command::BuildFromConfig);
    }

    debug(
        Domain::Config,
        "config_updated",
        obj(&[
            ("event", v_str(event.kind())),
            ("constrained", v_num(config.len() as f64)),
            ("commands", v_num(commands.len() as f64)),
        ]),
    );
    commands
}
