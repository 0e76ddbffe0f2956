//! Host-visible actions (OSC Button, OSC Knob, Custom Knob, Set Defaults)
//!
//! Each action family turns host calls into store updates and OSC sends.
//! Actions are stateless themselves: everything they mutate lives in the
//! shared [`ActionContext`].

use image::RgbaImage;
use thiserror::Error;
use tracing::error;

use crate::engine::ActionContext;
use crate::render::{ControlColor, ImageSize};

mod button;
mod custom_knob;
mod knob;
mod params;
mod set_defaults;

pub use button::{ButtonAction, ButtonKind};
pub use custom_knob::{ranged_step, CustomKnobAction};
pub use knob::{normal_step, raw_step, KnobAction, KnobKind};
pub use params::ActionParams;
pub use set_defaults::SetDefaultsAction;

/// Errors surfaced to the host for structurally invalid control parameters
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error("unknown {control} '{value}' for action '{action}'")]
    UnknownKind {
        action: String,
        control: String,
        value: String,
    },
    #[error("missing required parameter '{0}'")]
    MissingParameter(String),
    #[error("parameter '{name}' is not a number: '{value}'")]
    InvalidNumber { name: String, value: String },
    #[error("action '{0}' does not support adjustments")]
    NotAdjustable(String),
}

/// One entry of a listbox control: (value, label, description)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListboxItem {
    pub value: String,
    pub label: String,
    pub description: String,
}

impl ListboxItem {
    pub fn new(value: &str, label: &str, description: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            description: description.to_string(),
        }
    }
}

/// Action trait - every host-visible action family implements this
///
/// All methods take `&self`; actions keep no state of their own.
pub trait Action: Send + Sync {
    /// Registry name used by the host (e.g. "ButtonOSC")
    fn name(&self) -> &str;

    /// Human readable name shown in the host's action list
    fn display_name(&self) -> &str;

    /// Group shown in the host's action list
    fn group(&self) -> &str;

    /// Press (buttons) or reset (knobs)
    fn run_command(&self, params: &ActionParams, ctx: &ActionContext) -> Result<(), ActionError>;

    /// Dial rotation by `diff` ticks
    ///
    /// Default implementation: the action is not an adjustment.
    fn apply_adjustment(
        &self,
        _params: &ActionParams,
        _diff: i32,
        _ctx: &ActionContext,
    ) -> Result<(), ActionError> {
        Err(ActionError::NotAdjustable(self.name().to_string()))
    }

    /// Feedback image for the control, `None` when the action has none
    fn image(
        &self,
        _params: &ActionParams,
        _size: ImageSize,
        _ctx: &ActionContext,
    ) -> Result<Option<RgbaImage>, ActionError> {
        Ok(None)
    }

    /// Text shown next to the dial
    fn adjustment_display_name(&self, _params: &ActionParams) -> Option<String> {
        None
    }

    /// Items for a listbox control, `None` for a control this action lacks
    fn listbox_items(&self, _control: &str) -> Option<Vec<ListboxItem>> {
        None
    }
}

/// Built-in action set
pub fn builtin_actions() -> Vec<std::sync::Arc<dyn Action>> {
    vec![
        std::sync::Arc::new(ButtonAction),
        std::sync::Arc::new(KnobAction),
        std::sync::Arc::new(CustomKnobAction),
        std::sync::Arc::new(SetDefaultsAction),
    ]
}

/// Listbox items for the `color` control shared by the knobs
pub(crate) fn color_items() -> Vec<ListboxItem> {
    ControlColor::ALL
        .iter()
        .map(|color| ListboxItem::new(color.name(), color.label(), ""))
        .collect()
}

/// Parse a kind listbox value, logging contract violations
pub(crate) fn parse_kind<K: std::str::FromStr>(
    action: &str,
    control: &str,
    value: &str,
) -> Result<K, ActionError> {
    value.parse::<K>().map_err(|_| {
        error!("Unexpected {} value '{}' for action '{}'", control, value, action);
        ActionError::UnknownKind {
            action: action.to_string(),
            control: control.to_string(),
            value: value.to_string(),
        }
    })
}
