//! OSC Button - basic, toggle and momentary presses

use image::RgbaImage;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

use super::{parse_kind, Action, ActionError, ActionParams, ListboxItem};
use crate::engine::ActionContext;
use crate::osc::{OscArg, OscMessage};
use crate::render::{ControlColor, Feedback, ImageSize, Shape};

/// Button semantics selected by the `type` listbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    /// Sends the value on every press
    Basic,
    /// Alternates between the value and 0
    Toggle,
    /// Sends the value, then 0 after a short delay
    Momentary,
}

impl ButtonKind {
    pub const ALL: [ButtonKind; 3] = [ButtonKind::Basic, ButtonKind::Toggle, ButtonKind::Momentary];

    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonKind::Basic => "basic",
            ButtonKind::Toggle => "toggle",
            ButtonKind::Momentary => "momentary",
        }
    }

    fn item(&self) -> ListboxItem {
        match self {
            ButtonKind::Basic => ListboxItem::new("basic", "Basic", "Sends 1 to address"),
            ButtonKind::Toggle => {
                ListboxItem::new("toggle", "Toggle", "Alternates 1 and 0 to address")
            },
            ButtonKind::Momentary => {
                ListboxItem::new("momentary", "Momentary", "Sends 1 and then 0 to address")
            },
        }
    }
}

impl FromStr for ButtonKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ButtonKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or(())
    }
}

/// Next toggle value: any nonzero stored value switches off
pub fn toggle_value(stored: Decimal, send_value: Decimal) -> Decimal {
    if stored.is_zero() {
        send_value
    } else {
        Decimal::ZERO
    }
}

/// "OSC Button" action
pub struct ButtonAction;

impl ButtonAction {
    pub const NAME: &'static str = "ButtonOSC";

    /// Configured send value; 0 or absent means 1
    fn send_value(params: &ActionParams) -> Result<Decimal, ActionError> {
        let value = params.decimal_or("value", Decimal::ONE)?;
        Ok(if value.is_zero() { Decimal::ONE } else { value })
    }
}

impl Action for ButtonAction {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "OSC Button"
    }

    fn group(&self) -> &str {
        "Button"
    }

    fn run_command(&self, params: &ActionParams, ctx: &ActionContext) -> Result<(), ActionError> {
        let kind: ButtonKind = parse_kind(Self::NAME, "type", params.require("type")?)?;
        let address = params.require("address")?;
        let send_value = Self::send_value(params)?;

        debug!(address, kind = kind.as_str(), %send_value, "Button pressed");

        match kind {
            ButtonKind::Basic => {
                ctx.send(OscMessage::new(address, OscArg::int_from_decimal(send_value)));
                ctx.notify(Self::NAME, address, ctx.store.get(address));
            },
            ButtonKind::Toggle => {
                let next = ctx
                    .store
                    .update(address, |stored| toggle_value(stored, send_value));
                ctx.send(OscMessage::new(address, OscArg::float_from_decimal(next)));
                ctx.notify(Self::NAME, address, next);
            },
            ButtonKind::Momentary => {
                let press_ctx = ctx.clone();
                let revert_ctx = ctx.clone();
                let revert_address = address.to_string();

                ctx.scheduler.pulse(
                    address,
                    ctx.momentary_delay,
                    || {
                        press_ctx.store.set(address, send_value);
                        press_ctx.send(OscMessage::new(
                            address,
                            OscArg::int_from_decimal(send_value),
                        ));
                        press_ctx.notify(Self::NAME, address, send_value);
                    },
                    move || {
                        revert_ctx.store.set(&revert_address, Decimal::ZERO);
                        revert_ctx.send(OscMessage::int(revert_address.as_str(), 0));
                        revert_ctx.notify(Self::NAME, &revert_address, Decimal::ZERO);
                    },
                );
            },
        }

        Ok(())
    }

    fn image(
        &self,
        params: &ActionParams,
        size: ImageSize,
        ctx: &ActionContext,
    ) -> Result<Option<RgbaImage>, ActionError> {
        let address = params.require("address")?;
        let send_value = Self::send_value(params)?;
        let feedback = Feedback {
            shape: Shape::Arc,
            value: ctx.store.get(address),
            min: Decimal::ZERO,
            max: send_value,
            color: ControlColor::from_name_or_white(params.get_or("color", "white")),
            label: params.get_or("label", ""),
        };
        Ok(Some(ctx.renderer.render(&feedback, size)))
    }

    fn listbox_items(&self, control: &str) -> Option<Vec<ListboxItem>> {
        if control.eq_ignore_ascii_case("type") {
            Some(ButtonKind::ALL.iter().map(ButtonKind::item).collect())
        } else if control.eq_ignore_ascii_case("color") {
            Some(super::color_items())
        } else {
            None
        }
    }
}
