//! OSC Knob - raw and 0-100 normal dials

use image::RgbaImage;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::{color_items, parse_kind, Action, ActionError, ActionParams, ListboxItem};
use crate::engine::ActionContext;
use crate::osc::{OscArg, OscMessage};
use crate::render::{ControlColor, Feedback, ImageSize, Shape};

/// Knob semantics selected by the `type` listbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnobKind {
    /// Unbounded tick accumulator
    Raw,
    /// Tick accumulator clamped to 0..=100
    Normal,
}

impl KnobKind {
    pub const ALL: [KnobKind; 2] = [KnobKind::Raw, KnobKind::Normal];

    pub fn as_str(&self) -> &'static str {
        match self {
            KnobKind::Raw => "raw",
            KnobKind::Normal => "normal",
        }
    }

    fn item(&self) -> ListboxItem {
        match self {
            KnobKind::Raw => ListboxItem::new("raw", "Raw", "Raw value, no constraints to address"),
            KnobKind::Normal => ListboxItem::new("normal", "Normal", "Simple 0-100 value to address"),
        }
    }
}

impl FromStr for KnobKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KnobKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or(())
    }
}

const NORMAL_MAX: Decimal = Decimal::ONE_HUNDRED;

/// Saturates at the ends of the decimal range
pub fn raw_step(stored: Decimal, diff: i32) -> Decimal {
    stored.checked_add(Decimal::from(diff)).unwrap_or(if diff < 0 {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

pub fn normal_step(stored: Decimal, diff: i32) -> Decimal {
    raw_step(stored, diff).clamp(Decimal::ZERO, NORMAL_MAX)
}

/// "OSC Knob" action
pub struct KnobAction;

impl KnobAction {
    pub const NAME: &'static str = "oscknob";
}

impl Action for KnobAction {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "OSC Knob"
    }

    fn group(&self) -> &str {
        "Knob"
    }

    fn apply_adjustment(
        &self,
        params: &ActionParams,
        diff: i32,
        ctx: &ActionContext,
    ) -> Result<(), ActionError> {
        let kind: KnobKind = parse_kind(Self::NAME, "type", params.require("type")?)?;
        let address = params.require("address")?;

        let next = ctx.store.update(address, |stored| match kind {
            KnobKind::Raw => raw_step(stored, diff),
            KnobKind::Normal => normal_step(stored, diff),
        });

        ctx.send(OscMessage::new(address, OscArg::float_from_decimal(next)));
        ctx.notify(Self::NAME, address, next);
        Ok(())
    }

    /// Reset to 0
    fn run_command(&self, params: &ActionParams, ctx: &ActionContext) -> Result<(), ActionError> {
        let address = params.require("address")?;
        ctx.store.set(address, Decimal::ZERO);
        ctx.send(OscMessage::new(address, OscArg::float_from_decimal(Decimal::ZERO)));
        ctx.notify(Self::NAME, address, Decimal::ZERO);
        Ok(())
    }

    fn image(
        &self,
        params: &ActionParams,
        size: ImageSize,
        ctx: &ActionContext,
    ) -> Result<Option<RgbaImage>, ActionError> {
        let kind: KnobKind = parse_kind(Self::NAME, "type", params.require("type")?)?;
        let address = params.require("address")?;

        // Raw knobs have no range to show
        if kind == KnobKind::Raw {
            return Ok(None);
        }

        let feedback = Feedback {
            shape: Shape::Bar,
            value: ctx.store.get(address),
            min: Decimal::ZERO,
            max: NORMAL_MAX,
            color: ControlColor::from_name_or_white(params.get_or("color", "white")),
            label: params.get_or("label", ""),
        };
        Ok(Some(ctx.renderer.render(&feedback, size)))
    }

    fn adjustment_display_name(&self, params: &ActionParams) -> Option<String> {
        params.get("label").map(str::to_string)
    }

    fn listbox_items(&self, control: &str) -> Option<Vec<ListboxItem>> {
        if control.eq_ignore_ascii_case("type") {
            Some(KnobKind::ALL.iter().map(KnobKind::item).collect())
        } else if control.eq_ignore_ascii_case("color") {
            Some(color_items())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_raw_is_unbounded() {
        let mut v = Decimal::ZERO;
        v = raw_step(v, -250);
        assert_eq!(v, Decimal::from(-250));
        v = raw_step(v, 1000);
        assert_eq!(v, Decimal::from(750));
    }

    #[test]
    fn test_raw_saturates_at_decimal_limits() {
        assert_eq!(raw_step(Decimal::MAX, 3), Decimal::MAX);
        assert_eq!(raw_step(Decimal::MIN, -3), Decimal::MIN);
        assert_eq!(raw_step(Decimal::MAX, -1), Decimal::MAX - Decimal::ONE);
    }

    #[test]
    fn test_normal_clamps_at_edges() {
        assert_eq!(normal_step(Decimal::ZERO, -3), Decimal::ZERO);
        assert_eq!(normal_step(Decimal::from(98), 5), Decimal::ONE_HUNDRED);
        assert_eq!(normal_step(Decimal::from(50), 2), Decimal::from(52));
    }

    #[test]
    fn test_listbox_items() {
        let types = KnobAction.listbox_items("type").unwrap();
        assert_eq!(types.len(), 2);
        let colors = KnobAction.listbox_items("color").unwrap();
        assert_eq!(colors.len(), 7);
        assert!(KnobAction.listbox_items("min").is_none());
    }

    proptest! {
        #[test]
        fn prop_normal_stays_in_range(diffs in proptest::collection::vec(-50i32..50, 0..200)) {
            let mut v = Decimal::ZERO;
            for diff in diffs {
                v = normal_step(v, diff);
                prop_assert!(v >= Decimal::ZERO && v <= Decimal::ONE_HUNDRED);
            }
        }
    }
}
