//! Custom Knob - user defined min, max, step and reset value

use image::RgbaImage;
use rust_decimal::Decimal;
use tracing::debug;

use super::{color_items, Action, ActionError, ActionParams, ListboxItem};
use crate::engine::ActionContext;
use crate::osc::{OscArg, OscMessage};
use crate::render::{ControlColor, Feedback, ImageSize, Shape};

/// Decimal places kept after each step
const STEP_PRECISION: u32 = 3;

/// Next value of a ranged knob
///
/// Direction comes from whether the tick count exceeds 1, not from its sign:
/// `diff <= 1` (a single forward tick included) steps down, `diff > 1` steps
/// up. The step size never scales with `diff`. A step past the decimal range
/// saturates at the bound it heads towards.
pub fn ranged_step(stored: Decimal, diff: i32, step: Decimal, min: Decimal, max: Decimal) -> Decimal {
    let delta = if diff > 1 { step } else { -step };
    let next = match stored.checked_add(delta) {
        Some(next) => next.round_dp(STEP_PRECISION),
        None if delta.is_sign_negative() => return min,
        None => return max,
    };

    if next <= min {
        min
    } else if next >= max {
        max
    } else {
        next
    }
}

struct Range {
    min: Decimal,
    max: Decimal,
}

impl Range {
    fn from_params(params: &ActionParams) -> Result<Self, ActionError> {
        Ok(Self {
            min: params.decimal("min")?,
            max: params.decimal("max")?,
        })
    }
}

/// "Custom Knob" action
pub struct CustomKnobAction;

impl CustomKnobAction {
    pub const NAME: &'static str = "CustomKnobOSC";
}

impl Action for CustomKnobAction {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "Custom Knob"
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
        let address = params.require("address")?;
        let range = Range::from_params(params)?;
        let step = params.decimal("step")?;

        let next = ctx.store.update(address, |stored| {
            ranged_step(stored, diff, step, range.min, range.max)
        });
        debug!(address, diff, %next, "Custom knob adjusted");

        ctx.send(OscMessage::new(address, OscArg::float_from_decimal(next)));
        ctx.notify(Self::NAME, address, next);
        Ok(())
    }

    /// Reset to the configured `reset` value
    fn run_command(&self, params: &ActionParams, ctx: &ActionContext) -> Result<(), ActionError> {
        let address = params.require("address")?;
        let reset = params.decimal("reset")?;

        ctx.store.set(address, reset);
        ctx.send(OscMessage::new(address, OscArg::float_from_decimal(reset)));
        ctx.notify(Self::NAME, address, reset);
        Ok(())
    }

    fn image(
        &self,
        params: &ActionParams,
        size: ImageSize,
        ctx: &ActionContext,
    ) -> Result<Option<RgbaImage>, ActionError> {
        let address = params.require("address")?;
        let range = Range::from_params(params)?;

        let feedback = Feedback {
            shape: Shape::Bar,
            value: ctx.store.get(address),
            min: range.min,
            max: range.max,
            color: ControlColor::from_name_or_white(params.get_or("color", "white")),
            label: params.get_or("label", ""),
        };
        Ok(Some(ctx.renderer.render(&feedback, size)))
    }

    fn adjustment_display_name(&self, params: &ActionParams) -> Option<String> {
        params.get("label").map(str::to_string)
    }

    fn listbox_items(&self, control: &str) -> Option<Vec<ListboxItem>> {
        if control.eq_ignore_ascii_case("color") {
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

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_direction_uses_threshold_not_sign() {
        // Literal threshold behaviour: one forward tick (diff == 1) decrements.
        let (step, min, max) = (d("0.1"), d("0"), d("1"));
        let start = d("0.5");

        assert_eq!(ranged_step(start, 1, step, min, max), d("0.4"));
        assert_eq!(ranged_step(start, 0, step, min, max), d("0.4"));
        assert_eq!(ranged_step(start, -7, step, min, max), d("0.4"));
        assert_eq!(ranged_step(start, 2, step, min, max), d("0.6"));
        assert_eq!(ranged_step(start, 40, step, min, max), d("0.6"));
    }

    #[test]
    fn test_clamped_to_range() {
        let (step, min, max) = (d("0.3"), d("-1"), d("1"));
        assert_eq!(ranged_step(d("0.9"), 5, step, min, max), max);
        assert_eq!(ranged_step(d("-0.9"), -5, step, min, max), min);
    }

    #[test]
    fn test_huge_step_saturates_at_bounds() {
        let step = d("5e28");
        let (min, max) = (Decimal::MIN, Decimal::MAX);

        let once = ranged_step(Decimal::ZERO, 2, step, Decimal::ZERO, max);
        assert_eq!(once, step);
        assert_eq!(ranged_step(once, 2, step, Decimal::ZERO, max), max);
        assert_eq!(ranged_step(max, 2, step, Decimal::ZERO, max), max);

        assert_eq!(ranged_step(min, -1, step, min, Decimal::ZERO), min);
        assert_eq!(ranged_step(-step, 0, step, min, Decimal::ZERO), min);
    }

    #[test]
    fn test_rounded_to_three_places() {
        let next = ranged_step(d("0"), 2, d("0.12345"), d("-10"), d("10"));
        assert_eq!(next, d("0.123"));
        assert_eq!(next.scale(), 3);
    }

    #[test]
    fn test_tenth_steps_are_exact() {
        let (step, min, max) = (d("0.1"), d("0"), d("1"));
        let mut v = d("0");
        for _ in 0..3 {
            v = ranged_step(v, 2, step, min, max);
        }
        assert_eq!(v, d("0.3"));
    }

    proptest! {
        #[test]
        fn prop_ranged_stays_within_bounds(
            diffs in proptest::collection::vec(-20i32..20, 1..100),
            step_milli in 1i64..5000,
        ) {
            let (min, max) = (d("-2.5"), d("7.25"));
            let step = Decimal::new(step_milli, 3);
            let mut v = Decimal::ZERO;
            for diff in diffs {
                let before = v;
                v = ranged_step(v, diff, step, min, max);
                prop_assert!(v >= min && v <= max);
                if diff > 1 {
                    prop_assert!(v >= before);
                } else {
                    prop_assert!(v <= before);
                }
            }
        }
    }
}
