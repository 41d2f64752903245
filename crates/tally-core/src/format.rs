//! Number-to-display formatting.
//!
//! Results are shown the way a calculator readout writes them: integral
//! values without a decimal part (`20`, not `20.0`), fractional values
//! with exactly the digits that survive the evaluator's 8-place
//! rounding, and never a negative zero. `f64`'s `Display` already
//! produces the shortest round-trip decimal form, so most of the work
//! is normalization around it.

/// Format a result for the display buffer and history records.
///
/// `-0` collapses to `"0"` — a subtraction like `2-2` must read as
/// zero, not negative zero.
#[must_use]
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Covers -0.0 too: IEEE equality treats them as the same value.
        return "0".to_string();
    }
    value.to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_values_have_no_decimal_part() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(20.0), "20");
        assert_eq!(format_number(-4.0), "-4");
    }

    #[test]
    fn fractional_values_keep_their_digits() {
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.333_333_33), "0.33333333");
        assert_eq!(format_number(3.75), "3.75");
    }

    #[test]
    fn zero_is_zero() {
        assert_eq!(format_number(0.0), "0");
    }

    #[test]
    fn negative_zero_normalizes() {
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn small_fractions_stay_decimal() {
        // 1/100000000 — the smallest value rounding can produce.
        assert_eq!(format_number(0.000_000_01), "0.00000001");
    }

    #[test]
    fn large_integral_values() {
        assert_eq!(format_number(1e15), "1000000000000000");
    }
}
