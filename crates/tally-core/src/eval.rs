//! Expression evaluation — the left-to-right fold.
//!
//! `evaluate` is a pure function from a raw expression string to either
//! a number or an [`EvalError`]. There is no precedence and no
//! associativity beyond sequential application: the accumulator starts
//! at the first literal and each `(operator, literal)` pair applies in
//! the order entered, so `2+3*4` is `20`, not `14`.
//!
//! Division by zero is caught by a pre-scan over the tokens before any
//! arithmetic runs — the fold itself never divides by zero.
//!
//! The result is rounded to 8 decimal places of fixed-point precision
//! (format, then reparse). Rounding is total: a non-finite value passes
//! through unchanged, and it is the *caller's* job to reject it — see
//! [`CalcState::update`](crate::state::CalcState::update), which maps a
//! non-finite result to [`EvalError::InvalidResult`].

use crate::errors::EvalError;
use crate::scanner::{sanitize, scan};

/// Number of decimal places kept in a result.
pub const RESULT_PRECISION: usize = 8;

/// Evaluate an expression left to right.
///
/// Sanitizes, shape-validates, tokenizes, pre-scans for a zero divisor,
/// folds, and rounds. Pure — no side effects, no state.
///
/// # Errors
///
/// - [`EvalError::InvalidExpression`] — the input does not clean up to
///   `number (operator number)*`.
/// - [`EvalError::DivisionByZero`] — some `/` has a right-hand operand
///   that parses to exactly zero.
/// - [`EvalError::InvalidOperator`] — a token the fold does not know.
///   Unreachable after validation; kept as a defensive arm.
pub fn evaluate(expression: &str) -> Result<f64, EvalError> {
    let clean = sanitize(expression);
    let tokens = scan(&clean)?;

    let numbers = tokens
        .numbers
        .iter()
        .map(|literal| literal.parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| EvalError::InvalidExpression)?;

    // ── Division-by-zero pre-scan ──
    // Every `/` is checked, at any position in the chain. `operators[i]`
    // sits between `numbers[i]` and `numbers[i + 1]`, so the divisor of
    // operator i is the literal one past it.
    for (op, divisor) in tokens.operators.iter().zip(numbers.iter().skip(1)) {
        if *op == '/' && *divisor == 0.0 {
            return Err(EvalError::DivisionByZero);
        }
    }

    // ── Left-to-right fold ──
    let mut result = *numbers.first().ok_or(EvalError::InvalidExpression)?;
    for (op, operand) in tokens.operators.iter().zip(numbers.iter().skip(1)) {
        result = match op {
            '+' => result + operand,
            '-' => result - operand,
            '*' => result * operand,
            '/' => result / operand,
            other => return Err(EvalError::InvalidOperator(*other)),
        };
    }

    Ok(round_result(result))
}

/// Round to [`RESULT_PRECISION`] decimal places of fixed-point precision.
///
/// Formats with `{:.8}` and reparses, so `1/3` comes out as
/// `0.33333333` rather than a full-precision float. Total for every
/// input: non-finite values format to `"inf"`/`"NaN"` and reparse to
/// themselves, deferring the finiteness decision to the caller.
fn round_result(value: f64) -> f64 {
    format!("{value:.RESULT_PRECISION$}")
        .parse()
        .unwrap_or(value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
