//! Calculator state and the pure keypad transition handlers.
//!
//! All mutable UI state lives in one explicit value: [`CalcState`],
//! the triple of display buffer, pending-equation buffer, and history
//! log. Every keypad action is an [`Input`]; [`CalcState::update`]
//! takes the current state and one input and returns the next state.
//! There is no hidden shared mutation — the caller owns the state and
//! threads it through.
//!
//! The accumulation rules:
//!
//! - A digit replaces the `"0"` reset sentinel; otherwise it appends.
//!   Entries cap at 12 characters and hold at most one decimal point.
//! - An operator is accepted only while the display holds a number.
//!   It moves `display + operator` into the equation buffer and resets
//!   the display for the right-hand operand.
//! - Equals concatenates equation + display into one expression,
//!   evaluates it, and either shows the formatted result (recording
//!   `"<expr> = <result>"` in the history) or shows an error sentinel.
//!   Either way the pending equation is cleared — no partial state
//!   survives a computation.

use crate::errors::EvalError;
use crate::eval::evaluate;
use crate::format::format_number;
use crate::history::History;

/// The display's reset sentinel — "no entry in progress".
pub const RESET_DISPLAY: &str = "0";

/// Maximum length of one entered number, in characters.
pub const MAX_ENTRY_LEN: usize = 12;

/// Display sentinel for a division by zero.
pub const DIVISION_BY_ZERO_MSG: &str = "Division par 0";

/// Display sentinel for every other evaluation failure.
pub const GENERIC_ERROR_MSG: &str = "Erreur";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One keypad action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// A digit `0`–`9` or the decimal point `.`.
    Digit(char),
    /// One of `+ - * /`.
    Operator(char),
    /// Compute the pending expression (`=`).
    Equals,
    /// Clear the current entry and the pending equation (`AC`).
    ClearEntry,
    /// Empty the history log.
    ClearHistory,
}

// ---------------------------------------------------------------------------
// CalcState
// ---------------------------------------------------------------------------

/// The calculator's entire mutable state.
///
/// Constructed at [`new`](Self::new), then advanced one [`Input`] at a
/// time through [`update`](Self::update). Cheap to clone (three small
/// strings and at most five history records), which the tests lean on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalcState {
    /// The number being entered, a formatted result, or an error
    /// sentinel. Never empty.
    display: String,
    /// `"<left operand><operator>"` while an operation is pending,
    /// empty otherwise.
    equation: String,
    /// The bounded log of past computations.
    history: History,
}

impl Default for CalcState {
    fn default() -> Self {
        Self::new()
    }
}

impl CalcState {
    /// The initial state: display at the reset sentinel, no pending
    /// equation, empty history.
    #[must_use]
    pub fn new() -> Self {
        Self {
            display: RESET_DISPLAY.to_string(),
            equation: String::new(),
            history: History::new(),
        }
    }

    /// The current display text.
    #[inline]
    #[must_use]
    pub fn display(&self) -> &str {
        &self.display
    }

    /// The pending-equation text (empty when nothing is pending).
    #[inline]
    #[must_use]
    pub fn equation(&self) -> &str {
        &self.equation
    }

    /// The history log.
    #[inline]
    #[must_use]
    pub const fn history(&self) -> &History {
        &self.history
    }

    /// Whether the display currently holds a parseable number (as
    /// opposed to an error sentinel).
    #[must_use]
    pub fn display_is_numeric(&self) -> bool {
        self.display.parse::<f64>().is_ok()
    }

    // ── Transitions ─────────────────────────────────────────────

    /// Advance the state by one input.
    #[must_use]
    pub fn update(self, input: Input) -> Self {
        match input {
            Input::Digit(ch) => self.press_digit(ch),
            Input::Operator(op) => self.press_operator(op),
            Input::Equals => self.compute(),
            Input::ClearEntry => self.clear_entry(),
            Input::ClearHistory => self.clear_history(),
        }
    }

    /// Append a digit or decimal point to the current entry.
    fn press_digit(mut self, ch: char) -> Self {
        if !ch.is_ascii_digit() && ch != '.' {
            return self;
        }

        // An error sentinel is not an entry — the next digit starts
        // fresh instead of appending to the message.
        if !self.display_is_numeric() {
            self.display = if ch == '.' {
                "0.".to_string()
            } else {
                ch.to_string()
            };
            return self;
        }

        // One decimal point per entry.
        if ch == '.' && self.display.contains('.') {
            return self;
        }

        // Entries cap at 12 characters.
        if self.display.len() >= MAX_ENTRY_LEN {
            return self;
        }

        // A digit replaces the reset sentinel; a dot extends it to "0.".
        if self.display == RESET_DISPLAY && ch != '.' {
            self.display = ch.to_string();
        } else {
            self.display.push(ch);
        }
        self
    }

    /// Latch `display + operator` as the pending equation.
    fn press_operator(mut self, op: char) -> Self {
        if !crate::scanner::is_operator(op) || !self.display_is_numeric() {
            return self;
        }

        self.equation = format!("{}{}", self.display, op);
        self.display = RESET_DISPLAY.to_string();
        self
    }

    /// Evaluate `equation + display` and show the outcome.
    fn compute(mut self) -> Self {
        // Nothing pending, or no usable right-hand operand: ignore.
        if self.equation.is_empty() || !self.display_is_numeric() {
            return self;
        }

        let expression = format!("{}{}", self.equation, self.display);

        let outcome = evaluate(&expression).and_then(|value| {
            // Finiteness is checked here, at the call site — overflow
            // to infinity surfaces as a classified failure, never as a
            // rendered "inf".
            if value.is_finite() {
                Ok(value)
            } else {
                Err(EvalError::InvalidResult)
            }
        });

        match outcome {
            Ok(value) => {
                let formatted = format_number(value);
                self.history.push(format!("{expression} = {formatted}"));
                self.display = formatted;
            }
            Err(EvalError::DivisionByZero) => {
                self.display = DIVISION_BY_ZERO_MSG.to_string();
            }
            Err(_) => {
                self.display = GENERIC_ERROR_MSG.to_string();
            }
        }

        self.equation.clear();
        self
    }

    /// Reset the display and drop any pending equation.
    fn clear_entry(mut self) -> Self {
        self.display = RESET_DISPLAY.to_string();
        self.equation.clear();
        self
    }

    /// Empty the history log. Display and equation are untouched.
    fn clear_history(mut self) -> Self {
        self.history.clear();
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
