// SPDX-License-Identifier: MIT
//
// tally — a terminal calculator with a rolling history.
//
// This is the binary that wires the crates together:
//
//   tally-term → terminal control, rendering, input parsing, event loop
//   tally-core → expression evaluation, keypad state, history log
//
// The Calculator struct implements tally-term's App trait, connecting
// the event loop to the calculator state. Each keypress flows through:
//
//   stdin → parser → on_event → key classification → CalcState::update
//   paint → framebuffer → diff renderer → terminal
//
// Layout (centered on screen):
//
//   ┌──────────────────────────┐  ┌─────────────────────┐
//   │ History         h clears │  │        equation     │
//   │                          │  │         display     │
//   │ 2+3 = 5                  │  ├─────────────────────┤
//   │ 5*4 = 20                 │  │ [AC     ][ ÷ ][ × ] │
//   │ ...                      │  │ [7][8][9][ - ]      │
//   │                          │  │ [4][5][6][ + ]      │
//   │                          │  │ [1][2][3][ = ]      │
//   │                          │  │ [0     ][.][ = ]    │
//   └──────────────────────────┘  └─────────────────────┘
//    0-9 . digits  + - * / ops  enter =  c clear  h history  q quit
//
// The keypad is informational — buttons are typed, not clicked. All
// state transitions live in tally-core; this file only classifies keys
// and paints.

use std::process;

use tally_core::state::{CalcState, Input};
use tally_term::buffer::{FrameBuffer, Rect};
use tally_term::cell::{Attr, Cell};
use tally_term::color::CellColor;
use tally_term::event_loop::{Action, App, EventLoop};
use tally_term::input::{KeyCode, KeyEvent};

// ─── Theme ───────────────────────────────────────────────────────────────────

/// Panel background.
const PANEL_BG: CellColor = CellColor::hex(0x0020_242E);
/// Readout background, a shade darker than the panels.
const READOUT_BG: CellColor = CellColor::hex(0x0016_1A22);
/// Digit button background.
const DIGIT_BG: CellColor = CellColor::hex(0x002C_3240);
/// Operator button background.
const OPERATOR_BG: CellColor = CellColor::hex(0x003A_4254);
/// The AC button.
const CLEAR_BG: CellColor = CellColor::hex(0x009E_444E);
/// The equals button.
const EQUALS_BG: CellColor = CellColor::hex(0x003E_639E);
/// Foreground for error sentinels on the display.
const ERROR_FG: CellColor = CellColor::hex(0x00E8_6A74);
/// Dim foreground for the equation line and hints.
const FADED_FG: CellColor = CellColor::hex(0x007A_8496);

// ─── Layout constants ────────────────────────────────────────────────────────

/// Keypad geometry: 4 columns of 4-wide buttons with 1-column gaps.
const BUTTON_WIDTH: u16 = 4;
const BUTTON_STRIDE: u16 = BUTTON_WIDTH + 1;
const GRID_WIDTH: u16 = 4 * BUTTON_STRIDE - 1;

/// History panel width, including its padding.
const HISTORY_WIDTH: u16 = 28;
/// Calculator panel width: the grid plus two columns of padding per side.
const CALC_WIDTH: u16 = GRID_WIDTH + 4;
/// Gap between the two panels.
const PANEL_GAP: u16 = 2;
/// Both panels are this tall.
const PANEL_HEIGHT: u16 = 11;

/// Total content width.
const CONTENT_WIDTH: u16 = HISTORY_WIDTH + PANEL_GAP + CALC_WIDTH;

/// Smallest terminal the layout fits in (content + margins + help line).
const MIN_COLS: u16 = CONTENT_WIDTH + 2;
const MIN_ROWS: u16 = PANEL_HEIGHT + 3;

// ─── Keypad ──────────────────────────────────────────────────────────────────

/// Styling class of a keypad button.
#[derive(Clone, Copy)]
enum ButtonKind {
    Digit,
    Operator,
    Clear,
    Equals,
}

/// One button of the static keypad: grid position, column span, label.
struct Button {
    row: u16,
    col: u16,
    span: u16,
    label: &'static str,
    kind: ButtonKind,
}

/// The keypad, mirroring the classic layout: AC and the divide and
/// multiply keys on top, digits descending 7–1, a wide zero. The
/// equals key occupies the bottom-right corner of two rows.
#[rustfmt::skip]
const BUTTONS: &[Button] = &[
    Button { row: 0, col: 0, span: 2, label: "AC", kind: ButtonKind::Clear },
    Button { row: 0, col: 2, span: 1, label: "÷",  kind: ButtonKind::Operator },
    Button { row: 0, col: 3, span: 1, label: "×",  kind: ButtonKind::Operator },
    Button { row: 1, col: 0, span: 1, label: "7",  kind: ButtonKind::Digit },
    Button { row: 1, col: 1, span: 1, label: "8",  kind: ButtonKind::Digit },
    Button { row: 1, col: 2, span: 1, label: "9",  kind: ButtonKind::Digit },
    Button { row: 1, col: 3, span: 1, label: "-",  kind: ButtonKind::Operator },
    Button { row: 2, col: 0, span: 1, label: "4",  kind: ButtonKind::Digit },
    Button { row: 2, col: 1, span: 1, label: "5",  kind: ButtonKind::Digit },
    Button { row: 2, col: 2, span: 1, label: "6",  kind: ButtonKind::Digit },
    Button { row: 2, col: 3, span: 1, label: "+",  kind: ButtonKind::Operator },
    Button { row: 3, col: 0, span: 1, label: "1",  kind: ButtonKind::Digit },
    Button { row: 3, col: 1, span: 1, label: "2",  kind: ButtonKind::Digit },
    Button { row: 3, col: 2, span: 1, label: "3",  kind: ButtonKind::Digit },
    Button { row: 3, col: 3, span: 1, label: "=",  kind: ButtonKind::Equals },
    Button { row: 4, col: 0, span: 2, label: "0",  kind: ButtonKind::Digit },
    Button { row: 4, col: 2, span: 1, label: ".",  kind: ButtonKind::Digit },
    Button { row: 4, col: 3, span: 1, label: "=",  kind: ButtonKind::Equals },
];

// ─── Key classification ──────────────────────────────────────────────────────

/// What a keypress means to the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Forward to the state machine.
    Calc(Input),
    /// Exit the application.
    Quit,
    /// Not a calculator key.
    Ignored,
}

/// Map a terminal key event onto a calculator command.
///
/// `x`, `×` and `÷` are aliases for `*` and `/`; Enter doubles for
/// `=`; Escape, `c` and Delete all clear the entry.
fn classify(event: &KeyEvent) -> Command {
    if event.is_ctrl('c') {
        return Command::Quit;
    }

    match event.code {
        KeyCode::Char(ch @ ('0'..='9' | '.')) => Command::Calc(Input::Digit(ch)),
        KeyCode::Char(op @ ('+' | '-' | '*' | '/')) => Command::Calc(Input::Operator(op)),
        KeyCode::Char('x' | '×') => Command::Calc(Input::Operator('*')),
        KeyCode::Char('÷') => Command::Calc(Input::Operator('/')),
        KeyCode::Char('=') | KeyCode::Enter => Command::Calc(Input::Equals),
        KeyCode::Char('c') | KeyCode::Delete | KeyCode::Escape => {
            Command::Calc(Input::ClearEntry)
        }
        KeyCode::Char('h') => Command::Calc(Input::ClearHistory),
        KeyCode::Char('q') => Command::Quit,
        _ => Command::Ignored,
    }
}

// ─── Calculator ──────────────────────────────────────────────────────────────

/// The application: calculator state plus paint logic.
struct Calculator {
    state: CalcState,
}

impl Calculator {
    fn new() -> Self {
        Self {
            state: CalcState::new(),
        }
    }

    // ── Painting ────────────────────────────────────────────────

    /// Top-left corner of the centered content block.
    fn origin(frame: &FrameBuffer) -> (u16, u16) {
        let x = frame.width().saturating_sub(CONTENT_WIDTH) / 2;
        let y = frame.height().saturating_sub(PANEL_HEIGHT + 2) / 2;
        (x, y.max(1))
    }

    fn paint_too_small(frame: &mut FrameBuffer) {
        let msg = format!(
            "tally needs at least {MIN_COLS}x{MIN_ROWS} (have {}x{})",
            frame.width(),
            frame.height()
        );
        let x = frame.width().saturating_sub(msg.len() as u16) / 2;
        let y = frame.height() / 2;
        frame.set_text(x, y, &msg, Cell::EMPTY.with_fg(FADED_FG));
    }

    fn paint_history(&self, frame: &mut FrameBuffer, x: u16, y: u16) {
        let panel = Cell::EMPTY.with_bg(PANEL_BG);
        frame.fill_rect(Rect::new(x, y, HISTORY_WIDTH, PANEL_HEIGHT), panel);

        frame.set_text(x + 2, y + 1, "History", panel.with_attrs(Attr::BOLD));
        frame.set_text(
            x + HISTORY_WIDTH - 10,
            y + 1,
            "h clears",
            panel.with_fg(FADED_FG),
        );

        let history = self.state.history();
        if history.is_empty() {
            frame.set_text(
                x + 2,
                y + 3,
                "no computations yet",
                panel.with_fg(FADED_FG).with_attrs(Attr::ITALIC),
            );
            return;
        }

        let max = usize::from(HISTORY_WIDTH) - 4;
        for (i, record) in history.iter().enumerate() {
            let row = y + 3 + i as u16;
            frame.set_text(x + 2, row, &clip_tail(record, max), panel);
        }
    }

    fn paint_readout(&self, frame: &mut FrameBuffer, x: u16, y: u16) {
        let readout = Cell::EMPTY.with_bg(READOUT_BG);
        frame.fill_rect(Rect::new(x, y, GRID_WIDTH, 3), readout);

        // Equation line: dim, right-aligned, clipped from the left so
        // the pending operator stays visible.
        let equation = clip_tail(self.state.equation(), usize::from(GRID_WIDTH) - 2);
        let eq_x = x + GRID_WIDTH - 1 - equation.len() as u16;
        frame.set_text(eq_x, y, &equation, readout.with_fg(FADED_FG));

        // Display line: bold, right-aligned. Error sentinels go red.
        let display = clip_tail(self.state.display(), usize::from(GRID_WIDTH) - 2);
        let template = if self.state.display_is_numeric() {
            readout.with_attrs(Attr::BOLD)
        } else {
            readout.with_fg(ERROR_FG).with_attrs(Attr::BOLD)
        };
        let disp_x = x + GRID_WIDTH - 1 - display.chars().count() as u16;
        frame.set_text(disp_x, y + 1, &display, template);
    }

    fn paint_keypad(frame: &mut FrameBuffer, x: u16, y: u16) {
        for button in BUTTONS {
            let bx = x + button.col * BUTTON_STRIDE;
            let by = y + button.row;
            let width = button.span * BUTTON_STRIDE - 1;

            let template = match button.kind {
                ButtonKind::Digit => Cell::EMPTY.with_bg(DIGIT_BG),
                ButtonKind::Operator => Cell::EMPTY.with_bg(OPERATOR_BG),
                ButtonKind::Clear => Cell::EMPTY.with_bg(CLEAR_BG).with_attrs(Attr::BOLD),
                ButtonKind::Equals => Cell::EMPTY.with_bg(EQUALS_BG).with_attrs(Attr::BOLD),
            };

            frame.fill_rect(Rect::new(bx, by, width, 1), template);
            let pad = width.saturating_sub(button.label.chars().count() as u16) / 2;
            frame.set_text(bx + pad, by, button.label, template);
        }
    }

    fn paint_help(frame: &mut FrameBuffer) {
        let help = "0-9 . digits   + - * / ops   enter =   c clear   h history   q quit";
        let x = frame.width().saturating_sub(help.len() as u16) / 2;
        let y = frame.height() - 1;
        frame.set_text(x, y, help, Cell::EMPTY.with_fg(FADED_FG));
    }
}

impl App for Calculator {
    fn on_event(&mut self, event: &KeyEvent) -> Action {
        match classify(event) {
            Command::Quit => Action::Quit,
            Command::Calc(input) => {
                self.state = std::mem::take(&mut self.state).update(input);
                Action::Continue
            }
            Command::Ignored => Action::Continue,
        }
    }

    fn paint(&mut self, frame: &mut FrameBuffer) {
        if frame.width() < MIN_COLS || frame.height() < MIN_ROWS {
            Self::paint_too_small(frame);
            return;
        }

        let (x, y) = Self::origin(frame);
        self.paint_history(frame, x, y);

        let calc_x = x + HISTORY_WIDTH + PANEL_GAP;
        let panel = Cell::EMPTY.with_bg(PANEL_BG);
        frame.fill_rect(Rect::new(calc_x, y, CALC_WIDTH, PANEL_HEIGHT), panel);

        let grid_x = calc_x + 2;
        self.paint_readout(frame, grid_x, y + 1);
        Self::paint_keypad(frame, grid_x, y + 5);

        Self::paint_help(frame);
    }
}

/// The last `max` characters of `text` — the readout keeps the tail
/// visible when an entry outgrows it, the way the original scrolls.
fn clip_tail(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    text.chars().skip(count - max).collect()
}

// ─── Entry point ─────────────────────────────────────────────────────────────

fn main() {
    let mut calculator = Calculator::new();
    let result = EventLoop::new().and_then(|mut event_loop| event_loop.run(&mut calculator));

    if let Err(err) = result {
        eprintln!("tally: {err}");
        process::exit(1);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
