// SPDX-License-Identifier: MIT
//
// Minimal tally-term application: paints a styled box with the keys
// you press, quits on `q` or Ctrl-C.
//
// Run with: cargo run -p tally-term --example demo

use tally_term::buffer::{FrameBuffer, Rect};
use tally_term::cell::{Attr, Cell};
use tally_term::color::CellColor;
use tally_term::event_loop::{Action, App, EventLoop};
use tally_term::input::{KeyCode, KeyEvent};

struct Demo {
    typed: String,
}

impl App for Demo {
    fn on_event(&mut self, event: &KeyEvent) -> Action {
        if event.is_ctrl('c') {
            return Action::Quit;
        }
        match event.code {
            KeyCode::Char('q') => return Action::Quit,
            KeyCode::Char(ch) => self.typed.push(ch),
            KeyCode::Backspace => {
                self.typed.pop();
            }
            _ => {}
        }
        Action::Continue
    }

    fn paint(&mut self, frame: &mut FrameBuffer) {
        let panel = Cell::EMPTY.with_bg(CellColor::hex(0x20_2A_3A));
        frame.fill_rect(Rect::new(2, 1, 40, 5), panel);

        let title = panel.with_attrs(Attr::BOLD);
        frame.set_text(4, 2, "tally-term demo — q quits", title);

        let body = panel.with_fg(CellColor::Ansi256(6));
        let text = if self.typed.is_empty() {
            "type something...".to_string()
        } else {
            self.typed.clone()
        };
        frame.set_text(4, 4, &text, body);
    }
}

fn main() -> std::io::Result<()> {
    let mut demo = Demo {
        typed: String::new(),
    };
    EventLoop::new()?.run(&mut demo)
}
