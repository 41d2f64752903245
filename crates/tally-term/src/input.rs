// SPDX-License-Identifier: MIT
//
// Terminal input parser.
//
// Turns raw stdin bytes into key events. The calculator only enables
// plain keyboard input, so the parser handles exactly that:
//
// - Printable characters, including multi-byte UTF-8
// - Control bytes (Enter, Tab, Backspace, Ctrl+letter)
// - Legacy CSI sequences (arrows, Home/End/Delete, with modifiers)
// - SS3 sequences (arrow/Home/End alternate encoding)
// - Alt+key (ESC followed by a printable character)
//
// Escape sequences can arrive split across read() calls, so the parser
// keeps a small byte buffer. Feed bytes with [`Parser::advance`]; when
// the event loop's timeout fires with no new bytes, [`Parser::flush`]
// resolves a pending lone ESC into a real Escape keypress.

use bitflags::bitflags;

// ─── Key Types ───────────────────────────────────────────────────────────────

/// Identity of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    /// A printable Unicode character.
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
}

bitflags! {
    /// Keyboard modifier flags, as encoded in CSI modifier parameters.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const ALT   = 1 << 1;
        const CTRL  = 1 << 2;
    }
}

/// A key with its active modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Which key.
    pub code: KeyCode,
    /// Active modifiers.
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// A key event with no modifiers.
    #[inline]
    #[must_use]
    pub const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
        }
    }

    /// A key event with the given modifiers.
    #[inline]
    #[must_use]
    pub const fn with(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// Whether this is Ctrl plus the given character.
    #[must_use]
    pub fn is_ctrl(&self, ch: char) -> bool {
        self.modifiers.contains(Modifiers::CTRL) && self.code == KeyCode::Char(ch)
    }
}

// ─── Parse step ──────────────────────────────────────────────────────────────

/// Outcome of trying to parse one event from the front of the buffer.
enum Step {
    /// `(bytes consumed, event produced)`.
    Event(usize, KeyEvent),
    /// Bytes consumed with nothing to report (unknown sequence).
    Skip(usize),
    /// The buffer holds the start of a sequence; wait for more bytes.
    Incomplete,
}

// ─── Parser ──────────────────────────────────────────────────────────────────

/// Incremental byte-to-key-event parser.
///
/// ```
/// use tally_term::input::{KeyCode, Parser};
///
/// let mut parser = Parser::new();
/// let events = parser.advance(b"7+");
/// assert_eq!(events[0].code, KeyCode::Char('7'));
/// assert_eq!(events[1].code, KeyCode::Char('+'));
/// ```
#[derive(Debug, Default)]
pub struct Parser {
    buf: Vec<u8>,
}

impl Parser {
    /// A parser with an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and collect every complete event.
    pub fn advance(&mut self, data: &[u8]) -> Vec<KeyEvent> {
        self.buf.extend_from_slice(data);

        let mut events = Vec::new();
        while !self.buf.is_empty() {
            match self.parse_front() {
                Step::Event(n, event) => {
                    self.buf.drain(..n);
                    events.push(event);
                }
                Step::Skip(n) => {
                    self.buf.drain(..n);
                }
                Step::Incomplete => break,
            }
        }
        events
    }

    /// Whether bytes are waiting for a sequence to complete.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Resolve pending bytes after a timeout.
    ///
    /// A lone buffered ESC means the user pressed the Escape key, not
    /// that a sequence is on its way. Anything else that never
    /// completed is discarded.
    pub fn flush(&mut self) -> Vec<KeyEvent> {
        let mut events = Vec::new();
        if self.buf.first() == Some(&0x1B) {
            events.push(KeyEvent::plain(KeyCode::Escape));
        }
        self.buf.clear();
        events
    }

    // ─── Decoding ─────────────────────────────────────────────────────────

    /// Try to parse one event from the front of the buffer.
    fn parse_front(&self) -> Step {
        match self.buf[0] {
            0x1B => self.parse_escape(),
            b'\r' | b'\n' => Step::Event(1, KeyEvent::plain(KeyCode::Enter)),
            b'\t' => Step::Event(1, KeyEvent::plain(KeyCode::Tab)),
            0x7F | 0x08 => Step::Event(1, KeyEvent::plain(KeyCode::Backspace)),
            // Remaining C0 controls are Ctrl+letter (0x01 = Ctrl+A).
            b @ 0x01..=0x1A => Step::Event(
                1,
                KeyEvent::with(
                    KeyCode::Char((b + 0x60) as char),
                    Modifiers::CTRL,
                ),
            ),
            0x00 | 0x1C..=0x1F => Step::Skip(1),
            _ => Self::parse_utf8(&self.buf, 0, Modifiers::empty()),
        }
    }

    /// Parse an ESC-initiated sequence.
    fn parse_escape(&self) -> Step {
        let Some(&second) = self.buf.get(1) else {
            // Lone ESC: either the Escape key or a sequence still in
            // flight. Wait; the event loop's timeout flush decides.
            return Step::Incomplete;
        };

        match second {
            b'[' => self.parse_csi(),
            b'O' => self.parse_ss3(),
            0x1B => Step::Event(1, KeyEvent::plain(KeyCode::Escape)),
            // ESC + printable = Alt+key.
            _ => Self::parse_utf8(&self.buf, 1, Modifiers::ALT),
        }
    }

    /// Parse a CSI sequence: `ESC [ params final`.
    fn parse_csi(&self) -> Step {
        // Find the final byte (0x40..=0x7E) after the parameters.
        let Some(rel) = self.buf[2..]
            .iter()
            .position(|&b| (0x40..=0x7E).contains(&b))
        else {
            return Step::Incomplete;
        };
        let end = 2 + rel;
        let consumed = end + 1;
        let final_byte = self.buf[end];
        let params = parse_params(&self.buf[2..end]);

        let modifiers = params
            .get(1)
            .copied()
            .map_or(Modifiers::empty(), decode_modifiers);

        let code = match final_byte {
            b'A' => Some(KeyCode::Up),
            b'B' => Some(KeyCode::Down),
            b'C' => Some(KeyCode::Right),
            b'D' => Some(KeyCode::Left),
            b'H' => Some(KeyCode::Home),
            b'F' => Some(KeyCode::End),
            b'~' => match params.first() {
                Some(1 | 7) => Some(KeyCode::Home),
                Some(3) => Some(KeyCode::Delete),
                Some(4 | 8) => Some(KeyCode::End),
                _ => None,
            },
            _ => None,
        };

        match code {
            Some(code) => Step::Event(consumed, KeyEvent::with(code, modifiers)),
            None => Step::Skip(consumed),
        }
    }

    /// Parse an SS3 sequence: `ESC O final` (arrows and Home/End from
    /// terminals in application-cursor mode).
    fn parse_ss3(&self) -> Step {
        let Some(&final_byte) = self.buf.get(2) else {
            return Step::Incomplete;
        };
        let code = match final_byte {
            b'A' => Some(KeyCode::Up),
            b'B' => Some(KeyCode::Down),
            b'C' => Some(KeyCode::Right),
            b'D' => Some(KeyCode::Left),
            b'H' => Some(KeyCode::Home),
            b'F' => Some(KeyCode::End),
            _ => None,
        };
        match code {
            Some(code) => Step::Event(3, KeyEvent::plain(code)),
            None => Step::Skip(3),
        }
    }

    /// Decode one UTF-8 character starting at `offset`.
    ///
    /// `extra` is OR-ed into the event's modifiers (used for the
    /// Alt prefix). An invalid leading byte is skipped.
    fn parse_utf8(buf: &[u8], offset: usize, extra: Modifiers) -> Step {
        let lead = buf[offset];
        let len = match lead {
            0x00..=0x7F => 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return Step::Skip(offset + 1),
        };

        if buf.len() < offset + len {
            return Step::Incomplete;
        }

        match std::str::from_utf8(&buf[offset..offset + len]) {
            Ok(s) => match s.chars().next() {
                Some(ch) => Step::Event(
                    offset + len,
                    KeyEvent::with(KeyCode::Char(ch), extra),
                ),
                None => Step::Skip(offset + len),
            },
            Err(_) => Step::Skip(offset + 1),
        }
    }
}

// ─── Parameter decoding ──────────────────────────────────────────────────────

/// Decode semicolon-separated decimal CSI parameters, directly from
/// bytes — no intermediate `String`.
fn parse_params(bytes: &[u8]) -> Vec<u32> {
    let mut params = Vec::new();
    let mut current: Option<u32> = None;

    for &b in bytes {
        match b {
            b'0'..=b'9' => {
                let digit = u32::from(b - b'0');
                current = Some(current.unwrap_or(0).saturating_mul(10) + digit);
            }
            b';' => {
                params.push(current.take().unwrap_or(0));
            }
            _ => {} // Intermediate bytes — ignored.
        }
    }
    if let Some(value) = current {
        params.push(value);
    }
    params
}

/// Decode a CSI modifier parameter (value − 1 is a bitmask: 1 = Shift,
/// 2 = Alt, 4 = Ctrl).
fn decode_modifiers(param: u32) -> Modifiers {
    let Some(bits) = param.checked_sub(1) else {
        return Modifiers::empty();
    };
    let mut modifiers = Modifiers::empty();
    if bits & 1 != 0 {
        modifiers |= Modifiers::SHIFT;
    }
    if bits & 2 != 0 {
        modifiers |= Modifiers::ALT;
    }
    if bits & 4 != 0 {
        modifiers |= Modifiers::CTRL;
    }
    modifiers
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keys(bytes: &[u8]) -> Vec<KeyEvent> {
        Parser::new().advance(bytes)
    }

    // ── Printable characters ─────────────────────────────────────────────

    #[test]
    fn ascii_characters() {
        assert_eq!(keys(b"7"), vec![KeyEvent::plain(KeyCode::Char('7'))]);
        assert_eq!(keys(b"+"), vec![KeyEvent::plain(KeyCode::Char('+'))]);
    }

    #[test]
    fn several_characters_in_one_chunk() {
        let events = keys(b"12+3");
        let chars: Vec<_> = events.iter().map(|e| e.code).collect();
        assert_eq!(
            chars,
            vec![
                KeyCode::Char('1'),
                KeyCode::Char('2'),
                KeyCode::Char('+'),
                KeyCode::Char('3'),
            ]
        );
    }

    #[test]
    fn utf8_multibyte_character() {
        assert_eq!(keys("÷".as_bytes()), vec![KeyEvent::plain(KeyCode::Char('÷'))]);
    }

    #[test]
    fn utf8_split_across_reads() {
        let bytes = "×".as_bytes();
        let mut parser = Parser::new();
        assert!(parser.advance(&bytes[..1]).is_empty());
        assert!(parser.has_pending());
        assert_eq!(
            parser.advance(&bytes[1..]),
            vec![KeyEvent::plain(KeyCode::Char('×'))]
        );
    }

    #[test]
    fn invalid_byte_is_skipped() {
        assert_eq!(keys(&[0xFF, b'5']), vec![KeyEvent::plain(KeyCode::Char('5'))]);
    }

    // ── Control bytes ────────────────────────────────────────────────────

    #[test]
    fn enter_from_cr_and_lf() {
        assert_eq!(keys(b"\r"), vec![KeyEvent::plain(KeyCode::Enter)]);
        assert_eq!(keys(b"\n"), vec![KeyEvent::plain(KeyCode::Enter)]);
    }

    #[test]
    fn tab_and_backspace() {
        assert_eq!(keys(b"\t"), vec![KeyEvent::plain(KeyCode::Tab)]);
        assert_eq!(keys(&[0x7F]), vec![KeyEvent::plain(KeyCode::Backspace)]);
        assert_eq!(keys(&[0x08]), vec![KeyEvent::plain(KeyCode::Backspace)]);
    }

    #[test]
    fn ctrl_letter() {
        let events = keys(&[0x03]);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_ctrl('c'));
    }

    // ── CSI sequences ────────────────────────────────────────────────────

    #[test]
    fn arrow_keys() {
        assert_eq!(keys(b"\x1b[A"), vec![KeyEvent::plain(KeyCode::Up)]);
        assert_eq!(keys(b"\x1b[B"), vec![KeyEvent::plain(KeyCode::Down)]);
        assert_eq!(keys(b"\x1b[C"), vec![KeyEvent::plain(KeyCode::Right)]);
        assert_eq!(keys(b"\x1b[D"), vec![KeyEvent::plain(KeyCode::Left)]);
    }

    #[test]
    fn home_end_delete() {
        assert_eq!(keys(b"\x1b[H"), vec![KeyEvent::plain(KeyCode::Home)]);
        assert_eq!(keys(b"\x1b[F"), vec![KeyEvent::plain(KeyCode::End)]);
        assert_eq!(keys(b"\x1b[3~"), vec![KeyEvent::plain(KeyCode::Delete)]);
        assert_eq!(keys(b"\x1b[1~"), vec![KeyEvent::plain(KeyCode::Home)]);
        assert_eq!(keys(b"\x1b[4~"), vec![KeyEvent::plain(KeyCode::End)]);
    }

    #[test]
    fn csi_modifier_parameter() {
        // CSI 1;5C = Ctrl+Right.
        let events = keys(b"\x1b[1;5C");
        assert_eq!(
            events,
            vec![KeyEvent::with(KeyCode::Right, Modifiers::CTRL)]
        );
    }

    #[test]
    fn csi_shift_alt_combo() {
        // 1 + shift(1) + alt(2) = parameter 4.
        let events = keys(b"\x1b[1;4A");
        assert_eq!(
            events,
            vec![KeyEvent::with(KeyCode::Up, Modifiers::SHIFT | Modifiers::ALT)]
        );
    }

    #[test]
    fn unknown_csi_is_skipped() {
        // CSI 5~ (PageUp) isn't mapped — consumed without an event.
        let events = keys(b"\x1b[5~9");
        assert_eq!(events, vec![KeyEvent::plain(KeyCode::Char('9'))]);
    }

    #[test]
    fn csi_split_across_reads() {
        let mut parser = Parser::new();
        assert!(parser.advance(b"\x1b[").is_empty());
        assert_eq!(parser.advance(b"A"), vec![KeyEvent::plain(KeyCode::Up)]);
    }

    // ── SS3 sequences ────────────────────────────────────────────────────

    #[test]
    fn ss3_arrows() {
        assert_eq!(keys(b"\x1bOA"), vec![KeyEvent::plain(KeyCode::Up)]);
        assert_eq!(keys(b"\x1bOF"), vec![KeyEvent::plain(KeyCode::End)]);
    }

    #[test]
    fn unknown_ss3_is_skipped() {
        // SS3 P (F1) isn't mapped.
        assert_eq!(keys(b"\x1bOP5"), vec![KeyEvent::plain(KeyCode::Char('5'))]);
    }

    // ── Escape handling ──────────────────────────────────────────────────

    #[test]
    fn lone_esc_stays_pending_until_flush() {
        let mut parser = Parser::new();
        assert!(parser.advance(b"\x1b").is_empty());
        assert!(parser.has_pending());
        assert_eq!(parser.flush(), vec![KeyEvent::plain(KeyCode::Escape)]);
        assert!(!parser.has_pending());
    }

    #[test]
    fn double_esc_resolves_first_immediately() {
        let mut parser = Parser::new();
        let events = parser.advance(b"\x1b\x1b");
        assert_eq!(events, vec![KeyEvent::plain(KeyCode::Escape)]);
        // The second ESC is still pending.
        assert!(parser.has_pending());
    }

    #[test]
    fn alt_key() {
        let events = keys(b"\x1bq");
        assert_eq!(
            events,
            vec![KeyEvent::with(KeyCode::Char('q'), Modifiers::ALT)]
        );
    }

    #[test]
    fn flush_discards_incomplete_non_escape() {
        let mut parser = Parser::new();
        parser.advance(&[0xC3]); // First byte of a 2-byte UTF-8 char.
        assert!(parser.flush().is_empty());
        assert!(!parser.has_pending());
    }

    // ── Parameter decoding ───────────────────────────────────────────────

    #[test]
    fn params_decode() {
        assert_eq!(parse_params(b""), Vec::<u32>::new());
        assert_eq!(parse_params(b"1"), vec![1]);
        assert_eq!(parse_params(b"1;5"), vec![1, 5]);
        assert_eq!(parse_params(b";5"), vec![0, 5]);
        assert_eq!(parse_params(b"12;34"), vec![12, 34]);
    }

    #[test]
    fn modifier_decode() {
        assert_eq!(decode_modifiers(0), Modifiers::empty());
        assert_eq!(decode_modifiers(1), Modifiers::empty());
        assert_eq!(decode_modifiers(2), Modifiers::SHIFT);
        assert_eq!(decode_modifiers(3), Modifiers::ALT);
        assert_eq!(decode_modifiers(5), Modifiers::CTRL);
        assert_eq!(decode_modifiers(8), Modifiers::SHIFT | Modifiers::ALT | Modifiers::CTRL);
    }
}
