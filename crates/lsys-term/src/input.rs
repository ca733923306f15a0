// SPDX-License-Identifier: MIT
//
// Terminal input parser.
//
// Turns raw stdin bytes into key and paste events. Understands what a
// viewer driven by letters and arrow keys needs from a terminal:
//
// - ASCII and UTF-8 characters (rule keys may be any character)
// - control characters (Ctrl-C, Enter, Tab, Backspace)
// - legacy CSI and SS3 sequences for arrows and Home/End/Delete
// - xterm modifier parameters (`ESC [ 1 ; 5 C` is Ctrl+Right)
// - Alt+key as ESC followed by a printable byte
// - bracketed paste, delivered as one event
//
// Escape sequences may arrive split across read() calls, so the parser keeps
// unconsumed bytes in an internal buffer. A lone ESC stays pending until the
// caller decides no more bytes are coming and calls [`Parser::flush`].

use bitflags::bitflags;

// ─── Event Types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    /// Text between the bracketed paste delimiters.
    Paste(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
        }
    }

    #[must_use]
    pub const fn with_modifiers(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// True for Ctrl+`ch` (lowercase letter expected).
    #[must_use]
    pub fn is_ctrl(&self, ch: char) -> bool {
        self.code == KeyCode::Char(ch) && self.modifiers.contains(Modifiers::CTRL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
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
    /// Modifier keys, in xterm's `param = 1 + bitmask` layout.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
    }
}

// ─── Parser ─────────────────────────────────────────────────────────────────

const PASTE_START: &[u8] = b"\x1b[200~";
const PASTE_END: &[u8] = b"\x1b[201~";

/// Incremental input parser.
///
/// ```
/// use lsys_term::input::{Event, KeyCode, KeyEvent, Parser};
///
/// let mut parser = Parser::new();
/// let events = parser.advance(b"i\x1b[A");
/// assert_eq!(events, vec![
///     Event::Key(KeyEvent::new(KeyCode::Char('i'))),
///     Event::Key(KeyEvent::new(KeyCode::Up)),
/// ]);
/// ```
pub struct Parser {
    buf: Vec<u8>,
    in_paste: bool,
}

impl Parser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(64),
            in_paste: false,
        }
    }

    /// Feed raw bytes and return every event that is complete.
    pub fn advance(&mut self, data: &[u8]) -> Vec<Event> {
        self.buf.extend_from_slice(data);
        let mut events = Vec::new();
        let mut pos = 0;

        while pos < self.buf.len() {
            let remaining = &self.buf[pos..];

            if self.in_paste {
                let Some(end) = find_subsequence(remaining, PASTE_END) else {
                    break;
                };
                let text = String::from_utf8_lossy(&remaining[..end]).into_owned();
                events.push(Event::Paste(text));
                pos += end + PASTE_END.len();
                self.in_paste = false;
                continue;
            }

            if remaining.starts_with(PASTE_START) {
                self.in_paste = true;
                pos += PASTE_START.len();
                continue;
            }
            // A prefix of the paste opener: wait for the rest.
            if remaining.len() < PASTE_START.len()
                && remaining.starts_with(b"\x1b[")
                && PASTE_START.starts_with(remaining)
            {
                break;
            }

            match try_parse(remaining) {
                Parsed::Event(event, consumed) => {
                    events.push(event);
                    pos += consumed;
                }
                Parsed::Incomplete => break,
                Parsed::Skip(n) => pos += n,
            }
        }

        if pos > 0 {
            self.buf.drain(..pos);
        }
        events
    }

    /// Are there bytes waiting for the rest of a sequence?
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Resolve pending bytes as literal keys. A lone ESC becomes Escape.
    ///
    /// An unterminated paste is delivered as-is.
    pub fn flush(&mut self) -> Vec<Event> {
        let mut events = Vec::new();

        if self.in_paste {
            self.in_paste = false;
            let text = String::from_utf8_lossy(&self.buf).into_owned();
            self.buf.clear();
            if !text.is_empty() {
                events.push(Event::Paste(text));
            }
            return events;
        }

        for &byte in &self.buf {
            let event = match byte {
                0x1B => press(KeyCode::Escape),
                0x7F => press(KeyCode::Backspace),
                b @ 0x20..=0x7E => press(KeyCode::Char(char::from(b))),
                b @ 0x01..=0x1A => ctrl_key(b),
                _ => continue,
            };
            events.push(event);
        }
        self.buf.clear();
        events
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Stateless Parsing ──────────────────────────────────────────────────────

enum Parsed {
    /// An event and the bytes it consumed.
    Event(Event, usize),
    Incomplete,
    /// Unrecognized bytes to drop.
    Skip(usize),
}

fn try_parse(buf: &[u8]) -> Parsed {
    let Some(&lead) = buf.first() else {
        return Parsed::Skip(0);
    };

    match lead {
        0x1B => parse_escape(buf),
        0x08 | 0x7F => Parsed::Event(press(KeyCode::Backspace), 1),
        0x09 => Parsed::Event(press(KeyCode::Tab), 1),
        0x0A | 0x0D => Parsed::Event(press(KeyCode::Enter), 1),
        b @ 0x01..=0x1A => Parsed::Event(ctrl_key(b), 1),
        b @ 0x20..=0x7E => Parsed::Event(press(KeyCode::Char(char::from(b))), 1),
        0xC0..=0xFF => parse_utf8(buf),
        _ => Parsed::Skip(1),
    }
}

// ── Escape sequences ────────────────────────────────────────────────────────

fn parse_escape(buf: &[u8]) -> Parsed {
    let Some(&second) = buf.get(1) else {
        return Parsed::Incomplete;
    };

    match second {
        b'[' => parse_csi(buf),
        b'O' => parse_ss3(buf),
        b @ 0x20..=0x7E => Parsed::Event(
            key_with(KeyCode::Char(char::from(b)), Modifiers::ALT),
            2,
        ),
        _ => Parsed::Event(press(KeyCode::Escape), 1),
    }
}

fn parse_csi(buf: &[u8]) -> Parsed {
    // Parameter and intermediate bytes run until a final byte in 0x40..=0x7E.
    let mut end = 2;
    loop {
        let Some(&b) = buf.get(end) else {
            return Parsed::Incomplete;
        };
        if (0x40..=0x7E).contains(&b) {
            break;
        }
        if !(0x20..=0x3F).contains(&b) {
            return Parsed::Skip(end + 1);
        }
        end += 1;
    }

    let final_byte = buf[end];
    let params = parse_csi_params(&buf[2..end]);
    let consumed = end + 1;
    let modifiers = params.get(1).map_or(Modifiers::empty(), |&p| decode_modifiers(p));

    let code = match final_byte {
        b'~' => match params.first().copied().unwrap_or(0) {
            1 | 7 => KeyCode::Home,
            3 => KeyCode::Delete,
            4 | 8 => KeyCode::End,
            _ => return Parsed::Skip(consumed),
        },
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        b'Z' => return Parsed::Event(key_with(KeyCode::Tab, Modifiers::SHIFT), consumed),
        _ => return Parsed::Skip(consumed),
    };

    Parsed::Event(key_with(code, modifiers), consumed)
}

fn parse_ss3(buf: &[u8]) -> Parsed {
    let Some(&b) = buf.get(2) else {
        return Parsed::Incomplete;
    };

    let code = match b {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        _ => return Parsed::Skip(3),
    };
    Parsed::Event(press(code), 3)
}

// ── UTF-8 ───────────────────────────────────────────────────────────────────

fn parse_utf8(buf: &[u8]) -> Parsed {
    let expected = utf8_char_len(buf[0]);
    if expected == 0 {
        return Parsed::Skip(1);
    }
    if buf.len() < expected {
        return Parsed::Incomplete;
    }

    match std::str::from_utf8(&buf[..expected])
        .ok()
        .and_then(|s| s.chars().next())
    {
        Some(ch) => Parsed::Event(press(KeyCode::Char(ch)), expected),
        None => Parsed::Skip(1),
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────────

const fn press(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code))
}

const fn key_with(code: KeyCode, modifiers: Modifiers) -> Event {
    Event::Key(KeyEvent::with_modifiers(code, modifiers))
}

/// Ctrl+letter from its control byte (0x01 = Ctrl+A).
fn ctrl_key(byte: u8) -> Event {
    key_with(KeyCode::Char(char::from(byte + b'a' - 1)), Modifiers::CTRL)
}

/// `1;5` → `[1, 5]`. Empty fields parse as 0; sub-parameters after `:` are
/// ignored.
fn parse_csi_params(raw: &[u8]) -> Vec<u16> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(|&b| b == b';')
        .map(|field| {
            field
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .fold(0u16, |acc, &b| {
                    acc.saturating_mul(10).saturating_add(u16::from(b - b'0'))
                })
        })
        .collect()
}

/// xterm encodes modifiers as `1 + bitmask`; 0 and 1 mean none.
#[allow(clippy::cast_possible_truncation)]
const fn decode_modifiers(param: u16) -> Modifiers {
    let val = param.saturating_sub(1);
    Modifiers::from_bits_truncate(val as u8)
}

/// Byte length of a UTF-8 sequence from its lead byte; 0 if invalid.
const fn utf8_char_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 0,
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(data: &[u8]) -> Vec<Event> {
        Parser::new().advance(data)
    }

    fn parse_one(data: &[u8]) -> Event {
        let events = parse(data);
        assert_eq!(events.len(), 1, "expected one event for {data:?}, got {events:?}");
        events.into_iter().next().unwrap()
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code))
    }

    fn key_mod(code: KeyCode, modifiers: Modifiers) -> Event {
        Event::Key(KeyEvent::with_modifiers(code, modifiers))
    }

    // ── Characters ──────────────────────────────────────────────────────

    #[test]
    fn view_mode_letters() {
        let events = parse(b"mnqewasdiorx");
        assert_eq!(events.len(), 12);
        assert_eq!(events[0], key(KeyCode::Char('m')));
        assert_eq!(events[11], key(KeyCode::Char('x')));
    }

    #[test]
    fn rule_symbols() {
        assert_eq!(
            parse(b"F+[-]"),
            vec![
                key(KeyCode::Char('F')),
                key(KeyCode::Char('+')),
                key(KeyCode::Char('[')),
                key(KeyCode::Char('-')),
                key(KeyCode::Char(']')),
            ]
        );
    }

    #[test]
    fn utf8_two_and_three_byte() {
        assert_eq!(parse_one("ś".as_bytes()), key(KeyCode::Char('ś')));
        assert_eq!(parse_one("中".as_bytes()), key(KeyCode::Char('中')));
    }

    #[test]
    fn utf8_split_across_reads() {
        let bytes = "ż".as_bytes();
        let mut parser = Parser::new();
        assert!(parser.advance(&bytes[..1]).is_empty());
        assert!(parser.has_pending());
        assert_eq!(parser.advance(&bytes[1..]), vec![key(KeyCode::Char('ż'))]);
    }

    #[test]
    fn stray_continuation_byte_skipped() {
        assert_eq!(parse(b"\x80a"), vec![key(KeyCode::Char('a'))]);
    }

    // ── Control characters ──────────────────────────────────────────────

    #[test]
    fn ctrl_c() {
        let event = parse_one(b"\x03");
        assert_eq!(event, key_mod(KeyCode::Char('c'), Modifiers::CTRL));
        let Event::Key(k) = event else { unreachable!() };
        assert!(k.is_ctrl('c'));
    }

    #[test]
    fn enter_tab_backspace() {
        assert_eq!(parse_one(b"\r"), key(KeyCode::Enter));
        assert_eq!(parse_one(b"\n"), key(KeyCode::Enter));
        assert_eq!(parse_one(b"\t"), key(KeyCode::Tab));
        assert_eq!(parse_one(b"\x7f"), key(KeyCode::Backspace));
        assert_eq!(parse_one(b"\x08"), key(KeyCode::Backspace));
    }

    // ── CSI ─────────────────────────────────────────────────────────────

    #[test]
    fn arrows() {
        assert_eq!(parse_one(b"\x1b[A"), key(KeyCode::Up));
        assert_eq!(parse_one(b"\x1b[B"), key(KeyCode::Down));
        assert_eq!(parse_one(b"\x1b[C"), key(KeyCode::Right));
        assert_eq!(parse_one(b"\x1b[D"), key(KeyCode::Left));
    }

    #[test]
    fn arrows_with_modifiers() {
        assert_eq!(parse_one(b"\x1b[1;2A"), key_mod(KeyCode::Up, Modifiers::SHIFT));
        assert_eq!(parse_one(b"\x1b[1;5C"), key_mod(KeyCode::Right, Modifiers::CTRL));
        assert_eq!(
            parse_one(b"\x1b[1;4D"),
            key_mod(KeyCode::Left, Modifiers::SHIFT | Modifiers::ALT)
        );
    }

    #[test]
    fn tilde_keys() {
        assert_eq!(parse_one(b"\x1b[1~"), key(KeyCode::Home));
        assert_eq!(parse_one(b"\x1b[3~"), key(KeyCode::Delete));
        assert_eq!(parse_one(b"\x1b[4~"), key(KeyCode::End));
        assert_eq!(parse_one(b"\x1b[3;5~"), key_mod(KeyCode::Delete, Modifiers::CTRL));
    }

    #[test]
    fn unknown_csi_is_dropped() {
        assert_eq!(parse(b"\x1b[15~x"), vec![key(KeyCode::Char('x'))]);
        assert_eq!(parse(b"\x1b[<0;1;1Mx"), vec![key(KeyCode::Char('x'))]);
    }

    #[test]
    fn shift_tab() {
        assert_eq!(parse_one(b"\x1b[Z"), key_mod(KeyCode::Tab, Modifiers::SHIFT));
    }

    // ── SS3 ─────────────────────────────────────────────────────────────

    #[test]
    fn ss3_arrows() {
        assert_eq!(parse_one(b"\x1bOA"), key(KeyCode::Up));
        assert_eq!(parse_one(b"\x1bOD"), key(KeyCode::Left));
        assert_eq!(parse_one(b"\x1bOH"), key(KeyCode::Home));
    }

    // ── Alt ─────────────────────────────────────────────────────────────

    #[test]
    fn alt_letter() {
        assert_eq!(parse_one(b"\x1bx"), key_mod(KeyCode::Char('x'), Modifiers::ALT));
    }

    // ── Escape timeout ──────────────────────────────────────────────────

    #[test]
    fn lone_escape_waits_then_flushes() {
        let mut parser = Parser::new();
        assert!(parser.advance(b"\x1b").is_empty());
        assert!(parser.has_pending());
        assert_eq!(parser.flush(), vec![key(KeyCode::Escape)]);
        assert!(!parser.has_pending());
    }

    #[test]
    fn split_escape_sequence() {
        let mut parser = Parser::new();
        assert!(parser.advance(b"\x1b[").is_empty());
        assert!(parser.advance(b"1;5").is_empty());
        assert_eq!(
            parser.advance(b"A"),
            vec![key_mod(KeyCode::Up, Modifiers::CTRL)]
        );
    }

    // ── Bracketed paste ─────────────────────────────────────────────────

    #[test]
    fn paste_simple() {
        assert_eq!(
            parse(b"\x1b[200~F[+F]\x1b[201~"),
            vec![Event::Paste("F[+F]".into())]
        );
    }

    #[test]
    fn paste_split_across_reads() {
        let mut parser = Parser::new();
        assert!(parser.advance(b"\x1b[20").is_empty());
        assert!(parser.advance(b"0~FF").is_empty());
        assert_eq!(
            parser.advance(b"+\x1b[201~x"),
            vec![Event::Paste("FF+".into()), key(KeyCode::Char('x'))]
        );
    }

    #[test]
    fn unterminated_paste_flushes_text() {
        let mut parser = Parser::new();
        assert!(parser.advance(b"\x1b[200~abc").is_empty());
        assert_eq!(parser.flush(), vec![Event::Paste("abc".into())]);
    }

    // ── Parameters ──────────────────────────────────────────────────────

    #[test]
    fn csi_params() {
        assert_eq!(parse_csi_params(b""), Vec::<u16>::new());
        assert_eq!(parse_csi_params(b"1;5"), vec![1, 5]);
        assert_eq!(parse_csi_params(b";3"), vec![0, 3]);
        assert_eq!(parse_csi_params(b"99999999"), vec![u16::MAX]);
    }

    #[test]
    fn modifier_decoding() {
        assert_eq!(decode_modifiers(0), Modifiers::empty());
        assert_eq!(decode_modifiers(1), Modifiers::empty());
        assert_eq!(decode_modifiers(3), Modifiers::ALT);
        assert_eq!(decode_modifiers(6), Modifiers::SHIFT | Modifiers::CTRL);
    }
}
