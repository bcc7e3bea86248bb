//! Incremental decoder for raw terminal input.
//!
//! Bytes are appended with [`RawDecoder::feed`], which returns a lazy iterator
//! over the complete events now at the front of the buffer. Each event
//! consumes exactly the bytes it occupies; a trailing partial sequence stays
//! buffered until the next read completes it.
//!
//! Understood encodings:
//!   C0 controls, UTF-8 text, `ESC x` (Alt), CSI / SS3 cursor and function keys
//!   with xterm modifier parameters, and X10 / SGR (1006) / urxvt (1015) mouse
//!   reports.

use crate::event::{InputEvent, MouseButton, PointerAction, PointerInput};
use bytes::{Buf, BytesMut};
use crossterm::event::{KeyCode, KeyModifiers};
use std::time::Duration;

const ESC: u8 = 0x1B;

/// How long a lone ESC may wait for a follow-up byte before it counts as the
/// Escape key.
pub const ESC_TIMEOUT: Duration = Duration::from_millis(25);

/// A CSI sequence longer than this without a final byte is garbage.
const MAX_CSI_LEN: usize = 64;

// Mouse button code bits (xterm).
const MOUSE_SHIFT: u16 = 4;
const MOUSE_ALT: u16 = 8;
const MOUSE_CTRL: u16 = 16;
const MOUSE_MOTION: u16 = 32;
const MOUSE_WHEEL: u16 = 64;
const MOUSE_EXTRA: u16 = 128;

/// Outcome of parsing the front of the buffer.
#[derive(Debug, PartialEq, Eq)]
enum Parse {
    /// An event and the number of bytes it occupied.
    Event(InputEvent, usize),
    /// Not enough bytes yet.
    Incomplete,
}

/// Growable input buffer plus the parser that drains it.
#[derive(Debug, Default)]
pub struct RawDecoder {
    buf: BytesMut,
}

impl RawDecoder {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(64),
        }
    }

    /// Append newly read bytes and iterate over every complete event.
    ///
    /// Dropping the iterator early leaves the unparsed events in the buffer.
    pub fn feed(&mut self, data: &[u8]) -> Events<'_> {
        self.buf.extend_from_slice(data);
        Events { decoder: self }
    }

    /// Bytes waiting for the rest of their sequence.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    /// Whether the buffer holds only an escape that may still be the start
    /// of a longer sequence: a bare ESC, or `ESC [` / `ESC O` with nothing
    /// after it.
    pub fn has_pending_escape(&self) -> bool {
        matches!(self.buf[..], [ESC] | [ESC, b'['] | [ESC, b'O'])
    }

    /// Resolve an escape that was not followed by anything within
    /// [`ESC_TIMEOUT`]. A bare ESC is the Escape key; `ESC [` and `ESC O`
    /// are Alt+`[` and Alt+`O`.
    pub fn flush_escape(&mut self) -> Option<InputEvent> {
        if !self.has_pending_escape() {
            return None;
        }
        let event = match self.buf.get(1) {
            None => InputEvent::key(KeyCode::Esc),
            Some(&c) => InputEvent::key_with(KeyCode::Char(c as char), KeyModifiers::ALT),
        };
        self.buf.clear();
        Some(event)
    }
}

/// Lazy sequence of events produced by one [`RawDecoder::feed`] call.
pub struct Events<'a> {
    decoder: &'a mut RawDecoder,
}

impl Iterator for Events<'_> {
    type Item = InputEvent;

    fn next(&mut self) -> Option<InputEvent> {
        match parse_event(&self.decoder.buf) {
            Parse::Event(event, len) => {
                self.decoder.buf.advance(len);
                Some(event)
            }
            Parse::Incomplete => None,
        }
    }
}

fn parse_event(buf: &[u8]) -> Parse {
    let Some(&first) = buf.first() else {
        return Parse::Incomplete;
    };
    let ctrl = KeyModifiers::CONTROL;
    let event = match first {
        ESC => return parse_escape(buf),
        0x00 => InputEvent::key(KeyCode::Null),
        b'\r' => InputEvent::key(KeyCode::Enter),
        b'\t' => InputEvent::key(KeyCode::Tab),
        0x08 | 0x7F => InputEvent::key(KeyCode::Backspace),
        0x01..=0x1A => InputEvent::key_with(KeyCode::Char((first - 1 + b'a') as char), ctrl),
        0x1C..=0x1F => {
            let c = b"\\]^_"[(first - 0x1C) as usize] as char;
            InputEvent::key_with(KeyCode::Char(c), ctrl)
        }
        _ => return parse_utf8(buf),
    };
    Parse::Event(event, 1)
}

fn parse_utf8(buf: &[u8]) -> Parse {
    let width = match buf[0] {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        b => {
            return Parse::Event(
                InputEvent::Error(format!("invalid UTF-8 lead byte {:#04x}", b)),
                1,
            )
        }
    };
    let available = buf.len().min(width);
    if let Some(pos) = buf[1..available].iter().position(|b| b & 0xC0 != 0x80) {
        return Parse::Event(
            InputEvent::Error(format!("truncated UTF-8 sequence {:02x?}", &buf[..pos + 1])),
            pos + 1,
        );
    }
    if buf.len() < width {
        return Parse::Incomplete;
    }
    match std::str::from_utf8(&buf[..width]) {
        Ok(s) => match s.chars().next() {
            Some(c) => Parse::Event(InputEvent::key(KeyCode::Char(c)), width),
            None => Parse::Incomplete,
        },
        Err(e) => Parse::Event(InputEvent::Error(format!("invalid UTF-8: {}", e)), width),
    }
}

fn parse_escape(buf: &[u8]) -> Parse {
    match buf.get(1) {
        None => Parse::Incomplete,
        Some(b'[') => parse_csi(buf),
        Some(b'O') => parse_ss3(buf),
        // Double ESC: the first one stands alone.
        Some(&ESC) => Parse::Event(InputEvent::key(KeyCode::Esc), 1),
        Some(_) => match parse_event(&buf[1..]) {
            Parse::Event(InputEvent::Key { code, modifiers }, len) => Parse::Event(
                InputEvent::key_with(code, modifiers | KeyModifiers::ALT),
                len + 1,
            ),
            Parse::Event(other, len) => Parse::Event(other, len + 1),
            Parse::Incomplete => Parse::Incomplete,
        },
    }
}

fn parse_ss3(buf: &[u8]) -> Parse {
    let Some(&last) = buf.get(2) else {
        return Parse::Incomplete;
    };
    let event = match cursor_key(last) {
        Some(code) => InputEvent::key(code),
        None => match last {
            b'P' => InputEvent::key(KeyCode::F(1)),
            b'Q' => InputEvent::key(KeyCode::F(2)),
            b'R' => InputEvent::key(KeyCode::F(3)),
            b'S' => InputEvent::key(KeyCode::F(4)),
            _ => InputEvent::None,
        },
    };
    Parse::Event(event, 3)
}

fn parse_csi(buf: &[u8]) -> Parse {
    match buf.get(2) {
        None => return Parse::Incomplete,
        Some(b'M') => return parse_x10_mouse(buf),
        Some(_) => {}
    }

    // ESC [ <params 0x30-0x3F> <intermediates 0x20-0x2F> <final 0x40-0x7E>
    let mut i = 2;
    while i < buf.len() && (0x30..=0x3F).contains(&buf[i]) {
        i += 1;
    }
    let params_end = i;
    while i < buf.len() && (0x20..=0x2F).contains(&buf[i]) {
        i += 1;
    }
    let Some(&last) = buf.get(i) else {
        if buf.len() > MAX_CSI_LEN {
            return Parse::Event(
                InputEvent::Error(format!("unterminated CSI sequence of {} bytes", buf.len())),
                buf.len(),
            );
        }
        return Parse::Incomplete;
    };
    if !(0x40..=0x7E).contains(&last) {
        // A fresh ESC starts the next sequence; leave it for the next pass.
        let len = if last == ESC { i } else { i + 1 };
        return Parse::Event(
            InputEvent::Error(format!("malformed CSI sequence {:02x?}", &buf[..i + 1])),
            len,
        );
    }

    let len = i + 1;
    let params = &buf[2..params_end];
    let has_intermediates = params_end != i;
    if has_intermediates {
        return Parse::Event(InputEvent::None, len);
    }

    let event = match params.first() {
        Some(b'<') => sgr_mouse(&params[1..], last),
        Some(b'=' | b'>' | b'?') => InputEvent::None,
        _ => match parse_params(params) {
            Some(values) => csi_key_or_mouse(&values, last),
            None => InputEvent::None,
        },
    };
    Parse::Event(event, len)
}

/// `ESC [ M cb cx cy`, each value offset by 32.
fn parse_x10_mouse(buf: &[u8]) -> Parse {
    if buf.len() < 6 {
        return Parse::Incomplete;
    }
    let [cb, cx, cy] = [buf[3], buf[4], buf[5]];
    if cb < 32 || cx < 32 || cy < 32 {
        return Parse::Event(
            InputEvent::Error(format!("malformed X10 mouse report {:02x?}", &buf[..6])),
            6,
        );
    }
    let event = mouse_event(
        u16::from(cb - 32),
        u16::from(cx - 32),
        u16::from(cy - 32),
        false,
    );
    Parse::Event(event, 6)
}

/// `ESC [ < b ; x ; y M` for press/motion, `m` for release.
fn sgr_mouse(params: &[u8], last: u8) -> InputEvent {
    if last != b'M' && last != b'm' {
        return InputEvent::None;
    }
    match parse_params(params).as_deref() {
        Some(&[cb, x, y]) => mouse_event(cb, x, y, last == b'm'),
        _ => InputEvent::Error(format!(
            "malformed SGR mouse parameters {:?}",
            String::from_utf8_lossy(params)
        )),
    }
}

fn csi_key_or_mouse(values: &[u16], last: u8) -> InputEvent {
    // urxvt 1015 mouse: ESC [ cb ; x ; y M
    if last == b'M' {
        return match values {
            &[cb, x, y] if cb >= 32 => mouse_event(cb - 32, x, y, false),
            _ => InputEvent::None,
        };
    }

    let modifiers = values.get(1).map_or(KeyModifiers::NONE, |&m| key_modifiers(m));
    let code = match last {
        b'~' => values.first().and_then(|&n| tilde_key(n)),
        b'Z' => Some(KeyCode::BackTab),
        // Focus in/out reports.
        b'I' | b'O' => None,
        other => cursor_key(other),
    };
    match code {
        Some(code) => InputEvent::key_with(code, modifiers),
        None => InputEvent::None,
    }
}

/// Semicolon separated decimal parameters. `None` if any field is empty or
/// not a number.
fn parse_params(params: &[u8]) -> Option<Vec<u16>> {
    if params.is_empty() {
        return Some(Vec::new());
    }
    params
        .split(|&b| b == b';')
        .map(|field| std::str::from_utf8(field).ok()?.parse::<u16>().ok())
        .collect()
}

fn cursor_key(last: u8) -> Option<KeyCode> {
    match last {
        b'A' => Some(KeyCode::Up),
        b'B' => Some(KeyCode::Down),
        b'C' => Some(KeyCode::Right),
        b'D' => Some(KeyCode::Left),
        b'H' => Some(KeyCode::Home),
        b'F' => Some(KeyCode::End),
        _ => None,
    }
}

fn tilde_key(n: u16) -> Option<KeyCode> {
    let code = match n {
        1 | 7 => KeyCode::Home,
        2 => KeyCode::Insert,
        3 => KeyCode::Delete,
        4 | 8 => KeyCode::End,
        5 => KeyCode::PageUp,
        6 => KeyCode::PageDown,
        11..=15 => KeyCode::F((n - 10) as u8),
        17..=21 => KeyCode::F((n - 11) as u8),
        23 | 24 => KeyCode::F((n - 12) as u8),
        _ => return None,
    };
    Some(code)
}

/// xterm modifier parameter: value - 1 is a bit set of Shift(1) Alt(2) Ctrl(4).
fn key_modifiers(param: u16) -> KeyModifiers {
    let bits = param.saturating_sub(1);
    let mut modifiers = KeyModifiers::NONE;
    if bits & 1 != 0 {
        modifiers |= KeyModifiers::SHIFT;
    }
    if bits & 2 != 0 {
        modifiers |= KeyModifiers::ALT;
    }
    if bits & 4 != 0 {
        modifiers |= KeyModifiers::CONTROL;
    }
    modifiers
}

/// Build a pointer event from an xterm button code and one-based cell
/// coordinates.
fn mouse_event(cb: u16, col: u16, row: u16, sgr_release: bool) -> InputEvent {
    let mut modifiers = KeyModifiers::NONE;
    if cb & MOUSE_SHIFT != 0 {
        modifiers |= KeyModifiers::SHIFT;
    }
    if cb & MOUSE_ALT != 0 {
        modifiers |= KeyModifiers::ALT;
    }
    if cb & MOUSE_CTRL != 0 {
        modifiers |= KeyModifiers::CONTROL;
    }
    let motion = cb & MOUSE_MOTION != 0;

    if cb & MOUSE_EXTRA != 0 {
        // Buttons 8-11; nothing on the desktop side maps to them.
        return InputEvent::None;
    }
    let action = if cb & MOUSE_WHEEL != 0 {
        match cb & 3 {
            0 => PointerAction::WheelUp,
            1 => PointerAction::WheelDown,
            // Horizontal wheel.
            _ => return InputEvent::None,
        }
    } else if sgr_release {
        PointerAction::Release
    } else {
        match cb & 3 {
            0 => PointerAction::Press(MouseButton::Left),
            1 => PointerAction::Press(MouseButton::Middle),
            2 => PointerAction::Press(MouseButton::Right),
            _ if motion => PointerAction::Move,
            _ => PointerAction::Release,
        }
    };

    InputEvent::Pointer(PointerInput {
        x: col.saturating_sub(1),
        y: row.saturating_sub(1),
        action,
        motion,
        modifiers,
    })
}
