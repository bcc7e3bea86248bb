//! Turns decoded input events into desktop commands.
//!
//! Pointer events always produce a `MoveTo` first: the desktop pointer is not
//! tracked continuously, so it is re-positioned before any button action.

use crate::command::DesktopCommand;
use crate::event::{InputEvent, MouseButton, PointerAction, PointerInput};
use crate::geometry::{map_point, ViewportGeometry};
use crate::pan::PanSession;
use crate::zoom::ZoomInput;
use crossterm::event::{KeyCode, KeyModifiers};

/// Symbolic keys and their X keysym names.
const NAMED_KEYS: &[(KeyCode, &str)] = &[
    (KeyCode::Enter, "Return"),
    (KeyCode::Backspace, "BackSpace"),
    (KeyCode::Tab, "Tab"),
    (KeyCode::BackTab, "ISO_Left_Tab"),
    (KeyCode::Esc, "Escape"),
    (KeyCode::Char(' '), "space"),
    (KeyCode::F(1), "F1"),
    (KeyCode::F(2), "F2"),
    (KeyCode::F(3), "F3"),
    (KeyCode::F(4), "F4"),
    (KeyCode::F(5), "F5"),
    (KeyCode::F(6), "F6"),
    (KeyCode::F(7), "F7"),
    (KeyCode::F(8), "F8"),
    (KeyCode::F(9), "F9"),
    (KeyCode::F(10), "F10"),
    (KeyCode::F(11), "F11"),
    (KeyCode::F(12), "F12"),
    (KeyCode::Insert, "Insert"),
    (KeyCode::Delete, "Delete"),
    (KeyCode::Home, "Home"),
    (KeyCode::End, "End"),
    (KeyCode::PageUp, "Prior"),
    (KeyCode::PageDown, "Next"),
    (KeyCode::Up, "Up"),
    (KeyCode::Down, "Down"),
    (KeyCode::Left, "Left"),
    (KeyCode::Right, "Right"),
];

/// Keysym names for space and ASCII punctuation that may arrive with Ctrl or
/// Alt held. xdotool splits key names on `+`, so none of these may be sent
/// raw.
const PUNCTUATION_KEYSYMS: &[(char, &str)] = &[
    (' ', "space"),
    ('!', "exclam"),
    ('"', "quotedbl"),
    ('#', "numbersign"),
    ('$', "dollar"),
    ('%', "percent"),
    ('&', "ampersand"),
    ('\'', "apostrophe"),
    ('(', "parenleft"),
    (')', "parenright"),
    ('*', "asterisk"),
    ('+', "plus"),
    (',', "comma"),
    ('-', "minus"),
    ('.', "period"),
    ('/', "slash"),
    (':', "colon"),
    (';', "semicolon"),
    ('<', "less"),
    ('=', "equal"),
    ('>', "greater"),
    ('?', "question"),
    ('@', "at"),
    ('[', "bracketleft"),
    ('\\', "backslash"),
    (']', "bracketright"),
    ('^', "asciicircum"),
    ('_', "underscore"),
    ('`', "grave"),
    ('{', "braceleft"),
    ('|', "bar"),
    ('}', "braceright"),
    ('~', "asciitilde"),
];

/// Result of looking a key up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyTranslation {
    Command(DesktopCommand),
    /// NUL with no symbolic key. Fires once at startup on some terminals.
    Spurious,
    /// Nothing on the desktop side corresponds to this key.
    Unmapped,
}

pub fn key_name(code: KeyCode) -> Option<&'static str> {
    NAMED_KEYS
        .iter()
        .find(|(k, _)| *k == code)
        .map(|(_, name)| *name)
}

fn char_keysym(c: char) -> String {
    PUNCTUATION_KEYSYMS
        .iter()
        .find(|(p, _)| *p == c)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| c.to_ascii_lowercase().to_string())
}

/// `ctrl+alt+shift+` prefix in xdotool's order.
fn with_modifiers(modifiers: KeyModifiers, name: &str) -> String {
    let mut out = String::new();
    if modifiers.contains(KeyModifiers::CONTROL) {
        out.push_str("ctrl+");
    }
    if modifiers.contains(KeyModifiers::ALT) {
        out.push_str("alt+");
    }
    if modifiers.contains(KeyModifiers::SHIFT) {
        out.push_str("shift+");
    }
    out.push_str(name);
    out
}

/// Translate one key event.
pub fn translate_key(code: KeyCode, modifiers: KeyModifiers) -> KeyTranslation {
    let chorded = modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
    let command = match code {
        KeyCode::Null | KeyCode::Char('\0') => return KeyTranslation::Spurious,
        KeyCode::Char(c) if chorded => {
            DesktopCommand::SendKey(with_modifiers(modifiers - KeyModifiers::SHIFT, &char_keysym(c)))
        }
        KeyCode::Char(c) if c != ' ' && !c.is_control() => DesktopCommand::TypeChar(c),
        other => match key_name(other) {
            Some(name) => DesktopCommand::SendKey(with_modifiers(modifiers, name)),
            None => return KeyTranslation::Unmapped,
        },
    };
    KeyTranslation::Command(command)
}

/// Event classifier: owns the pan session, the remembered button and the
/// current preview geometry.
#[derive(Debug)]
pub struct Translator {
    geometry: ViewportGeometry,
    pan: PanSession,
    last_button: Option<MouseButton>,
}

impl Translator {
    pub fn new(geometry: ViewportGeometry) -> Self {
        Self {
            geometry,
            pan: PanSession::new(),
            last_button: None,
        }
    }

    pub fn geometry(&self) -> ViewportGeometry {
        self.geometry
    }

    pub fn set_geometry(&mut self, geometry: ViewportGeometry) {
        self.geometry = geometry;
    }

    #[cfg(test)]
    pub fn is_panning(&self) -> bool {
        self.pan.is_panning()
    }

    /// Commands for one decoded event, in injection order.
    pub fn translate(&mut self, event: &InputEvent, zoom: &ZoomInput) -> Vec<DesktopCommand> {
        match event {
            InputEvent::Key { code, modifiers } => match translate_key(*code, *modifiers) {
                KeyTranslation::Command(cmd) => vec![cmd],
                KeyTranslation::Spurious => Vec::new(),
                KeyTranslation::Unmapped => {
                    log::info!("No key found for keycode: {:?} (mod {:?})", code, modifiers);
                    Vec::new()
                }
            },
            InputEvent::Pointer(pointer) => self.pointer(pointer, zoom),
            InputEvent::None | InputEvent::Error(_) => Vec::new(),
        }
    }

    fn pointer(&mut self, p: &PointerInput, zoom: &ZoomInput) -> Vec<DesktopCommand> {
        let qualifying =
            p.motion && p.ctrl() && p.action == PointerAction::Press(MouseButton::Left);
        let (grab_x, grab_y) = zoom.grab();
        let origin = self.pan.update(qualifying, (grab_x as f32, grab_y as f32));
        zoom.set_pan(self.pan.is_panning());

        let target = map_point(
            (p.x, p.y),
            zoom.source_size(),
            (self.geometry.preview_width, self.geometry.preview_height),
            origin,
        );
        zoom.set_pointer(target.x, target.y);

        let mut commands = vec![DesktopCommand::MoveTo {
            x: target.x,
            y: target.y,
        }];
        if self.pan.is_panning() {
            return commands;
        }

        match p.action {
            PointerAction::Press(button) if !p.motion => {
                self.last_button = Some(button);
                commands.push(DesktopCommand::ButtonDown(button.number()));
            }
            // Drag samples and plain motion only move the pointer.
            PointerAction::Press(_) | PointerAction::Move => {}
            PointerAction::Release => match self.last_button {
                Some(button) => commands.push(DesktopCommand::ButtonUp(button.number())),
                None => log::warn!("button release with no button pressed"),
            },
            PointerAction::WheelUp if p.ctrl() => {
                commands.push(DesktopCommand::AdjustMagnification(1))
            }
            PointerAction::WheelDown if p.ctrl() => {
                commands.push(DesktopCommand::AdjustMagnification(-1))
            }
            PointerAction::WheelUp => commands.push(DesktopCommand::Click(4)),
            PointerAction::WheelDown => commands.push(DesktopCommand::Click(5)),
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zoom::{ZoomRender, ZoomState};

    fn setup() -> (Translator, ZoomInput, ZoomRender) {
        let (input, render) = ZoomState::split(1600, 1200);
        // 80 x 60 preview over the full desktop: 20 px per cell.
        let geometry = ViewportGeometry {
            terminal_width: 80,
            terminal_height: 31,
            preview_width: 80,
            preview_height: 60,
        };
        (Translator::new(geometry), input, render)
    }

    fn pointer(x: u16, y: u16, action: PointerAction, motion: bool, mods: KeyModifiers) -> InputEvent {
        InputEvent::Pointer(PointerInput {
            x,
            y,
            action,
            motion,
            modifiers: mods,
        })
    }

    const LEFT: PointerAction = PointerAction::Press(MouseButton::Left);
    const CTRL: KeyModifiers = KeyModifiers::CONTROL;
    const NONE: KeyModifiers = KeyModifiers::NONE;

    #[test]
    fn test_key_table() {
        assert_eq!(key_name(KeyCode::Enter), Some("Return"));
        assert_eq!(key_name(KeyCode::PageUp), Some("Prior"));
        assert_eq!(key_name(KeyCode::F(12)), Some("F12"));
        assert_eq!(key_name(KeyCode::F(13)), None);
    }

    #[test]
    fn test_printable_char_is_typed() {
        assert_eq!(
            translate_key(KeyCode::Char('x'), NONE),
            KeyTranslation::Command(DesktopCommand::TypeChar('x'))
        );
        assert_eq!(
            translate_key(KeyCode::Char('X'), KeyModifiers::SHIFT),
            KeyTranslation::Command(DesktopCommand::TypeChar('X'))
        );
    }

    #[test]
    fn test_named_and_chorded_keys() {
        assert_eq!(
            translate_key(KeyCode::Backspace, NONE),
            KeyTranslation::Command(DesktopCommand::SendKey("BackSpace".into()))
        );
        assert_eq!(
            translate_key(KeyCode::Char('l'), CTRL),
            KeyTranslation::Command(DesktopCommand::SendKey("ctrl+l".into()))
        );
        assert_eq!(
            translate_key(KeyCode::Char('^'), CTRL),
            KeyTranslation::Command(DesktopCommand::SendKey("ctrl+asciicircum".into()))
        );
        assert_eq!(
            translate_key(KeyCode::Right, CTRL | KeyModifiers::SHIFT),
            KeyTranslation::Command(DesktopCommand::SendKey("ctrl+shift+Right".into()))
        );
        assert_eq!(
            translate_key(KeyCode::Char('f'), KeyModifiers::ALT),
            KeyTranslation::Command(DesktopCommand::SendKey("alt+f".into()))
        );
    }

    #[test]
    fn test_chorded_punctuation_uses_keysym_names() {
        for c in (b' '..=b'~').map(char::from).filter(|c| !c.is_ascii_alphanumeric()) {
            let KeyTranslation::Command(DesktopCommand::SendKey(name)) =
                translate_key(KeyCode::Char(c), KeyModifiers::ALT)
            else {
                panic!("no key for alt+{:?}", c);
            };
            let keysym = name.strip_prefix("alt+").unwrap();
            assert!(
                keysym.len() > 1 && keysym.chars().all(|k| k.is_ascii_alphabetic()),
                "alt+{:?} sent as {:?}",
                c,
                name
            );
        }
        let alt = |c| translate_key(KeyCode::Char(c), KeyModifiers::ALT);
        assert_eq!(alt(' '), KeyTranslation::Command(DesktopCommand::SendKey("alt+space".into())));
        assert_eq!(alt('+'), KeyTranslation::Command(DesktopCommand::SendKey("alt+plus".into())));
        assert_eq!(
            alt('?'),
            KeyTranslation::Command(DesktopCommand::SendKey("alt+question".into()))
        );
        assert_eq!(
            translate_key(KeyCode::Char('@'), CTRL),
            KeyTranslation::Command(DesktopCommand::SendKey("ctrl+at".into()))
        );
    }

    #[test]
    fn test_spurious_and_unmapped_keys() {
        assert_eq!(translate_key(KeyCode::Null, NONE), KeyTranslation::Spurious);
        assert_eq!(translate_key(KeyCode::Char('\0'), NONE), KeyTranslation::Spurious);
        assert_eq!(translate_key(KeyCode::CapsLock, NONE), KeyTranslation::Unmapped);

        let (mut t, zoom, _render) = setup();
        assert!(t.translate(&InputEvent::key(KeyCode::Null), &zoom).is_empty());
        assert!(t.translate(&InputEvent::key(KeyCode::CapsLock), &zoom).is_empty());
    }

    #[test]
    fn test_click_moves_then_presses() {
        let (mut t, zoom, _render) = setup();
        let cmds = t.translate(&pointer(10, 5, LEFT, false, NONE), &zoom);
        assert_eq!(
            cmds,
            vec![
                DesktopCommand::MoveTo { x: 200, y: 100 },
                DesktopCommand::ButtonDown(1)
            ]
        );
        let cmds = t.translate(&pointer(10, 5, PointerAction::Release, false, NONE), &zoom);
        assert_eq!(cmds[1], DesktopCommand::ButtonUp(1));
    }

    #[test]
    fn test_release_uses_last_button() {
        let (mut t, zoom, _render) = setup();
        t.translate(
            &pointer(1, 1, PointerAction::Press(MouseButton::Right), false, NONE),
            &zoom,
        );
        let cmds = t.translate(&pointer(1, 1, PointerAction::Release, false, NONE), &zoom);
        assert_eq!(cmds.last(), Some(&DesktopCommand::ButtonUp(3)));
    }

    #[test]
    fn test_release_without_press_only_moves() {
        let (mut t, zoom, _render) = setup();
        let cmds = t.translate(&pointer(0, 0, PointerAction::Release, false, NONE), &zoom);
        assert_eq!(cmds, vec![DesktopCommand::MoveTo { x: 0, y: 0 }]);
    }

    #[test]
    fn test_wheel_clicks_or_zooms() {
        let (mut t, zoom, _render) = setup();
        let up = t.translate(&pointer(0, 0, PointerAction::WheelUp, false, NONE), &zoom);
        assert_eq!(up[1], DesktopCommand::Click(4));
        let down = t.translate(&pointer(0, 0, PointerAction::WheelDown, false, NONE), &zoom);
        assert_eq!(down[1], DesktopCommand::Click(5));
        let zoom_in = t.translate(&pointer(0, 0, PointerAction::WheelUp, false, CTRL), &zoom);
        assert_eq!(zoom_in[1], DesktopCommand::AdjustMagnification(1));
        let zoom_out = t.translate(&pointer(0, 0, PointerAction::WheelDown, false, CTRL), &zoom);
        assert_eq!(zoom_out[1], DesktopCommand::AdjustMagnification(-1));
    }

    #[test]
    fn test_ctrl_click_is_not_a_pan() {
        let (mut t, zoom, _render) = setup();
        let cmds = t.translate(
            &pointer(2, 2, PointerAction::Press(MouseButton::Right), false, CTRL),
            &zoom,
        );
        assert_eq!(cmds[1], DesktopCommand::ButtonDown(3));
        assert!(!t.is_panning());
    }

    #[test]
    fn test_pan_gesture_uses_latched_origin() {
        let (mut t, zoom, render) = setup();
        render.set_grab(100, 40);

        let down = t.translate(&pointer(10, 10, LEFT, false, CTRL), &zoom);
        assert_eq!(down[1], DesktopCommand::ButtonDown(1));

        let first = t.translate(&pointer(11, 10, LEFT, true, CTRL), &zoom);
        assert!(t.is_panning());
        assert!(render.pan());
        assert_eq!(first, vec![DesktopCommand::MoveTo { x: 320, y: 240 }]);

        // The compositor moves the grab mid-gesture; mapping must not follow.
        render.set_grab(500, 300);
        let second = t.translate(&pointer(12, 10, LEFT, true, CTRL), &zoom);
        assert_eq!(second, vec![DesktopCommand::MoveTo { x: 340, y: 240 }]);

        let up = t.translate(&pointer(12, 10, PointerAction::Release, false, NONE), &zoom);
        assert!(!t.is_panning());
        assert!(!render.pan());
        assert_eq!(
            up,
            vec![
                DesktopCommand::MoveTo { x: 340, y: 240 },
                DesktopCommand::ButtonUp(1)
            ]
        );

        // A new gesture latches the current grab.
        let again = t.translate(&pointer(0, 0, LEFT, true, CTRL), &zoom);
        assert_eq!(again, vec![DesktopCommand::MoveTo { x: 500, y: 300 }]);
    }

    #[test]
    fn test_press_pan_release_scenario_counts() {
        let (mut t, zoom, render) = setup();
        let mut all = Vec::new();
        all.extend(t.translate(&pointer(5, 5, LEFT, false, NONE), &zoom));
        for (i, grab) in [(0, 0), (30, 30), (60, 60)].into_iter().enumerate() {
            render.set_grab(grab.0, grab.1);
            all.extend(t.translate(&pointer(6 + i as u16, 5, LEFT, true, CTRL), &zoom));
        }
        all.extend(t.translate(&pointer(8, 5, PointerAction::Release, false, NONE), &zoom));

        let downs = all.iter().filter(|c| matches!(c, DesktopCommand::ButtonDown(_))).count();
        let clicks = all.iter().filter(|c| matches!(c, DesktopCommand::Click(_))).count();
        let ups: Vec<_> = all.iter().filter(|c| matches!(c, DesktopCommand::ButtonUp(_))).collect();
        assert_eq!(downs, 1);
        assert_eq!(clicks, 0);
        assert_eq!(ups, vec![&DesktopCommand::ButtonUp(1)]);

        let pan_moves: Vec<_> = all[2..5].to_vec();
        assert_eq!(
            pan_moves,
            vec![
                DesktopCommand::MoveTo { x: 120, y: 100 },
                DesktopCommand::MoveTo { x: 140, y: 100 },
                DesktopCommand::MoveTo { x: 160, y: 100 },
            ]
        );
    }

    #[test]
    fn test_pan_release_lands_on_last_drag_position() {
        let (mut t, zoom, render) = setup();
        t.translate(&pointer(10, 10, LEFT, false, CTRL), &zoom);
        t.translate(&pointer(11, 10, LEFT, true, CTRL), &zoom);
        render.set_grab(400, 300);
        let last = t.translate(&pointer(12, 10, LEFT, true, CTRL), &zoom);
        assert_eq!(last, vec![DesktopCommand::MoveTo { x: 240, y: 200 }]);

        let up = t.translate(&pointer(12, 10, PointerAction::Release, false, NONE), &zoom);
        assert_eq!(up[0], last[0]);
        assert_eq!(up[1], DesktopCommand::ButtonUp(1));
    }

    #[test]
    fn test_plain_drag_only_moves() {
        let (mut t, zoom, _render) = setup();
        t.translate(&pointer(1, 1, LEFT, false, NONE), &zoom);
        let drag = t.translate(&pointer(2, 1, LEFT, true, NONE), &zoom);
        assert_eq!(drag, vec![DesktopCommand::MoveTo { x: 40, y: 20 }]);
        assert!(!t.is_panning());
    }

    #[test]
    fn test_mapping_follows_source_size() {
        let (mut t, zoom, render) = setup();
        render.set_source_size(800, 600);
        render.set_grab(400, 300);
        let cmds = t.translate(&pointer(10, 10, PointerAction::Move, true, NONE), &zoom);
        assert_eq!(cmds, vec![DesktopCommand::MoveTo { x: 500, y: 400 }]);
    }
}
