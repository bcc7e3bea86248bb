//! Abstract desktop actions and their injection-tool argument vectors.

use std::fmt;

/// The argument vector that the injector recognises and drops without
/// spawning anything.
pub const NOOP: &str = "noop";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesktopCommand {
    MoveTo { x: i32, y: i32 },
    ButtonDown(u8),
    ButtonUp(u8),
    Click(u8),
    TypeChar(char),
    SendKey(String),
    /// Applied to the zoom state locally; nothing is injected.
    AdjustMagnification(i32),
}

impl DesktopCommand {
    /// Positional arguments for an `xdotool`-compatible tool.
    pub fn argv(&self) -> Vec<String> {
        match self {
            DesktopCommand::MoveTo { x, y } => {
                vec!["mousemove".into(), x.to_string(), y.to_string()]
            }
            DesktopCommand::ButtonDown(n) => vec!["mousedown".into(), n.to_string()],
            DesktopCommand::ButtonUp(n) => vec!["mouseup".into(), n.to_string()],
            DesktopCommand::Click(n) => vec!["click".into(), n.to_string()],
            DesktopCommand::TypeChar(c) => vec!["type".into(), c.to_string()],
            DesktopCommand::SendKey(name) => vec!["key".into(), name.clone()],
            DesktopCommand::AdjustMagnification(_) => vec![NOOP.into()],
        }
    }
}

impl fmt::Display for DesktopCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}
