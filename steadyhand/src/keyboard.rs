//! Keys and an OS-level keyboard driver.
//!
//! [`XdotoolKeyboard`] sends key events to whatever window has focus by
//! shelling out to `xdotool`, for desktop applications that have no
//! automation API of their own.

use std::fmt;
use std::str::FromStr;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::driver::UiDriver;
use crate::errors::AutomationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Tab,
    Escape,
    Backspace,
    Space,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Ctrl,
    Alt,
    Shift,
    Meta,
    Char(char),
}

impl Key {
    /// Keysym name understood by `xdotool key`.
    pub fn xdotool_name(&self) -> String {
        let name = match self {
            Key::Enter => "Return",
            Key::Tab => "Tab",
            Key::Escape => "Escape",
            Key::Backspace => "BackSpace",
            Key::Space => "space",
            Key::Up => "Up",
            Key::Down => "Down",
            Key::Left => "Left",
            Key::Right => "Right",
            Key::Home => "Home",
            Key::End => "End",
            Key::PageUp => "Prior",
            Key::PageDown => "Next",
            Key::Ctrl => "ctrl",
            Key::Alt => "alt",
            Key::Shift => "shift",
            Key::Meta => "super",
            Key::Char(c) => return c.to_string(),
        };
        name.to_string()
    }

    /// Code point WebDriver key actions use for this key.
    pub fn webdriver_value(&self) -> String {
        let code = match self {
            Key::Enter => '\u{E007}',
            Key::Tab => '\u{E004}',
            Key::Escape => '\u{E00C}',
            Key::Backspace => '\u{E003}',
            Key::Space => '\u{E00D}',
            Key::Up => '\u{E013}',
            Key::Down => '\u{E015}',
            Key::Left => '\u{E012}',
            Key::Right => '\u{E014}',
            Key::Home => '\u{E011}',
            Key::End => '\u{E010}',
            Key::PageUp => '\u{E00E}',
            Key::PageDown => '\u{E00F}',
            Key::Ctrl => '\u{E009}',
            Key::Alt => '\u{E00A}',
            Key::Shift => '\u{E008}',
            Key::Meta => '\u{E03D}',
            Key::Char(c) => *c,
        };
        code.to_string()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{c}"),
            other => write!(f, "{}", format!("{other:?}").to_lowercase()),
        }
    }
}

impl FromStr for Key {
    type Err = AutomationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(Key::Char(c.to_ascii_lowercase()));
        }

        match trimmed.to_lowercase().as_str() {
            "enter" | "return" => Ok(Key::Enter),
            "tab" => Ok(Key::Tab),
            "esc" | "escape" => Ok(Key::Escape),
            "backspace" => Ok(Key::Backspace),
            "space" => Ok(Key::Space),
            "up" => Ok(Key::Up),
            "down" => Ok(Key::Down),
            "left" => Ok(Key::Left),
            "right" => Ok(Key::Right),
            "home" => Ok(Key::Home),
            "end" => Ok(Key::End),
            "pageup" => Ok(Key::PageUp),
            "pagedown" => Ok(Key::PageDown),
            "ctrl" | "control" => Ok(Key::Ctrl),
            "alt" => Ok(Key::Alt),
            "shift" => Ok(Key::Shift),
            "meta" | "super" | "cmd" | "win" => Ok(Key::Meta),
            _ => Err(AutomationError::InvalidArgument(format!(
                "unknown key '{trimmed}'"
            ))),
        }
    }
}

/// Parse a combination such as `ctrl+o` or `ctrl+shift+s`.
pub fn parse_hotkey(combo: &str) -> Result<Vec<Key>, AutomationError> {
    if combo.trim().is_empty() {
        return Err(AutomationError::InvalidArgument(
            "hotkey is empty".to_string(),
        ));
    }
    combo.split('+').map(str::parse).collect()
}

/// Keyboard-only driver backed by the `xdotool` binary.
#[derive(Debug, Clone)]
pub struct XdotoolKeyboard {
    program: String,
}

impl Default for XdotoolKeyboard {
    fn default() -> Self {
        Self {
            program: "xdotool".to_string(),
        }
    }
}

impl XdotoolKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different executable, e.g. a wrapper script or an absolute path.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn send(&self, keysym: &str) -> Result<(), AutomationError> {
        debug!("{} key {}", self.program, keysym);
        let output = Command::new(&self.program)
            .args(["key", "--clearmodifiers", keysym])
            .output()
            .await
            .map_err(|e| {
                AutomationError::PlatformError(format!("Failed to run {}: {e}", self.program))
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(AutomationError::PlatformError(format!(
                "{} key {keysym} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}

#[async_trait::async_trait]
impl UiDriver for XdotoolKeyboard {
    fn name(&self) -> &str {
        "xdotool"
    }

    #[instrument(level = "debug", skip(self))]
    async fn press_key(&self, key: Key) -> Result<(), AutomationError> {
        self.send(&key.xdotool_name()).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn hotkey(&self, keys: &[Key]) -> Result<(), AutomationError> {
        if keys.is_empty() {
            return Err(AutomationError::InvalidArgument(
                "hotkey needs at least one key".to_string(),
            ));
        }
        let combo = keys
            .iter()
            .map(Key::xdotool_name)
            .collect::<Vec<_>>()
            .join("+");
        self.send(&combo).await
    }
}
