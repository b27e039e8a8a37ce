//! Status line rendering and OS error text.
//!
//! # Responsibility
//! - Render leveled, module-attributed single-line status messages.
//! - Map OS errors to strerror-style reportable text.
//!
//! # Invariants
//! - Rendering never fails; unknown raw levels render as `error`.
//! - Rendered lines follow `<level> (<module>): <message>`.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter, Write};
use std::io;

/// Fallback line delivered when a status message cannot be composed.
pub const INTERNAL_FORMAT_ERROR: &str = "error (puflib): internal error formatting message";

/// Severity attached to one status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

impl StatusLevel {
    /// Maps a raw numeric level (`0` info, `1` warn, `2` error).
    ///
    /// Any other value is treated as `Error`.
    pub fn from_raw(value: i32) -> Self {
        match value {
            0 => Self::Info,
            1 => Self::Warn,
            _ => Self::Error,
        }
    }

    /// Stable label used in rendered status lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub(crate) fn as_log_level(self) -> log::Level {
        match self {
            Self::Info => log::Level::Info,
            Self::Warn => log::Level::Warn,
            Self::Error => log::Level::Error,
        }
    }
}

impl Display for StatusLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders one status line, or `None` when `message` fails to format.
pub fn try_render_status_line(
    level: StatusLevel,
    module: &str,
    message: impl Display,
) -> Option<String> {
    let mut line = String::new();
    write!(line, "{} ({}): {}", level.as_str(), module, message).ok()?;
    Some(line)
}

/// Renders one status line, degrading to [`INTERNAL_FORMAT_ERROR`].
pub fn render_status_line(level: StatusLevel, module: &str, message: impl Display) -> String {
    try_render_status_line(level, module, message)
        .unwrap_or_else(|| INTERNAL_FORMAT_ERROR.to_string())
}

/// Returns strerror-style text for an OS error.
///
/// Raw OS errors lose the `(os error N)` suffix; other errors use their
/// display text as is.
pub fn describe_os_error(err: &io::Error) -> String {
    let text = err.to_string();
    match err.raw_os_error() {
        Some(code) => {
            let suffix = format!(" (os error {code})");
            match text.strip_suffix(suffix.as_str()) {
                Some(stripped) => stripped.to_string(),
                None => text,
            }
        }
        None => text,
    }
}
