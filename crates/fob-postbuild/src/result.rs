//! Build result collector handed to build-end hooks.
//!
//! The host owns the [`BuildResult`]; stages only append to it and check
//! whether it already carries errors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

/// A single error or warning reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMessage {
    /// Stable identifier for the kind of message.
    pub id: String,
    /// Name of the stage that reported it.
    pub plugin_name: String,
    pub text: String,
    pub location: Option<Location>,
}

impl BuildMessage {
    pub fn new(
        id: impl Into<String>,
        plugin_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            plugin_name: plugin_name.into(),
            text: text.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

impl fmt::Display for BuildMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(
                f,
                "[{}] {}:{}:{}: {}",
                self.plugin_name, loc.file, loc.line, loc.column, self.text
            ),
            None => write!(f, "[{}] {}", self.plugin_name, self.text),
        }
    }
}

/// Mutable collector of build errors and warnings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildResult {
    pub errors: Vec<BuildMessage>,
    #[serde(default)]
    pub warnings: Vec<BuildMessage>,
}

impl BuildResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn push_error(&mut self, message: BuildMessage) {
        self.errors.push(message);
    }

    pub fn push_warning(&mut self, message: BuildMessage) {
        self.warnings.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_without_location() {
        let msg = BuildMessage::new("dts-fault", "fob-dts", "boom");
        assert_eq!(msg.to_string(), "[fob-dts] boom");
    }

    #[test]
    fn test_display_with_location() {
        let msg = BuildMessage::new("parse", "host", "unexpected token").with_location(Location {
            file: "src/index.ts".to_string(),
            line: 3,
            column: 7,
        });
        assert_eq!(msg.to_string(), "[host] src/index.ts:3:7: unexpected token");
    }

    #[test]
    fn test_has_errors() {
        let mut result = BuildResult::new();
        assert!(!result.has_errors());
        result.push_warning(BuildMessage::new("w", "host", "warning only"));
        assert!(!result.has_errors());
        result.push_error(BuildMessage::new("e", "host", "broken"));
        assert!(result.has_errors());
    }
}
