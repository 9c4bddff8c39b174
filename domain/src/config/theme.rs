//! Theme value object

use serde::{Deserialize, Serialize};

/// Colour theme of the transcript.
///
/// Persisted as the opaque strings `"dark_mode"` / `"light_mode"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    #[serde(rename = "dark_mode")]
    Dark,
    #[serde(rename = "light_mode")]
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark_mode",
            Theme::Light => "light_mode",
        }
    }

    /// Parse a stored flag; anything unrecognised falls back to dark.
    pub fn from_stored(value: &str) -> Self {
        match value {
            "light_mode" => Theme::Light,
            _ => Theme::Dark,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_dark() {
        assert_eq!(Theme::default(), Theme::Dark);
    }

    #[test]
    fn test_toggle() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
    }

    #[test]
    fn test_from_stored() {
        assert_eq!(Theme::from_stored("light_mode"), Theme::Light);
        assert_eq!(Theme::from_stored("dark_mode"), Theme::Dark);
        assert_eq!(Theme::from_stored("garbage"), Theme::Dark);
    }

    #[test]
    fn test_serde_uses_stored_names() {
        let json = serde_json::to_string(&Theme::Light).unwrap();
        assert_eq!(json, "\"light_mode\"");
    }
}
