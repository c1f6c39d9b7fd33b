//! Storefront appearance document.
//!
//! Owners pick colors, layout, typography and decorative effects. The document
//! is stored as JSONB on the store and handed to the frontend untouched, so the
//! shape here is the contract with the SPA. Missing fields take defaults and
//! unknown fields are rejected.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors from building an appearance document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppearanceError {
    #[error("color must be a hex value like #1A2B3C: {0}")]
    InvalidColor(String),
    #[error("invalid appearance document: {0}")]
    Document(String),
}

/// A `#RRGGBB` color, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Parse `#RRGGBB` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`AppearanceError::InvalidColor`] for anything else.
    pub fn parse(s: &str) -> Result<Self, AppearanceError> {
        let s = s.trim();
        let valid = s.len() == 7
            && s.starts_with('#')
            && s.bytes().skip(1).all(|b| b.is_ascii_hexdigit());
        if !valid {
            return Err(AppearanceError::InvalidColor(s.to_string()));
        }
        Ok(Self(s.to_ascii_uppercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_static(s: &'static str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for HexColor {
    type Error = AppearanceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

/// Storefront palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Palette {
    pub primary: HexColor,
    pub secondary: HexColor,
    pub background: HexColor,
    pub text: HexColor,
    pub accent: HexColor,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: HexColor::from_static("#4F46E5"),
            secondary: HexColor::from_static("#0EA5E9"),
            background: HexColor::from_static("#FFFFFF"),
            text: HexColor::from_static("#111827"),
            accent: HexColor::from_static("#F59E0B"),
        }
    }
}

/// Catalog arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    #[default]
    Grid,
    List,
    Masonry,
}

/// Font family class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Font {
    #[default]
    Sans,
    Serif,
    Mono,
}

/// Button corner style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    #[default]
    Rounded,
    Square,
    Pill,
}

/// Decorative effect rendered by the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Particles,
    Gradient,
    Glow,
    Snow,
}

/// The full appearance document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Appearance {
    pub colors: Palette,
    pub layout: Layout,
    pub font: Font,
    pub button_style: ButtonStyle,
    /// Set semantics; duplicates in input collapse.
    pub effects: BTreeSet<Effect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

impl Appearance {
    /// Longest image URL accepted.
    pub const MAX_URL_LENGTH: usize = 2048;

    /// Build from a stored or submitted JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`AppearanceError::Document`] when the value does not match the
    /// document shape.
    pub fn from_json(value: serde_json::Value) -> Result<Self, AppearanceError> {
        serde_json::from_value(value).map_err(|e| AppearanceError::Document(e.to_string()))
    }

    /// JSON value for storage.
    ///
    /// # Errors
    ///
    /// Returns [`AppearanceError::Document`] if serialization fails.
    pub fn to_json(&self) -> Result<serde_json::Value, AppearanceError> {
        serde_json::to_value(self).map_err(|e| AppearanceError::Document(e.to_string()))
    }

    /// Field errors not expressible in the type, all of them at once.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        [("banner_url", &self.banner_url), ("logo_url", &self.logo_url)]
            .into_iter()
            .filter_map(|(field, url)| url.as_deref().map(|u| (field, u)))
            .filter_map(|(field, url)| check_image_url(field, url))
            .collect()
    }
}

fn check_image_url(field: &str, url: &str) -> Option<String> {
    if url.len() > Appearance::MAX_URL_LENGTH {
        return Some(format!(
            "{field} must be at most {} characters",
            Appearance::MAX_URL_LENGTH
        ));
    }
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Some(format!("{field} must be an http(s) URL"));
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let appearance = Appearance::from_json(json!({})).unwrap();
        assert_eq!(appearance, Appearance::default());
        assert_eq!(appearance.colors.primary.as_str(), "#4F46E5");
        assert_eq!(appearance.layout, Layout::Grid);
    }

    #[test]
    fn test_partial_document_merges_with_defaults() {
        let appearance = Appearance::from_json(json!({
            "colors": {"primary": "#ff0000"},
            "font": "serif",
            "effects": ["snow", "glow", "snow"]
        }))
        .unwrap();
        assert_eq!(appearance.colors.primary.as_str(), "#FF0000");
        assert_eq!(appearance.colors.text, Palette::default().text);
        assert_eq!(appearance.font, Font::Serif);
        assert_eq!(appearance.effects.len(), 2);
    }

    #[test]
    fn test_rejects_unknown_fields_and_values() {
        assert!(Appearance::from_json(json!({"theme": "dark"})).is_err());
        assert!(Appearance::from_json(json!({"layout": "carousel"})).is_err());
        assert!(Appearance::from_json(json!({"effects": ["confetti"]})).is_err());
        assert!(Appearance::from_json(json!({"colors": {"shadow": "#000000"}})).is_err());
    }

    #[test]
    fn test_hex_color_validation() {
        assert!(HexColor::parse("#a1B2c3").is_ok());
        for bad in ["a1b2c3", "#abc", "#GGGGGG", "#1234567", ""] {
            assert!(HexColor::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_validate_collects_url_errors() {
        let appearance = Appearance {
            banner_url: Some("ftp://files.example/banner.png".to_string()),
            logo_url: Some(format!("https://cdn.example/{}", "a".repeat(2100))),
            ..Appearance::default()
        };
        let errors = appearance.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("banner_url"));
        assert!(errors[1].starts_with("logo_url"));
    }

    #[test]
    fn test_serializes_effects_in_stable_order() {
        let appearance = Appearance::from_json(json!({"effects": ["snow", "particles"]})).unwrap();
        let value = appearance.to_json().unwrap();
        assert_eq!(value["effects"], json!(["particles", "snow"]));
        assert!(value.get("banner_url").is_none());
    }
}
