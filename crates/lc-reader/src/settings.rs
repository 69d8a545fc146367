//! Reading mode presentation settings.

use lc_core::ReaderError;
use lc_core::ReaderResult;
use lc_dom::Document;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const MIN_FONT_SIZE: u16 = 50;
pub const MAX_FONT_SIZE: u16 = 300;

/// Custom property carrying the text size, in percent.
pub const FONT_SIZE_PROPERTY: &str = "--reading-mode-font-size";
/// Body class set while multimedia is hidden.
pub const MULTIMEDIA_HIDDEN_CLASS: &str = "core-reading-mode-multimedia-hidden";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingTheme {
    #[default]
    Auto,
    Light,
    Dark,
    Sepia,
}

impl ReadingTheme {
    pub const ALL: [Self; 4] = [Self::Auto, Self::Light, Self::Dark, Self::Sepia];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Sepia => "sepia",
        }
    }

    pub fn class_name(self) -> String {
        format!("core-reading-mode-theme-{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadingModeSettings {
    /// Text size in percent of the page default.
    pub font_size: u16,
    pub theme: ReadingTheme,
    pub show_multimedia: bool,
}

impl Default for ReadingModeSettings {
    fn default() -> Self {
        Self {
            font_size: 100,
            theme: ReadingTheme::Auto,
            show_multimedia: true,
        }
    }
}

impl ReadingModeSettings {
    pub fn from_toml_str(source: &str) -> ReaderResult<Self> {
        let settings: Self = toml::from_str(source).map_err(|error| {
            ReaderError::new(
                "reader.settings.parse_failed",
                format!("invalid reading mode settings: {error}"),
            )
        })?;
        Ok(settings.clamped())
    }

    pub fn from_path(path: &Path) -> ReaderResult<Self> {
        let source = fs::read_to_string(path).map_err(|error| {
            ReaderError::new(
                "reader.settings.read_failed",
                format!(
                    "failed to read settings file `{}`: {error}",
                    path.display()
                ),
            )
        })?;
        Self::from_toml_str(&source)
    }

    fn clamped(mut self) -> Self {
        self.font_size = self.font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        self
    }

    /// Lands the settings on `<body>` as a custom property and classes.
    pub fn apply(&self, doc: &mut Document) {
        let body = doc.body();
        doc.set_style_property(body, FONT_SIZE_PROPERTY, &format!("{}%", self.font_size));

        for theme in ReadingTheme::ALL {
            doc.toggle_class(body, &theme.class_name(), theme == self.theme);
        }
        doc.toggle_class(body, MULTIMEDIA_HIDDEN_CLASS, !self.show_multimedia);
    }
}

#[cfg(test)]
mod tests {
    use super::MULTIMEDIA_HIDDEN_CLASS;
    use super::ReadingModeSettings;
    use super::ReadingTheme;
    use lc_dom::Document;

    #[test]
    fn parses_partial_toml_with_defaults() {
        let parsed = ReadingModeSettings::from_toml_str("theme = \"sepia\"\nfont_size = 140\n");
        assert_eq!(
            parsed,
            Ok(ReadingModeSettings {
                font_size: 140,
                theme: ReadingTheme::Sepia,
                show_multimedia: true,
            })
        );
    }

    #[test]
    fn clamps_font_size() {
        let parsed = ReadingModeSettings::from_toml_str("font_size = 900");
        assert!(matches!(parsed, Ok(settings) if settings.font_size == 300));
    }

    #[test]
    fn rejects_unknown_keys_and_themes() {
        for source in ["colour = \"red\"", "theme = \"neon\""] {
            let parsed = ReadingModeSettings::from_toml_str(source);
            assert!(matches!(parsed, Err(error) if error.code == "reader.settings.parse_failed"));
        }
    }

    #[test]
    fn missing_file_reports_read_failure() {
        let parsed =
            ReadingModeSettings::from_path(std::path::Path::new("/nonexistent/lectern.toml"));
        assert!(matches!(parsed, Err(error) if error.code == "reader.settings.read_failed"));
    }

    #[test]
    fn apply_switches_theme_class_and_multimedia_marker() {
        let mut doc = Document::new();
        let body = doc.body();

        let dark = ReadingModeSettings {
            font_size: 120,
            theme: ReadingTheme::Dark,
            show_multimedia: false,
        };
        dark.apply(&mut doc);
        assert!(doc.has_class(body, "core-reading-mode-theme-dark"));
        assert!(doc.has_class(body, MULTIMEDIA_HIDDEN_CLASS));
        assert_eq!(
            doc.attribute(body, "style"),
            Some("--reading-mode-font-size: 120%;")
        );

        ReadingModeSettings::default().apply(&mut doc);
        assert!(!doc.has_class(body, "core-reading-mode-theme-dark"));
        assert!(doc.has_class(body, "core-reading-mode-theme-auto"));
        assert!(!doc.has_class(body, MULTIMEDIA_HIDDEN_CLASS));
        assert_eq!(
            doc.attribute(body, "style"),
            Some("--reading-mode-font-size: 100%;")
        );
    }
}
