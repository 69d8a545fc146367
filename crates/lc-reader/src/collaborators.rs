//! Services reading mode consumes but does not own.

use crate::ENTER_LABEL_KEY;
use crate::SharedDocument;
use crate::settings::ReadingModeSettings;
use async_trait::async_trait;
use lc_dom::NodeId;

/// Resolves once a region is visible inside its scroll container.
#[async_trait(?Send)]
pub trait VisibilitySignal {
    async fn wait_visible(&self, region: NodeId);
}

/// Treats every region as visible immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysVisible;

#[async_trait(?Send)]
impl VisibilitySignal for AlwaysVisible {
    async fn wait_visible(&self, _region: NodeId) {}
}

/// Loads reading mode presentation settings into the page.
#[async_trait(?Send)]
pub trait SettingsLoader {
    async fn load(&self, document: &SharedDocument);
}

/// Applies a fixed [`ReadingModeSettings`] value to the document body.
#[derive(Debug, Clone, Default)]
pub struct CssSettingsLoader {
    settings: ReadingModeSettings,
}

impl CssSettingsLoader {
    pub fn new(settings: ReadingModeSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ReadingModeSettings {
        &self.settings
    }
}

#[async_trait(?Send)]
impl SettingsLoader for CssSettingsLoader {
    async fn load(&self, document: &SharedDocument) {
        self.settings.apply(&mut document.borrow_mut());
    }
}

/// Result of the settings surface opened from an active affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsOutcome {
    Dismissed,
    ExitRequested,
}

/// The modal-like settings surface.
#[async_trait(?Send)]
pub trait SettingsSurface {
    async fn open(&self) -> SettingsOutcome;
}

/// Surface that is closed without asking to leave reading mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct DismissingSurface;

#[async_trait(?Send)]
impl SettingsSurface for DismissingSurface {
    async fn open(&self) -> SettingsOutcome {
        SettingsOutcome::Dismissed
    }
}

/// Label and icon lookup for the affordance button.
pub trait AffordanceResources {
    fn label(&self, key: &str) -> String;
    fn icon(&self, library: &str, style: &str, name: &str) -> String;
}

/// Built-in English label and Font Awesome icon naming.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResources;

impl AffordanceResources for DefaultResources {
    fn label(&self, key: &str) -> String {
        match key {
            ENTER_LABEL_KEY => "Enter reading mode".to_owned(),
            other => other.to_owned(),
        }
    }

    fn icon(&self, library: &str, style: &str, name: &str) -> String {
        if library != "font-awesome" {
            return name.to_owned();
        }

        let prefix = match style {
            "regular" => "far",
            "brands" => "fab",
            _ => "fas",
        };
        format!("{prefix}-{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::AffordanceResources;
    use super::DefaultResources;
    use crate::AFFORDANCE_ICON;
    use crate::ENTER_LABEL_KEY;

    #[test]
    fn default_resources_name_the_affordance() {
        let resources = DefaultResources;
        assert_eq!(resources.label(ENTER_LABEL_KEY), "Enter reading mode");
        assert_eq!(resources.label("core.other"), "core.other");

        let (library, style, name) = AFFORDANCE_ICON;
        assert_eq!(resources.icon(library, style, name), "fas-book-open-reader");
        assert_eq!(resources.icon("ionicons", "", "book"), "book");
    }
}
