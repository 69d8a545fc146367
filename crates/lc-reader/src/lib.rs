//! Reading mode for content regions.
//!
//! Entering reading mode isolates every ready region on the page: sibling
//! elements up to the scroll container are hidden, `<style>` elements inside
//! the region are disabled and inline `style` attributes are parked in
//! `data-original-style`. Leaving reading mode undoes exactly what was done.

use lc_dom::Document;
use std::cell::RefCell;
use std::rc::Rc;

pub mod collaborators;
pub mod controller;
pub mod header;
pub mod isolate;
pub mod mask;
pub mod service;
pub mod settings;
pub mod styles;


pub use controller::ClickOutcome;
pub use controller::MountConfig;
pub use controller::MountOutcome;
pub use controller::ReadingModeContext;
pub use controller::ReadingModeController;
pub use controller::ReadingModeState;
pub use controller::RestorationRecord;
pub use isolate::IsolationConfig;
pub use isolate::SiblingIsolator;
pub use mask::InlineStyleMasker;
pub use service::ReadingModeService;
pub use settings::ReadingModeSettings;
pub use styles::StyleSuppressor;

/// Region processed at mount and eligible for isolation.
pub const READY_CLASS: &str = "core-reading-mode-ready";
/// Page-level marker set on `<body>` while reading mode is on.
pub const ENABLED_CLASS: &str = "core-reading-mode-enabled";
/// Marker for siblings hidden by isolation.
pub const HIDDEN_CLASS: &str = "hide-on-reading-mode";
/// Side attribute holding a masked inline style.
pub const ORIGINAL_STYLE_ATTR: &str = "data-original-style";
/// Class of the toolbar button that enters reading mode.
pub const AFFORDANCE_CLASS: &str = "core-text-viewer-button";
/// Translation key for the affordance label.
pub const ENTER_LABEL_KEY: &str = "core.viewer.enterreadingmode";
/// Icon resource for the affordance: library, style, name.
pub const AFFORDANCE_ICON: (&str, &str, &str) = ("font-awesome", "solid", "book-open-reader");

/// Document shared by every controller on a page. Access is single-threaded;
/// borrows must never be held across an `.await`.
pub type SharedDocument = Rc<RefCell<Document>>;

pub fn shared_document(document: Document) -> SharedDocument {
    Rc::new(RefCell::new(document))
}
