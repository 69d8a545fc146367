//! Parking inline `style` attributes while reading mode is on.

use crate::ORIGINAL_STYLE_ATTR;
use lc_dom::Document;
use lc_dom::NodeId;

/// An element whose inline style was moved aside, with the value it had.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedStyle {
    pub element: NodeId,
    pub original: String,
}

/// Moves inline `style` attributes into [`ORIGINAL_STYLE_ATTR`] and back.
///
/// Only the snapshot taken by [`InlineStyleMasker::mask`] is restored; styles
/// added while masked are left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineStyleMasker;

impl InlineStyleMasker {
    pub fn mask(&self, doc: &mut Document, root: NodeId) -> Vec<MaskedStyle> {
        let styled = doc.find_all(root, |el| {
            el.attribute("style")
                .is_some_and(|value| !value.is_empty())
        });

        let mut masked = Vec::with_capacity(styled.len());
        for element in styled {
            let Some(original) = doc.remove_attribute(element, "style") else {
                continue;
            };
            doc.set_attribute(element, ORIGINAL_STYLE_ATTR, original.as_str());
            masked.push(MaskedStyle { element, original });
        }
        masked
    }

    /// Puts every parked style back and removes the side attribute. Elements
    /// no longer in the document are skipped.
    pub fn unmask(&self, doc: &mut Document, masked: &mut Vec<MaskedStyle>) -> usize {
        let mut restored = 0_usize;
        for entry in masked.drain(..) {
            if !doc.is_connected(entry.element) {
                tracing::debug!(element = ?entry.element, "skipping detached element on unmask");
                continue;
            }

            let value = doc
                .remove_attribute(entry.element, ORIGINAL_STYLE_ATTR)
                .unwrap_or(entry.original);
            doc.set_attribute(entry.element, "style", value);
            restored = restored.saturating_add(1);
        }
        restored
    }
}
