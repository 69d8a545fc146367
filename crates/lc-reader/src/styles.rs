//! Disabling embedded `<style>` sheets inside a region.

use lc_dom::Document;
use lc_dom::NodeId;

/// Disables `<style>` elements so page and theme CSS govern the region.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleSuppressor;

impl StyleSuppressor {
    /// Disables every enabled `<style>` below `root` and returns them in
    /// document order. Sheets that were already disabled are not touched.
    pub fn suppress(&self, doc: &mut Document, root: NodeId) -> Vec<NodeId> {
        let styles = doc.find_all(root, |el| el.tag() == "style");
        styles
            .into_iter()
            .filter(|style| !doc.is_sheet_disabled(*style) && doc.set_sheet_disabled(*style, true))
            .collect()
    }

    /// Re-enables every recorded sheet and drains the record. Enabling twice is
    /// harmless.
    pub fn restore(&self, doc: &mut Document, disabled: &mut Vec<NodeId>) -> usize {
        disabled
            .drain(..)
            .filter(|style| doc.set_sheet_disabled(*style, false))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::StyleSuppressor;
    use lc_dom::Document;

    #[test]
    fn suppresses_only_enabled_sheets_and_restores_them() {
        let mut doc = Document::new();
        let region = doc.create_element("div");
        doc.append_child(doc.body(), region);
        let first = doc.create_element("style");
        let nested = doc.create_element("section");
        let second = doc.create_element("style");
        let already_off = doc.create_element("style");
        doc.append_child(region, first);
        doc.append_child(region, nested);
        doc.append_child(nested, second);
        doc.append_child(region, already_off);
        doc.set_sheet_disabled(already_off, true);

        let outside = doc.create_element("style");
        doc.append_child(doc.body(), outside);

        let suppressor = StyleSuppressor;
        let mut disabled = suppressor.suppress(&mut doc, region);
        assert_eq!(disabled, vec![first, second]);
        assert!(doc.is_sheet_disabled(first) && doc.is_sheet_disabled(second));
        assert!(!doc.is_sheet_disabled(outside));

        let mut again = disabled.clone();
        assert_eq!(suppressor.restore(&mut doc, &mut disabled), 2);
        assert!(disabled.is_empty());
        assert!(!doc.is_sheet_disabled(first) && !doc.is_sheet_disabled(second));
        assert!(doc.is_sheet_disabled(already_off));

        // A second restore of the same elements changes nothing.
        suppressor.restore(&mut doc, &mut again);
        assert!(!doc.is_sheet_disabled(first));
        assert!(doc.is_sheet_disabled(already_off));
    }
}
