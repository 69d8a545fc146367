//! Sibling isolation: hide everything around a region up to its scroll
//! container.

use crate::HIDDEN_CLASS;
use lc_dom::Document;
use lc_dom::ElementData;
use lc_dom::NodeId;

/// Where isolation stops and what it never hides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsolationConfig {
    /// Tag of the scrollable container bounding the upward walk.
    pub boundary_tag: String,
    /// Classes of siblings that stay visible. Slides lay themselves out as a
    /// carousel and must not be hidden.
    pub exempt_classes: Vec<String>,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self {
            boundary_tag: "ion-content".to_owned(),
            exempt_classes: vec!["swiper-slide".to_owned()],
        }
    }
}

impl IsolationConfig {
    pub fn is_boundary(&self, element: &ElementData) -> bool {
        element.tag().eq_ignore_ascii_case(&self.boundary_tag)
    }

    pub fn is_exempt(&self, element: &ElementData) -> bool {
        self.exempt_classes
            .iter()
            .any(|class| element.has_class(class))
    }
}

/// Computes the siblings to hide for `target`, nearest level first.
///
/// Walks the parent chain; at every level each element child other than the
/// path element is collected unless `is_exempt` says otherwise. The walk stops
/// at a parent matching `is_boundary` or at the root. A target that is itself a
/// boundary yields nothing.
pub fn siblings_to_hide(
    doc: &Document,
    target: NodeId,
    is_boundary: impl Fn(&ElementData) -> bool,
    is_exempt: impl Fn(&ElementData) -> bool,
) -> Vec<NodeId> {
    let mut out = Vec::new();
    if doc.element(target).is_none_or(&is_boundary) {
        return out;
    }

    let mut path = target;
    while let Some(parent) = doc.parent_element(path) {
        if doc.element(parent).is_some_and(&is_boundary) {
            break;
        }

        out.extend(doc.element_children(parent).into_iter().filter(|child| {
            *child != path && doc.element(*child).is_some_and(|el| !is_exempt(el))
        }));
        path = parent;
    }

    out
}

#[derive(Debug, Clone, Default)]
pub struct SiblingIsolator {
    config: IsolationConfig,
}

impl SiblingIsolator {
    pub fn new(config: IsolationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IsolationConfig {
        &self.config
    }

    pub fn compute(&self, doc: &Document, target: NodeId) -> Vec<NodeId> {
        siblings_to_hide(
            doc,
            target,
            |el| self.config.is_boundary(el),
            |el| self.config.is_exempt(el),
        )
    }

    /// Hides the siblings of `target` and returns the ones this call actually
    /// marked. Elements already carrying the hidden marker are left out so a
    /// later [`SiblingIsolator::reveal`] never strips a marker it did not add.
    pub fn isolate(&self, doc: &mut Document, target: NodeId) -> Vec<NodeId> {
        let candidates = self.compute(doc, target);
        let hidden: Vec<NodeId> = candidates
            .into_iter()
            .filter(|sibling| doc.add_class(*sibling, HIDDEN_CLASS))
            .collect();

        tracing::trace!(region = ?target, hidden = hidden.len(), "isolated region");
        hidden
    }

    /// Removes the hidden marker from every recorded element, draining the
    /// record. Order does not matter.
    pub fn reveal(doc: &mut Document, hidden: &mut Vec<NodeId>) -> usize {
        let mut revealed = 0_usize;
        for element in hidden.drain(..) {
            if !doc.is_connected(element) {
                tracing::debug!(?element, "skipping detached sibling on reveal");
                continue;
            }
            if doc.remove_class(element, HIDDEN_CLASS) {
                revealed = revealed.saturating_add(1);
            }
        }
        revealed
    }
}

#[cfg(test)]
mod tests {
    use super::IsolationConfig;
    use super::SiblingIsolator;
    use super::siblings_to_hide;
    use crate::HIDDEN_CLASS;
    use lc_dom::Document;
    use lc_dom::NodeId;

    struct Fixture {
        doc: Document,
        content: NodeId,
        nav: NodeId,
        wrapper: NodeId,
        heading: NodeId,
        region: NodeId,
        aside: NodeId,
        slide: NodeId,
    }

    fn element(doc: &mut Document, parent: NodeId, tag: &str) -> NodeId {
        let node = doc.create_element(tag);
        doc.append_child(parent, node);
        node
    }

    // body > ion-content > div > [nav, div.wrapper > [h1, section(region), aside, div.swiper-slide]]
    fn fixture() -> Fixture {
        let mut doc = Document::new();
        let body = doc.body();
        element(&mut doc, body, "ion-header");
        let content = element(&mut doc, body, "ion-content");
        let scroll = element(&mut doc, content, "div");
        let nav = element(&mut doc, scroll, "nav");
        let wrapper = element(&mut doc, scroll, "div");
        let heading = element(&mut doc, wrapper, "h1");
        let region = element(&mut doc, wrapper, "section");
        let aside = element(&mut doc, wrapper, "aside");
        let slide = element(&mut doc, wrapper, "div");
        doc.add_class(slide, "swiper-slide");
        let text = doc.create_text("loose text");
        doc.append_child(wrapper, text);

        Fixture {
            doc,
            content,
            nav,
            wrapper,
            heading,
            region,
            aside,
            slide,
        }
    }

    #[test]
    fn collects_siblings_level_by_level_up_to_boundary() {
        let fx = fixture();
        let isolator = SiblingIsolator::default();
        assert_eq!(
            isolator.compute(&fx.doc, fx.region),
            vec![fx.heading, fx.aside, fx.nav]
        );
    }

    #[test]
    fn boundary_target_yields_nothing() {
        let fx = fixture();
        let isolator = SiblingIsolator::default();
        assert!(isolator.compute(&fx.doc, fx.content).is_empty());
    }

    #[test]
    fn walking_to_the_root_is_a_safe_stop() {
        let fx = fixture();
        let hidden = siblings_to_hide(&fx.doc, fx.region, |_| false, |_| false);
        // Without a boundary every level up to <html> contributes, including
        // the slide, the header and <head>.
        assert!(hidden.contains(&fx.slide));
        assert!(hidden.contains(&fx.doc.head()));
        assert!(!hidden.contains(&fx.wrapper));
        assert!(!hidden.contains(&fx.region));
    }

    #[test]
    fn custom_boundary_and_exemptions_apply() {
        let fx = fixture();
        let config = IsolationConfig {
            boundary_tag: "BODY".to_owned(),
            exempt_classes: vec![],
        };
        let isolator = SiblingIsolator::new(config);
        assert_eq!(
            isolator.compute(&fx.doc, fx.region),
            vec![fx.heading, fx.aside, fx.slide, fx.nav]
        );
    }

    #[test]
    fn isolate_then_reveal_leaves_no_markers() {
        let mut fx = fixture();
        let isolator = SiblingIsolator::default();

        let mut hidden = isolator.isolate(&mut fx.doc, fx.region);
        assert_eq!(hidden.len(), 3);
        assert!(fx.doc.has_class(fx.nav, HIDDEN_CLASS));

        assert_eq!(SiblingIsolator::reveal(&mut fx.doc, &mut hidden), 3);
        assert!(hidden.is_empty());
        assert!(
            fx.doc
                .elements_inclusive(fx.doc.root())
                .iter()
                .all(|node| !fx.doc.has_class(*node, HIDDEN_CLASS))
        );
    }

    #[test]
    fn pre_hidden_siblings_are_not_recorded() {
        let mut fx = fixture();
        fx.doc.add_class(fx.aside, HIDDEN_CLASS);
        let isolator = SiblingIsolator::default();

        let mut hidden = isolator.isolate(&mut fx.doc, fx.region);
        assert_eq!(hidden, vec![fx.heading, fx.nav]);

        SiblingIsolator::reveal(&mut fx.doc, &mut hidden);
        assert!(fx.doc.has_class(fx.aside, HIDDEN_CLASS));
    }

    #[test]
    fn reveal_skips_detached_elements() {
        let mut fx = fixture();
        let isolator = SiblingIsolator::default();
        let mut hidden = isolator.isolate(&mut fx.doc, fx.region);

        fx.doc.detach(fx.nav);
        assert_eq!(SiblingIsolator::reveal(&mut fx.doc, &mut hidden), 2);
        assert!(hidden.is_empty());
    }
}
