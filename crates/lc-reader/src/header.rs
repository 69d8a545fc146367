//! Link between a region and the collapsible header of its page.

use async_trait::async_trait;
use lc_dom::NodeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::rc::Weak;

/// The part of a collapsible header that reading mode drives.
#[async_trait(?Send)]
pub trait CollapsibleHeader {
    /// Resolves once the header finished its own setup.
    async fn ready(&self);

    /// Turns collapsing on or off. Reading mode keeps the header fixed.
    async fn set_enabled(&self, enabled: bool);
}

/// Looks up the header capability attached to a header element.
pub trait HeaderRegistry {
    fn resolve(&self, header: NodeId) -> Option<Rc<dyn CollapsibleHeader>>;
}

/// Registry with no headers; every page degrades to "no header link".
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHeaders;

impl HeaderRegistry for NoHeaders {
    fn resolve(&self, _header: NodeId) -> Option<Rc<dyn CollapsibleHeader>> {
        None
    }
}

/// Registry backed by an explicit map from header element to capability.
#[derive(Default)]
pub struct StaticHeaderRegistry {
    entries: RefCell<HashMap<NodeId, Rc<dyn CollapsibleHeader>>>,
}

impl StaticHeaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, header: NodeId, capability: Rc<dyn CollapsibleHeader>) {
        self.entries.borrow_mut().insert(header, capability);
    }

    pub fn unregister(&self, header: NodeId) {
        self.entries.borrow_mut().remove(&header);
    }
}

impl HeaderRegistry for StaticHeaderRegistry {
    fn resolve(&self, header: NodeId) -> Option<Rc<dyn CollapsibleHeader>> {
        self.entries.borrow().get(&header).cloned()
    }
}

/// Cached, non-owning link to a header capability.
///
/// Resolved at most once; if the header goes away the link silently turns
/// into a no-op.
#[derive(Default)]
pub struct HeaderCoordinator {
    link: RefCell<Option<Weak<dyn CollapsibleHeader>>>,
}

impl HeaderCoordinator {
    /// Resolves and caches the capability for `header`. A cached link wins
    /// over a new lookup.
    pub fn resolve(
        &self,
        registry: &dyn HeaderRegistry,
        header: NodeId,
    ) -> Option<Rc<dyn CollapsibleHeader>> {
        if let Some(existing) = self.upgrade() {
            return Some(existing);
        }

        let capability = registry.resolve(header)?;
        *self.link.borrow_mut() = Some(Rc::downgrade(&capability));
        Some(capability)
    }

    pub fn is_linked(&self) -> bool {
        self.upgrade().is_some()
    }

    fn upgrade(&self) -> Option<Rc<dyn CollapsibleHeader>> {
        self.link.borrow().as_ref().and_then(Weak::upgrade)
    }

    /// Enables or disables collapsing; skipped without a live link.
    pub async fn set_collapsing(&self, enabled: bool) {
        let Some(header) = self.upgrade() else {
            tracing::trace!(enabled, "no header link; collapsing unchanged");
            return;
        };
        header.set_enabled(enabled).await;
    }
}
