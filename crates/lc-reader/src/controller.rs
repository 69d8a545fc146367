//! Per-region reading mode controller.
//!
//! State machine: `Disabled -> Enabling -> Enabled -> Disabled`, with
//! `Destroyed` once the region is unmounted. At most one transition runs per
//! controller at a time; overlapping requests return without effect.

use crate::AFFORDANCE_CLASS;
use crate::AFFORDANCE_ICON;
use crate::ENABLED_CLASS;
use crate::ENTER_LABEL_KEY;
use crate::READY_CLASS;
use crate::SharedDocument;
use crate::collaborators::AffordanceResources;
use crate::collaborators::AlwaysVisible;
use crate::collaborators::CssSettingsLoader;
use crate::collaborators::DefaultResources;
use crate::collaborators::DismissingSurface;
use crate::collaborators::SettingsLoader;
use crate::collaborators::SettingsOutcome;
use crate::collaborators::SettingsSurface;
use crate::collaborators::VisibilitySignal;
use crate::header::HeaderCoordinator;
use crate::header::HeaderRegistry;
use crate::header::NoHeaders;
use crate::isolate::IsolationConfig;
use crate::isolate::SiblingIsolator;
use crate::mask::InlineStyleMasker;
use crate::mask::MaskedStyle;
use crate::service::ReadingModeService;
use crate::styles::StyleSuppressor;
use lc_dom::Document;
use lc_dom::NodeId;
use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingModeState {
    Disabled,
    Enabling,
    Enabled,
    Destroyed,
}

/// How [`ReadingModeController::mount`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    /// Affordance inserted into the header toolbar.
    Attached,
    /// The toolbar already had an affordance; region marked ready only.
    AlreadyAttached,
    /// No toolbar or scroll container; region ready but without affordance.
    Degraded,
    /// Unmounted before mounting finished.
    Cancelled,
}

/// What an affordance click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Entered,
    Exited,
    StayedEnabled,
    Busy,
}

/// Where the affordance goes, as element names in the page chrome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountConfig {
    pub page_class: String,
    pub header_tag: String,
    pub toolbar_tag: String,
    pub buttons_tag: String,
    /// `slot` attribute value of the end button group.
    pub buttons_slot: String,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            page_class: "ion-page".to_owned(),
            header_tag: "ion-header".to_owned(),
            toolbar_tag: "ion-toolbar".to_owned(),
            buttons_tag: "ion-buttons".to_owned(),
            buttons_slot: "end".to_owned(),
        }
    }
}

/// Everything captured by one activation, drained by the matching
/// deactivation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestorationRecord {
    pub styles: Vec<NodeId>,
    pub masked: Vec<MaskedStyle>,
    pub hidden: Vec<NodeId>,
    pub regions: Vec<NodeId>,
}

impl RestorationRecord {
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
            && self.masked.is_empty()
            && self.hidden.is_empty()
            && self.regions.is_empty()
    }

    /// Number of entries across all sequences, processed regions included.
    pub fn len(&self) -> usize {
        self.styles.len() + self.masked.len() + self.hidden.len() + self.regions.len()
    }
}

/// Page-level collaborators shared by every controller of one document.
#[derive(Clone)]
pub struct ReadingModeContext {
    pub document: SharedDocument,
    pub service: Rc<ReadingModeService>,
    pub headers: Rc<dyn HeaderRegistry>,
    pub visibility: Rc<dyn VisibilitySignal>,
    pub settings_loader: Rc<dyn SettingsLoader>,
    pub settings_surface: Rc<dyn SettingsSurface>,
    pub resources: Rc<dyn AffordanceResources>,
    pub isolation: IsolationConfig,
    pub mount: MountConfig,
}

impl ReadingModeContext {
    pub fn new(document: SharedDocument, service: Rc<ReadingModeService>) -> Self {
        Self {
            document,
            service,
            headers: Rc::new(NoHeaders),
            visibility: Rc::new(AlwaysVisible),
            settings_loader: Rc::new(CssSettingsLoader::default()),
            settings_surface: Rc::new(DismissingSurface),
            resources: Rc::new(DefaultResources),
            isolation: IsolationConfig::default(),
            mount: MountConfig::default(),
        }
    }

    pub fn with_headers(mut self, headers: Rc<dyn HeaderRegistry>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_visibility(mut self, visibility: Rc<dyn VisibilitySignal>) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_settings_loader(mut self, loader: Rc<dyn SettingsLoader>) -> Self {
        self.settings_loader = loader;
        self
    }

    pub fn with_settings_surface(mut self, surface: Rc<dyn SettingsSurface>) -> Self {
        self.settings_surface = surface;
        self
    }

    pub fn with_resources(mut self, resources: Rc<dyn AffordanceResources>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_isolation(mut self, isolation: IsolationConfig) -> Self {
        self.isolation = isolation;
        self
    }

    pub fn with_mount_config(mut self, mount: MountConfig) -> Self {
        self.mount = mount;
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct Chrome {
    header: NodeId,
    buttons: NodeId,
}

/// Clears the in-flight flag when a transition ends, however it ends.
struct TransitionGuard<'a>(&'a Cell<bool>);

impl<'a> TransitionGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            return None;
        }
        Some(Self(flag))
    }
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct ReadingModeController {
    ctx: ReadingModeContext,
    region: NodeId,
    isolator: SiblingIsolator,
    state: Cell<ReadingModeState>,
    in_flight: Cell<bool>,
    mounted: Cell<bool>,
    active: Cell<bool>,
    affordance: Cell<Option<NodeId>>,
    header: HeaderCoordinator,
    record: RefCell<RestorationRecord>,
    cancel: CancellationToken,
}

impl ReadingModeController {
    pub fn new(ctx: ReadingModeContext, region: NodeId) -> Self {
        let isolator = SiblingIsolator::new(ctx.isolation.clone());
        Self {
            ctx,
            region,
            isolator,
            state: Cell::new(ReadingModeState::Disabled),
            in_flight: Cell::new(false),
            mounted: Cell::new(false),
            active: Cell::new(false),
            affordance: Cell::new(None),
            header: HeaderCoordinator::default(),
            record: RefCell::new(RestorationRecord::default()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn region(&self) -> NodeId {
        self.region
    }

    pub fn state(&self) -> ReadingModeState {
        self.state.get()
    }

    /// True while enabled or entering.
    pub fn is_enabled(&self) -> bool {
        matches!(
            self.state.get(),
            ReadingModeState::Enabling | ReadingModeState::Enabled
        )
    }

    pub fn is_ready(&self) -> bool {
        self.ctx.document.borrow().has_class(self.region, READY_CLASS)
    }

    /// Button inserted by this controller, if mounting attached one.
    pub fn affordance(&self) -> Option<NodeId> {
        self.affordance.get()
    }

    pub fn has_header_link(&self) -> bool {
        self.header.is_linked()
    }

    pub fn restoration(&self) -> RestorationRecord {
        self.record.borrow().clone()
    }

    /// Elements currently held for restoration.
    pub fn restoration_len(&self) -> usize {
        self.record.borrow().len()
    }

    /// Mounts the region: counts it, waits for visibility and one scheduling
    /// tick, then attaches the affordance and links the header. Enters reading
    /// mode straight away if the previous view left it on.
    pub async fn mount(&self) -> MountOutcome {
        if self.state.get() == ReadingModeState::Destroyed {
            return MountOutcome::Cancelled;
        }

        if !self.mounted.replace(true) {
            self.ctx.service.increase_counter();
            self.sync_page_marker();
        }

        let visible = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = self.ctx.visibility.wait_visible(self.region) => true,
        };
        if !visible {
            tracing::debug!(
                region = ?self.region,
                "mount cancelled while waiting for visibility"
            );
            return MountOutcome::Cancelled;
        }

        tokio::task::yield_now().await;
        if self.cancel.is_cancelled() {
            return MountOutcome::Cancelled;
        }

        let outcome = self.attach_affordance().await;
        if outcome == MountOutcome::Cancelled {
            return outcome;
        }

        tracing::debug!(region = ?self.region, ?outcome, "reading mode region mounted");
        if self.ctx.service.is_enabled_on_enter() {
            self.enable().await;
        }
        outcome
    }

    async fn attach_affordance(&self) -> MountOutcome {
        let chrome = {
            let doc = self.ctx.document.borrow();
            locate_chrome(&doc, self.region, &self.ctx.mount, &self.ctx.isolation)
        };
        let Some(chrome) = chrome else {
            tracing::warn!(
                region = ?self.region,
                "no header toolbar or scroll container found; reading mode affordance not added"
            );
            self.mark_ready();
            return MountOutcome::Degraded;
        };

        let existing = {
            let doc = self.ctx.document.borrow();
            doc.find_descendant(chrome.buttons, |el| el.has_class(AFFORDANCE_CLASS))
        };
        if existing.is_some() {
            self.mark_ready();
            return MountOutcome::AlreadyAttached;
        }

        let button = {
            let mut doc = self.ctx.document.borrow_mut();
            self.insert_affordance(&mut doc, chrome.buttons)
        };
        self.affordance.set(Some(button));

        if let Some(header) = self.header.resolve(self.ctx.headers.as_ref(), chrome.header) {
            header.ready().await;
        }
        if self.cancel.is_cancelled() {
            return MountOutcome::Cancelled;
        }

        self.mark_ready();
        MountOutcome::Attached
    }

    fn insert_affordance(&self, doc: &mut Document, buttons: NodeId) -> NodeId {
        let label = self.ctx.resources.label(ENTER_LABEL_KEY);
        let (library, style, name) = AFFORDANCE_ICON;
        let icon_name = self.ctx.resources.icon(library, style, name);

        let button = doc.create_element("ion-button");
        doc.set_attribute(button, "fill", "clear");
        doc.add_class(button, AFFORDANCE_CLASS);
        doc.set_attribute(button, "aria-label", label);

        let icon = doc.create_element("ion-icon");
        doc.set_attribute(icon, "name", icon_name);
        doc.set_attribute(icon, "aria-hidden", "true");
        doc.append_child(button, icon);

        doc.insert_child(buttons, 0, button);
        button
    }

    fn mark_ready(&self) {
        self.ctx
            .document
            .borrow_mut()
            .add_class(self.region, READY_CLASS);
    }

    /// Enters reading mode for every ready region on the page.
    ///
    /// Returns whether this call performed the transition.
    pub async fn enable(&self) -> bool {
        if self.is_enabled() || self.state.get() == ReadingModeState::Destroyed {
            return false;
        }
        let Some(_guard) = TransitionGuard::acquire(&self.in_flight) else {
            tracing::debug!(region = ?self.region, "reading mode transition already running");
            return false;
        };

        self.state.set(ReadingModeState::Enabling);
        self.ctx.settings_loader.load(&self.ctx.document).await;
        if self.unmounted_while_entering() {
            return false;
        }
        self.header.set_collapsing(false).await;
        if self.unmounted_while_entering() {
            return false;
        }

        self.set_active(true);
        self.ctx.service.set_enabled_on_enter(true);
        self.sync_page_marker();

        let captured = {
            let mut doc = self.ctx.document.borrow_mut();
            self.isolate_ready_regions(&mut doc)
        };

        tracing::debug!(
            region = ?self.region,
            regions = captured.regions.len(),
            touched = captured.len(),
            "reading mode enabled"
        );
        let mut record = self.record.borrow_mut();
        record.styles.extend(captured.styles);
        record.masked.extend(captured.masked);
        record.hidden.extend(captured.hidden);
        record.regions.extend(captured.regions);
        drop(record);

        self.state.set(ReadingModeState::Enabled);
        true
    }

    /// Unmount landed during one of `enable`'s awaits: nothing is applied to
    /// the page and the marker follows the counter again.
    fn unmounted_while_entering(&self) -> bool {
        if self.state.get() != ReadingModeState::Destroyed {
            return false;
        }
        tracing::debug!(
            region = ?self.region,
            "controller unmounted while entering; page left untouched"
        );
        self.sync_page_marker();
        true
    }

    fn isolate_ready_regions(&self, doc: &mut Document) -> RestorationRecord {
        let mut captured = RestorationRecord::default();
        let regions = doc.find_all(doc.root(), |el| el.has_class(READY_CLASS));

        for region in regions {
            doc.remove_class(region, READY_CLASS);
            captured.styles.extend(StyleSuppressor.suppress(doc, region));
            captured.masked.extend(InlineStyleMasker.mask(doc, region));
            captured.hidden.extend(self.isolator.isolate(doc, region));
            captured.regions.push(region);
        }

        captured
    }

    /// Leaves reading mode and restores everything the matching
    /// [`ReadingModeController::enable`] captured.
    ///
    /// Returns whether this call performed the transition.
    pub async fn disable(&self) -> bool {
        if self.state.get() != ReadingModeState::Enabled {
            return false;
        }
        let Some(_guard) = TransitionGuard::acquire(&self.in_flight) else {
            tracing::debug!(region = ?self.region, "reading mode transition already running");
            return false;
        };

        self.header.set_collapsing(true).await;
        if self.state.get() != ReadingModeState::Destroyed {
            self.state.set(ReadingModeState::Disabled);
        }
        self.ctx.service.set_enabled_on_enter(false);
        self.set_active(false);
        self.sync_page_marker();

        let mut record = std::mem::take(&mut *self.record.borrow_mut());
        let mut doc = self.ctx.document.borrow_mut();

        let styles = StyleSuppressor.restore(&mut doc, &mut record.styles);
        let masked = InlineStyleMasker.unmask(&mut doc, &mut record.masked);
        let revealed = SiblingIsolator::reveal(&mut doc, &mut record.hidden);
        for region in record.regions.drain(..) {
            if doc.is_connected(region) {
                doc.add_class(region, READY_CLASS);
            }
        }

        tracing::debug!(
            region = ?self.region,
            styles,
            masked,
            revealed,
            "reading mode disabled"
        );
        true
    }

    /// Handles a click on the affordance: enter when off, otherwise open the
    /// settings surface and leave only on an explicit exit.
    pub async fn handle_affordance_click(&self) -> ClickOutcome {
        if self.in_flight.get() {
            return ClickOutcome::Busy;
        }

        if !self.is_enabled() {
            return if self.enable().await {
                ClickOutcome::Entered
            } else {
                ClickOutcome::Busy
            };
        }

        match self.ctx.settings_surface.open().await {
            SettingsOutcome::ExitRequested => {
                if self.disable().await {
                    ClickOutcome::Exited
                } else {
                    ClickOutcome::Busy
                }
            }
            SettingsOutcome::Dismissed => ClickOutcome::StayedEnabled,
        }
    }

    /// Tears the controller down without leaving reading mode: cancels a
    /// pending visibility wait, uncounts the region and re-evaluates the page
    /// marker. Restoration state of this controller is dropped.
    pub fn unmount(&self) {
        if self.state.get() == ReadingModeState::Destroyed {
            return;
        }

        self.cancel.cancel();
        self.state.set(ReadingModeState::Destroyed);
        if self.mounted.replace(false) {
            self.ctx.service.decrease_counter();
        }
        self.set_active(false);
        self.sync_page_marker();

        if !self.in_flight.get() {
            *self.record.borrow_mut() = RestorationRecord::default();
        }
        tracing::debug!(
            region = ?self.region,
            counter = self.ctx.service.counter(),
            "reading mode region unmounted"
        );
    }

    /// Counts this controller in or out of the page's active set, once.
    fn set_active(&self, active: bool) {
        if self.active.replace(active) == active {
            return;
        }
        if active {
            self.ctx.service.activate();
        } else {
            self.ctx.service.deactivate();
        }
    }

    fn sync_page_marker(&self) {
        let mut doc = self.ctx.document.borrow_mut();
        let body = doc.body();
        doc.toggle_class(body, ENABLED_CLASS, self.ctx.service.is_enabled());
    }
}

/// Finds the header and its end button group for `region`, requiring a scroll
/// container around the region.
fn locate_chrome(
    doc: &Document,
    region: NodeId,
    mount: &MountConfig,
    isolation: &IsolationConfig,
) -> Option<Chrome> {
    doc.closest(region, |el| isolation.is_boundary(el))?;

    let page = doc
        .closest(region, |el| el.has_class(&mount.page_class))
        .unwrap_or_else(|| doc.body());
    let header = doc.find_descendant(page, |el| el.tag() == mount.header_tag)?;
    let toolbar = doc.find_descendant(header, |el| el.tag() == mount.toolbar_tag)?;
    let buttons = doc.find_descendant(toolbar, |el| {
        el.tag() == mount.buttons_tag && el.attribute("slot") == Some(mount.buttons_slot.as_str())
    })?;

    Some(Chrome { header, buttons })
}
