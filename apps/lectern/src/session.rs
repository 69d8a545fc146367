use async_trait::async_trait;
use lc_core::ReaderError;
use lc_core::ReaderResult;
use lc_dom::Document;
use lc_dom::NodeId;
use lc_html::HtmlParser;
use lc_reader::ClickOutcome;
use lc_reader::ENABLED_CLASS;
use lc_reader::HIDDEN_CLASS;
use lc_reader::MountOutcome;
use lc_reader::ORIGINAL_STYLE_ATTR;
use lc_reader::ReadingModeContext;
use lc_reader::ReadingModeController;
use lc_reader::ReadingModeService;
use lc_reader::ReadingModeSettings;
use lc_reader::collaborators::CssSettingsLoader;
use lc_reader::collaborators::SettingsOutcome;
use lc_reader::collaborators::SettingsSurface;
use lc_reader::header::CollapsibleHeader;
use lc_reader::header::StaticHeaderRegistry;
use lc_reader::shared_document;
use std::rc::Rc;
use tracing::info;

/// Attribute marking an element as a reading mode region.
const REGION_ATTR: &str = "core-reading-mode";

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SessionOptions {
    pub(crate) enter: bool,
    pub(crate) exit: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct SessionReport {
    pub(crate) markup: String,
    pub(crate) mounts: Vec<MountOutcome>,
    pub(crate) clicks: Vec<ClickOutcome>,
    pub(crate) counter: usize,
    pub(crate) enabled: bool,
    pub(crate) hidden: usize,
    pub(crate) masked: usize,
    pub(crate) suppressed: usize,
}

impl SessionReport {
    pub(crate) fn summary(&self) -> String {
        format!(
            "regions={} counter={} enabled={} hidden={} masked={} suppressed={}",
            self.mounts.len(),
            self.counter,
            self.enabled,
            self.hidden,
            self.masked,
            self.suppressed
        )
    }
}

/// Header stand-in that only logs collapse changes.
struct LoggedHeader {
    node: NodeId,
}

#[async_trait(?Send)]
impl CollapsibleHeader for LoggedHeader {
    async fn ready(&self) {}

    async fn set_enabled(&self, enabled: bool) {
        info!(header = ?self.node, enabled, "header collapsing changed");
    }
}

/// Settings surface whose only answer is leaving reading mode.
struct ExitSurface;

#[async_trait(?Send)]
impl SettingsSurface for ExitSurface {
    async fn open(&self) -> SettingsOutcome {
        SettingsOutcome::ExitRequested
    }
}

pub(crate) async fn run(
    html: &str,
    settings: ReadingModeSettings,
    options: SessionOptions,
) -> ReaderResult<SessionReport> {
    let doc = HtmlParser.parse(html);
    let registry = Rc::new(StaticHeaderRegistry::new());
    for node in doc.find_all(doc.root(), |el| el.tag() == "ion-header") {
        registry.register(node, Rc::new(LoggedHeader { node }));
    }
    let regions = doc.find_all(doc.root(), |el| el.attribute(REGION_ATTR).is_some());
    info!(title = %doc.title, regions = regions.len(), "page loaded");

    let doc = shared_document(doc);
    let service = Rc::new(ReadingModeService::new());
    let ctx = ReadingModeContext::new(doc.clone(), service.clone())
        .with_headers(registry)
        .with_settings_loader(Rc::new(CssSettingsLoader::new(settings)))
        .with_settings_surface(Rc::new(ExitSurface));

    let controllers: Vec<ReadingModeController> = regions
        .iter()
        .map(|region| ReadingModeController::new(ctx.clone(), *region))
        .collect();
    let mut mounts = Vec::with_capacity(controllers.len());
    for controller in &controllers {
        mounts.push(controller.mount().await);
    }

    let mut clicks = Vec::new();
    if options.enter {
        let Some(first) = controllers.first() else {
            return Err(ReaderError::new(
                "reader.session.no_regions",
                "page has no reading mode region to enter",
            ));
        };
        clicks.push(first.handle_affordance_click().await);
        if options.exit {
            clicks.push(first.handle_affordance_click().await);
        }
    }

    let doc = doc.borrow();
    let body = doc.body();
    Ok(SessionReport {
        markup: doc.to_html(body),
        mounts,
        clicks,
        counter: service.counter(),
        enabled: doc.has_class(body, ENABLED_CLASS),
        hidden: count(&doc, |doc, node| doc.has_class(node, HIDDEN_CLASS)),
        masked: count(&doc, |doc, node| doc.has_attribute(node, ORIGINAL_STYLE_ATTR)),
        suppressed: count(&doc, |doc, node| doc.is_sheet_disabled(node)),
    })
}

fn count(doc: &Document, predicate: impl Fn(&Document, NodeId) -> bool) -> usize {
    doc.elements_inclusive(doc.root())
        .into_iter()
        .filter(|node| predicate(doc, *node))
        .count()
}

#[cfg(test)]
mod tests {
    use super::SessionOptions;
    use super::run;
    use lc_reader::ClickOutcome;
    use lc_reader::MountOutcome;
    use lc_reader::ReadingModeSettings;
    use lc_reader::settings::ReadingTheme;

    const PAGE: &str = r#"<!doctype html>
<html><head><title>Lesson</title></head>
<body>
<div class="ion-page">
  <ion-header>
    <ion-toolbar><ion-buttons slot="end"></ion-buttons></ion-toolbar>
  </ion-header>
  <ion-content>
    <div class="scroll">
      <h1>Lesson</h1>
      <div core-reading-mode>
        <style>p { color: red }</style>
        <p style="font-weight: bold">Read me</p>
      </div>
      <footer>Next</footer>
    </div>
  </ion-content>
</div>
</body></html>"#;

    #[tokio::test]
    async fn mount_only_adds_the_affordance() {
        let report = run(PAGE, ReadingModeSettings::default(), SessionOptions::default()).await;
        let Ok(report) = report else {
            panic!("session failed: {report:?}");
        };

        assert_eq!(report.mounts, vec![MountOutcome::Attached]);
        assert!(report.clicks.is_empty());
        assert!(report.markup.contains("core-text-viewer-button"));
        assert_eq!(
            report.summary(),
            "regions=1 counter=1 enabled=false hidden=0 masked=0 suppressed=0"
        );
    }

    #[tokio::test]
    async fn enter_isolates_and_applies_settings() {
        let settings = ReadingModeSettings {
            font_size: 150,
            theme: ReadingTheme::Dark,
            show_multimedia: false,
        };
        let options = SessionOptions {
            enter: true,
            exit: false,
        };
        let report = run(PAGE, settings, options).await;
        let Ok(report) = report else {
            panic!("session failed: {report:?}");
        };

        assert_eq!(report.clicks, vec![ClickOutcome::Entered]);
        assert_eq!(
            report.summary(),
            "regions=1 counter=1 enabled=true hidden=2 masked=1 suppressed=1"
        );
        assert!(report.markup.contains("core-reading-mode-theme-dark"));
        assert!(report.markup.contains("--reading-mode-font-size: 150%;"));
        assert!(report.markup.contains(r#"data-original-style="font-weight: bold""#));
    }

    #[tokio::test]
    async fn enter_then_exit_restores_the_page() {
        let options = SessionOptions {
            enter: true,
            exit: true,
        };
        let report = run(PAGE, ReadingModeSettings::default(), options).await;
        let Ok(report) = report else {
            panic!("session failed: {report:?}");
        };

        assert_eq!(report.clicks, vec![ClickOutcome::Entered, ClickOutcome::Exited]);
        assert!(!report.enabled);
        assert_eq!((report.hidden, report.masked, report.suppressed), (0, 0, 0));
        assert!(report.markup.contains(r#"style="font-weight: bold""#));
    }

    #[tokio::test]
    async fn entering_a_page_without_regions_fails() {
        let options = SessionOptions {
            enter: true,
            exit: false,
        };
        let report = run("<p>plain</p>", ReadingModeSettings::default(), options).await;
        assert!(matches!(report, Err(error) if error.code == "reader.session.no_regions"));
    }
}
