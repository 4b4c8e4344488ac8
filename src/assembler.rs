//! Profile assembler
//!
//! Drives one profile through the navigator and the registered extractors:
//! load, identity, then every list section in order (scroll, expand,
//! snapshot, extract, restore), then optionally the current companies.
//! Only the initial load, the identity section and cancellation end a scrape
//! early; everything else becomes a diagnostic on the report.

use futures::stream::{self, StreamExt};
use scraper::Html;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::{Config, Credentials};
use crate::error::{NavigationError, NavigationStage, ScrapeError};
use crate::extract::company::{about_url, company_base_url};
use crate::extract::{extract_company, ExtractorRegistry, ProfileSection, SectionExtractor, SectionKind};
use crate::navigator::{resolve, Deadline, Expansion, Navigator, PageHandle};
use crate::profile::{Diagnostic, DiagnosticStage, Profile, ScrapeReport, SectionStatus};
use crate::session::controller::{SessionController, SessionHandle};
use crate::{Error, Result};

/// Per-scrape switches
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Visit the About page of every current employer
    pub scrape_companies: bool,
    /// Write every document an extractor ran against under this directory
    pub snapshot_dir: Option<PathBuf>,
    /// Budget for the whole profile, every load and expansion included
    pub scrape_timeout: Duration,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            scrape_companies: false,
            snapshot_dir: None,
            scrape_timeout: Duration::from_secs(600),
        }
    }
}

/// A profile URL reduced to `https://<host>/in/<slug>/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUrl {
    pub url: String,
    pub slug: String,
}

/// Accept only `/in/<slug>` URLs on the target site
pub fn validate_profile_url(raw: &str) -> std::result::Result<ProfileUrl, ScrapeError> {
    let invalid = || ScrapeError::InvalidProfileUrl(raw.to_string());
    let parsed = reqwest::Url::parse(raw.trim()).map_err(|_| invalid())?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid());
    }
    let host = parsed.host_str().ok_or_else(invalid)?;
    if host != "linkedin.com" && !host.ends_with(".linkedin.com") {
        return Err(invalid());
    }

    let mut segments = parsed.path_segments().ok_or_else(invalid)?.filter(|s| !s.is_empty());
    match (segments.next(), segments.next()) {
        (Some("in"), Some(slug)) => Ok(ProfileUrl {
            url: format!("https://{}/in/{}/", host, slug),
            slug: slug.to_string(),
        }),
        _ => Err(invalid()),
    }
}

fn same_page(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

async fn write_snapshot(dir: &Path, name: &str, html: &str) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(format!("{}.html", name)), html).await
}

/// Profile assembler
#[derive(Debug)]
pub struct ProfileAssembler {
    navigator: Navigator,
    registry: ExtractorRegistry,
    options: AssembleOptions,
    load_timeout: Duration,
}

impl ProfileAssembler {
    pub fn new(navigator: Navigator, options: AssembleOptions, load_timeout: Duration) -> Self {
        Self {
            navigator,
            registry: ExtractorRegistry::default(),
            options,
            load_timeout,
        }
    }

    pub fn from_config(config: &Config, options: AssembleOptions) -> Self {
        Self::new(Navigator::from_config(config), options, config.load_timeout())
    }

    pub fn with_registry(mut self, registry: ExtractorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn options(&self) -> &AssembleOptions {
        &self.options
    }

    pub async fn assemble(&self, session: &SessionHandle, url: &str) -> Result<ScrapeReport> {
        self.assemble_with_cancel(session, url, &CancellationToken::new()).await
    }

    /// Build the profile at `url` on an authenticated session
    #[instrument(skip_all, fields(session = %session.id(), url = %url))]
    pub async fn assemble_with_cancel(
        &self,
        session: &SessionHandle,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ScrapeReport> {
        let target = validate_profile_url(url)?;
        let deadline = Deadline::with_cancel(self.options.scrape_timeout, cancel.clone());
        let snapshots = self.options.snapshot_dir.as_ref().map(|dir| dir.join(&target.slug));

        let mut handle = self.load(session, &target.url, &deadline).await?;
        let html = handle.content().await?;

        let identity = match self.registry.identity().extract_html(&html) {
            Ok(ProfileSection::Identity(identity)) => identity,
            Ok(other) => {
                return Err(Error::internal(format!("identity extractor returned {}", other.kind())));
            }
            Err(e) => {
                return Err(ScrapeError::IdentityUnavailable {
                    url: target.url.clone(),
                    reason: e.to_string(),
                }
                .into());
            }
        };
        info!("Profile of {} loaded", identity.name);

        let mut report = ScrapeReport::new(Profile::new(&target.url, identity));
        self.snapshot(snapshots.as_deref(), "profile", &html, SectionKind::Identity, &mut report)
            .await;

        let sections = self.registry.sections();
        for (index, extractor) in sections.iter().enumerate() {
            handle = self
                .section(handle, extractor.as_ref(), &deadline, snapshots.as_deref(), &mut report)
                .await?;

            let restored = self.restore(session, handle, &deadline).await;
            handle = match restored {
                Ok(handle) => handle,
                Err(e) if e.is_cancelled() => return Err(e.into()),
                Err(e) => {
                    // Without the profile page nothing further can be read
                    warn!("Could not return to {}: {}", target.url, e);
                    for rest in &sections[index + 1..] {
                        report.profile.fail(rest.kind());
                        report.push(Diagnostic::error(rest.kind(), DiagnosticStage::Restore, e.to_string()));
                    }
                    if self.options.scrape_companies {
                        report.profile.fail(SectionKind::Companies);
                        report.push(Diagnostic::error(SectionKind::Companies, DiagnosticStage::Restore, e.to_string()));
                    }
                    return Ok(report);
                }
            };
        }

        if self.options.scrape_companies {
            self.companies(session, &target.url, &deadline, snapshots.as_deref(), &mut report)
                .await?;
        }

        for diagnostic in &report.diagnostics {
            warn!("{}", diagnostic);
        }
        info!(
            "Assembled {} ({:?}, {} diagnostic(s))",
            target.url,
            report.outcome(),
            report.diagnostics.len()
        );
        Ok(report)
    }

    async fn load(
        &self,
        session: &SessionHandle,
        url: &str,
        deadline: &Deadline,
    ) -> std::result::Result<PageHandle, NavigationError> {
        self.navigator.load(session, url, &deadline.child(self.load_timeout)).await
    }

    /// Reload the profile page if an expansion navigated away from it
    async fn restore(
        &self,
        session: &SessionHandle,
        handle: PageHandle,
        deadline: &Deadline,
    ) -> std::result::Result<PageHandle, NavigationError> {
        let current = deadline
            .run(handle.page().current_url())
            .await
            .map_err(|f| NavigationError::new(NavigationStage::Load, handle.url(), f))?
            .unwrap_or_default();
        if same_page(&current, handle.url()) {
            return Ok(handle);
        }
        debug!("Restoring {} from {}", handle.url(), current);
        self.load(session, handle.url(), deadline).await
    }

    async fn section(
        &self,
        handle: PageHandle,
        extractor: &dyn SectionExtractor,
        deadline: &Deadline,
        snapshots: Option<&Path>,
        report: &mut ScrapeReport,
    ) -> Result<PageHandle> {
        let kind = extractor.kind();
        debug!("Extracting {}", kind);

        if let Some(anchor) = extractor.anchor() {
            match self.navigator.scroll_into_view(&handle, &anchor, deadline).await {
                Ok(true) => {}
                Ok(false) => debug!("No {} anchor on page", kind),
                Err(e) if e.is_cancelled() => return Err(e.into()),
                Err(e) => report.push(Diagnostic::warning(kind, DiagnosticStage::Scroll, e.to_string())),
            }
        }

        let mut truncated = false;
        if let Some(spec) = extractor.truncation() {
            match self.navigator.expand(&handle, &spec, deadline).await {
                Ok(Expansion { followed: Some(detail), .. }) => debug!("{} expanded on {}", kind, detail),
                Ok(_) => {}
                Err(e) if e.is_cancelled() => return Err(e.into()),
                Err(e) => {
                    truncated = true;
                    report.push(Diagnostic::warning(kind, DiagnosticStage::Expand, e.to_string()));
                }
            }
        }

        let html = match handle.content().await {
            Ok(html) => html,
            Err(e) => {
                report.profile.fail(kind);
                report.push(Diagnostic::error(kind, DiagnosticStage::Extract, e.to_string()));
                return Ok(handle);
            }
        };
        self.snapshot(snapshots, kind.as_str(), &html, kind, report).await;

        match extractor.extract_html(&html) {
            Ok(section) => {
                debug!("{}: {} record(s)", kind, section.len());
                report.profile.apply(section, truncated);
            }
            Err(e) => {
                warn!("{} extraction failed: {}", kind, e);
                report.profile.fail(kind);
                report.push(Diagnostic::error(kind, DiagnosticStage::Extract, e.to_string()));
            }
        }
        Ok(handle)
    }

    /// Company pages linked from open-ended positions, deduplicated by URL
    fn current_company_urls(&self, profile_url: &str, report: &ScrapeReport) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();
        for entry in &report.profile.experience {
            if !entry.date_range.as_ref().is_some_and(|range| range.is_current()) {
                continue;
            }
            let Some(href) = entry.company_url.as_deref() else { continue };
            let Some(absolute) = resolve(profile_url, href) else { continue };
            let url = company_base_url(&absolute);
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        urls
    }

    async fn companies(
        &self,
        session: &SessionHandle,
        profile_url: &str,
        deadline: &Deadline,
        snapshots: Option<&Path>,
        report: &mut ScrapeReport,
    ) -> Result<()> {
        let kind = SectionKind::Companies;
        let urls = self.current_company_urls(profile_url, report);
        info!("Scraping {} current company page(s)", urls.len());

        let mut failures = 0usize;
        for (index, url) in urls.iter().enumerate() {
            let about = about_url(url);
            let handle = match self.load(session, &about, deadline).await {
                Ok(handle) => handle,
                Err(e) if e.is_cancelled() => return Err(e.into()),
                Err(e) => {
                    failures += 1;
                    report.push(Diagnostic::warning(kind, DiagnosticStage::Company, e.to_string()));
                    continue;
                }
            };

            let html = match handle.content().await {
                Ok(html) => html,
                Err(e) => {
                    failures += 1;
                    report.push(Diagnostic::warning(kind, DiagnosticStage::Company, e.to_string()));
                    continue;
                }
            };
            self.snapshot(snapshots, &format!("company-{}", index + 1), &html, kind, report)
                .await;

            let info = {
                let document = Html::parse_document(&html);
                extract_company(&document, url)
            };
            match info {
                Ok(info) => report.profile.companies.push(info),
                Err(e) => {
                    failures += 1;
                    report.push(Diagnostic::warning(kind, DiagnosticStage::Company, e.to_string()));
                }
            }
        }

        let status = if !report.profile.companies.is_empty() {
            SectionStatus::Extracted
        } else if failures > 0 {
            SectionStatus::Failed
        } else {
            SectionStatus::Empty
        };
        report.profile.set_status(kind, status);
        Ok(())
    }

    async fn snapshot(
        &self,
        dir: Option<&Path>,
        name: &str,
        html: &str,
        section: SectionKind,
        report: &mut ScrapeReport,
    ) {
        let Some(dir) = dir else { return };
        if let Err(e) = write_snapshot(dir, name, html).await {
            report.push(Diagnostic::warning(
                section,
                DiagnosticStage::Snapshot,
                format!("could not write {}.html: {}", name, e),
            ));
        }
    }

    /// Authenticate, assemble `url`, and tear the session down
    pub async fn scrape(
        &self,
        controller: &SessionController,
        credentials: &Credentials,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ScrapeReport> {
        let target = validate_profile_url(url)?;
        controller
            .scoped_with_cancel(credentials, cancel, |session| async move {
                self.assemble_with_cancel(&session, &target.url, cancel).await
            })
            .await
    }

    /// Independent pipelines, one session each, at most `limit` at a time.
    /// Results come back in input order.
    pub async fn scrape_many(
        &self,
        controller: &SessionController,
        credentials: &Credentials,
        urls: &[String],
        limit: usize,
        cancel: &CancellationToken,
    ) -> Vec<(String, Result<ScrapeReport>)> {
        let mut results: Vec<(usize, String, Result<ScrapeReport>)> = stream::iter(urls.iter().enumerate())
            .map(|(index, url)| async move {
                let result = self.scrape(controller, credentials, url, cancel).await;
                if let Err(e) = &result {
                    warn!("Scrape of {} failed: {}", url, e);
                }
                (index, url.clone(), result)
            })
            .buffer_unordered(limit.max(1))
            .collect()
            .await;

        results.sort_by_key(|(index, _, _)| *index);
        results.into_iter().map(|(_, url, result)| (url, result)).collect()
    }
}
