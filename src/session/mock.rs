//! Mock session implementations for testing
//!
//! `MockSite` is a scripted website: documents keyed by URL, a login form that
//! accepts a fixed set of accounts, and per-element click/scroll handlers that
//! swap the document. It implements `ContextFactory`, so the session
//! controller, navigator and assembler run against it unchanged.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::session::traits::{
    BrowserContext, BrowserOptions, ContextFactory, ElementInfo, Locator, PageContext, PageProbe,
};
use crate::Error;

pub const MOCK_LOGIN_URL: &str = "https://www.linkedin.com/login";
pub const MOCK_FEED_URL: &str = "https://www.linkedin.com/feed/";
pub const MOCK_CHALLENGE_URL: &str = "https://www.linkedin.com/checkpoint/challenge/AQH1";

const LOGIN_FORM: &str = r#"<form class="login__form">
<input id="username" name="session_key" type="text">
<input id="password" name="session_password" type="password">
<button class="btn__primary--large" type="submit">Sign in</button>
</form>"#;

fn login_html(error: Option<&str>) -> String {
    let alert = error
        .map(|msg| format!(r#"<div id="error-for-password" role="alert">{}</div>"#, msg))
        .unwrap_or_default();
    format!(
        "<html><head><title>LinkedIn Login</title></head><body><main>{}{}</main></body></html>",
        LOGIN_FORM, alert
    )
}

const FEED_HTML: &str = r#"<html><head><title>Feed | LinkedIn</title></head>
<body><nav id="global-nav"><a href="/feed/">Home</a></nav><main class="scaffold-layout__main">Feed</main></body></html>"#;

const CHALLENGE_HTML: &str = r#"<html><head><title>Security Verification | LinkedIn</title></head>
<body><main><h1>Let's do a quick security check</h1></main></body></html>"#;

const NOT_FOUND_HTML: &str = r#"<html><head><title>Page not found | LinkedIn</title></head>
<body><main><h1>This page doesn't exist</h1></main></body></html>"#;

/// A scripted document
#[derive(Debug, Clone)]
pub struct MockDocument {
    html: String,
    settle_after: Duration,
    on_click: HashMap<String, String>,
    on_scroll: HashMap<String, String>,
}

impl MockDocument {
    pub fn new<S: Into<String>>(html: S) -> Self {
        Self {
            html: html.into(),
            settle_after: Duration::ZERO,
            on_click: HashMap::new(),
            on_scroll: HashMap::new(),
        }
    }

    /// `document.readyState` stays "loading" for this long after navigation
    pub fn settle_after(mut self, delay: Duration) -> Self {
        self.settle_after = delay;
        self
    }

    /// Never reaches "complete"
    pub fn never_settles(self) -> Self {
        self.settle_after(Duration::from_secs(24 * 3600))
    }

    /// Clicking the element with this `id` replaces the document body
    pub fn on_click<I: Into<String>, H: Into<String>>(mut self, element_id: I, html: H) -> Self {
        self.on_click.insert(element_id.into(), html.into());
        self
    }

    /// Scrolling to the element with this `id` replaces the document body
    pub fn on_scroll<I: Into<String>, H: Into<String>>(mut self, element_id: I, html: H) -> Self {
        self.on_scroll.insert(element_id.into(), html.into());
        self
    }
}

#[derive(Debug, Default)]
struct SiteState {
    documents: HashMap<String, MockDocument>,
    accounts: HashMap<String, String>,
    challenged: HashSet<String>,
    /// (loads to let through first, loads to fail after that)
    failing_loads: HashMap<String, (usize, usize)>,
    navigations: Vec<String>,
    init_scripts: usize,
}

#[derive(Debug, Default)]
struct SiteInner {
    state: Mutex<SiteState>,
    contexts_opened: AtomicUsize,
    contexts_closed: AtomicUsize,
}

/// Scripted website standing in for a real browser
#[derive(Debug, Clone)]
pub struct MockSite {
    inner: Arc<SiteInner>,
}

fn url_key(url: &str) -> &str {
    url.trim_end_matches('/')
}

impl MockSite {
    pub fn new() -> Self {
        let site = Self {
            inner: Arc::new(SiteInner::default()),
        };
        site.add_page(MOCK_LOGIN_URL, MockDocument::new(login_html(None)));
        site.add_page(MOCK_FEED_URL, MockDocument::new(FEED_HTML));
        site.add_page(MOCK_CHALLENGE_URL, MockDocument::new(CHALLENGE_HTML));
        site
    }

    fn state(&self) -> MutexGuard<'_, SiteState> {
        self.inner.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_page<S: AsRef<str>>(&self, url: S, document: MockDocument) -> &Self {
        self.state()
            .documents
            .insert(url_key(url.as_ref()).to_string(), document);
        self
    }

    pub fn add_account<E: Into<String>, P: Into<String>>(&self, email: E, password: P) -> &Self {
        self.state().accounts.insert(email.into(), password.into());
        self
    }

    /// Valid account that always lands on a verification challenge
    pub fn add_challenged_account<E: Into<String>, P: Into<String>>(&self, email: E, password: P) -> &Self {
        let email = email.into();
        let mut state = self.state();
        state.accounts.insert(email.clone(), password.into());
        state.challenged.insert(email);
        drop(state);
        self
    }

    /// The next `count` navigations to `url` fail with a network error
    pub fn fail_loads<S: AsRef<str>>(&self, url: S, count: usize) -> &Self {
        self.fail_loads_after(url, 0, count)
    }

    /// Let `after` navigations to `url` through, then fail the next `count`
    pub fn fail_loads_after<S: AsRef<str>>(&self, url: S, after: usize, count: usize) -> &Self {
        self.state()
            .failing_loads
            .insert(url_key(url.as_ref()).to_string(), (after, count));
        self
    }

    /// Every URL passed to `navigate`, in order
    pub fn navigations(&self) -> Vec<String> {
        self.state().navigations.clone()
    }

    pub fn init_scripts(&self) -> usize {
        self.state().init_scripts
    }

    pub fn contexts_opened(&self) -> usize {
        self.inner.contexts_opened.load(Ordering::SeqCst)
    }

    /// Contexts opened and not yet closed
    pub fn open_contexts(&self) -> usize {
        self.contexts_opened() - self.inner.contexts_closed.load(Ordering::SeqCst)
    }

    fn document(&self, url: &str) -> MockDocument {
        self.state()
            .documents
            .get(url_key(url))
            .cloned()
            .unwrap_or_else(|| MockDocument::new(NOT_FOUND_HTML))
    }

    fn take_failure(&self, url: &str) -> bool {
        let mut state = self.state();
        match state.failing_loads.get_mut(url_key(url)) {
            Some((after, _)) if *after > 0 => {
                *after -= 1;
                false
            }
            Some((_, remaining)) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn login_outcome(&self, email: &str, password: &str) -> (String, String) {
        let state = self.state();
        match state.accounts.get(email) {
            Some(expected) if expected == password => {
                if state.challenged.contains(email) {
                    (MOCK_CHALLENGE_URL.to_string(), CHALLENGE_HTML.to_string())
                } else {
                    (MOCK_FEED_URL.to_string(), FEED_HTML.to_string())
                }
            }
            _ => (
                MOCK_LOGIN_URL.to_string(),
                login_html(Some("Wrong email or password. Try again or create an account.")),
            ),
        }
    }
}

impl Default for MockSite {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContextFactory for MockSite {
    async fn open_context(&self, _options: &BrowserOptions) -> Result<Arc<dyn BrowserContext>, Error> {
        let index = self.inner.contexts_opened.fetch_add(1, Ordering::SeqCst);
        let id = format!("mock-context-{}", index + 1);
        let page = Arc::new(MockPage::new(self.clone(), format!("{}-page", id)));
        Ok(Arc::new(MockContext {
            id,
            page,
            site: self.clone(),
            is_active: AtomicBool::new(true),
        }))
    }
}

/// Mock browser context
#[derive(Debug)]
pub struct MockContext {
    id: String,
    page: Arc<MockPage>,
    site: MockSite,
    is_active: AtomicBool,
}

#[async_trait]
impl BrowserContext for MockContext {
    fn id(&self) -> &str {
        &self.id
    }

    fn page(&self) -> Arc<dyn PageContext> {
        self.page.clone()
    }

    async fn close(&self) -> Result<(), Error> {
        if self.is_active.swap(false, Ordering::SeqCst) {
            self.page.close().await?;
            self.site.inner.contexts_closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct PageState {
    url: String,
    document: MockDocument,
    loaded_at: Instant,
    form: HashMap<String, String>,
}

/// Mock page
#[derive(Debug)]
pub struct MockPage {
    id: String,
    site: MockSite,
    state: Mutex<PageState>,
    is_active: AtomicBool,
}

/// What a click or fill targets, extracted before the parsed DOM is dropped
#[derive(Debug, Clone)]
struct Hit {
    info: ElementInfo,
    name: Option<String>,
    kind: Option<String>,
}

fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve a locator against raw HTML; unparseable selectors match nothing
fn select_all(html: &str, locator: &Locator) -> Vec<Hit> {
    let Ok(selector) = Selector::parse(&locator.css) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    document
        .select(&selector)
        .filter_map(|el| {
            let text = element_text(&el);
            if !locator.text_matches(&text) {
                return None;
            }
            let value = el.value();
            Some(Hit {
                info: ElementInfo {
                    tag: value.name().to_string(),
                    text,
                    href: value.attr("href").map(str::to_string),
                    id: value.attr("id").map(str::to_string),
                },
                name: value.attr("name").map(str::to_string),
                kind: value.attr("type").map(str::to_string),
            })
        })
        .collect()
}

fn count_elements(html: &str) -> u64 {
    let Ok(all) = Selector::parse("*") else {
        return 0;
    };
    Html::parse_document(html).select(&all).count() as u64
}

impl MockPage {
    fn new(site: MockSite, id: String) -> Self {
        Self {
            id,
            site,
            state: Mutex::new(PageState {
                url: "about:blank".to_string(),
                document: MockDocument::new("<html><head></head><body></body></html>"),
                loaded_at: Instant::now(),
                form: HashMap::new(),
            }),
            is_active: AtomicBool::new(true),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, PageState>, Error> {
        if !self.is_active.load(Ordering::SeqCst) {
            return Err(Error::page_closed(&self.id));
        }
        Ok(self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    fn load(&self, url: &str, document: MockDocument) -> Result<(), Error> {
        let mut state = self.state()?;
        state.url = url.to_string();
        state.document = document;
        state.loaded_at = Instant::now();
        state.form.clear();
        Ok(())
    }

    fn replace_html(&self, html: &str) -> Result<(), Error> {
        let mut state = self.state()?;
        state.document.html = html.to_string();
        Ok(())
    }

    fn hits(&self, locator: &Locator) -> Result<Vec<Hit>, Error> {
        let html = self.state()?.document.html.clone();
        Ok(select_all(&html, locator))
    }

    fn activate(&self, hit: &Hit) -> Result<(), Error> {
        let (url, handler) = {
            let state = self.state()?;
            let handler = hit
                .info
                .id
                .as_ref()
                .and_then(|id| state.document.on_click.get(id).cloned());
            (state.url.clone(), handler)
        };

        if let Some(html) = handler {
            return self.replace_html(&html);
        }

        if hit.kind.as_deref() == Some("submit") && url_key(&url) == url_key(MOCK_LOGIN_URL) {
            let (email, password) = {
                let state = self.state()?;
                (
                    state.form.get("session_key").cloned().unwrap_or_default(),
                    state.form.get("session_password").cloned().unwrap_or_default(),
                )
            };
            let (next_url, html) = self.site.login_outcome(&email, &password);
            return self.load(&next_url, MockDocument::new(html));
        }

        if let (Some(href), "a") = (hit.info.href.as_deref(), hit.info.tag.as_str()) {
            let target = reqwest::Url::parse(&url)
                .and_then(|base| base.join(href))
                .map_err(|e| Error::cdp(format!("bad href {}: {}", href, e)))?;
            let document = self.site.document(target.as_str());
            return self.load(target.as_str(), document);
        }

        Ok(())
    }
}

#[async_trait]
impl PageContext for MockPage {
    fn id(&self) -> &str {
        &self.id
    }

    async fn navigate(&self, url: &str) -> Result<(), Error> {
        self.state()?;
        self.site.state().navigations.push(url.to_string());

        if self.site.take_failure(url) {
            return Err(Error::cdp(format!("navigation to {} failed: net::ERR_CONNECTION_RESET", url)));
        }

        let document = self.site.document(url);
        self.load(url, document)
    }

    async fn current_url(&self) -> Result<String, Error> {
        Ok(self.state()?.url.clone())
    }

    async fn content(&self) -> Result<String, Error> {
        Ok(self.state()?.document.html.clone())
    }

    async fn probe(&self, landmarks: &[Locator]) -> Result<PageProbe, Error> {
        let (url, html, settled) = {
            let state = self.state()?;
            (
                state.url.clone(),
                state.document.html.clone(),
                state.loaded_at.elapsed() >= state.document.settle_after,
            )
        };

        let landmark_present =
            landmarks.is_empty() || landmarks.iter().any(|l| !select_all(&html, l).is_empty());

        Ok(PageProbe {
            url,
            ready_state: if settled { "complete" } else { "loading" }.to_string(),
            landmark_present,
            node_count: count_elements(&html),
            resource_count: 0,
        })
    }

    async fn find(&self, locator: &Locator) -> Result<Option<ElementInfo>, Error> {
        Ok(self.hits(locator)?.into_iter().next().map(|hit| hit.info))
    }

    async fn click(&self, locator: &Locator) -> Result<bool, Error> {
        match self.hits(locator)?.into_iter().next() {
            Some(hit) => {
                self.activate(&hit)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn click_all(&self, locator: &Locator) -> Result<usize, Error> {
        let hits = self.hits(locator)?;
        for hit in &hits {
            self.activate(hit)?;
        }
        Ok(hits.len())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> Result<bool, Error> {
        let Some(hit) = self.hits(locator)?.into_iter().next() else {
            return Ok(false);
        };
        let key = hit.name.or(hit.info.id).unwrap_or_else(|| locator.css.clone());
        self.state()?.form.insert(key, value.to_string());
        Ok(true)
    }

    async fn scroll_into_view(&self, locator: &Locator) -> Result<bool, Error> {
        let Some(hit) = self.hits(locator)?.into_iter().next() else {
            return Ok(false);
        };
        let handler = {
            let state = self.state()?;
            hit.info.id.as_ref().and_then(|id| state.document.on_scroll.get(id).cloned())
        };
        if let Some(html) = handler {
            self.replace_html(&html)?;
        }
        Ok(true)
    }

    async fn add_init_script(&self, _source: &str) -> Result<(), Error> {
        self.state()?;
        self.site.state().init_scripts += 1;
        Ok(())
    }

    async fn close(&self) -> Result<(), Error> {
        self.is_active.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }
}
