//! # 导航层
//!
//! 驱动页面加载、等待动态内容稳定，并触发页面内的展开操作。
//!
//! ## 主要功能
//! - **页面加载**: 在截止时间内导航并等待页面稳定，对瞬时失败进行有限次重试
//! - **区块展开**: 查找 "Show all" / "see more" 等截断控件并触发，若不存在则为空操作
//! - **滚动加载**: 将懒加载区块滚动到视口内并重新等待稳定
//! - **截止时间**: 所有等待都接受 `Deadline`，超时或取消时返回 `NavigationError`
//!
//! ## 模块结构
//! - `deadline`: 截止时间与取消令牌
//! - `stability`: 页面稳定性检测

pub mod deadline;
pub mod stability;

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::{NavigationError, NavigationFailure, NavigationStage};
use crate::session::controller::SessionHandle;
use crate::session::traits::{Locator, PageContext, PageProbe};
use crate::stealth::HumanPacing;

pub use deadline::Deadline;
pub use stability::{wait_stable, StabilityPolicy};

/// Landmark every loaded document must expose
const DEFAULT_LANDMARK: &str = "main";

/// Navigator timing
#[derive(Debug, Clone)]
pub struct NavigatorConfig {
    pub attempt_timeout: Duration,
    pub expand_timeout: Duration,
    pub scroll_timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub stability: StabilityPolicy,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        NavigatorConfig::from(&Config::default())
    }
}

impl From<&Config> for NavigatorConfig {
    fn from(config: &Config) -> Self {
        Self {
            attempt_timeout: Duration::from_millis(config.attempt_timeout),
            expand_timeout: Duration::from_millis(config.expand_timeout),
            scroll_timeout: Duration::from_millis(config.scroll_timeout),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff),
            stability: StabilityPolicy::from(config),
        }
    }
}

/// A page that reached a stable state at `url`
#[derive(Debug, Clone)]
pub struct PageHandle {
    page: Arc<dyn PageContext>,
    url: String,
    probe: PageProbe,
}

impl PageHandle {
    pub fn page(&self) -> &Arc<dyn PageContext> {
        &self.page
    }

    /// URL the handle was loaded with
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Last stable probe
    pub fn probe(&self) -> &PageProbe {
        &self.probe
    }

    pub async fn content(&self) -> crate::Result<String> {
        self.page.content().await
    }
}

/// How truncation shows up in one section
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TruncationSpec {
    /// "Show all N ..." controls; links lead to a detail page
    pub show_all: Vec<Locator>,
    /// In-place "see more" toggles, all of which are clicked
    pub see_more: Option<Locator>,
    /// Landmarks of the expanded content
    pub landmark: Vec<Locator>,
}

/// What `expand` did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expansion {
    /// Detail page the page navigated to
    pub followed: Option<String>,
    /// Controls clicked in place
    pub clicked: usize,
}

impl Expansion {
    pub fn is_noop(&self) -> bool {
        self.followed.is_none() && self.clicked == 0
    }
}

/// Navigator
#[derive(Debug, Clone)]
pub struct Navigator {
    config: NavigatorConfig,
    pacing: HumanPacing,
}

impl Navigator {
    pub fn new(config: NavigatorConfig, pacing: HumanPacing) -> Self {
        Self { config, pacing }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(NavigatorConfig::from(config), HumanPacing::from_config(config))
    }

    pub async fn load(
        &self,
        session: &SessionHandle,
        url: &str,
        deadline: &Deadline,
    ) -> Result<PageHandle, NavigationError> {
        self.load_with(session, url, &[Locator::css(DEFAULT_LANDMARK)], deadline).await
    }

    /// Navigate to `url` and wait until stable with one of `landmarks` present.
    /// Transient failures are retried while the overall deadline allows.
    #[instrument(skip(self, session, landmarks, deadline), fields(session = %session.id()))]
    pub async fn load_with(
        &self,
        session: &SessionHandle,
        url: &str,
        landmarks: &[Locator],
        deadline: &Deadline,
    ) -> Result<PageHandle, NavigationError> {
        let page = session.page();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let attempt = deadline.child(self.config.attempt_timeout);

            let failure = match self.try_load(page.as_ref(), url, landmarks, &attempt).await {
                Ok(probe) => {
                    info!("Loaded {} after {} attempt(s)", url, attempts);
                    if let Err(stop) = self.pacing.pause(deadline).await {
                        return Err(NavigationError::new(NavigationStage::Load, url, stop).with_attempts(attempts));
                    }
                    return Ok(PageHandle {
                        page: Arc::clone(page),
                        url: url.to_string(),
                        probe,
                    });
                }
                Err(failure) => failure,
            };

            let exhausted = attempts > self.config.max_retries || deadline.is_expired();
            if failure == NavigationFailure::Cancelled || exhausted {
                return Err(NavigationError::new(NavigationStage::Load, url, failure).with_attempts(attempts));
            }

            warn!("Load attempt {} for {} failed ({}); retrying", attempts, url, failure);
            if let Err(stop) = deadline.sleep(self.config.retry_backoff).await {
                return Err(NavigationError::new(NavigationStage::Load, url, stop).with_attempts(attempts));
            }
        }
    }

    async fn try_load(
        &self,
        page: &dyn PageContext,
        url: &str,
        landmarks: &[Locator],
        deadline: &Deadline,
    ) -> Result<PageProbe, NavigationFailure> {
        deadline
            .run(page.navigate(url))
            .await?
            .map_err(|e| NavigationFailure::Browser(e.to_string()))?;
        wait_stable(page, landmarks, &self.config.stability, deadline).await
    }

    /// Trigger the truncation controls of one section, then wait for the
    /// revealed content to settle. Without a control this returns at once.
    #[instrument(skip_all, fields(url = %handle.url()))]
    pub async fn expand(
        &self,
        handle: &PageHandle,
        spec: &TruncationSpec,
        deadline: &Deadline,
    ) -> Result<Expansion, NavigationError> {
        let deadline = deadline.child(self.config.expand_timeout);
        let fail = |reason: NavigationFailure| NavigationError::new(NavigationStage::Expand, handle.url(), reason);
        let page = handle.page().as_ref();
        let mut expansion = Expansion::default();

        for control in &spec.show_all {
            let found = deadline
                .run(page.find(control))
                .await
                .map_err(fail)?
                .map_err(|e| fail(NavigationFailure::Browser(e.to_string())))?;
            let Some(element) = found else { continue };

            self.pacing.pause(&deadline).await.map_err(fail)?;
            match element.href.as_deref().filter(|h| !h.is_empty() && !h.starts_with('#')) {
                Some(href) => {
                    let target = resolve(&handle.probe.url, href).unwrap_or_else(|| href.to_string());
                    debug!("Following {} to {}", control, target);
                    deadline
                        .run(page.navigate(&target))
                        .await
                        .map_err(fail)?
                        .map_err(|e| fail(NavigationFailure::Browser(e.to_string())))?;
                    expansion.followed = Some(target);
                }
                None => {
                    let clicked = deadline
                        .run(page.click(control))
                        .await
                        .map_err(fail)?
                        .map_err(|e| fail(NavigationFailure::Browser(e.to_string())))?;
                    if clicked {
                        expansion.clicked += 1;
                    }
                }
            }
            break;
        }

        if let Some(see_more) = &spec.see_more {
            if !expansion.is_noop() {
                wait_stable(page, &spec.landmark, &self.config.stability, &deadline)
                    .await
                    .map_err(fail)?;
            }
            expansion.clicked += deadline
                .run(page.click_all(see_more))
                .await
                .map_err(fail)?
                .map_err(|e| fail(NavigationFailure::Browser(e.to_string())))?;
        }

        if expansion.is_noop() {
            return Ok(expansion);
        }

        wait_stable(page, &spec.landmark, &self.config.stability, &deadline)
            .await
            .map_err(fail)?;
        debug!("Expanded: followed={:?} clicked={}", expansion.followed, expansion.clicked);
        Ok(expansion)
    }

    /// Scroll `anchor` into view and wait for lazily rendered content.
    /// Returns false when the anchor is not on the page.
    pub async fn scroll_into_view(
        &self,
        handle: &PageHandle,
        anchor: &Locator,
        deadline: &Deadline,
    ) -> Result<bool, NavigationError> {
        let deadline = deadline.child(self.config.scroll_timeout);
        let fail = |reason: NavigationFailure| NavigationError::new(NavigationStage::Scroll, handle.url(), reason);
        let page = handle.page().as_ref();

        let scrolled = deadline
            .run(page.scroll_into_view(anchor))
            .await
            .map_err(fail)?
            .map_err(|e| fail(NavigationFailure::Browser(e.to_string())))?;
        if !scrolled {
            return Ok(false);
        }

        wait_stable(page, &[anchor.clone()], &self.config.stability, &deadline)
            .await
            .map_err(fail)?;
        Ok(true)
    }
}

/// Resolve a possibly relative href against the page URL
pub fn resolve(base: &str, href: &str) -> Option<String> {
    let base = reqwest::Url::parse(base).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}
