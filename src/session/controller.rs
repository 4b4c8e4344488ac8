//! Session controller
//!
//! Owns authentication and the lifetime of every browser context: a context
//! slot is taken from a semaphore before the context opens and is only given
//! back once the context has been closed.

use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::{Config, Credentials};
use crate::error::{AuthError, NavigationFailure};
use crate::navigator::deadline::Deadline;
use crate::navigator::stability::{wait_stable, StabilityPolicy};
use crate::session::traits::{BrowserContext, BrowserOptions, ContextFactory, Locator, PageContext};
use crate::stealth::{HumanPacing, STEALTH_INIT_SCRIPT};
use crate::{Error, Result};

const EMAIL_FIELD: &str = r#"input[name="session_key"]"#;
const PASSWORD_FIELD: &str = r#"input[name="session_password"]"#;
const SUBMIT_BUTTON: &str = r#"button[type="submit"]"#;
const LOGIN_ERROR: &str = r#"#error-for-password, #error-for-username, .form__label--error, div[role="alert"]"#;
const POST_LOGIN_LANDMARK: &str = "#global-nav, nav.global-nav, .global-nav__content, .feed-identity-module";
const CHALLENGE_MARKERS: [&str; 2] = ["/checkpoint", "/challenge"];

/// What the page shows after the login form was submitted
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Success,
    InvalidCredentials(String),
    Challenge(String),
    Pending,
}

impl LoginOutcome {
    /// Classify one observation of the post-submit page
    pub fn classify(url: &str, error_text: Option<&str>, landmark_present: bool) -> Self {
        if CHALLENGE_MARKERS.iter().any(|m| url.contains(m)) {
            return LoginOutcome::Challenge(url.to_string());
        }
        if let Some(text) = error_text.map(str::trim).filter(|t| !t.is_empty()) {
            return LoginOutcome::InvalidCredentials(text.to_string());
        }
        if landmark_present && !url.contains("/login") {
            return LoginOutcome::Success;
        }
        LoginOutcome::Pending
    }
}

/// Cheap, clonable view of an authenticated session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: String,
    page: Arc<dyn PageContext>,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn page(&self) -> &Arc<dyn PageContext> {
        &self.page
    }
}

/// Authenticated browser context. Exclusively owned; release with
/// [`SessionController::teardown`].
#[derive(Debug)]
pub struct Session {
    handle: SessionHandle,
    context: Arc<dyn BrowserContext>,
    permit: Option<OwnedSemaphorePermit>,
    torn_down: bool,
}

impl Session {
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn context_id(&self) -> &str {
        self.context.id()
    }
}

impl Deref for Session {
    type Target = SessionHandle;

    fn deref(&self) -> &SessionHandle {
        &self.handle
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.torn_down {
            return;
        }
        warn!("Session {} dropped without teardown; closing in background", self.handle.id);
        let context = Arc::clone(&self.context);
        let permit = self.permit.take();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                if let Err(e) = context.close().await {
                    warn!("Background close of context {} failed: {}", context.id(), e);
                }
                drop(permit);
            });
        }
    }
}

/// Login timing and pacing
#[derive(Debug, Clone)]
struct LoginSettings {
    login_url: String,
    timeout: Duration,
    stability: StabilityPolicy,
    pacing: HumanPacing,
}

/// Session controller
#[derive(Debug)]
pub struct SessionController {
    factory: Arc<dyn ContextFactory>,
    options: BrowserOptions,
    login: LoginSettings,
    slots: Arc<Semaphore>,
}

impl SessionController {
    pub fn new(factory: Arc<dyn ContextFactory>, config: &Config) -> Self {
        Self {
            factory,
            options: BrowserOptions::from(config),
            login: LoginSettings {
                login_url: config.login_url.clone(),
                timeout: config.login_timeout(),
                stability: StabilityPolicy::from(config),
                pacing: HumanPacing::from_config(config),
            },
            slots: Arc::new(Semaphore::new(config.max_contexts.max(1))),
        }
    }

    /// Context slots not currently held by a session
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Session> {
        self.authenticate_with_cancel(credentials, &CancellationToken::new()).await
    }

    /// Log in on a fresh isolated context. On any failure the context is
    /// closed before the error is returned.
    #[instrument(skip_all, fields(email = %credentials.email))]
    pub async fn authenticate_with_cancel(
        &self,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> Result<Session> {
        credentials.validate()?;

        let permit = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(network("acquire_context", NavigationFailure::Cancelled.to_string()).into());
            }
            permit = Arc::clone(&self.slots).acquire_owned() => {
                permit.map_err(|_| Error::internal("context semaphore closed"))?
            }
        };

        let deadline = Deadline::with_cancel(self.login.timeout, cancel.clone());
        let context = deadline
            .run(self.factory.open_context(&self.options))
            .await
            .map_err(|f| network("open_context", f.to_string()))?
            .map_err(|e| network("open_context", e.to_string()))?;

        let page = context.page();

        if let Err(e) = self.login(page.as_ref(), credentials, &deadline).await {
            if let Err(close_err) = context.close().await {
                warn!("Failed to close context after login failure: {}", close_err);
            }
            return Err(e.into());
        }

        let session = Session {
            handle: SessionHandle {
                id: Uuid::new_v4().to_string(),
                page,
            },
            context,
            permit: Some(permit),
            torn_down: false,
        };
        info!("Authenticated session {} on context {}", session.id(), session.context_id());
        Ok(session)
    }

    async fn login(
        &self,
        page: &dyn PageContext,
        credentials: &Credentials,
        deadline: &Deadline,
    ) -> std::result::Result<(), AuthError> {
        if self.options.stealth {
            deadline
                .run(page.add_init_script(STEALTH_INIT_SCRIPT))
                .await
                .map_err(|f| network("stealth", f.to_string()))?
                .map_err(|e| network("stealth", e.to_string()))?;
        }

        debug!("Opening login page {}", self.login.login_url);
        deadline
            .run(page.navigate(&self.login.login_url))
            .await
            .map_err(|f| network("login_page", f.to_string()))?
            .map_err(|e| network("login_page", e.to_string()))?;

        let form = [Locator::css(EMAIL_FIELD)];
        wait_stable(page, &form, &self.login.stability, deadline)
            .await
            .map_err(|f| network("login_page", f.to_string()))?;

        self.pause(deadline).await?;
        self.fill(page, EMAIL_FIELD, &credentials.email, deadline).await?;
        self.pause(deadline).await?;
        self.fill(page, PASSWORD_FIELD, &credentials.password, deadline).await?;
        self.pause(deadline).await?;

        let submitted = deadline
            .run(page.click(&Locator::css(SUBMIT_BUTTON)))
            .await
            .map_err(|f| network("submit", f.to_string()))?
            .map_err(|e| network("submit", e.to_string()))?;
        if !submitted {
            return Err(network("submit", "submit button not found"));
        }

        self.await_outcome(page, deadline).await
    }

    async fn pause(&self, deadline: &Deadline) -> std::result::Result<(), AuthError> {
        self.login
            .pacing
            .pause(deadline)
            .await
            .map_err(|f| network("login_form", f.to_string()))
    }

    async fn fill(
        &self,
        page: &dyn PageContext,
        css: &str,
        value: &str,
        deadline: &Deadline,
    ) -> std::result::Result<(), AuthError> {
        let filled = deadline
            .run(page.fill(&Locator::css(css), value))
            .await
            .map_err(|f| network("login_form", f.to_string()))?;
        match filled {
            Ok(true) => Ok(()),
            Ok(false) => Err(network("login_form", format!("field {} not found", css))),
            Err(e) => Err(network("login_form", e.to_string())),
        }
    }

    async fn await_outcome(&self, page: &dyn PageContext, deadline: &Deadline) -> std::result::Result<(), AuthError> {
        let error_locator = Locator::css(LOGIN_ERROR);
        let landmark = Locator::css(POST_LOGIN_LANDMARK);

        loop {
            let observed = deadline
                .run(async {
                    let url = page.current_url().await?;
                    let error = page.find(&error_locator).await?.map(|el| el.text);
                    let has_landmark = page.find(&landmark).await?.is_some();
                    Ok::<_, Error>((url, error, has_landmark))
                })
                .await
                .map_err(|f| network("post_login", f.to_string()))?;

            match observed {
                Ok((url, error, landmark)) => match LoginOutcome::classify(&url, error.as_deref(), landmark) {
                    LoginOutcome::Success => return Ok(()),
                    LoginOutcome::InvalidCredentials(msg) => return Err(AuthError::InvalidCredentials(msg)),
                    LoginOutcome::Challenge(url) => return Err(AuthError::Challenge { url }),
                    LoginOutcome::Pending => {}
                },
                Err(e) if !page.is_active() => return Err(network("post_login", e.to_string())),
                Err(e) => debug!("Post-login probe failed, retrying: {}", e),
            }

            deadline
                .sleep(self.login.stability.poll_interval)
                .await
                .map_err(|f| network("post_login", format!("no post-login landmark: {}", f)))?;
        }
    }

    /// Release every browser resource held by `session`
    pub async fn teardown(&self, mut session: Session) -> Result<()> {
        session.torn_down = true;
        let result = session.context.close().await;
        drop(session.permit.take());
        match &result {
            Ok(()) => debug!("Session {} torn down", session.id()),
            Err(e) => warn!("Teardown of session {} failed: {}", session.id(), e),
        }
        result
    }

    /// Authenticate, run `body`, and tear the session down on every exit path
    pub async fn scoped<T, F, Fut>(&self, credentials: &Credentials, body: F) -> Result<T>
    where
        F: FnOnce(SessionHandle) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.scoped_with_cancel(credentials, &CancellationToken::new(), body).await
    }

    pub async fn scoped_with_cancel<T, F, Fut>(
        &self,
        credentials: &Credentials,
        cancel: &CancellationToken,
        body: F,
    ) -> Result<T>
    where
        F: FnOnce(SessionHandle) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let session = self.authenticate_with_cancel(credentials, cancel).await?;
        let result = body(session.handle()).await;
        if let Err(e) = self.teardown(session).await {
            if result.is_ok() {
                warn!("Scrape succeeded but teardown failed: {}", e);
            }
        }
        result
    }
}

fn network<S: Into<String>, R: Into<String>>(stage: S, reason: R) -> AuthError {
    AuthError::Network {
        stage: stage.into(),
        reason: reason.into(),
    }
}
