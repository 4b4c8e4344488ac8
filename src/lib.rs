//! Profile-Oxide: browser-driven extraction of professional profile pages
//!
//! This library drives a Chrome instance over the DevTools Protocol, signs in,
//! loads profile pages until their dynamic content settles, and turns each
//! page section into typed records collected in a [`ScrapeReport`].

pub mod error;
pub mod config;

pub mod cdp;
pub mod session;
pub mod stealth;
pub mod navigator;
pub mod extract;
pub mod profile;
pub mod assembler;
pub mod sink;

// Re-exports
pub use error::{Error, Result};
pub use config::{Config, Credentials};
pub use session::{SessionController, SessionHandle};
pub use navigator::{Deadline, Navigator};
pub use assembler::{AssembleOptions, ProfileAssembler};
pub use profile::{Diagnostic, Outcome, Profile, ScrapeReport, SectionStatus};
pub use sink::{CallbackSink, JsonFileSink, ProfileSink};

/// Profile-Oxide library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
