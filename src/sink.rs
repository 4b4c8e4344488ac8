//! Output sinks for finished reports

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

use crate::profile::ScrapeReport;
use crate::{Error, Result};

/// Receives every assembled report
#[async_trait]
pub trait ProfileSink: Send + Sync {
    async fn accept(&self, report: &ScrapeReport) -> Result<()>;
}

/// Pretty-printed UTF-8 JSON file; parent directories are created
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ProfileSink for JsonFileSink {
    async fn accept(&self, report: &ScrapeReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, json).await?;
        info!("Wrote {}", self.path.display());
        Ok(())
    }
}

type Callback = Box<dyn Fn(&ScrapeReport) -> Result<()> + Send + Sync>;

/// Hands each report to a caller closure
pub struct CallbackSink {
    callback: Callback,
}

impl CallbackSink {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&ScrapeReport) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Collect reports into a shared vector
    pub fn collecting(store: std::sync::Arc<Mutex<Vec<ScrapeReport>>>) -> Self {
        Self::new(move |report| {
            store
                .lock()
                .map_err(|_| Error::internal("report store poisoned"))?
                .push(report.clone());
            Ok(())
        })
    }
}

impl fmt::Debug for CallbackSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSink").finish_non_exhaustive()
    }
}

#[async_trait]
impl ProfileSink for CallbackSink {
    async fn accept(&self, report: &ScrapeReport) -> Result<()> {
        (self.callback)(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Identity;
    use crate::profile::Profile;
    use std::sync::Arc;

    fn report() -> ScrapeReport {
        ScrapeReport::new(Profile::new(
            "https://www.linkedin.com/in/jdoe/",
            Identity {
                name: "Jane Doe".into(),
                ..Default::default()
            },
        ))
    }

    #[tokio::test]
    async fn test_json_file_sink_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("out").join("linkedin_profile.json"));
        sink.accept(&report()).await.unwrap();

        let written = std::fs::read_to_string(sink.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["name"], "Jane Doe");
        assert_eq!(value["url"], "https://www.linkedin.com/in/jdoe/");
        assert!(value["diagnostics"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_callback_sink_collects() {
        let store = Arc::new(Mutex::new(Vec::new()));
        let sink = CallbackSink::collecting(Arc::clone(&store));
        sink.accept(&report()).await.unwrap();
        sink.accept(&report()).await.unwrap();
        assert_eq!(store.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_callback_error_propagates() {
        let sink = CallbackSink::new(|_| Err(Error::internal("rejected")));
        assert!(sink.accept(&report()).await.is_err());
    }
}
