//! Local Chrome process management
//!
//! Starts Chrome with remote debugging on a throwaway profile and waits until
//! its DevTools endpoint answers.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::config::Config;
use crate::Error;

/// A Chrome process started by this crate
#[derive(Debug)]
pub struct ChromeProcess {
    child: Child,
    endpoint: String,
    profile_dir: PathBuf,
}

impl ChromeProcess {
    /// Launch the executable named by `config.chrome_path`
    pub async fn launch(config: &Config) -> Result<Self, Error> {
        let chrome_path = config
            .chrome_path
            .as_deref()
            .ok_or_else(|| Error::configuration("chrome_path is not set"))?;

        let profile_dir = std::env::temp_dir().join(format!("profile-oxide-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&profile_dir)?;

        let mut cmd = Command::new(chrome_path);
        cmd.arg(format!("--remote-debugging-port={}", config.chrome_port))
            .arg(format!("--user-data-dir={}", profile_dir.display()))
            .arg(format!("--window-size={},{}", config.window_width, config.window_height))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        if config.headless {
            cmd.arg("--headless=new");
        }

        let child = cmd
            .spawn()
            .map_err(|e| Error::configuration(format!("Failed to launch {}: {}", chrome_path, e)))?;
        info!("Chrome launched with PID: {:?}", child.id());

        let endpoint = format!("ws://127.0.0.1:{}", config.chrome_port);
        let mut process = Self {
            child,
            endpoint,
            profile_dir,
        };

        if let Err(e) = process.wait_ready().await {
            process.shutdown().await;
            return Err(e);
        }
        Ok(process)
    }

    async fn wait_ready(&mut self) -> Result<(), Error> {
        let version_url = format!("{}/json/version", self.endpoint.replace("ws://", "http://"));

        for _ in 0..50 {
            if let Ok(Some(status)) = self.child.try_wait() {
                return Err(Error::websocket(format!("Chrome exited early with {}", status)));
            }
            if reqwest::get(&version_url).await.is_ok() {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }

        Err(Error::timeout("Chrome failed to start within timeout"))
    }

    /// DevTools endpoint of the launched browser
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn shutdown(&mut self) {
        info!("Shutting down Chrome...");
        if let Err(e) = self.child.kill().await {
            warn!("Failed to kill Chrome: {}", e);
        }
        if let Err(e) = std::fs::remove_dir_all(&self.profile_dir) {
            warn!("Failed to remove profile dir {}: {}", self.profile_dir.display(), e);
        }
    }
}
