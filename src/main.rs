//! # Profile-Oxide 命令行入口
//!
//! 登录目标站点，抓取一个个人主页并将结构化结果写入 JSON 文件。
//!
//! ## 主要功能
//! - 解析命令行参数与环境变量中的凭据
//! - 加载配置（TOML 文件 + `SCRAPER_*` 环境变量）
//! - 可选启动本地 Chrome，或连接已有的 CDP 端点
//! - 运行抓取流程并输出 JSON，诊断信息以警告形式打印
//! - 收到 Ctrl+C / SIGTERM 时取消抓取并释放浏览器上下文
//!
//! ## 架构
//! - **CDP 层**: 与 Chrome/Chromium 浏览器的 WebSocket 通信
//! - **会话管理**: 登录认证与上下文生命周期
//! - **导航层**: 页面加载、稳定性检测与区块展开
//! - **提取层**: 各区块的 DOM 解析与文本规范化
//! - **组装与输出**: 生成 `ScrapeReport` 并写入 JSON
//!
//! ## 退出码
//! - `0`: 完整或部分成功
//! - `1`: 登录、导航或身份信息提取失败
//! - `2`: 配置错误
//!
//! ## 环境变量
//! - `LINKEDIN_EMAIL` / `LINKEDIN_PASSWORD`: 登录凭据
//! - `SCRAPER_CDP_ENDPOINT`: CDP WebSocket 端点（默认: ws://localhost:9222）
//! - `RUST_LOG`: 日志过滤（默认使用配置中的 `log_level`）

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use profile_oxide::{
    cdp::CdpBrowserImpl,
    session::{CdpContextFactory, ChromeProcess, SessionController},
    AssembleOptions, Config, Credentials, JsonFileSink, Outcome, ProfileAssembler, ProfileSink,
};

#[derive(Debug, Parser)]
#[command(name = "profile-oxide", version, about = "Extract a LinkedIn profile into structured JSON")]
struct Cli {
    /// Profile URL, e.g. https://www.linkedin.com/in/jdoe/
    url: String,

    #[arg(long, env = "LINKEDIN_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "LINKEDIN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(short, long, default_value = "linkedin_profile.json")]
    output: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    cdp_endpoint: Option<String>,

    /// Launch a local Chrome instead of connecting to a running one
    #[arg(long)]
    chrome_path: Option<String>,

    /// Also scrape the About page of every current employer
    #[arg(long)]
    companies: bool,

    /// Write every parsed HTML document under this directory
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Overall budget for one profile
    #[arg(long, default_value_t = 600)]
    timeout_secs: u64,
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let path = path.to_string_lossy();
            Config::from_file(&path)
                .and_then(Config::merge_env)
                .with_context(|| format!("loading {}", path))?
        }
        None => Config::from_env().context("reading SCRAPER_* environment")?,
    };

    if let Some(endpoint) = &cli.cdp_endpoint {
        config.cdp_endpoint = endpoint.clone();
    }
    if let Some(chrome_path) = &cli.chrome_path {
        config.chrome_path = Some(chrome_path.clone());
    }
    Ok(config.validate()?)
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Cancel `token` on Ctrl+C or SIGTERM
fn spawn_signal_handler(token: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = sigterm.recv() => info!("Received SIGTERM signal"),
                        _ = tokio::signal::ctrl_c() => info!("Received SIGINT signal"),
                    }
                }
                Err(e) => {
                    warn!("SIGTERM handler unavailable: {}", e);
                    let _ = tokio::signal::ctrl_c().await;
                    info!("Received SIGINT signal");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received Ctrl+C signal");
        }

        token.cancel();
    });
}

async fn run(cli: Cli, config: Config) -> anyhow::Result<Outcome> {
    let credentials = Credentials::resolve(cli.email.clone(), cli.password.clone())
        .map_err(profile_oxide::Error::from)?;

    // Keep the process alive for the whole run; it is killed on drop
    let mut chrome = if config.chrome_path.is_some() {
        Some(ChromeProcess::launch(&config).await?)
    } else {
        None
    };
    let endpoint = chrome
        .as_ref()
        .map(|c| c.endpoint().to_string())
        .unwrap_or_else(|| config.cdp_endpoint.clone());
    info!("Using CDP endpoint {}", endpoint);

    let browser = Arc::new(CdpBrowserImpl::new(endpoint));
    let controller = SessionController::new(Arc::new(CdpContextFactory::new(browser)), &config);
    let assembler = ProfileAssembler::from_config(
        &config,
        AssembleOptions {
            scrape_companies: cli.companies,
            snapshot_dir: cli.snapshot_dir.clone(),
            scrape_timeout: Duration::from_secs(cli.timeout_secs),
        },
    );

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let result = assembler.scrape(&controller, &credentials, &cli.url, &cancel).await;

    if let Some(chrome) = chrome.as_mut() {
        chrome.shutdown().await;
    }
    let report = result?;

    for diagnostic in &report.diagnostics {
        warn!("{}", diagnostic);
    }

    let sink = JsonFileSink::new(&cli.output);
    sink.accept(&report)
        .await
        .with_context(|| format!("writing {}", cli.output.display()))?;

    let outcome = report.outcome();
    info!(
        "Scraped {} ({:?}, {} diagnostics) into {}",
        report.profile.name,
        outcome,
        report.diagnostics.len(),
        cli.output.display()
    );
    Ok(outcome)
}

/// Exit code carried by the typed library error, 1 for anything else
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<profile_oxide::Error>())
        .map(|e| e.exit_code())
        .unwrap_or(1)
        .clamp(1, 255) as u8
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            init_tracing("info");
            error!("Configuration error: {:#}", e);
            return ExitCode::from(exit_code(&e));
        }
    };
    init_tracing(&config.log_level);
    info!("Profile-Oxide v{}", profile_oxide::VERSION);

    match run(cli, config).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Scrape failed: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}
