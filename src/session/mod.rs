//! # 会话管理层
//!
//! 负责浏览器上下文的创建、登录认证和释放，为上层提供已认证的页面句柄。
//!
//! ## 主要功能
//! - **上下文管理**: 为每个会话创建独立的浏览器上下文（独立 Cookie 存储）
//! - **登录认证**: 填写凭据、提交并判断结果（成功、凭据无效、安全验证）
//! - **资源回收**: 会话结束时关闭上下文，无论成功、失败还是取消
//! - **并发限制**: 通过信号量限制同时打开的上下文数量
//!
//! ## 核心概念
//! - **BrowserContext**: 浏览器上下文，拥有一个页面
//! - **PageContext**: 页面上下文，提供导航、探测、点击、滚动等操作
//! - **SessionHandle**: 已认证会话的句柄，可在多个任务间共享
//!
//! ## 模块结构
//! - `traits`: 上下文与页面的核心 trait 定义
//! - `scripts`: 在页面中执行的 JavaScript 片段
//! - `page`: 基于 CDP 的页面上下文实现
//! - `browser`: 基于 CDP 的浏览器上下文与工厂
//! - `launcher`: 本地 Chrome 进程启动器
//! - `controller`: 会话控制器（登录、作用域会话、释放）
//! - `mock`: 用于测试的模拟站点
//!
//! ## 使用示例
//! ```rust,no_run
//! use profile_oxide::session::{CdpContextFactory, SessionController};
//! use profile_oxide::cdp::CdpBrowserImpl;
//! use profile_oxide::{Config, Credentials};
//! use std::sync::Arc;
//!
//! # async fn example(config: Config, credentials: Credentials) -> Result<(), Box<dyn std::error::Error>> {
//! let browser = Arc::new(CdpBrowserImpl::new(config.cdp_endpoint.clone()));
//! let controller = SessionController::new(Arc::new(CdpContextFactory::new(browser)), &config);
//!
//! let title = controller
//!     .scoped(&credentials, |session| async move { session.page().current_url().await })
//!     .await?;
//! println!("Signed in at {}", title);
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod scripts;
pub mod page;
pub mod browser;
pub mod launcher;
pub mod controller;
pub mod mock;

pub use traits::{
    BrowserContext, PageContext, ContextFactory, BrowserOptions,
    Locator, ElementInfo, PageProbe,
};

// Re-export implementation structs
pub use page::PageContextImpl;
pub use browser::{BrowserContextImpl, CdpContextFactory};
pub use launcher::ChromeProcess;
pub use controller::{LoginOutcome, Session, SessionController, SessionHandle};

pub use mock::{MockDocument, MockSite};
