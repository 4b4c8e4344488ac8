//! # Chrome DevTools Protocol (CDP) 层
//!
//! 通过 WebSocket 与 Chrome/Chromium 通信，为会话层提供最底层的浏览器控制能力。
//!
//! ## 主要功能
//! - **WebSocket 连接管理**: 每个 DevTools 目标一条连接，读任务按命令 ID 分发响应
//! - **浏览器上下文隔离**: 通过 `Target.createBrowserContext` 为每个会话创建独立的 Cookie 空间
//! - **导航控制**: 发起页面导航并报告导航错误
//! - **脚本执行**: 在页面上下文中执行 JavaScript，注册新文档初始化脚本
//!
//! ## 模块结构
//! - `traits`: CDP 操作的核心 trait 定义
//! - `types`: CDP 协议相关的数据类型
//! - `connection`: WebSocket 连接实现
//! - `client`: CDP 客户端实现
//! - `browser`: 浏览器级别的操作
//! - `mock`: 用于测试的 Mock 实现
//!
//! ## 使用示例
//! ```rust,no_run
//! use profile_oxide::cdp::{CdpBrowser, CdpBrowserImpl, CdpClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let browser = CdpBrowserImpl::new("ws://localhost:9222");
//! let target = browser.open_context().await?;
//!
//! target.client.navigate("https://example.com").await?;
//! browser.dispose_context(&target.context_id).await?;
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod types;
pub mod connection;
pub mod client;
pub mod browser;
pub mod mock;

pub use traits::{
    BrowserVersion, CdpBrowser, CdpClient, CdpConnection, CdpError, CdpResponse, CdpTarget,
    EvaluationResult, NavigationResult,
};

pub use connection::CdpWebSocketConnection;
pub use client::CdpClientImpl;
pub use browser::CdpBrowserImpl;

pub use mock::MockCdpConnection;
