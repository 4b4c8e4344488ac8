//! # 隐身层
//!
//! 降低自动化浏览器被识别的概率。
//!
//! ## 主要功能
//! - **初始化脚本**: 在每个新文档加载前隐藏 `navigator.webdriver` 等自动化特征
//! - **行为节奏**: 在页面交互之间插入随机停顿，模拟真实用户
//!
//! ## 模块结构
//! - `script`: 隐身初始化脚本
//! - `pacing`: 随机延迟生成器

pub mod script;
pub mod pacing;

pub use script::STEALTH_INIT_SCRIPT;
pub use pacing::HumanPacing;
