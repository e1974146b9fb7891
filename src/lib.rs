//! Fxview - 汇率看板核心
//!
//! 模块划分：
//! - **client**: 请求分发器（超时取消、响应解码）、传输抽象与请求策略注册表
//! - **store**: 带监听器的键值数据仓库
//! - **boundary**: 错误捕获与回退状态机
//! - **currency**: get_currency 策略、汇率模型、分页与看板组件
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型
//! - **observability**: 日志初始化

pub mod boundary;
pub mod client;
pub mod config;
pub mod core;
pub mod currency;
pub mod observability;
pub mod store;

pub use boundary::{CaptureState, ErrorCapture, ErrorSource};
pub use client::{ApiStrategy, Dispatcher, StrategyRegistry};
pub use currency::RatesBoard;
pub use store::{DataStore, StoreEvent};
