//! 错误类型
//!
//! - ClientError：策略注册表、数据仓库、请求分发器产生的错误（注册表/仓库错误同步返回，请求错误走 on_error 回调）
//! - ViewError：分页区间与每页条数选项校验失败（保留原系统的数字错误码）
//! - BoardError：看板组件捕获的错误（自身请求失败或子视图校验失败）

use thiserror::Error;

/// 请求链路上的错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Duplicate strategy: {0}")]
    DuplicateStrategy(String),

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    /// 策略未预设 URL，调用时也未提供替换 URL
    #[error("No target resolvable for strategy: {0}")]
    UnresolvedTarget(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    /// 超时触发的取消，参数为配置的秒数
    #[error("Request aborted after {0}s timeout")]
    Timeout(u64),

    /// 调用方通过 RequestHandle::cancel 主动取消
    #[error("Request aborted")]
    Aborted,
}

impl ClientError {
    /// 简短稳定标签，用于审计日志
    pub fn as_label(&self) -> &'static str {
        match self {
            ClientError::DuplicateStrategy(_) => "duplicate_strategy",
            ClientError::UnknownStrategy(_) => "unknown_strategy",
            ClientError::UnresolvedTarget(_) => "unresolved_target",
            ClientError::KeyNotFound(_) => "key_not_found",
            ClientError::Transport(_) => "transport",
            ClientError::Decode(_) => "decode",
            ClientError::Timeout(_) => "timeout",
            ClientError::Aborted => "aborted",
        }
    }
}

/// 分页视图的调用约定校验（错误码沿用原系统：13xx 区间，1400 每页条数）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("Error code 1300. 1: {start} | 2: {end}")]
    StartAfterEnd { start: i64, end: i64 },

    #[error("Error code 1301. 1: {start} | 2: {len}")]
    StartOutOfRange { start: i64, len: usize },

    #[error("Error code 1302. 1: {end} | 2: {len}")]
    EndOutOfRange { end: i64, len: usize },

    #[error("Error code 1303. 1: {0}")]
    NegativeStart(i64),

    #[error("Error code 1304. 1: {0}")]
    NegativeEnd(i64),

    #[error("Error code 1400. 1: {size} | 2: {options}")]
    UnknownPageSize { size: usize, options: usize },
}

/// 看板组件捕获的错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    View(#[from] ViewError),
}
