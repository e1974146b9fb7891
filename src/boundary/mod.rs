//! 错误捕获与回退
//!
//! ErrorCapture 包裹一个持有状态的组件（owner），状态机只有两态：Clean / Captured。
//! - 组件每个渲染周期调用一次 observe，内部维护 (current, previous) 两个槽位
//! - 首个错误到达时进入 Captured：冻结错误与回退快照；之后的错误一律忽略，直到显式 reset
//! - 自身错误（如请求失败）以 current 为快照；子视图错误以 previous 为快照：
//!   子视图在本次渲染中失败，回退目标是上一次渲染时的状态
//! - reset 同时清空错误与快照，把快照作为新的当前状态，并交给回退处理器（每次捕获只交付一次）

use std::fmt;

/// 错误来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSource {
    /// 组件自身的执行路径
    Owner,
    /// 子视图 / 下游消费者
    Descendant,
}

/// 捕获状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Clean,
    Captured,
}

struct Captured<S, E> {
    error: E,
    snapshot: S,
}

type CaptureHook<E> = Box<dyn FnMut(&E) + Send>;
type FallbackHook<S, E> = Box<dyn FnMut(S, E) + Send>;

pub struct ErrorCapture<S, E> {
    current: S,
    previous: S,
    captured: Option<Captured<S, E>>,
    on_capture: Option<CaptureHook<E>>,
    on_fallback: Option<FallbackHook<S, E>>,
}

impl<S: Clone, E: fmt::Display> ErrorCapture<S, E> {
    /// 以初始状态创建；初始时 previous 与 current 相同
    pub fn new(initial: S) -> Self {
        Self {
            previous: initial.clone(),
            current: initial,
            captured: None,
            on_capture: None,
            on_fallback: None,
        }
    }

    /// 进入 Captured 时回调（用于通知组件切换到错误展示）
    pub fn on_capture(mut self, f: impl FnMut(&E) + Send + 'static) -> Self {
        self.on_capture = Some(Box::new(f));
        self
    }

    /// reset 时接收 (快照, 错误)，由组件恢复自身状态
    pub fn on_fallback(mut self, f: impl FnMut(S, E) + Send + 'static) -> Self {
        self.on_fallback = Some(Box::new(f));
        self
    }

    /// 记录本次渲染的状态
    pub fn observe(&mut self, state: S) {
        self.previous = std::mem::replace(&mut self.current, state);
    }

    pub fn current(&self) -> &S {
        &self.current
    }

    pub fn previous(&self) -> &S {
        &self.previous
    }

    pub fn state(&self) -> CaptureState {
        if self.captured.is_some() {
            CaptureState::Captured
        } else {
            CaptureState::Clean
        }
    }

    pub fn is_captured(&self) -> bool {
        self.captured.is_some()
    }

    pub fn error(&self) -> Option<&E> {
        self.captured.as_ref().map(|c| &c.error)
    }

    pub fn snapshot(&self) -> Option<&S> {
        self.captured.as_ref().map(|c| &c.snapshot)
    }

    /// 上报错误；返回是否被捕获（已处于 Captured 时返回 false 且不做任何改变）
    pub fn report(&mut self, source: ErrorSource, error: E) -> bool {
        if self.captured.is_some() {
            tracing::debug!(?source, error = %error, "error ignored: already captured");
            return false;
        }
        let snapshot = match source {
            ErrorSource::Owner => self.current.clone(),
            ErrorSource::Descendant => self.previous.clone(),
        };
        tracing::warn!(?source, error = %error, "error captured");
        if let Some(hook) = self.on_capture.as_mut() {
            hook(&error);
        }
        self.captured = Some(Captured { error, snapshot });
        true
    }

    /// 执行子视图逻辑，Err 作为 Descendant 错误上报
    pub fn guard<T>(&mut self, f: impl FnOnce() -> Result<T, E>) -> Option<T> {
        match f() {
            Ok(v) => Some(v),
            Err(e) => {
                self.report(ErrorSource::Descendant, e);
                None
            }
        }
    }

    /// 回退：Clean 状态下无操作并返回 false
    pub fn reset(&mut self) -> bool {
        let Some(Captured { error, snapshot }) = self.captured.take() else {
            return false;
        };
        tracing::info!(error = %error, "fallback to snapshot");
        self.observe(snapshot.clone());
        if let Some(hook) = self.on_fallback.as_mut() {
            hook(snapshot, error);
        }
        true
    }
}

impl<S: fmt::Debug, E: fmt::Debug> fmt::Debug for ErrorCapture<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorCapture")
            .field("current", &self.current)
            .field("previous", &self.previous)
            .field("error", &self.captured.as_ref().map(|c| &c.error))
            .field("snapshot", &self.captured.as_ref().map(|c| &c.snapshot))
            .finish()
    }
}
