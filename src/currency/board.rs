//! 汇率看板组件
//!
//! 持有分页状态与 ErrorCapture：
//! - update 通过 get_currency 策略拉取数据，请求失败作为自身错误上报
//! - render 为一个渲染周期：先把当前状态交给 ErrorCapture 观察，再校验页窗口（子视图），
//!   失败作为子视图错误上报；Captured 时只输出错误信息
//! - fallback 为唯一的恢复动作，通过 Reset 动作把状态回退到捕获时的快照
//!
//! 回退目标是上一次渲染时的状态，两次渲染之间的多次状态变更只算一次。
//! 锁顺序固定为 capture → state。

use std::sync::{Arc, Mutex};

use crate::boundary::{ErrorCapture, ErrorSource};
use crate::client::{Decoded, RequestHandle, StrategyRegistry};
use crate::core::{BoardError, ClientError, ViewError};
use crate::currency::api::GET_CURRENCY;
use crate::currency::model::CurrencyMap;
use crate::currency::pagination::{
    page_rows, validate_window, PageAction, PageSizeOptions, PageState, PageWindow, Row,
};

/// 一页的展示数据
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub rows: Vec<Row>,
    pub start_pos: i64,
    pub end_pos: i64,
    pub total: usize,
    pub page_size: usize,
    pub page_size_options: Vec<usize>,
    pub has_next: bool,
    pub has_previous: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoardView {
    /// 已捕获错误，等待 fallback
    Failed { message: String },
    Page(PageView),
}

type Capture = ErrorCapture<PageState, BoardError>;

/// 回调与组件共享的部分
#[derive(Clone)]
struct Shared {
    state: Arc<Mutex<PageState>>,
    capture: Arc<Mutex<Capture>>,
}

impl Shared {
    fn dispatch(&self, action: PageAction) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = state.reduce(action);
    }

    /// 未捕获错误时才应用；检查与变更在同一次 capture 加锁内完成
    fn dispatch_unless_captured(&self, action: PageAction) -> bool {
        let capture = self.capture.lock().unwrap_or_else(|e| e.into_inner());
        if capture.is_captured() {
            return false;
        }
        self.dispatch(action);
        true
    }

    fn report(&self, source: ErrorSource, error: BoardError) {
        self.capture
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .report(source, error);
    }
}

pub struct RatesBoard {
    registry: Arc<StrategyRegistry>,
    shared: Shared,
    page_sizes: PageSizeOptions,
}

impl RatesBoard {
    pub fn new(registry: Arc<StrategyRegistry>, page_sizes: PageSizeOptions) -> Self {
        let initial = PageState::new(page_sizes.default_size());
        let state = Arc::new(Mutex::new(initial.clone()));
        let restore = Arc::clone(&state);
        let capture = ErrorCapture::new(initial).on_fallback(move |snapshot: PageState, _| {
            let mut state = restore.lock().unwrap_or_else(|e| e.into_inner());
            *state = state.reduce(PageAction::Reset(snapshot));
        });
        Self {
            registry,
            shared: Shared {
                state,
                capture: Arc::new(Mutex::new(capture)),
            },
            page_sizes,
        }
    }

    /// 拉取最新汇率；Captured 期间到达的数据被丢弃
    pub fn update(&self) -> Result<RequestHandle, ClientError> {
        let on_update = self.shared.clone();
        let on_error = self.shared.clone();
        self.registry.call(
            GET_CURRENCY,
            move |decoded: Decoded| {
                let map = CurrencyMap::from_value(&decoded.into_json()?)?;
                if !on_update.dispatch_unless_captured(PageAction::UpdateList(map)) {
                    tracing::debug!("currency data dropped: error captured");
                }
                Ok(())
            },
            move |err: ClientError| on_error.report(ErrorSource::Owner, err.into()),
        )
    }

    pub fn next_page(&self) {
        self.shared.dispatch(PageAction::IncrementPage);
    }

    pub fn previous_page(&self) {
        self.shared.dispatch(PageAction::DecrementPage);
    }

    /// 只接受配置中的每页条数，其他值返回 1400 且不改变状态
    pub fn set_page_size(&self, page_size: usize) -> Result<(), ViewError> {
        let page_size = self.page_sizes.check(page_size)?;
        self.shared.dispatch(PageAction::SetPageSize(page_size));
        Ok(())
    }

    /// 恢复动作；未捕获错误时返回 false
    pub fn fallback(&self) -> bool {
        self.shared
            .capture
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .reset()
    }

    pub fn state(&self) -> PageState {
        self.shared
            .state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn error(&self) -> Option<BoardError> {
        self.shared
            .capture
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .error()
            .cloned()
    }

    pub fn render(&self) -> BoardView {
        let mut capture = self.shared.capture.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(err) = capture.error() {
            return BoardView::Failed {
                message: err.to_string(),
            };
        }
        let state = self
            .shared
            .state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        capture.observe(state.clone());
        let window = PageWindow::of(&state);

        let checked = capture.guard(|| {
            validate_window(window.len, window.start, window.end).map_err(BoardError::from)
        });
        if checked.is_none() {
            let message = capture.error().map(ToString::to_string).unwrap_or_default();
            return BoardView::Failed { message };
        }

        BoardView::Page(PageView {
            rows: page_rows(&state.currency_data, window.start, window.end, state.page_size),
            start_pos: window.start_pos(),
            end_pos: window.end_pos(),
            total: window.len,
            page_size: state.page_size,
            page_size_options: self.page_sizes.options().to_vec(),
            has_next: window.has_next(),
            has_previous: window.has_previous(),
        })
    }
}
