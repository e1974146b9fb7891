//! 分页：组件状态、状态变更动作、页窗口计算、行填充与区间校验
//!
//! page_index 使用有符号整数：越界翻页不在这里拦截，而是由子视图的区间校验报错，
//! 再由看板组件的错误捕获回退到上一状态。

use crate::core::ViewError;
use crate::currency::model::CurrencyMap;

/// 看板组件状态
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    pub page_size: usize,
    pub page_index: i64,
    pub currency_data: CurrencyMap,
}

impl PageState {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            page_index: 0,
            currency_data: CurrencyMap::default(),
        }
    }

    /// 应用一次状态变更
    pub fn reduce(&self, action: PageAction) -> PageState {
        match action {
            PageAction::UpdateList(currency_data) => PageState {
                currency_data,
                ..self.clone()
            },
            PageAction::IncrementPage => PageState {
                page_index: self.page_index + 1,
                ..self.clone()
            },
            PageAction::DecrementPage => PageState {
                page_index: self.page_index - 1,
                ..self.clone()
            },
            // 改变每页条数时回到第一页
            PageAction::SetPageSize(page_size) => PageState {
                page_size,
                page_index: 0,
                ..self.clone()
            },
            PageAction::Reset(state) => state,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageAction {
    UpdateList(CurrencyMap),
    IncrementPage,
    DecrementPage,
    SetPageSize(usize),
    Reset(PageState),
}

/// 由状态推导出的当前页窗口（下标从 0 开始，end 为闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub start: i64,
    pub end: i64,
    pub len: usize,
    pub page_size: usize,
    pub page_index: i64,
}

impl PageWindow {
    pub fn of(state: &PageState) -> Self {
        let len = state.currency_data.len() as i64;
        let size = state.page_size as i64;
        let start = state.page_index * size;
        let end = if start + size >= len {
            len.max(1) - 1
        } else {
            start + size - 1
        };
        Self {
            start,
            end,
            len: state.currency_data.len(),
            page_size: state.page_size,
            page_index: state.page_index,
        }
    }

    /// 摘要用的 1 起始位置；空列表时为 0
    pub fn start_pos(&self) -> i64 {
        if self.len == 0 {
            0
        } else {
            self.start + 1
        }
    }

    pub fn end_pos(&self) -> i64 {
        if self.len == 0 {
            0
        } else {
            self.end + 1
        }
    }

    /// 最后一项已显示时不可下一页
    pub fn has_next(&self) -> bool {
        self.len != 0 && self.end != self.len as i64 - 1
    }

    pub fn has_previous(&self) -> bool {
        self.len > 0 && self.page_index > 0
    }
}

/// 列表的区间校验（顺序：1303、1304、1300，列表非空时再查 1301、1302）
pub fn validate_window(len: usize, start: i64, end: i64) -> Result<(), ViewError> {
    if start < 0 {
        return Err(ViewError::NegativeStart(start));
    }
    if end < 0 {
        return Err(ViewError::NegativeEnd(end));
    }
    if start > end {
        return Err(ViewError::StartAfterEnd { start, end });
    }
    if len == 0 {
        return Ok(());
    }
    if start >= len as i64 {
        return Err(ViewError::StartOutOfRange { start, len });
    }
    if end >= len as i64 {
        return Err(ViewError::EndOutOfRange { end, len });
    }
    Ok(())
}

/// 摘要面板的位置校验（1 起始位置，允许等于总数）
pub fn validate_positions(start_pos: i64, end_pos: i64, total: usize) -> Result<(), ViewError> {
    if start_pos > end_pos {
        return Err(ViewError::StartAfterEnd {
            start: start_pos,
            end: end_pos,
        });
    }
    if start_pos < 0 {
        return Err(ViewError::NegativeStart(start_pos));
    }
    if end_pos < 0 {
        return Err(ViewError::NegativeEnd(end_pos));
    }
    if total == 0 {
        return Ok(());
    }
    if start_pos > total as i64 {
        return Err(ViewError::StartOutOfRange {
            start: start_pos,
            len: total,
        });
    }
    if end_pos > total as i64 {
        return Err(ViewError::EndOutOfRange {
            end: end_pos,
            len: total,
        });
    }
    Ok(())
}

/// 一行展示数据
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Rate {
        symbol: String,
        name: String,
        unit: String,
        kind: String,
        /// 保留三位小数
        value: String,
    },
    Blank,
}

/// 生成恰好 page_size 行；超出数据末尾或列表为空时填充 Blank
pub fn page_rows(data: &CurrencyMap, start: i64, end: i64, page_size: usize) -> Vec<Row> {
    (start..start + page_size as i64)
        .map(|i| {
            if i > end || i < 0 || data.is_empty() {
                return Row::Blank;
            }
            match data.get(i as usize) {
                Some((symbol, info)) => Row::Rate {
                    symbol: symbol.to_string(),
                    name: info.name.clone(),
                    unit: info.unit.clone(),
                    kind: info.kind.clone(),
                    value: format!("{:.3}", info.value),
                },
                None => Row::Blank,
            }
        })
        .collect()
}

/// 每页条数选项；默认值必须是选项之一
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSizeOptions {
    options: Vec<usize>,
    default: usize,
}

impl PageSizeOptions {
    pub fn new(options: Vec<usize>, default: usize) -> Result<Self, ViewError> {
        if !options.contains(&default) {
            return Err(ViewError::UnknownPageSize {
                size: default,
                options: options.len(),
            });
        }
        Ok(Self { options, default })
    }

    /// 只接受选项中的条数
    pub fn check(&self, size: usize) -> Result<usize, ViewError> {
        if self.options.contains(&size) {
            Ok(size)
        } else {
            Err(ViewError::UnknownPageSize {
                size,
                options: self.options.len(),
            })
        }
    }

    pub fn options(&self) -> &[usize] {
        &self.options
    }

    pub fn default_size(&self) -> usize {
        self.default
    }
}

impl Default for PageSizeOptions {
    fn default() -> Self {
        Self {
            options: vec![5, 6, 7, 8, 9, 10],
            default: 5,
        }
    }
}
