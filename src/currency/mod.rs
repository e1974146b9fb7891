//! 汇率业务层：get_currency 策略、数据模型、分页与看板组件

pub mod api;
pub mod board;
pub mod model;
pub mod pagination;

pub use api::{
    currency_strategy, register_currency_strategy, CURRENCY_KEY, DEFAULT_CURRENCY_URL, GET_CURRENCY,
};
pub use board::{BoardView, PageView, RatesBoard};
pub use model::{CurrencyInfo, CurrencyMap};
pub use pagination::{
    page_rows, validate_positions, validate_window, PageAction, PageSizeOptions, PageState,
    PageWindow, Row,
};
