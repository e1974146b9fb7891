//! Fxview - 汇率看板
//!
//! 入口：初始化日志、加载配置，注册 get_currency 策略，拉取一次汇率并输出第一页。
//! 用法：`fxview [config.toml]`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use fxview::client::{Dispatcher, HttpTransport, StrategyRegistry};
use fxview::config::load_config;
use fxview::currency::{
    register_currency_strategy, BoardView, PageSizeOptions, RatesBoard, Row, CURRENCY_KEY,
};
use fxview::observability;
use fxview::store::{DataStore, StoreEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = load_config(config_path).context("Failed to load config")?;

    let store = Arc::new(DataStore::new());
    store.add_listener(
        StoreEvent::OnSet,
        CURRENCY_KEY,
        Arc::new(|rates: &serde_json::Value| {
            let symbols = rates.as_object().map_or(0, |m| m.len());
            tracing::info!(symbols, "currency rates updated");
        }),
    );

    let transport = Arc::new(HttpTransport::new(&cfg.api.user_agent));
    let mut registry = StrategyRegistry::new(Dispatcher::new(transport));
    register_currency_strategy(
        &mut registry,
        Arc::clone(&store),
        &cfg.api.currency_url,
        cfg.api.timeout_secs,
    )
    .context("Failed to register currency strategy")?;

    let page_sizes = PageSizeOptions::new(cfg.view.page_size_options.clone(), cfg.view.default_page_size)
        .context("Invalid page size options")?;
    let board = RatesBoard::new(Arc::new(registry), page_sizes);

    board
        .update()
        .context("Failed to start currency update")?
        .finished()
        .await;

    match board.render() {
        BoardView::Failed { message } => {
            println!("Something went wrong:\n{message}");
        }
        BoardView::Page(page) => {
            println!("Rates");
            for row in &page.rows {
                match row {
                    Row::Rate {
                        name,
                        unit,
                        kind,
                        value,
                        ..
                    } => println!("{name:<24} {unit:<6} {kind:<10} {value:>16}"),
                    Row::Blank => println!(),
                }
            }
            println!(
                "Rows per page: {}    {} - {} of {}",
                page.page_size, page.start_pos, page.end_pos, page.total
            );
        }
    }

    Ok(())
}
