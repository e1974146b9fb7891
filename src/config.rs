//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `FXVIEW__*` 覆盖（双下划线表示嵌套，如 `FXVIEW__API__TIMEOUT_SECS=15`）。
//! 只有二进制入口读取配置，核心模块通过参数接收。

use std::path::PathBuf;

use serde::Deserialize;

use crate::currency::DEFAULT_CURRENCY_URL;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiSection,
    pub view: ViewSection,
}

/// [api] 段：汇率接口地址、超时、User-Agent
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSection {
    #[serde(default = "default_currency_url")]
    pub currency_url: String,
    /// 秒；不大于 5 时不启用超时
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_currency_url() -> String {
    DEFAULT_CURRENCY_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!("fxview/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            currency_url: default_currency_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// [view] 段：默认每页条数与可选项
#[derive(Debug, Clone, Deserialize)]
pub struct ViewSection {
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    #[serde(default = "default_page_size_options")]
    pub page_size_options: Vec<usize>,
}

fn default_page_size() -> usize {
    5
}

fn default_page_size_options() -> Vec<usize> {
    vec![5, 6, 7, 8, 9, 10]
}

impl Default for ViewSection {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            page_size_options: default_page_size_options(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 FXVIEW__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 FXVIEW__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("FXVIEW")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
