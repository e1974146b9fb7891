//! 请求策略注册表
//!
//! 策略 = 预设 URL + 解码方式 + 超时 + 请求选项 + 回调包装（在调用方回调外层注入共享逻辑，
//! 如写入数据仓库、上报错误）。StrategyRegistry 按名注册与查找，invoke 时解析目标 URL 并交给 Dispatcher。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::client::dispatcher::{
    Decoded, Dispatcher, OnComplete, OnError, RequestConfig, RequestHandle, ResponseType,
};
use crate::client::transport::RequestOptions;
use crate::core::ClientError;

/// 完成回调包装：接收调用方回调（可能为空），返回实际交给分发器的回调
pub type CompleteWrap = Arc<dyn Fn(Option<OnComplete>) -> OnComplete + Send + Sync>;

/// 错误回调包装
pub type ErrorWrap = Arc<dyn Fn(Option<OnError>) -> OnError + Send + Sync>;

/// 一类请求的可复用模板
#[derive(Clone, Default)]
pub struct ApiStrategy {
    /// 预设 URL；为空时使用 invoke 传入的 url_override
    pub url: Option<String>,
    pub response_type: ResponseType,
    pub timeout: Option<u64>,
    pub options: RequestOptions,
    pub on_complete_wrap: Option<CompleteWrap>,
    pub on_error_wrap: Option<ErrorWrap>,
}

impl ApiStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    pub fn timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(secs);
        self
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn wrap_complete(
        mut self,
        wrap: impl Fn(Option<OnComplete>) -> OnComplete + Send + Sync + 'static,
    ) -> Self {
        self.on_complete_wrap = Some(Arc::new(wrap));
        self
    }

    pub fn wrap_error(
        mut self,
        wrap: impl Fn(Option<OnError>) -> OnError + Send + Sync + 'static,
    ) -> Self {
        self.on_error_wrap = Some(Arc::new(wrap));
        self
    }
}

impl fmt::Debug for ApiStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiStrategy")
            .field("url", &self.url)
            .field("response_type", &self.response_type)
            .field("timeout", &self.timeout)
            .field("options", &self.options)
            .field("on_complete_wrap", &self.on_complete_wrap.is_some())
            .field("on_error_wrap", &self.on_error_wrap.is_some())
            .finish()
    }
}

/// 策略注册表：按名称存储 ApiStrategy，支持 register / unregister / invoke
pub struct StrategyRegistry {
    dispatcher: Dispatcher,
    strategies: HashMap<String, ApiStrategy>,
}

impl StrategyRegistry {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            strategies: HashMap::new(),
        }
    }

    /// 注册策略；名称已存在且 replace 为 false 时返回 DuplicateStrategy
    pub fn register(
        &mut self,
        name: impl Into<String>,
        strategy: ApiStrategy,
        replace: bool,
    ) -> Result<(), ClientError> {
        let name = name.into();
        if !replace && self.strategies.contains_key(&name) {
            return Err(ClientError::DuplicateStrategy(name));
        }
        tracing::debug!(strategy = %name, replace, "register api strategy");
        self.strategies.insert(name, strategy);
        Ok(())
    }

    /// 移除策略；不存在时无操作
    pub fn unregister(&mut self, name: &str) {
        if self.strategies.remove(name).is_some() {
            tracing::debug!(strategy = %name, "unregister api strategy");
        }
    }

    pub fn get(&self, name: &str) -> Option<&ApiStrategy> {
        self.strategies.get(name)
    }

    pub fn strategy_names(&self) -> Vec<String> {
        self.strategies.keys().cloned().collect()
    }

    /// 按名称发起请求
    ///
    /// 目标 URL 优先取策略预设值，其次 url_override；调用方回调先经策略包装再交给分发器。
    /// 注册表层面的错误（未知策略、无法解析目标）同步返回，请求错误只走回调。
    pub fn invoke(
        &self,
        name: &str,
        on_complete: Option<OnComplete>,
        on_error: Option<OnError>,
        url_override: Option<&str>,
    ) -> Result<RequestHandle, ClientError> {
        let strategy = self
            .strategies
            .get(name)
            .ok_or_else(|| ClientError::UnknownStrategy(name.to_string()))?;
        let target = strategy
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .or(url_override)
            .ok_or_else(|| ClientError::UnresolvedTarget(name.to_string()))?;

        let on_complete = match &strategy.on_complete_wrap {
            Some(wrap) => Some(wrap(on_complete)),
            None => on_complete,
        };
        let on_error = match &strategy.on_error_wrap {
            Some(wrap) => Some(wrap(on_error)),
            None => on_error,
        };

        tracing::debug!(strategy = %name, target = %target, "invoke api strategy");
        let config = RequestConfig {
            on_complete,
            on_error,
            response_type: strategy.response_type,
            timeout: strategy.timeout,
            options: strategy.options.clone(),
        };
        Ok(self.dispatcher.send(target, config))
    }

    /// 便捷形式：闭包回调
    pub fn call(
        &self,
        name: &str,
        on_complete: impl FnOnce(Decoded) -> Result<(), ClientError> + Send + 'static,
        on_error: impl FnOnce(ClientError) + Send + 'static,
    ) -> Result<RequestHandle, ClientError> {
        self.invoke(name, Some(Box::new(on_complete)), Some(Box::new(on_error)), None)
    }
}
