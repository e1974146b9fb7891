//! Mock 传输（用于测试，无需网络）
//!
//! 按 URL 预设应答：延迟后返回响应、延迟后失败、或永不返回；记录每次请求的 URL。

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::client::transport::{RawResponse, RequestOptions, Transport};
use crate::core::ClientError;

/// 预设应答
#[derive(Debug, Clone)]
pub enum MockReply {
    Respond { delay: Duration, response: RawResponse },
    Fail { delay: Duration, message: String },
    /// 永不返回，用于超时/取消测试
    Hang,
}

/// Mock 传输：未预设的 URL 返回 Transport 错误
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, MockReply>>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, url: impl Into<String>, reply: MockReply) {
        self.routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.into(), reply);
    }

    pub fn respond(&self, url: impl Into<String>, delay: Duration, response: RawResponse) {
        self.reply(url, MockReply::Respond { delay, response });
    }

    pub fn respond_json(&self, url: impl Into<String>, delay: Duration, body: &serde_json::Value) {
        self.respond(url, delay, RawResponse::json(body));
    }

    pub fn fail(&self, url: impl Into<String>, delay: Duration, message: impl Into<String>) {
        self.reply(
            url,
            MockReply::Fail {
                delay,
                message: message.into(),
            },
        );
    }

    pub fn hang(&self, url: impl Into<String>) {
        self.reply(url, MockReply::Hang);
    }

    /// 已请求过的 URL（按请求顺序）
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(&self, url: &str, _options: &RequestOptions) -> Result<RawResponse, ClientError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.to_string());
        let reply = self
            .routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .cloned();
        match reply {
            Some(MockReply::Respond { delay, response }) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Some(MockReply::Fail { delay, message }) => {
                tokio::time::sleep(delay).await;
                Err(ClientError::Transport(message))
            }
            Some(MockReply::Hang) => std::future::pending().await,
            None => Err(ClientError::Transport(format!("No route: {url}"))),
        }
    }
}
