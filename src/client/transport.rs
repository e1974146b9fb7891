//! 传输层抽象
//!
//! Transport trait 是分发器与底层 HTTP 之间的接缝：HttpTransport 基于 reqwest，
//! 测试使用 MockTransport（见 client::mock）。fetch 读完整个响应体后才返回。

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method};

use crate::core::ClientError;

/// 请求选项：方法、请求头、请求体
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// 未解码的响应：状态码、响应头、完整响应体
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// 200 + application/json
    pub fn json(value: &serde_json::Value) -> Self {
        Self::new(200, value.to_string()).with_header("content-type", "application/json")
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// 按名称（大小写不敏感）取第一个响应头
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 传输 trait：发出一次请求并返回完整响应；非 2xx 不视为失败（与浏览器 fetch 一致）
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str, options: &RequestOptions) -> Result<RawResponse, ClientError>;
}

/// reqwest 实现；超时与取消由分发器负责，Client 本身不设超时
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str, options: &RequestOptions) -> Result<RawResponse, ClientError> {
        let mut request = self.client.request(options.method.clone(), url);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            request = request.body(body.clone());
        }
        let resp = request
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("Request failed: {}", e)))?;
        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = resp
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(format!("Read body: {}", e)))?;
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
