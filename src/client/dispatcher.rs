//! 请求分发器
//!
//! send(target, config) 立即返回 RequestHandle，请求在后台任务中执行：
//! - timeout 大于 5 秒时启用超时取消，超时视为失败交给 on_error；响应或失败先到者胜出，计时器随即丢弃
//! - 成功时按 ResponseType 解码后交给 on_complete；on_complete 返回 Err 同样转交 on_error
//! - 未提供 on_error 时失败被丢弃（只记 debug 日志），不会影响调用方
//!
//! 每次请求输出一条结构化审计日志（JSON）。

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::transport::{RawResponse, RequestOptions, Transport};
use crate::core::ClientError;

/// 超时秒数必须大于此值才会生效
pub const MIN_TIMEOUT_SECS: u64 = 5;

/// 完成回调：返回 Err 时错误转交 on_error
pub type OnComplete = Box<dyn FnOnce(Decoded) -> Result<(), ClientError> + Send>;

/// 错误回调
pub type OnError = Box<dyn FnOnce(ClientError) + Send>;

/// 响应解码方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// 原样返回 RawResponse
    #[default]
    Raw,
    Json,
    Blob,
    ArrayBuffer,
}

/// 带类型的二进制对象
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// 解码结果
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Raw(RawResponse),
    Json(Value),
    Blob(Blob),
    Buffer(Bytes),
}

impl Decoded {
    /// 取出 JSON 值；其他解码方式返回 Decode 错误
    pub fn into_json(self) -> Result<Value, ClientError> {
        match self {
            Decoded::Json(v) => Ok(v),
            other => Err(ClientError::Decode(format!(
                "Expected json, got {}",
                other.kind()
            ))),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Decoded::Raw(_) => "raw",
            Decoded::Json(_) => "json",
            Decoded::Blob(_) => "blob",
            Decoded::Buffer(_) => "arraybuffer",
        }
    }
}

/// 按声明方式解码响应体
pub fn decode(response: RawResponse, response_type: ResponseType) -> Result<Decoded, ClientError> {
    match response_type {
        ResponseType::Raw => Ok(Decoded::Raw(response)),
        ResponseType::Json => serde_json::from_slice(&response.body)
            .map(Decoded::Json)
            .map_err(|e| ClientError::Decode(e.to_string())),
        ResponseType::Blob => Ok(Decoded::Blob(Blob {
            content_type: response.content_type().map(str::to_string),
            data: response.body,
        })),
        ResponseType::ArrayBuffer => Ok(Decoded::Buffer(response.body)),
    }
}

/// 单次请求的配置
#[derive(Default)]
pub struct RequestConfig {
    pub on_complete: Option<OnComplete>,
    pub on_error: Option<OnError>,
    pub response_type: ResponseType,
    /// 秒；不大于 MIN_TIMEOUT_SECS 时忽略
    pub timeout: Option<u64>,
    pub options: RequestOptions,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_complete(
        mut self,
        f: impl FnOnce(Decoded) -> Result<(), ClientError> + Send + 'static,
    ) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(ClientError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
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
}

/// 在途请求的句柄
pub struct RequestHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RequestHandle {
    /// 尽力取消：请求仍在途时 on_error 收到 Aborted；已完成则无效果
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// 等待回调执行完毕；回调内的 panic 在此处继续传播
    pub async fn finished(self) {
        if let Err(e) = self.task.await {
            if e.is_panic() {
                std::panic::resume_unwind(e.into_panic());
            }
        }
    }
}

/// 请求分发器：持有传输实现，可廉价克隆
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// 发出请求，立即返回；结果通过 config 中的回调送达
    pub fn send(&self, target: impl Into<String>, config: RequestConfig) -> RequestHandle {
        let url = target.into();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(Arc::clone(&self.transport), url, config, cancel.clone()));
        RequestHandle { cancel, task }
    }
}

async fn run(transport: Arc<dyn Transport>, url: String, config: RequestConfig, cancel: CancellationToken) {
    let RequestConfig {
        on_complete,
        on_error,
        response_type,
        timeout,
        options,
    } = config;
    let start = Instant::now();
    let armed = timeout.filter(|secs| *secs > MIN_TIMEOUT_SECS);
    let timer = async move {
        match armed {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };

    let fetched = tokio::select! {
        biased;
        r = transport.fetch(&url, &options) => r,
        _ = cancel.cancelled() => Err(ClientError::Aborted),
        _ = timer => Err(ClientError::Timeout(armed.unwrap_or_default())),
    };

    let status = fetched.as_ref().ok().map(|raw| raw.status);
    if let Ok(raw) = &fetched {
        if !raw.is_success() {
            tracing::debug!(url = %url, status = raw.status, "non-2xx status passed through");
        }
    }

    let outcome = fetched
        .and_then(|raw| decode(raw, response_type))
        .and_then(|decoded| match on_complete {
            Some(f) => f(decoded),
            None => Ok(()),
        });

    let label = match &outcome {
        Ok(()) => "ok",
        Err(e) => e.as_label(),
    };
    let audit = serde_json::json!({
        "event": "request_audit",
        "url": url,
        "ok": outcome.is_ok(),
        "status": status,
        "outcome": label,
        "duration_ms": start.elapsed().as_millis() as u64,
    });
    tracing::info!(audit = %audit.to_string(), "request");

    if let Err(e) = outcome {
        match on_error {
            Some(f) => f(e),
            None => tracing::debug!(url = %url, error = %e, "request error dropped: no error callback"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockTransport;
    use std::sync::Mutex;

    const URL: &str = "https://rates.test/api";

    #[derive(Default)]
    struct Calls {
        completed: Mutex<Vec<Decoded>>,
        errors: Mutex<Vec<ClientError>>,
    }

    fn config_for(calls: &Arc<Calls>) -> RequestConfig {
        let c1 = Arc::clone(calls);
        let c2 = Arc::clone(calls);
        RequestConfig::new()
            .on_complete(move |d| {
                c1.completed.lock().unwrap().push(d);
                Ok(())
            })
            .on_error(move |e| c2.errors.lock().unwrap().push(e))
    }

    fn dispatcher(transport: &Arc<MockTransport>) -> Dispatcher {
        Dispatcher::new(transport.clone() as Arc<dyn Transport>)
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_before_timeout_completes() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_json(URL, Duration::from_secs(3), &serde_json::json!({"ok": true}));
        let calls = Arc::new(Calls::default());

        dispatcher(&transport)
            .send(URL, config_for(&calls).response_type(ResponseType::Json).timeout(10))
            .finished()
            .await;

        assert!(calls.errors.lock().unwrap().is_empty());
        let completed = calls.completed.lock().unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0], Decoded::Json(serde_json::json!({"ok": true})));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_once() {
        let transport = Arc::new(MockTransport::new());
        transport.hang(URL);
        let calls = Arc::new(Calls::default());

        let begin = tokio::time::Instant::now();
        dispatcher(&transport)
            .send(URL, config_for(&calls).timeout(10))
            .finished()
            .await;

        assert!(begin.elapsed() >= Duration::from_secs(10));
        assert!(calls.completed.lock().unwrap().is_empty());
        assert_eq!(*calls.errors.lock().unwrap(), vec![ClientError::Timeout(10)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_not_above_minimum_is_ignored() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(URL, Duration::from_secs(30), RawResponse::new(200, "slow"));
        let calls = Arc::new(Calls::default());

        dispatcher(&transport)
            .send(URL, config_for(&calls).timeout(5))
            .finished()
            .await;

        assert!(calls.errors.lock().unwrap().is_empty());
        assert_eq!(calls.completed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_decode_modes() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(
            URL,
            Duration::ZERO,
            RawResponse::new(200, vec![1u8, 2, 3]).with_header("Content-Type", "image/png"),
        );
        let d = dispatcher(&transport);

        for (mode, expected) in [
            (
                ResponseType::Blob,
                Decoded::Blob(Blob {
                    content_type: Some("image/png".to_string()),
                    data: Bytes::from_static(&[1, 2, 3]),
                }),
            ),
            (ResponseType::ArrayBuffer, Decoded::Buffer(Bytes::from_static(&[1, 2, 3]))),
        ] {
            let calls = Arc::new(Calls::default());
            d.send(URL, config_for(&calls).response_type(mode)).finished().await;
            assert_eq!(*calls.completed.lock().unwrap(), vec![expected]);
        }

        let calls = Arc::new(Calls::default());
        d.send(URL, config_for(&calls)).finished().await;
        match &calls.completed.lock().unwrap()[0] {
            Decoded::Raw(raw) => assert_eq!(raw.status, 200),
            other => panic!("Expected raw passthrough, got {other:?}"),
        };
    }

    #[tokio::test]
    async fn test_json_decode_failure_goes_to_error() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(URL, Duration::ZERO, RawResponse::new(200, "not json"));
        let calls = Arc::new(Calls::default());

        dispatcher(&transport)
            .send(URL, config_for(&calls).response_type(ResponseType::Json))
            .finished()
            .await;

        assert!(calls.completed.lock().unwrap().is_empty());
        assert!(matches!(calls.errors.lock().unwrap()[0], ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn test_completion_error_routed_to_error_callback() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(URL, Duration::ZERO, RawResponse::new(200, "x"));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);

        let config = RequestConfig::new()
            .on_complete(|_| Err(ClientError::Decode("bad shape".to_string())))
            .on_error(move |e| sink.lock().unwrap().push(e));
        dispatcher(&transport).send(URL, config).finished().await;

        assert_eq!(
            *errors.lock().unwrap(),
            vec![ClientError::Decode("bad shape".to_string())]
        );
    }

    #[tokio::test]
    async fn test_missing_error_callback_drops_failure() {
        let transport = Arc::new(MockTransport::new());
        transport.fail(URL, Duration::ZERO, "connection refused");

        let handle = dispatcher(&transport).send(URL, RequestConfig::new());
        handle.finished().await;
        assert_eq!(transport.requests(), vec![URL.to_string()]);
    }

    #[tokio::test]
    async fn test_transport_failure_delivered() {
        let transport = Arc::new(MockTransport::new());
        transport.fail(URL, Duration::ZERO, "connection refused");
        let calls = Arc::new(Calls::default());

        dispatcher(&transport).send(URL, config_for(&calls)).finished().await;

        assert_eq!(
            *calls.errors.lock().unwrap(),
            vec![ClientError::Transport("connection refused".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_delivers_aborted() {
        let transport = Arc::new(MockTransport::new());
        transport.hang(URL);
        let calls = Arc::new(Calls::default());

        let handle = dispatcher(&transport).send(URL, config_for(&calls));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!handle.is_finished());
        handle.cancel();
        handle.finished().await;

        assert!(calls.completed.lock().unwrap().is_empty());
        assert_eq!(*calls.errors.lock().unwrap(), vec![ClientError::Aborted]);
    }

    #[test]
    fn test_into_json_rejects_other_modes() {
        let err = Decoded::Buffer(Bytes::new()).into_json().unwrap_err();
        assert_eq!(err, ClientError::Decode("Expected json, got arraybuffer".to_string()));
    }
}
