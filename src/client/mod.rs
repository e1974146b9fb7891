//! 请求层：传输抽象、分发器（超时/解码/回调）、策略注册表

pub mod dispatcher;
pub mod mock;
pub mod registry;
pub mod transport;

pub use dispatcher::{
    decode, Blob, Decoded, Dispatcher, OnComplete, OnError, RequestConfig, RequestHandle,
    ResponseType, MIN_TIMEOUT_SECS,
};
pub use mock::{MockReply, MockTransport};
pub use registry::{ApiStrategy, CompleteWrap, ErrorWrap, StrategyRegistry};
pub use transport::{HttpTransport, RawResponse, RequestOptions, Transport};
