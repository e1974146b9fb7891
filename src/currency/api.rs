//! get_currency 策略：JSON 解码，完成时把 rates 写入数据仓库 "currency"，再把仓库中的值交给调用方

use std::sync::Arc;

use crate::client::{ApiStrategy, Decoded, OnComplete, ResponseType, StrategyRegistry};
use crate::core::ClientError;
use crate::store::DataStore;

pub const GET_CURRENCY: &str = "get_currency";
pub const CURRENCY_KEY: &str = "currency";
pub const DEFAULT_CURRENCY_URL: &str = "https://api.coingecko.com/api/v3/exchange_rates";

/// 构造策略；rates 缺失或不是对象时视为解码失败
pub fn currency_strategy(url: &str, timeout_secs: u64, store: Arc<DataStore>) -> ApiStrategy {
    ApiStrategy::new()
        .url(url)
        .response_type(ResponseType::Json)
        .timeout(timeout_secs)
        .wrap_complete(move |on_complete: Option<OnComplete>| -> OnComplete {
            let store = Arc::clone(&store);
            Box::new(move |decoded: Decoded| {
                let body = decoded.into_json()?;
                let rates = body
                    .get("rates")
                    .filter(|r| r.is_object())
                    .cloned()
                    .ok_or_else(|| ClientError::Decode("missing `rates` object".to_string()))?;
                store.set(CURRENCY_KEY, rates);
                let stored = store.get(CURRENCY_KEY)?;
                match on_complete {
                    Some(f) => f(Decoded::Json(stored)),
                    None => Ok(()),
                }
            })
        })
}

pub fn register_currency_strategy(
    registry: &mut StrategyRegistry,
    store: Arc<DataStore>,
    url: &str,
    timeout_secs: u64,
) -> Result<(), ClientError> {
    registry.register(GET_CURRENCY, currency_strategy(url, timeout_secs, store), false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Dispatcher, MockTransport, RawResponse, Transport};
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    const URL: &str = "https://rates.test/exchange_rates";

    fn setup() -> (StrategyRegistry, Arc<DataStore>, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let store = Arc::new(DataStore::new());
        let mut registry = StrategyRegistry::new(Dispatcher::new(transport.clone() as Arc<dyn Transport>));
        register_currency_strategy(&mut registry, Arc::clone(&store), URL, 10).unwrap();
        (registry, store, transport)
    }

    #[test]
    fn test_register_twice_fails() {
        let (mut registry, store, _) = setup();
        let err = register_currency_strategy(&mut registry, store, URL, 10).unwrap_err();
        assert_eq!(err, ClientError::DuplicateStrategy(GET_CURRENCY.to_string()));
    }

    #[tokio::test]
    async fn test_missing_rates_is_decode_error() {
        let (registry, store, transport) = setup();
        transport.respond(URL, Duration::ZERO, RawResponse::json(&json!({"data": {}})));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);

        registry
            .call(GET_CURRENCY, |_| Ok(()), move |e| sink.lock().unwrap().push(e))
            .unwrap()
            .finished()
            .await;

        assert!(matches!(errors.lock().unwrap()[0], ClientError::Decode(_)));
        assert!(!store.contains(CURRENCY_KEY));
    }
}
