//! 带监听的键值数据仓库
//!
//! set 无条件覆盖后，按注册顺序同步调用 (OnSet, key) 上的所有监听器；监听器的 panic 不捕获，直接传给 set 的调用方。
//! get 读取不存在的键返回 KeyNotFound，而不是默认值。
//!
//! 重入：监听器内对同一 key 再次 set 会递归触发自身，这里不做保护，由调用方避免。
//! 调用监听器时不持有任何锁，因此重入不会死锁。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use serde_json::Value;

use crate::core::ClientError;

/// 仓库事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreEvent {
    OnSet,
}

/// 监听器；按 Arc 指针判断是否为同一个监听器
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Default)]
pub struct DataStore {
    values: RwLock<HashMap<String, Value>>,
    listeners: Mutex<HashMap<(StoreEvent, String), Vec<Listener>>>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 覆盖 key 的值并通知监听器
    pub fn set(&self, key: &str, value: Value) {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.clone());

        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(StoreEvent::OnSet, key.to_string()))
            .cloned()
            .unwrap_or_default();
        tracing::debug!(key = %key, listeners = listeners.len(), "data store set");
        for listener in listeners {
            listener(&value);
        }
    }

    /// 读取副本；从未 set 过的 key 返回 KeyNotFound
    pub fn get(&self, key: &str) -> Result<Value, ClientError> {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
            .ok_or_else(|| ClientError::KeyNotFound(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(key)
    }

    /// 注册监听器；同一个 Arc 重复注册无效果
    pub fn add_listener(&self, event: StoreEvent, key: &str, listener: Listener) {
        let mut map = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        let list = map.entry((event, key.to_string())).or_default();
        if !list.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            list.push(listener);
        }
    }

    /// 移除指定监听器；listener 为 None 时移除该 key 上的全部监听器
    pub fn remove_listener(&self, event: StoreEvent, key: &str, listener: Option<&Listener>) {
        let mut map = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        let slot = (event, key.to_string());
        match listener {
            Some(target) => {
                if let Some(list) = map.get_mut(&slot) {
                    list.retain(|l| !Arc::ptr_eq(l, target));
                }
            }
            None => {
                map.remove(&slot);
            }
        }
    }

    pub fn listener_count(&self, event: StoreEvent, key: &str) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(event, key.to_string()))
            .map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> Listener {
        let log = Arc::clone(log);
        Arc::new(move |v: &Value| log.lock().unwrap().push(format!("{tag}:{v}")))
    }

    #[test]
    fn test_get_before_set_fails() {
        let store = DataStore::new();
        assert_eq!(
            store.get("currency").unwrap_err(),
            ClientError::KeyNotFound("currency".to_string())
        );
        assert!(!store.contains("currency"));
    }

    #[test]
    fn test_set_then_get_returns_value() {
        let store = DataStore::new();
        store.set("currency", json!({"usd": 1}));
        assert_eq!(store.get("currency").unwrap(), json!({"usd": 1}));
        store.set("currency", json!(null));
        assert_eq!(store.get("currency").unwrap(), json!(null));
    }

    #[test]
    fn test_listeners_called_in_order_once() {
        let store = DataStore::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        store.add_listener(StoreEvent::OnSet, "k", recorder(&log, "a"));
        store.add_listener(StoreEvent::OnSet, "k", recorder(&log, "b"));
        store.add_listener(StoreEvent::OnSet, "other", recorder(&log, "x"));

        store.set("k", json!(7));
        assert_eq!(*log.lock().unwrap(), vec!["a:7", "b:7"]);
    }

    #[test]
    fn test_duplicate_listener_ignored() {
        let store = DataStore::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let l = recorder(&log, "a");
        store.add_listener(StoreEvent::OnSet, "k", Arc::clone(&l));
        store.add_listener(StoreEvent::OnSet, "k", Arc::clone(&l));
        assert_eq!(store.listener_count(StoreEvent::OnSet, "k"), 1);

        store.set("k", json!(1));
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_remove_one_or_all() {
        let store = DataStore::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = recorder(&log, "a");
        let b = recorder(&log, "b");
        store.add_listener(StoreEvent::OnSet, "k", Arc::clone(&a));
        store.add_listener(StoreEvent::OnSet, "k", Arc::clone(&b));

        store.remove_listener(StoreEvent::OnSet, "k", Some(&a));
        store.set("k", json!(1));
        assert_eq!(*log.lock().unwrap(), vec!["b:1"]);

        store.remove_listener(StoreEvent::OnSet, "k", None);
        store.set("k", json!(2));
        assert_eq!(log.lock().unwrap().len(), 1);
        assert_eq!(store.listener_count(StoreEvent::OnSet, "k"), 0);

        // 不存在的 key 上移除是无操作
        store.remove_listener(StoreEvent::OnSet, "missing", Some(&a));
    }

    #[test]
    fn test_listener_may_read_store() {
        let store = Arc::new(DataStore::new());
        let seen = Arc::new(Mutex::new(None));
        let (s, out) = (Arc::clone(&store), Arc::clone(&seen));
        store.add_listener(
            StoreEvent::OnSet,
            "k",
            Arc::new(move |_: &Value| *out.lock().unwrap() = Some(s.get("k").unwrap())),
        );
        store.set("k", json!("v"));
        assert_eq!(*seen.lock().unwrap(), Some(json!("v")));
    }

    #[test]
    #[should_panic(expected = "listener failed")]
    fn test_listener_panic_propagates() {
        let store = DataStore::new();
        store.add_listener(StoreEvent::OnSet, "k", Arc::new(|_: &Value| panic!("listener failed")));
        store.set("k", json!(1));
    }
}
