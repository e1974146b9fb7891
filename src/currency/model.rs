//! 汇率数据模型
//!
//! 接口实际返回的字段比这里声明的多，解码时忽略多余字段；符号顺序保持接口返回顺序。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::ClientError;

/// 单个币种
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyInfo {
    pub name: String,
    pub unit: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
}

/// 符号 → 币种信息，有序
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrencyMap {
    entries: Vec<(String, CurrencyInfo)>,
}

impl CurrencyMap {
    /// 从 `{ symbol: { name, unit, type, value } }` 解码
    pub fn from_value(value: &Value) -> Result<Self, ClientError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ClientError::Decode("rates is not an object".to_string()))?;
        let entries = obj
            .iter()
            .map(|(symbol, info)| {
                CurrencyInfo::deserialize(info)
                    .map(|info| (symbol.clone(), info))
                    .map_err(|e| ClientError::Decode(format!("rate `{symbol}`: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<(&str, &CurrencyInfo)> {
        self.entries.get(index).map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CurrencyInfo)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, CurrencyInfo)> for CurrencyMap {
    fn from_iter<I: IntoIterator<Item = (String, CurrencyInfo)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_keeps_order_and_ignores_extra_fields() {
        let value = json!({
            "btc": {"name": "Bitcoin", "unit": "BTC", "value": 1.0, "type": "crypto"},
            "eth": {"name": "Ether", "unit": "ETH", "value": 15.2, "type": "crypto", "extra": true},
            "aed": {"name": "UAE Dirham", "unit": "DH", "value": 250000.5, "type": "fiat"}
        });
        let map = CurrencyMap::from_value(&value).unwrap();
        let symbols: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(symbols, vec!["btc", "eth", "aed"]);
        assert_eq!(map.get(1).unwrap().1.kind, "crypto");
        assert!(map.get(3).is_none());
    }

    #[test]
    fn test_decode_rejects_bad_shape() {
        assert!(matches!(
            CurrencyMap::from_value(&json!([1, 2])),
            Err(ClientError::Decode(_))
        ));
        assert!(matches!(
            CurrencyMap::from_value(&json!({"usd": {"name": "US Dollar"}})),
            Err(ClientError::Decode(_))
        ));
    }
}
