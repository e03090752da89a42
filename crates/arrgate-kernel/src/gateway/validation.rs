//! Wire-level call description and its validation into a [`CallRequest`].
//!
//! [`RawCallRequest`] mirrors the JSON body accepted by `POST /proxy`:
//!
//! ```json
//! { "url": "...", "method": "GET", "data": {}, "params": {}, "headers": {} }
//! ```
//!
//! Conversion into [`CallRequest`] is the only place a call can be rejected,
//! and it happens before any network I/O.

use super::error::KernelError;
use super::types::{CallRequest, HttpMethod};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Call description exactly as received from the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCallRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_params")]
    pub params: Vec<(String, String)>,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
}

impl TryFrom<RawCallRequest> for CallRequest {
    type Error = KernelError;

    fn try_from(raw: RawCallRequest) -> Result<Self, Self::Error> {
        let target = raw
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or(KernelError::MissingTarget)?;

        let method = match raw.method.as_deref() {
            None => HttpMethod::Get,
            Some(m) => {
                HttpMethod::from_str_ci(m).ok_or_else(|| KernelError::UnsupportedMethod(m.to_string()))?
            }
        };

        Ok(CallRequest {
            target,
            method,
            body: raw.data.filter(|d| !d.is_null()),
            query: raw.params,
            headers: raw.headers.unwrap_or_default(),
        })
    }
}

/// Normalise a service base URL the way clients store it.
///
/// Adds `http://` when no scheme is present and strips trailing slashes.
///
/// ```rust
/// use arrgate_kernel::gateway::normalize_base_url;
///
/// assert_eq!(normalize_base_url("192.168.1.50:8181/"), "http://192.168.1.50:8181");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim();
    let lower = trimmed.to_ascii_lowercase();
    let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    with_scheme.trim_end_matches('/').to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Query parameter decoding
// ─────────────────────────────────────────────────────────────────────────────

/// Accepts `null` or a JSON object whose values are strings, numbers or
/// booleans. Numbers and booleans are stringified, `null` values dropped,
/// and object order is preserved.
fn deserialize_params<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ParamsVisitor;

    impl<'de> Visitor<'de> for ParamsVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object of query parameters or null")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut params = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, Value>()? {
                let value = match value {
                    Value::Null => continue,
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    other => {
                        return Err(de::Error::custom(format!(
                            "query parameter '{key}' must be a scalar, got {other}"
                        )));
                    }
                };
                params.push((key, value));
            }
            Ok(params)
        }
    }

    deserializer.deserialize_any(ParamsVisitor)
}
