// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Method,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{self, Result};

use super::{base::BaseUrl, transport::Outgoing};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Body {
    /// Serialized as JSON, with a JSON content type unless one is given.
    Json(Value),
    /// Sent as-is, with no content type added.
    Raw(Vec<u8>),
}

/// Everything needed to (re)issue one logical operation.
#[derive(Clone, Debug, Default)]
pub(crate) struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Body>,
    pub(crate) params: Vec<(String, Value)>,
    pub(crate) cancel: Option<CancellationToken>,
}

impl Request {
    pub(crate) fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_owned(),
            ..Self::default()
        }
    }

    pub(crate) fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub(crate) fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    pub(crate) fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(error::Request::from)?;
        let value = HeaderValue::from_str(value).map_err(error::Request::from)?;
        _ = self.headers.insert(name, value);
        Ok(self)
    }

    pub(crate) fn with_json<V: Into<Value>>(mut self, body: V) -> Self {
        self.body = Some(Body::Json(body.into()));
        self
    }

    pub(crate) fn with_raw(mut self, body: Vec<u8>) -> Self {
        self.body = Some(Body::Raw(body));
        self
    }

    /// Adds a query parameter. `None` converts to `null`, so optional values
    /// can be passed straight through and are left out when absent.
    pub(crate) fn with_param<V: Into<Value>>(mut self, key: &str, value: V) -> Self {
        self.params.push((key.to_owned(), value.into()));
        self
    }

    pub(crate) fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub(crate) fn prepare(&self, base: &BaseUrl) -> Result<Outgoing> {
        let mut url = base.resolve(&self.path)?;
        for (key, value) in &self.params {
            if let Some(value) = query_value(value) {
                set_query_param(&mut url, key, &value);
            }
        }

        let mut headers = HeaderMap::new();
        _ = headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.extend(self.headers.clone());

        let body = match self.body {
            Some(Body::Json(ref value)) => {
                if !headers.contains_key(header::CONTENT_TYPE) {
                    _ = headers.insert(
                        header::CONTENT_TYPE,
                        HeaderValue::from_static("application/json"),
                    );
                }
                Some(serde_json::to_vec(value)?)
            }
            Some(Body::Raw(ref bytes)) => Some(bytes.clone()),
            None => None,
        };

        Ok(Outgoing {
            method: self.method.clone(),
            url,
            headers,
            body,
        })
    }
}

/// The query string form of a parameter, or `None` when it should be left
/// out. Only `null` and the empty string are dropped; `0` and `false` stay.
fn query_value(value: &Value) -> Option<String> {
    match *value {
        Value::Null => None,
        Value::String(ref s) if s.is_empty() => None,
        Value::String(ref s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) | Value::Object(_) => Some(value.to_string()),
        Value::Array(ref items) => Some(
            items
                .iter()
                .map(|item| match *item {
                    Value::Null => String::new(),
                    Value::String(ref s) => s.clone(),
                    Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
                        item.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
    }
}

fn set_query_param(url: &mut Url, key: &str, value: &str) {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut pairs = url.query_pairs_mut();
    _ = pairs.clear();
    _ = pairs.extend_pairs(kept);
    _ = pairs.append_pair(key, value);
}
