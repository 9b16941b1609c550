// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{self, HeaderMap},
    Method, StatusCode,
};
use serde_json::{Map, Value};
use url::Url;

use crate::{
    error::{HttpError, Result},
    metadata,
};

#[derive(Clone, Debug)]
pub(crate) struct Outgoing {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Vec<u8>>,
}

#[derive(Clone, Debug)]
pub(crate) struct Incoming {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Vec<u8>,
}

impl Incoming {
    pub(crate) fn is_json(&self) -> bool {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map_or(false, |value| value.contains("application/json"))
    }

    /// The body as JSON when the server says it is JSON (an empty object if it
    /// lied), otherwise as text.
    pub(crate) fn payload(&self) -> Value {
        if self.is_json() {
            serde_json::from_slice(&self.body).unwrap_or_else(|_| Value::Object(Map::new()))
        } else {
            Value::String(String::from_utf8_lossy(&self.body).into_owned())
        }
    }

    pub(crate) fn into_result(self) -> Result<Value> {
        let payload = self.payload();
        if self.status.is_success() {
            Ok(payload)
        } else {
            Err(HttpError::new(self.status, payload, self.is_json()).into())
        }
    }
}

#[async_trait]
pub(crate) trait Transport: Send + Sync {
    async fn send(&self, req: Outgoing) -> Result<Incoming>;
}

/// The real network. Its cookie store plays the part of the browser's: the
/// server's http-only session cookies live here and nowhere else.
pub(crate) struct Http {
    client: reqwest::Client,
}

impl Http {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .cookie_store(true)
                .user_agent(metadata::USER_AGENT.as_str())
                .connect_timeout(Duration::from_secs(15))
                .timeout(Duration::from_secs(60))
                .build()?,
        })
    }
}

#[async_trait]
impl Transport for Http {
    async fn send(&self, req: Outgoing) -> Result<Incoming> {
        let mut builder = self
            .client
            .request(req.method, req.url)
            .headers(req.headers);
        if let Some(body) = req.body {
            builder = builder.body(body);
        }

        let res = builder.send().await?;
        let status = res.status();
        let headers = res.headers().clone();
        let body = res.bytes().await?.to_vec();
        Ok(Incoming {
            status,
            headers,
            body,
        })
    }
}
