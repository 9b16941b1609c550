// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

pub(crate) mod attendance;
pub(crate) mod auth;
pub(crate) mod base;
mod client;
pub(crate) mod payments;
pub(crate) mod request;
pub(crate) mod students;
pub(crate) mod transport;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

pub(crate) use base::BaseUrl;
pub(crate) use client::Client;
pub(crate) use request::Request;

/// A typed backend operation. Implementors describe the request; the shared
/// client takes care of sending it, recovering the session and decoding.
#[async_trait]
pub(crate) trait Endpoint: Sized + Send {
    type Response: for<'de> Deserialize<'de>;

    fn into_request(self) -> Request;

    async fn execute(self, client: &Client) -> Result<Self::Response> {
        let data = client.fetch(&self.into_request()).await?;
        Ok(serde_json::from_value(data)?)
    }
}
