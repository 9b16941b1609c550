// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretVec};
use serde::{Deserialize, Serialize};

use crate::{
    error::{self, Result},
    metadata,
};

use super::{IsPersistent, Storage};

/// An item in the freedesktop secret service, looked up by the entry name and
/// the origin it was cached for.
pub(crate) struct SecretService {
    keyring: oo7::Keyring,
    label: String,
    attributes: HashMap<String, String>,
}

impl SecretService {
    pub(crate) async fn new(origin: &url::Url, name: &str) -> Result<Self> {
        let prefix = &*metadata::CLIENT_TYPE_ID;
        Ok(Self {
            keyring: oo7::Keyring::new().await.map_err(error::Storage::from)?,
            label: format!("{} ({name})", *metadata::CLIENT_DISPLAY_NAME),
            attributes: HashMap::from([
                (format!("{prefix}.entry"), name.to_owned()),
                (format!("{prefix}.origin"), origin.as_str().to_owned()),
            ]),
        })
    }

    fn attributes(&self) -> HashMap<&str, &str> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect()
    }

    async fn item(&self) -> Result<Option<oo7::Item>> {
        Ok(self
            .keyring
            .search_items(self.attributes())
            .await
            .map_err(error::Storage::from)?
            .into_iter()
            .next())
    }
}

impl IsPersistent for SecretService {
    fn is_persistent(&self) -> bool {
        true
    }
}

#[async_trait]
impl<T: for<'de> Deserialize<'de> + Send + Serialize + Sync> Storage<T> for SecretService {
    async fn get(&mut self) -> Result<Option<T>> {
        Ok(match self.item().await? {
            Some(item) => {
                let secret = item.secret().await.map_err(error::Storage::from)?;
                Some(serde_json::from_slice(&secret)?)
            }
            None => None,
        })
    }

    async fn update(&mut self, data: &T) -> Result<()> {
        self.keyring
            .create_item(
                &self.label,
                self.attributes(),
                SecretVec::new(serde_json::to_vec(data)?).expose_secret(),
                true,
            )
            .await
            .map_err(error::Storage::from)?;
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        if let Some(item) = self.item().await? {
            item.delete().await.map_err(error::Storage::from)?;
        }
        Ok(())
    }
}
