// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::{
    error::{self, Result},
    metadata,
};

use super::{IsPersistent, Storage};

const EXPIRES_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";
const EPOCH_EXPIRES: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// A single named cookie kept in a jar file under the data directory. The
/// value is JSON, URL-encoded, with an `Expires` attribute that is honoured on
/// read.
pub(crate) struct Cookie {
    path: PathBuf,
    name: String,
    max_age: Duration,
}

impl Cookie {
    pub(crate) const DEFAULT_MAX_AGE_DAYS: i64 = 7;

    pub(crate) fn new(name: &str) -> Option<Self> {
        metadata::PROJECT_DIRS
            .as_ref()
            .map(|dirs| Self::with_path(dirs.data_dir().join("cookies").join(name), name))
    }

    pub(crate) fn with_path<P: AsRef<Path>>(path: P, name: &str) -> Self {
        Self {
            path: path.as_ref().to_owned(),
            name: name.to_owned(),
            max_age: Duration::days(Self::DEFAULT_MAX_AGE_DAYS),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    fn line(&self, value: &str, expires: &str) -> String {
        format!(
            "{}={value}; Expires={expires}; Path=/; SameSite=Lax\n",
            self.name
        )
    }

    fn write(&self, line: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, line)?;
        Ok(())
    }

    /// The decoded value of this cookie in `jar`, unless it is missing or
    /// expired at `now`.
    fn find(&self, jar: &str, now: DateTime<Utc>) -> Result<Option<String>> {
        for line in jar.lines() {
            let mut attributes = line.split("; ");
            let Some((key, value)) = attributes.next().and_then(|pair| pair.split_once('=')) else {
                continue;
            };
            if key != self.name {
                continue;
            }

            for attribute in attributes {
                if let Some(expires) = attribute.strip_prefix("Expires=") {
                    let expires = DateTime::parse_from_rfc2822(expires)
                        .map_err(|_| error::Storage::MalformedCookie)?;
                    if expires <= now {
                        return Ok(None);
                    }
                }
            }

            return Ok(Some(decode(value)));
        }

        Ok(None)
    }
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn decode(value: &str) -> String {
    form_urlencoded::parse(value.as_bytes())
        .next()
        .map_or_else(String::new, |(decoded, _)| decoded.into_owned())
}

impl IsPersistent for Cookie {
    fn is_persistent(&self) -> bool {
        true
    }
}

#[async_trait]
impl<T: Send + Serialize + Sync + for<'de> Deserialize<'de>> Storage<T> for Cookie {
    async fn get(&mut self) -> Result<Option<T>> {
        let jar = match fs::read_to_string(&self.path) {
            Ok(jar) => jar,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match self.find(&jar, Utc::now())? {
            Some(value) if !value.is_empty() => Ok(Some(serde_json::from_str(&value)?)),
            Some(_) | None => Ok(None),
        }
    }

    async fn update(&mut self, data: &T) -> Result<()> {
        let value = encode(&serde_json::to_string(data)?);
        let expires = (Utc::now() + self.max_age).format(EXPIRES_FORMAT).to_string();
        self.write(&self.line(&value, &expires))
    }

    async fn clear(&mut self) -> Result<()> {
        self.write(&self.line("", EPOCH_EXPIRES))
    }
}
