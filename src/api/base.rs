// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use url::Url;

use crate::error::Result;

pub(crate) const DEFAULT_BASE_URL: &str = "/api/v1";

/// Where relative API paths are rooted. A relative base (the default
/// `/api/v1`) hangs off `origin`, the way a page resolves it against its own
/// location.
#[derive(Clone, Debug)]
pub(crate) struct BaseUrl {
    origin: Url,
    prefix: String,
}

impl BaseUrl {
    pub(crate) fn new(origin: Url, prefix: &str) -> Self {
        let prefix = prefix.strip_suffix('/').unwrap_or(prefix);
        Self {
            origin,
            prefix: if prefix.is_empty() {
                DEFAULT_BASE_URL.to_owned()
            } else {
                prefix.to_owned()
            },
        }
    }

    /// Resolves `path` to a full URL. Absolute `http(s)` URLs are used as-is;
    /// anything else is appended to the prefix with exactly one slash between.
    pub(crate) fn resolve(&self, path: &str) -> Result<Url> {
        if let Some(url) = absolute(path) {
            return Ok(url);
        }

        let separator = if path.starts_with('/') { "" } else { "/" };
        let raw = format!("{}{separator}{path}", self.prefix);
        match absolute(&raw) {
            Some(url) => Ok(url),
            None => Ok(self.origin.join(&raw)?),
        }
    }
}

fn absolute(candidate: &str) -> Option<Url> {
    Url::parse(candidate)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}
