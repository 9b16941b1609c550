// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use clap::ValueEnum;
use log::{debug, info, warn};
use serde_json::Value;
use tokio::sync::watch;

use crate::{
    api::{
        auth::{Login, Me, Signup},
        Client, Endpoint as _,
    },
    cache::IdentityCache,
    error::{Error, Result},
    identity::{Code, Identity},
};

/// What to believe when the server cannot confirm a cached identity during
/// startup.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum StalePolicy {
    /// Keep showing the cached identity, marked as unverified.
    #[default]
    Keep,
    /// Treat the user as logged out.
    Discard,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Snapshot {
    pub(crate) identity: Option<Identity>,
    /// Whether `identity` was confirmed by the server rather than read back
    /// from the cache.
    pub(crate) verified: bool,
    /// Set until the first initialization finishes, and again while a refresh
    /// is in flight. Nothing may redirect on a loading snapshot.
    pub(crate) loading: bool,
}

impl Snapshot {
    const fn determining() -> Self {
        Self {
            identity: None,
            verified: false,
            loading: true,
        }
    }
}

/// The current identity, or none, or still determining. Constructed once per
/// application run and shared with everything that needs to know who is
/// logged in.
pub(crate) struct Session {
    client: Arc<Client>,
    cache: IdentityCache,
    policy: StalePolicy,
    state: watch::Sender<Snapshot>,
}

impl Session {
    pub(crate) fn new(client: Arc<Client>, cache: IdentityCache, policy: StalePolicy) -> Self {
        let (state, _) = watch::channel(Snapshot::determining());
        Self {
            client,
            cache,
            policy,
            state,
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state.subscribe()
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    /// Replaces the in-memory identity without touching the server or cache.
    pub(crate) fn set(&self, identity: Option<Identity>) {
        self.state.send_modify(|state| {
            state.verified = identity.is_some();
            state.identity = identity;
        });
    }

    fn show_cached(&self, identity: Option<Identity>) {
        self.state.send_modify(|state| {
            state.verified = false;
            state.identity = identity;
        });
    }

    fn set_loading(&self, loading: bool) {
        self.state.send_modify(|state| state.loading = loading);
    }

    async fn adopt(&self, identity: Identity) -> Identity {
        self.cache.save(&identity).await;
        self.set(Some(identity.clone()));
        identity
    }

    async fn verify(&self) -> Result<Identity> {
        Me.execute(&self.client).await
    }

    async fn login_and_verify(&self, code: String) -> Result<Identity> {
        _ = Login::new(code).execute(&self.client).await?;
        self.verify().await
    }

    /// Works out who is logged in. The cached identity is shown right away,
    /// then confirmed with the server; loading always ends, whatever happens.
    pub(crate) async fn init(&self) -> Snapshot {
        let saved = self.cache.load().await;
        if saved.is_some() {
            self.show_cached(saved.clone());
        }

        match self.verify().await {
            Ok(identity) => {
                _ = self.adopt(identity).await;
            }
            Err(e) => {
                debug!("Session verification failed: {}", e);
                match saved.as_ref().and_then(Identity::usable_code) {
                    Some(code) => match self.login_and_verify(code).await {
                        Ok(identity) => {
                            _ = self.adopt(identity).await;
                        }
                        Err(e) => self.degrade(saved, &e),
                    },
                    None => self.set(None),
                }
            }
        }

        self.set_loading(false);
        self.snapshot()
    }

    fn degrade(&self, saved: Option<Identity>, cause: &Error) {
        match self.policy {
            StalePolicy::Keep => {
                warn!(
                    "Could not confirm the session with the server ({}); showing the cached identity",
                    cause
                );
                self.show_cached(saved);
            }
            StalePolicy::Discard => {
                info!("Could not confirm the session with the server ({}); logging out", cause);
                self.set(None);
            }
        }
    }

    /// Asks the server who is logged in, and believes it.
    pub(crate) async fn refresh(&self) -> Result<Identity> {
        self.set_loading(true);
        let result = match self.verify().await {
            Ok(identity) => Ok(self.adopt(identity).await),
            Err(e) => Err(e),
        };
        self.set_loading(false);
        result
    }

    /// Logs in with a teacher code. The canonical profile comes from `/me`;
    /// if that is unavailable the login response stands in when it carries a
    /// code.
    pub(crate) async fn sign_in(&self, code: &str) -> Result<Option<Identity>> {
        let response = Login::new(code.trim().to_owned())
            .execute(&self.client)
            .await?;

        let candidate = match self.verify().await {
            Ok(identity) => Some(identity),
            Err(e) => {
                debug!("Could not fetch the profile after login: {}", e);
                serde_json::from_value::<Identity>(response)
                    .ok()
                    .filter(|identity| identity.code.is_usable())
            }
        };

        Ok(match candidate {
            Some(identity) => Some(self.adopt(identity).await),
            None => None,
        })
    }

    /// Creates a teacher account and logs it in where possible.
    pub(crate) async fn register(&self, signup: Signup) -> Result<Option<Identity>> {
        let response = signup.execute(&self.client).await?;
        let returned = returned_code(&response);

        let profile = match self.verify().await {
            Ok(identity) => Some(identity),
            Err(e) => {
                debug!("No session after registration: {}", e);
                match returned.as_ref().filter(|code| code.is_usable()) {
                    Some(code) => self.login_and_verify(code.to_string()).await.ok(),
                    None => None,
                }
            }
        };

        let identity = profile.or_else(|| returned.map(Identity::new));
        Ok(match identity {
            Some(identity) => Some(self.adopt(identity).await),
            None => None,
        })
    }

    /// Forgets the identity here and in the cache.
    pub(crate) async fn teardown(&self) {
        self.cache.clear().await;
        self.set(None);
    }
}

fn returned_code(response: &Value) -> Option<Code> {
    response
        .get("code")
        .cloned()
        .and_then(|code| serde_json::from_value(code).ok())
}
