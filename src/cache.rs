// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use futures_util::lock::Mutex;
use log::{debug, warn};

use crate::{
    identity::Identity,
    storage::{self, IsPersistent as _},
};

pub(crate) const IDENTITY_COOKIE: &str = "doctor_profile";
pub(crate) const SELECTED_STUDENT_KEY: &str = "selectedStudentCode";

/// Best-effort access to a single persisted value. Nothing here ever fails:
/// unreadable entries are misses and failed writes are logged and dropped.
pub(crate) struct Cache<T> {
    name: &'static str,
    storage: Arc<Mutex<Box<dyn storage::Storage<T>>>>,
}

pub(crate) type IdentityCache = Cache<Identity>;

impl<T> Clone for Cache<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<T: Send + Sync + 'static> Cache<T> {
    pub(crate) fn new(name: &'static str, storage: Box<dyn storage::Storage<T>>) -> Self {
        Self {
            name,
            storage: Arc::new(Mutex::new(storage)),
        }
    }

    pub(crate) fn in_memory(name: &'static str) -> Self
    where
        T: Clone,
    {
        Self::new(name, Box::new(storage::Memory::<T>::new()))
    }

    pub(crate) async fn is_persistent(&self) -> bool {
        self.storage.lock().await.is_persistent()
    }

    pub(crate) async fn save(&self, data: &T) {
        if let Err(e) = self.storage.lock().await.update(data).await {
            warn!("Could not cache {}: {}", self.name, e);
        }
    }

    pub(crate) async fn load(&self) -> Option<T> {
        match self.storage.lock().await.get().await {
            Ok(data) => data,
            Err(e) => {
                debug!("Treating unreadable {} cache entry as missing: {}", self.name, e);
                None
            }
        }
    }

    pub(crate) async fn clear(&self) {
        if let Err(e) = self.storage.lock().await.clear().await {
            warn!("Could not clear cached {}: {}", self.name, e);
        }
    }
}
