// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_recursion::async_recursion;
use log::debug;
use serde_json::Value;

use crate::{
    cache::IdentityCache,
    error::{Error, Result},
};

use super::{auth, base::BaseUrl, request::Request, transport::Transport, Endpoint as _};

/// Which send of a logical operation this is. Only the initial send may
/// trigger session recovery; the replay after recovery never does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Attempt {
    Initial,
    Replay,
}

pub(crate) struct Client {
    transport: Box<dyn Transport>,
    base: BaseUrl,
    identity: IdentityCache,
}

impl Client {
    pub(crate) fn new(transport: Box<dyn Transport>, base: BaseUrl, identity: IdentityCache) -> Self {
        Self {
            transport,
            base,
            identity,
        }
    }

    /// Sends `req` and returns the parsed body of a 2xx response. An expired
    /// session is recovered at most once by logging in again with the cached
    /// identity code and replaying the request.
    pub(crate) async fn fetch(&self, req: &Request) -> Result<Value> {
        self.dispatch(req, Attempt::Initial).await
    }

    #[async_recursion]
    async fn dispatch(&self, req: &Request, attempt: Attempt) -> Result<Value> {
        let failure = match self.send(req).await {
            Err(Error::Http(e)) if e.is_auth_failure() => e,
            other => return other,
        };

        match attempt {
            Attempt::Replay => Err(failure.into()),
            Attempt::Initial => {
                debug!(
                    "{} {} was rejected with {}; trying to recover the session",
                    req.method, req.path, failure.status
                );
                if self.reauthenticate().await {
                    self.dispatch(req, Attempt::Replay).await
                } else {
                    Err(failure.into())
                }
            }
        }
    }

    async fn reauthenticate(&self) -> bool {
        let Some(code) = self
            .identity
            .load()
            .await
            .and_then(|identity| identity.usable_code())
        else {
            debug!("No cached identity to recover the session with");
            return false;
        };

        let login = auth::Login::new(code).into_request();
        match self.dispatch(&login, Attempt::Replay).await {
            Ok(_) => true,
            Err(e) => {
                debug!("Silent login failed: {}", e);
                false
            }
        }
    }

    async fn send(&self, req: &Request) -> Result<Value> {
        if req.cancel.as_ref().map_or(false, |token| token.is_cancelled()) {
            return Err(Error::Cancelled);
        }

        let outgoing = req.prepare(&self.base)?;
        debug!("{} {}", outgoing.method, outgoing.url);

        let exchange = self.transport.send(outgoing);
        let incoming = match req.cancel {
            Some(ref token) => tokio::select! {
                biased;
                () = token.cancelled() => return Err(Error::Cancelled),
                res = exchange => res?,
            },
            None => exchange.await?,
        };
        incoming.into_result()
    }
}

#[cfg(test)]
mod tests {
    use reqwest::{Method, StatusCode};
    use serde_json::json;
    use tokio_util::sync::CancellationToken;
    use url::Url;

    use crate::{
        api::{
            base::DEFAULT_BASE_URL,
            transport::testing::{Reply, Scripted},
        },
        cache::{IdentityCache, IDENTITY_COOKIE},
        identity::Identity,
        storage::Memory,
    };

    use super::*;

    const LIST: &str = "/api/v1/student/list";
    const LOGIN: &str = "/api/v1/login";

    fn client(backend: &Scripted, cached: Option<Identity>) -> Result<Client> {
        let storage = cached.map_or_else(Memory::new, Memory::with);
        Ok(Client::new(
            Box::new(backend.clone()),
            BaseUrl::new(Url::parse("http://127.0.0.1:8000")?, DEFAULT_BASE_URL),
            IdentityCache::new(IDENTITY_COOKIE, Box::new(storage)),
        ))
    }

    fn denied() -> Reply {
        Reply::json(401, &json!({"detail": "Authentication credentials were not provided."}))
    }

    fn logged_in() -> Reply {
        Reply::json(200, &json!({"code": "D-1", "first_name": "Amina"}))
    }

    fn status(result: &Result<Value>) -> Option<StatusCode> {
        result.as_ref().err().and_then(Error::status)
    }

    #[tokio::test]
    async fn success_returns_payload() -> Result<()> {
        let backend = Scripted::new().on(Method::GET, LIST, [Reply::json(200, &json!([{"code": "S-1"}]))]);

        let data = client(&backend, None)?.fetch(&Request::get("/student/list")).await?;
        assert_eq!(data, json!([{"code": "S-1"}]));
        Ok(())
    }

    #[tokio::test]
    async fn recovers_once_and_returns_replayed_payload() -> Result<()> {
        let backend = Scripted::new()
            .on(Method::GET, LIST, [denied(), Reply::json(200, &json!([]))])
            .on(Method::POST, LOGIN, [logged_in()]);

        let data = client(&backend, Some(Identity::new("D-1")))?
            .fetch(&Request::get("/student/list"))
            .await?;

        assert_eq!(data, json!([]));
        assert_eq!(backend.count(&Method::GET, LIST), 2);
        assert_eq!(backend.count(&Method::POST, LOGIN), 1);

        let login = &backend.sent()[1];
        assert_eq!(login.body.as_deref(), Some(&br#"{"code":"D-1"}"#[..]));
        Ok(())
    }

    #[tokio::test]
    async fn recovery_is_attempted_at_most_once() -> Result<()> {
        let backend = Scripted::new()
            .on(Method::GET, LIST, [denied()])
            .on(Method::POST, LOGIN, [logged_in()]);

        let result = client(&backend, Some(Identity::new("D-1")))?
            .fetch(&Request::get("/student/list"))
            .await;

        assert_eq!(status(&result), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(backend.count(&Method::GET, LIST), 2);
        assert_eq!(backend.count(&Method::POST, LOGIN), 1);
        assert_eq!(backend.sent().len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn forbidden_also_recovers() -> Result<()> {
        let backend = Scripted::new()
            .on(
                Method::DELETE,
                "/api/v1/student/S-1/delete",
                [Reply::json(403, &json!({})), Reply::json(200, &json!({"ok": true}))],
            )
            .on(Method::POST, LOGIN, [logged_in()]);

        let data = client(&backend, Some(Identity::new("D-1")))?
            .fetch(&Request::new(Method::DELETE, "/student/S-1/delete"))
            .await?;
        assert_eq!(data, json!({"ok": true}));
        Ok(())
    }

    #[tokio::test]
    async fn no_cached_identity_means_no_login() -> Result<()> {
        let backend = Scripted::new()
            .on(Method::GET, LIST, [denied()])
            .on(Method::POST, LOGIN, [logged_in()]);

        let result = client(&backend, None)?.fetch(&Request::get("/student/list")).await;

        assert_eq!(status(&result), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(backend.count(&Method::POST, LOGIN), 0);
        assert_eq!(backend.count(&Method::GET, LIST), 1);
        Ok(())
    }

    #[tokio::test]
    async fn unusable_cached_code_means_no_login() -> Result<()> {
        let backend = Scripted::new()
            .on(Method::GET, LIST, [denied()])
            .on(Method::POST, LOGIN, [logged_in()]);

        let result = client(&backend, Some(Identity::new("")))?
            .fetch(&Request::get("/student/list"))
            .await;

        assert_eq!(status(&result), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(backend.count(&Method::POST, LOGIN), 0);
        Ok(())
    }

    #[tokio::test]
    async fn failed_login_raises_the_original_error() -> Result<()> {
        let backend = Scripted::new()
            .on(Method::GET, LIST, [Reply::json(403, &json!({"detail": "expired"}))])
            .on(Method::POST, LOGIN, [Reply::json(400, &json!({"detail": "Invalid code"}))]);

        let result = client(&backend, Some(Identity::new("D-9")))?
            .fetch(&Request::get("/student/list"))
            .await;

        match result {
            Err(Error::Http(e)) => {
                assert_eq!(e.status, StatusCode::FORBIDDEN);
                assert_eq!(e.message, "expired");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(backend.count(&Method::GET, LIST), 1);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_login_does_not_recover_itself() -> Result<()> {
        let backend = Scripted::new()
            .on(Method::GET, LIST, [denied()])
            .on(Method::POST, LOGIN, [denied()]);

        let result = client(&backend, Some(Identity::new("D-1")))?
            .fetch(&Request::get("/student/list"))
            .await;

        assert_eq!(status(&result), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(backend.count(&Method::POST, LOGIN), 1);
        assert_eq!(backend.count(&Method::GET, LIST), 1);
        Ok(())
    }

    #[tokio::test]
    async fn other_failures_skip_recovery() -> Result<()> {
        let backend = Scripted::new()
            .on(Method::GET, LIST, [Reply::json(500, &json!({"message": "boom"}))])
            .on(Method::POST, LOGIN, [logged_in()]);

        let result = client(&backend, Some(Identity::new("D-1")))?
            .fetch(&Request::get("/student/list"))
            .await;

        assert_eq!(status(&result), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(backend.count(&Method::POST, LOGIN), 0);
        Ok(())
    }

    #[tokio::test]
    async fn transport_failures_skip_recovery() -> Result<()> {
        let backend = Scripted::new()
            .on(Method::GET, LIST, [Reply::Unreachable])
            .on(Method::POST, LOGIN, [logged_in()]);

        let result = client(&backend, Some(Identity::new("D-1")))?
            .fetch(&Request::get("/student/list"))
            .await;

        assert!(matches!(result, Err(Error::Io(_))));
        assert_eq!(backend.count(&Method::POST, LOGIN), 0);
        Ok(())
    }

    #[tokio::test]
    async fn replay_repeats_the_original_request() -> Result<()> {
        let path = "/api/v1/student/S-1/update";
        let backend = Scripted::new()
            .on(Method::PATCH, path, [denied(), Reply::json(200, &json!({"age": 12}))])
            .on(Method::POST, LOGIN, [logged_in()]);

        let req = Request::new(Method::PATCH, "/student/S-1/update")
            .with_header("x-request-source", "roster")?
            .with_param("notify", false)
            .with_json(json!({"age": 12}));
        let _ = client(&backend, Some(Identity::new("D-1")))?.fetch(&req).await?;

        let sent = backend.sent();
        let (first, replay) = (&sent[0], &sent[2]);
        assert_eq!(first.url, replay.url);
        assert_eq!(first.body, replay.body);
        assert_eq!(first.headers, replay.headers);
        assert_eq!(replay.url.query(), Some("notify=false"));
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_before_sending() -> Result<()> {
        let backend = Scripted::new().on(Method::GET, LIST, [Reply::json(200, &json!([]))]);
        let token = CancellationToken::new();
        token.cancel();

        let result = client(&backend, None)?
            .fetch(&Request::get("/student/list").with_cancellation(token))
            .await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(backend.sent().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_while_in_flight() -> Result<()> {
        let backend = Scripted::new().on(Method::GET, LIST, [Reply::Hang]);
        let client = client(&backend, None)?;
        let token = CancellationToken::new();
        let req = Request::get("/student/list").with_cancellation(token.clone());

        let fetch = client.fetch(&req);
        tokio::pin!(fetch);
        assert!(futures_util::poll!(&mut fetch).is_pending());
        token.cancel();

        assert!(matches!(fetch.await, Err(Error::Cancelled)));
        assert_eq!(backend.sent().len(), 1);
        Ok(())
    }
}
