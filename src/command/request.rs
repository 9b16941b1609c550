// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::debug;
use reqwest::Method;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::{
    api,
    error::{self, Result},
};

use super::Context;

fn parse_method(s: &str) -> Result<Method, String> {
    Method::from_bytes(s.to_ascii_uppercase().as_bytes()).map_err(|e| e.to_string())
}

/// Send any request to the backend, with session recovery, and print the
/// response body.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    #[arg(short = 'X', long, default_value = "GET", value_parser = parse_method)]
    method: Method,

    /// A header to send, as `NAME:VALUE`. May be repeated.
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE")]
    headers: Vec<String>,

    /// A query parameter, as `KEY=VALUE`. Empty values are left out.
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// A JSON request body.
    #[arg(long, value_name = "JSON")]
    data: Option<String>,

    /// A request body sent exactly as given, with no content type added.
    #[arg(long, value_name = "TEXT", conflicts_with = "data")]
    data_raw: Option<String>,

    /// The path under the API base URL, or an absolute URL.
    #[clap()]
    path: String,
}

impl Command {
    fn build(&self) -> Result<api::Request> {
        let mut req = api::Request::new(self.method.clone(), &self.path);

        for header in &self.headers {
            let (name, value) = header
                .split_once(':')
                .ok_or_else(|| error::Request::Syntax(header.clone(), "NAME:VALUE"))?;
            req = req.with_header(name.trim(), value.trim())?;
        }

        for param in &self.params {
            let (key, value) = param
                .split_once('=')
                .ok_or_else(|| error::Request::Syntax(param.clone(), "KEY=VALUE"))?;
            req = req.with_param(key, value);
        }

        if let Some(ref data) = self.data {
            req = req.with_json(serde_json::from_str::<Value>(data)?);
        } else if let Some(ref raw) = self.data_raw {
            req = req.with_raw(raw.clone().into_bytes());
        }

        Ok(req)
    }
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let token = CancellationToken::new();
        let req = self.build()?.with_cancellation(token.clone());

        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Interrupted; cancelling the request");
                token.cancel();
            }
        });
        let result = ctx.client.fetch(&req).await;
        interrupt.abort();

        if let Err(error::Error::Http(ref e)) = result {
            debug!("Response body: {}", e.data);
        }

        match result? {
            Value::String(text) => println!("{text}"),
            data => println!("{}", serde_json::to_string_pretty(&data)?),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser as _;
    use serde_json::json;

    use crate::{
        api::{
            request::Body,
            transport::testing::{Reply, Scripted},
        },
        command::{testing, Command as _},
        error::Error,
    };

    use super::*;

    fn parse(args: &[&str]) -> Result<Command> {
        Command::try_parse_from(std::iter::once("request").chain(args.iter().copied()))
            .map_err(|_| Error::Command)
    }

    #[test]
    fn builds_from_arguments() -> Result<()> {
        let req = parse(&[
            "-X",
            "patch",
            "-H",
            "X-Request-Source: roster",
            "-p",
            "page=2",
            "-p",
            "search=",
            "--data",
            r#"{"age": 12}"#,
            "/student/S-1/update",
        ])?
        .build()?;

        assert_eq!(req.method, Method::PATCH);
        assert_eq!(req.path, "/student/S-1/update");
        assert_eq!(
            req.headers.get("x-request-source").and_then(|v| v.to_str().ok()),
            Some("roster")
        );
        assert_eq!(
            req.params,
            [
                ("page".to_owned(), json!("2")),
                ("search".to_owned(), json!("")),
            ]
        );
        assert_eq!(req.body, Some(Body::Json(json!({"age": 12}))));
        Ok(())
    }

    #[test]
    fn raw_body_is_kept_verbatim() -> Result<()> {
        let req = parse(&["-X", "POST", "--data-raw", "code=D-1", "/login"])?.build()?;
        assert_eq!(req.body, Some(Body::Raw(b"code=D-1".to_vec())));
        assert!(parse(&["--data", "{}", "--data-raw", "x", "/login"]).is_err());
        Ok(())
    }

    #[test]
    fn rejects_malformed_header() -> Result<()> {
        let result = parse(&["-H", "no-colon", "/me"])?.build();
        assert!(matches!(
            result,
            Err(Error::Request(error::Request::Syntax(ref arg, "NAME:VALUE"))) if arg == "no-colon"
        ));
        Ok(())
    }

    #[test]
    fn rejects_malformed_body() -> Result<()> {
        let result = parse(&["--data", "{oops", "/me"])?.build();
        assert!(matches!(result, Err(Error::Json(_))));
        Ok(())
    }

    #[tokio::test]
    async fn malformed_arguments_send_nothing() -> Result<()> {
        let backend = Scripted::new().on(Method::GET, "/api/v1/me", [Reply::json(200, &json!({"code": "D-1"}))]);
        let ctx = testing::context(&backend).await?;
        let before = backend.sent().len();

        let result = parse(&["-p", "no-equals", "/student/list"])?.execute(&ctx).await;
        assert!(matches!(result, Err(Error::Request(error::Request::Syntax(..)))));
        assert_eq!(backend.sent().len(), before);
        Ok(())
    }

    #[tokio::test]
    async fn sends_through_the_session() -> Result<()> {
        let backend = Scripted::new()
            .on(Method::GET, "/api/v1/me", [Reply::json(200, &json!({"code": "D-1"}))])
            .on(Method::GET, "/api/v1/payments/total", [Reply::json(200, &json!({"total": 10}))]);
        let ctx = testing::context(&backend).await?;

        parse(&["-p", "month=", "/payments/total"])?.execute(&ctx).await?;
        assert_eq!(backend.count(&Method::GET, "/api/v1/payments/total"), 1);
        Ok(())
    }
}
