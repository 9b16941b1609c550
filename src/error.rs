// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{convert::Infallible, io, result};

use reqwest::{
    header::{InvalidHeaderName, InvalidHeaderValue},
    StatusCode,
};
use thiserror::Error;

pub(crate) type Result<T, E = Error> = result::Result<T, E>;

#[derive(Error, Debug)]
pub(crate) enum Error {
    #[error("IO operation failed: {0}")]
    Io(#[from] io::Error),
    #[error("JSON format error: {0}")]
    Json(serde_json::Error),
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
    #[error("{0}")]
    Http(#[from] HttpError),
    #[error("request construction error: {0}")]
    Request(#[from] Request),
    #[error("invalid registration: {0}")]
    Validation(#[from] Validation),
    #[error("storage error: {0}")]
    Storage(#[from] Storage),
    #[error("password retrieval error: {0}")]
    Password(#[from] Password),
    #[error("command execution failed")]
    Command,
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// The HTTP status of a failed response, if this error came from one.
    pub(crate) const fn status(&self) -> Option<StatusCode> {
        match *self {
            Self::Http(ref e) => Some(e.status),
            Self::Io(_)
            | Self::Json(_)
            | Self::Transport(_)
            | Self::Url(_)
            | Self::Request(_)
            | Self::Validation(_)
            | Self::Storage(_)
            | Self::Password(_)
            | Self::Command
            | Self::Cancelled => None,
        }
    }
}

impl From<pinentry::Error> for Error {
    fn from(value: pinentry::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(
            clippy::wildcard_enum_match_arm,
            clippy::match_wildcard_for_single_variants
        )]
        match value {
            pinentry::Error::Cancelled | pinentry::Error::Timeout => Self::Cancelled,
            pinentry::Error::Io(e) => Self::Io(e),
            _ => Self::Password(Password::Pinentry(value)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(clippy::wildcard_enum_match_arm)]
        match value.classify() {
            serde_json::error::Category::Io => Self::Io(value.into()),
            _ => Self::Json(value),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Io(value.into())
    }
}

impl From<Infallible> for Error {
    fn from(_: Infallible) -> Self {
        unreachable!()
    }
}

/// A non-2xx response, after any session recovery has been given its chance.
#[derive(Error, Debug, Clone)]
#[error("{message} (HTTP {})", .status.as_u16())]
pub(crate) struct HttpError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
    pub(crate) data: serde_json::Value,
}

impl HttpError {
    pub(crate) const FALLBACK_MESSAGE: &'static str = "Request failed";

    /// Builds the error for a failed response, preferring a server-supplied
    /// `detail` or `message` over the status reason phrase.
    pub(crate) fn new(status: StatusCode, data: serde_json::Value, is_json: bool) -> Self {
        let server_message = is_json
            .then(|| ["detail", "message"].iter().find_map(|key| message_field(&data, key)))
            .flatten();

        let message = server_message
            .or_else(|| status.canonical_reason().map(str::to_owned))
            .unwrap_or_else(|| Self::FALLBACK_MESSAGE.to_owned());

        Self {
            status,
            message,
            data,
        }
    }

    pub(crate) fn is_auth_failure(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED || self.status == StatusCode::FORBIDDEN
    }
}

fn message_field(data: &serde_json::Value, key: &str) -> Option<String> {
    data.get(key)?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

#[derive(Error, Debug)]
pub(crate) enum Request {
    #[error("invalid header name: {0}")]
    HeaderName(#[from] InvalidHeaderName),
    #[error("invalid header value: {0}")]
    HeaderValue(#[from] InvalidHeaderValue),
    #[error(r#"argument "{}" must have the form {}"#, .0.escape_default(), .1)]
    Syntax(String, &'static str),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub(crate) enum Validation {
    #[error("first and last name are required")]
    MissingName,
    #[error("phone number must be 10 to 14 digits")]
    PhoneNumber,
    #[error("email address is not valid")]
    Email,
    #[error("password must be at least {0} characters")]
    PasswordTooShort(usize),
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("month must be between 1 and 12, not {0}")]
    Month(u32),
    #[error("amount must be greater than zero")]
    Amount,
}

#[derive(Error, Debug)]
pub(crate) enum Storage {
    #[error("cookie entry is malformed")]
    MalformedCookie,
    #[cfg(feature = "secret-service")]
    #[error("secret service error: {0}")]
    SecretService(#[from] oo7::Error),
    #[cfg(feature = "keychain")]
    #[error("keychain error: {0}")]
    Keychain(#[from] security_framework::base::Error),
}

#[derive(Error, Debug)]
pub(crate) enum Password {
    #[error("no password prompt available")]
    NoPrompt,
    #[error("Pinentry implementation error: {0}")]
    Pinentry(pinentry::Error),
}
