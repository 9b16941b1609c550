// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use secrecy::{ExposeSecret as _, SecretString};
use serde_json::{json, Value};

use crate::{error, identity::Identity};

use super::{Endpoint, Request};

pub(crate) struct Login {
    code: SecretString,
}

impl Login {
    pub(crate) fn new(code: String) -> Self {
        Self {
            code: SecretString::new(code),
        }
    }
}

impl Endpoint for Login {
    type Response = Value;

    fn into_request(self) -> Request {
        Request::post("/login").with_json(json!({ "code": self.code.expose_secret() }))
    }
}

pub(crate) struct Me;

impl Endpoint for Me {
    type Response = Identity;

    fn into_request(self) -> Request {
        Request::get("/me")
    }
}

/// Registration of a new teacher account.
pub(crate) struct Signup {
    first_name: String,
    last_name: String,
    phone_number: String,
    email: String,
    password: SecretString,
}

impl Signup {
    pub(crate) const MIN_PASSWORD_LENGTH: usize = 8;

    pub(crate) fn new(
        first_name: &str,
        last_name: &str,
        phone_number: &str,
        email: &str,
        password: SecretString,
    ) -> Self {
        Self {
            first_name: first_name.trim().to_owned(),
            last_name: last_name.trim().to_owned(),
            phone_number: phone_number.trim().to_owned(),
            email: email.trim().to_owned(),
            password,
        }
    }

    pub(crate) fn validate(&self, confirmation: &SecretString) -> Result<(), error::Validation> {
        if self.first_name.is_empty() || self.last_name.is_empty() {
            return Err(error::Validation::MissingName);
        }
        if !(10..=14).contains(&self.phone_number.len())
            || !self.phone_number.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(error::Validation::PhoneNumber);
        }
        if !is_plausible_email(&self.email) {
            return Err(error::Validation::Email);
        }
        if self.password.expose_secret().chars().count() < Self::MIN_PASSWORD_LENGTH {
            return Err(error::Validation::PasswordTooShort(Self::MIN_PASSWORD_LENGTH));
        }
        if self.password.expose_secret() != confirmation.expose_secret() {
            return Err(error::Validation::PasswordMismatch);
        }
        Ok(())
    }
}

/// `local@domain.tld`, with no whitespace and exactly one `@`.
fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

impl Endpoint for Signup {
    type Response = Value;

    fn into_request(self) -> Request {
        Request::post("/signup").with_json(json!({
            "first_name": self.first_name,
            "last_name": self.last_name,
            "phone_number": self.phone_number,
            "email": self.email,
            "password": self.password.expose_secret(),
        }))
    }
}
