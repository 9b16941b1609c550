// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use log::error;
use serde_json::Value;
use tabled::{
    settings::{object::Segment, Alignment, Modify, Style},
    Table, Tabled,
};

use crate::{
    api::Client,
    cache::Cache,
    error::{self, Result},
    guard::{Decision, Guard, LOGIN_PATH},
    identity::Field,
    password::Prompt,
    session::Session,
};

pub(crate) mod attendance;
pub(crate) mod login;
pub(crate) mod logout;
pub(crate) mod me;
pub(crate) mod payments;
pub(crate) mod request;
pub(crate) mod route;
pub(crate) mod signup;
pub(crate) mod students;

/// Everything a command may need for one run of the program.
pub(crate) struct Context {
    pub(crate) client: Arc<Client>,
    pub(crate) session: Session,
    pub(crate) selection: Cache<String>,
    pub(crate) prompt: Box<dyn Prompt>,
}

impl Context {
    /// Lets the command continue only if `guard` would render `location`.
    pub(crate) async fn enter(&self, guard: Guard, location: &str) -> Result<()> {
        match guard.settle(&mut self.session.subscribe(), location).await {
            Decision::Render => Ok(()),
            Decision::Redirect { ref to, .. } if to == LOGIN_PATH => {
                error!("You are not logged in; run the login command first");
                Err(error::Error::Command)
            }
            decision @ (Decision::Loading | Decision::Redirect { .. } | Decision::NotFound) => {
                error!("Cannot open {}: {}", location, decision);
                Err(error::Error::Command)
            }
        }
    }
}

#[async_trait]
pub(crate) trait Command {
    async fn execute(self, ctx: &Context) -> Result<()>;
}

pub(crate) fn print_table<T: Tabled>(rows: impl IntoIterator<Item = T>) {
    println!(
        "{}",
        Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Segment::all()).with(Alignment::left()))
    );
}

/// Prints an object as a field table and anything else as JSON.
pub(crate) fn print_details(data: &Value) -> Result<()> {
    match *data {
        Value::Object(ref fields) => {
            print_table(fields.iter().map(|(key, value)| Field::new(key, value)));
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Array(_) => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
    }
    Ok(())
}
