// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::info;
use secrecy::SecretString;

use crate::{
    api::auth::Signup,
    error::{self, Result, Validation},
    password,
};

use super::{print_table, Context};

/// Create a teacher account. The password is asked for interactively.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    #[arg(long)]
    first_name: String,

    #[arg(long)]
    last_name: String,

    /// Between 10 and 14 digits.
    #[arg(long)]
    phone_number: String,

    #[arg(long)]
    email: String,
}

async fn ask(ctx: &Context, label: &'static str, error: Option<&str>) -> Result<SecretString> {
    let req = match error {
        Some(e) => password::Request::new(label).with_error(e),
        None => password::Request::new(label),
    };
    ctx.prompt
        .prompt(req)
        .await?
        .ok_or_else(|| error::Password::NoPrompt.into())
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let mut problem: Option<String> = None;
        let signup = loop {
            let password = ask(ctx, "Password", problem.as_deref()).await?;
            let confirmation = ask(ctx, "Confirm password", None).await?;

            let signup = Signup::new(
                &self.first_name,
                &self.last_name,
                &self.phone_number,
                &self.email,
                password,
            );
            match signup.validate(&confirmation) {
                Ok(()) => break signup,
                Err(e @ (Validation::PasswordTooShort(_) | Validation::PasswordMismatch)) => {
                    problem = Some(e.to_string());
                }
                Err(
                    e @ (Validation::MissingName
                    | Validation::PhoneNumber
                    | Validation::Email
                    | Validation::Month(_)
                    | Validation::Amount),
                ) => {
                    return Err(e.into())
                }
            }
        };

        match ctx.session.register(signup).await? {
            Some(identity) => {
                info!("Account created for {}", identity.code);
                print_table(identity.rows());
            }
            None => println!("Account created. Log in with the code you were given."),
        }
        Ok(())
    }
}
