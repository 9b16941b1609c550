// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::warn;

use crate::error::Result;

use super::{print_table, Context};

/// Log in with a teacher code.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The unique code issued to the teacher at registration.
    #[clap()]
    code: String,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        match ctx.session.sign_in(&self.code).await? {
            Some(identity) => print_table(identity.rows()),
            None => warn!("Logged in, but the server did not send a teacher profile"),
        }
        Ok(())
    }
}
