// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{error::Result, guard::Router};

use super::Context;

/// Print what opening a page would do for the current session.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// A page path, optionally with a query string, e.g. `/teacher/students`.
    #[clap()]
    location: String,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let router = Router::default();
        let decision = match router.guard(&self.location) {
            Some(guard) => {
                guard
                    .settle(&mut ctx.session.subscribe(), &self.location)
                    .await
            }
            None => router.decide(&ctx.session.snapshot(), &self.location),
        };
        println!("{decision}");
        Ok(())
    }
}
