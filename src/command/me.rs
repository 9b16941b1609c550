// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::{error, warn};

use crate::error::{self, Result};

use super::{print_table, Context};

/// Show the logged-in teacher.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// Ask the server again instead of reporting what startup found.
    #[arg(long, short)]
    refresh: bool,

    /// Print only the teacher's display name.
    #[arg(long, conflicts_with = "refresh")]
    name_only: bool,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let identity = if self.refresh {
            Some(ctx.session.refresh().await?)
        } else {
            let snapshot = ctx.session.snapshot();
            if snapshot.identity.is_some() && !snapshot.verified {
                warn!("The server could not confirm this session; showing the cached teacher");
            }
            snapshot.identity
        };

        let Some(identity) = identity else {
            error!("Nobody is logged in");
            return Err(error::Error::Command);
        };

        if self.name_only {
            println!("{}", identity.display_name().unwrap_or_else(|| identity.code.to_string()));
        } else {
            print_table(identity.rows());
        }
        Ok(())
    }
}
