// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(elided_lifetimes_in_paths)]
#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused,
    unused_lifetimes,
    unused_qualifications,
    unused_results,
    anonymous_parameters,
    deprecated_in_future,
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    missing_doc_code_examples,
    private_doc_tests,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::unseparated_literal_suffix,
    clippy::decimal_literal_representation,
    clippy::single_char_lifetime_names,
    clippy::fallible_impl_from,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::wildcard_enum_match_arm,
    clippy::deref_by_slicing,
    clippy::default_numeric_fallback,
    clippy::shadow_reuse,
    clippy::clone_on_ref_ptr,
    clippy::todo,
    clippy::string_add,
    clippy::use_debug,
    clippy::future_not_send
)]
#![cfg_attr(not(test), warn(clippy::panic_in_result_fn))]

mod api;
mod cache;
mod command;
mod error;
mod guard;
mod identity;
mod metadata;
mod password;
mod roster;
mod session;
mod storage;

use std::{path::PathBuf, process, sync::Arc};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use error::Result;
use identity::Identity;
use log::{error, info, warn};
use reqwest::StatusCode;
use url::Url;

use crate::{
    api::{transport, BaseUrl, Client},
    cache::{Cache, IdentityCache},
    command::Context,
    session::{Session, StalePolicy},
};

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand)]
    Attendance(command::attendance::Command),
    Login(command::login::Command),
    Logout(command::logout::Command),
    Me(command::me::Command),
    #[command(subcommand)]
    Payments(command::payments::Command),
    Request(command::request::Command),
    Route(command::route::Command),
    Signup(command::signup::Command),
    #[command(subcommand)]
    Students(command::students::Command),
}

#[async_trait]
impl command::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        match self {
            Self::Attendance(cmd) => cmd.execute(ctx).await,
            Self::Login(cmd) => cmd.execute(ctx).await,
            Self::Logout(cmd) => cmd.execute(ctx).await,
            Self::Me(cmd) => cmd.execute(ctx).await,
            Self::Payments(cmd) => cmd.execute(ctx).await,
            Self::Request(cmd) => cmd.execute(ctx).await,
            Self::Route(cmd) => cmd.execute(ctx).await,
            Self::Signup(cmd) => cmd.execute(ctx).await,
            Self::Students(cmd) => cmd.execute(ctx).await,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// The origin of the school backend.
    #[arg(long, env = "HIFZ_ORIGIN", default_value = "http://127.0.0.1:8000", value_parser = Url::parse)]
    origin: Url,

    /// The path prefix of every API operation, or an absolute URL.
    #[arg(long, env = "HIFZ_API_BASE_URL", default_value = api::base::DEFAULT_BASE_URL)]
    base_url: String,

    /// Turn off remembering the logged-in teacher between runs.
    #[arg(long)]
    no_cache_identity: bool,

    /// What to do at startup when the server cannot confirm a remembered
    /// teacher.
    #[arg(long, env = "HIFZ_STALE_IDENTITY", value_enum, default_value_t)]
    stale_identity: StalePolicy,

    /// The path to the Pinentry program to use when asking for a new
    /// account's password.
    #[arg(long, value_hint = clap::ValueHint::ExecutablePath)]
    pinentry_program: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

async fn identity_storage(args: &Args) -> Box<dyn storage::Storage<Identity>> {
    if !args.no_cache_identity {
        #[cfg(feature = "secret-service")]
        match storage::SecretService::new(&args.origin, cache::IDENTITY_COOKIE).await {
            Ok(secret_service_storage) => return Box::new(secret_service_storage),
            Err(e) => {
                warn!("Falling back to cookie storage because we can't connect to the secret service: {}", e);
            }
        }

        #[cfg(feature = "keychain")]
        match storage::Keychain::new(&args.origin, cache::IDENTITY_COOKIE) {
            Ok(keychain_storage) => return Box::new(keychain_storage),
            Err(e) => {
                warn!("Falling back to cookie storage because we can't connect to Keychain: {}", e);
            }
        }

        if let Some(cookie_storage) = storage::Cookie::new(cache::IDENTITY_COOKIE) {
            return Box::new(cookie_storage);
        }
        warn!("No data directory is available; the logged-in teacher will not be remembered");
    }

    Box::new(storage::Memory::<Identity>::new())
}

fn selection_cache() -> Cache<String> {
    match storage::File::new(cache::SELECTED_STUDENT_KEY) {
        Some(file_storage) => Cache::new(cache::SELECTED_STUDENT_KEY, Box::new(file_storage)),
        None => Cache::in_memory(cache::SELECTED_STUDENT_KEY),
    }
}

async fn run(args: Args) -> Result<()> {
    let prompt: Vec<Box<dyn password::Prompt>> = vec![
        Box::new(args.pinentry_program.clone().map_or_else(
            password::PinentryPrompt::new,
            password::PinentryPrompt::new_with_executable,
        )),
        Box::new(password::RpasswordPrompt),
    ];

    let identity = IdentityCache::new(cache::IDENTITY_COOKIE, identity_storage(&args).await);
    if !identity.is_persistent().await {
        info!("The logged-in teacher is only kept for this run");
    }

    let client = Arc::new(Client::new(
        Box::new(transport::Http::new()?),
        BaseUrl::new(args.origin.clone(), &args.base_url),
        identity.clone(),
    ));
    let ctx = Context {
        client: Arc::clone(&client),
        session: Session::new(client, identity, args.stale_identity),
        selection: selection_cache(),
        prompt: Box::new(prompt),
    };

    _ = ctx.session.init().await;
    command::Command::execute(args.command, &ctx).await
}

#[tokio::main]
async fn main() {
    let logger_env = env_logger::Env::new()
        .filter_or("HIFZ_LOG", "warn")
        .write_style("HIFZ_LOG_STYLE");
    env_logger::Builder::from_env(logger_env).init();

    if let Err(e) = run(Args::parse()).await {
        error!("We encountered an error: {}", e);
        if e.status().map_or(false, |status| {
            status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
        }) {
            error!("The session could not be recovered; log in again");
        }
        process::exit(1);
    };
}
