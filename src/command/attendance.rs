// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use inflector::Inflector as _;
use log::info;
use tabled::Tabled;

use crate::{
    api::{
        attendance::{AttendanceRecord, AttendanceSheet, CreateAttendance, Record, SheetEntry, State},
        Endpoint as _,
    },
    error::Result,
    guard::Guard,
};

use super::{print_table, Context};

const ROSTER_PATH: &str = "/teacher/students";

/// Mark and look up attendance.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    Mark(Mark),
    Record(Lookup),
    Sheet(Sheet),
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        ctx.enter(Guard::Protected, ROSTER_PATH).await?;

        match self {
            Self::Mark(cmd) => cmd.execute(ctx).await,
            Self::Record(cmd) => cmd.execute(ctx).await,
            Self::Sheet(cmd) => cmd.execute(ctx).await,
        }
    }
}

/// Mark a student present or absent for a day, today unless `--date` is
/// given.
#[derive(Debug, Parser)]
pub(crate) struct Mark {
    #[clap()]
    code: String,

    #[arg(value_enum)]
    state: State,

    /// The day, as `YYYY-MM-DD`.
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[async_trait]
impl super::Command for Mark {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        _ = CreateAttendance {
            code: self.code.clone(),
            date,
            state: self.state,
        }
        .execute(&ctx.client)
        .await?;
        info!("Marked student {} {} on {}", self.code, self.state.as_str(), date);
        Ok(())
    }
}

#[derive(Clone, Debug, Tabled)]
struct RecordRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "State")]
    state: String,
}

impl From<&Record> for RecordRow {
    fn from(value: &Record) -> Self {
        Self {
            date: value.attendance_date.clone(),
            state: value.state.to_title_case(),
        }
    }
}

/// Show a student's attendance for a month, the current one by default.
#[derive(Debug, Parser)]
pub(crate) struct Lookup {
    #[clap()]
    code: String,

    #[arg(long)]
    year: Option<i32>,

    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,
}

#[async_trait]
impl super::Command for Lookup {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let records = AttendanceRecord {
            code: self.code,
            year: self.year,
            month: self.month,
        }
        .execute(&ctx.client)
        .await?;

        if !records.is_empty() {
            print_table(records.iter().map(RecordRow::from));
        }
        let present = records
            .iter()
            .filter(|record| record.state == State::Present.as_str())
            .count();
        println!("Present on {} of {} recorded days", present, records.len());
        Ok(())
    }
}

#[derive(Clone, Debug, Tabled)]
struct SheetRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
}

impl From<&SheetEntry> for SheetRow {
    fn from(value: &SheetEntry) -> Self {
        Self {
            code: value
                .code
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            name: value.name.clone(),
            state: value
                .status
                .as_deref()
                .map_or_else(|| "Not marked".to_owned(), |s| s.to_title_case()),
        }
    }
}

/// Show every student's attendance for one day, today unless `--date` is
/// given.
#[derive(Debug, Parser)]
pub(crate) struct Sheet {
    /// The day, as `YYYY-MM-DD`.
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[async_trait]
impl super::Command for Sheet {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        let sheet = AttendanceSheet { date }.execute(&ctx.client).await?;

        if sheet.is_empty() {
            println!("No students");
        } else {
            print_table(sheet.iter().map(SheetRow::from));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser as _;
    use reqwest::Method;
    use serde_json::{json, Value};

    use crate::{
        api::transport::testing::{Reply, Scripted},
        command::{testing, Command as _},
        error::Error,
    };

    use super::*;

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(subcommand)]
        command: Command,
    }

    fn parse(args: &[&str]) -> Result<Command> {
        Cli::try_parse_from(std::iter::once("attendance").chain(args.iter().copied()))
            .map(|cli| cli.command)
            .map_err(|_| Error::Command)
    }

    fn teacher() -> Scripted {
        Scripted::new().on(
            Method::GET,
            "/api/v1/me",
            [Reply::json(200, &json!({"code": "D-1"}))],
        )
    }

    #[tokio::test]
    async fn mark_defaults_to_today() -> Result<()> {
        let backend = teacher().on(
            Method::POST,
            "/api/v1/attendance/S-1/create",
            [Reply::json(200, &json!({}))],
        );
        let ctx = testing::context(&backend).await?;

        parse(&["mark", "S-1", "present"])?.execute(&ctx).await?;
        parse(&["mark", "S-1", "absent", "--date", "2025-01-31"])?
            .execute(&ctx)
            .await?;

        let bodies = backend
            .sent()
            .iter()
            .filter(|req| req.method == Method::POST)
            .map(|req| serde_json::from_slice::<Value>(req.body.as_deref().unwrap_or_default()))
            .collect::<serde_json::Result<Vec<_>>>()?;
        assert_eq!(
            bodies,
            [
                json!({"attendance_date": Local::now().date_naive().to_string(), "state": "present"}),
                json!({"attendance_date": "2025-01-31", "state": "absent"}),
            ]
        );
        assert!(parse(&["mark", "S-1", "late"]).is_err());
        assert!(parse(&["mark", "S-1", "present", "--date", "31/01/2025"]).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn record_leaves_unset_month_to_the_server() -> Result<()> {
        let backend = teacher().on(
            Method::GET,
            "/api/v1/attendance/S-1/record",
            [Reply::json(200, &json!([{"attendance_date": "2025-03-01", "state": "present"}]))],
        );
        let ctx = testing::context(&backend).await?;

        parse(&["record", "S-1", "--year", "2025"])?.execute(&ctx).await?;

        let query = backend
            .sent()
            .into_iter()
            .find(|req| req.url.path() == "/api/v1/attendance/S-1/record")
            .map(|req| req.url.query().map(str::to_owned));
        assert_eq!(query, Some(Some("year=2025".to_owned())));
        Ok(())
    }

    #[tokio::test]
    async fn sheet_for_a_given_day() -> Result<()> {
        let backend = teacher().on(
            Method::GET,
            "/api/v1/attendance/all",
            [Reply::json(200, &json!([{"code": "S-1", "name": "Maryam Ali"}]))],
        );
        let ctx = testing::context(&backend).await?;

        parse(&["sheet", "--date", "2025-03-09"])?.execute(&ctx).await?;
        assert_eq!(backend.count(&Method::GET, "/api/v1/attendance/all"), 1);

        let row = SheetRow::from(&SheetEntry {
            code: None,
            name: "Omar".to_owned(),
            status: None,
        });
        assert_eq!(row.state, "Not marked");
        Ok(())
    }
}
