// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::num::NonZeroUsize;

use async_trait::async_trait;
use chrono::{Datelike as _, Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use futures_util::future;
use log::{debug, error, info};

use crate::{
    api::{
        attendance::{self, AttendanceRecord},
        students::{CreateStudent, DeleteStudent, Form, ListStudents, StudentDetail, UpdateStudent},
        Client, Endpoint as _,
    },
    error::{self, Result},
    guard::Guard,
    roster::{self, Filter, Gender, Row},
};

use super::{print_details, print_table, Context};

const ROSTER_PATH: &str = "/teacher/students";

/// Work with the teacher's students.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    List(List),
    Show(Show),
    Create(Create),
    Update(Update),
    Delete(Delete),
    /// Print the code of the last student shown.
    Selected,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        match self {
            Self::List(cmd) => cmd.execute(ctx).await,
            Self::Show(cmd) => cmd.execute(ctx).await,
            Self::Create(cmd) => cmd.execute(ctx).await,
            Self::Update(cmd) => cmd.execute(ctx).await,
            Self::Delete(cmd) => cmd.execute(ctx).await,
            Self::Selected => match ctx.selection.load().await {
                Some(code) => {
                    println!("{code}");
                    Ok(())
                }
                None => {
                    error!("No student has been selected");
                    Err(error::Error::Command)
                }
            },
        }
    }
}

/// List students, optionally narrowed down, with today's attendance.
#[derive(Debug, Parser)]
pub(crate) struct List {
    /// Only students whose name or code contains this text.
    #[arg(long, short)]
    query: Option<String>,

    #[arg(long, short, value_enum)]
    gender: Option<Gender>,

    #[arg(long, default_value = "1")]
    page: NonZeroUsize,

    #[arg(long, default_value = "10")]
    per_page: NonZeroUsize,
}

/// Today's mark for one student. A student whose record cannot be read is
/// shown as unmarked.
async fn attendance_on(client: &Client, code: String, day: NaiveDate) -> Option<String> {
    let lookup = AttendanceRecord {
        code: code.clone(),
        year: Some(day.year()),
        month: Some(day.month()),
    };
    match lookup.execute(client).await {
        Ok(records) => attendance::state_on(&records, day).map(str::to_owned),
        Err(e) => {
            debug!("Could not load attendance for student {}: {}", code, e);
            None
        }
    }
}

#[async_trait]
impl super::Command for List {
    async fn execute(self, ctx: &Context) -> Result<()> {
        ctx.enter(Guard::Protected, ROSTER_PATH).await?;

        let students = ListStudents.execute(&ctx.client).await?;
        let filter = Filter {
            query: self.query,
            gender: self.gender,
        };
        let page = roster::page(students, &filter, self.page, self.per_page);

        let today = Local::now().date_naive();
        let marks = future::join_all(
            page.items
                .iter()
                .map(|student| attendance_on(&ctx.client, student.code.to_string(), today)),
        )
        .await;

        if !page.items.is_empty() {
            print_table(
                page.items
                    .iter()
                    .zip(&marks)
                    .map(|(student, mark)| Row::from(student).with_attendance(mark.as_deref())),
            );
        }
        println!(
            "Page {} of {} ({} students)",
            page.number,
            page.pages.max(1),
            page.total
        );
        Ok(())
    }
}

/// Show one student's details and remember them as the selected student.
#[derive(Debug, Parser)]
pub(crate) struct Show {
    #[clap()]
    code: String,
}

#[async_trait]
impl super::Command for Show {
    async fn execute(self, ctx: &Context) -> Result<()> {
        ctx.enter(Guard::Protected, ROSTER_PATH).await?;

        let detail = StudentDetail {
            code: self.code.clone(),
        }
        .execute(&ctx.client)
        .await?;
        ctx.selection.save(&self.code).await;

        print_details(&detail)
    }
}

#[derive(Debug, Args)]
pub(crate) struct Fields {
    #[arg(long)]
    first_name: Option<String>,

    #[arg(long)]
    last_name: Option<String>,

    /// The guardian's name.
    #[arg(long)]
    parent: Option<String>,

    #[arg(long)]
    phone_number: Option<String>,

    #[arg(long)]
    memorization_method: Option<String>,

    #[arg(long, value_enum)]
    gender: Option<Gender>,

    #[arg(long)]
    age: Option<u32>,
}

impl From<Fields> for Form {
    fn from(value: Fields) -> Self {
        let given = |field: Option<String>| {
            field
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
        };
        Self {
            first_name: given(value.first_name),
            last_name: given(value.last_name),
            parent: given(value.parent),
            phone_number: given(value.phone_number),
            memorization_method: given(value.memorization_method),
            gender: value.gender.map(|gender| gender.code().to_owned()),
            age: value.age,
        }
    }
}

/// Add a student to the roster.
#[derive(Debug, Parser)]
pub(crate) struct Create {
    #[command(flatten)]
    fields: Fields,
}

#[async_trait]
impl super::Command for Create {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let form = Form::from(self.fields);
        if form.first_name.is_none() || form.last_name.is_none() {
            return Err(error::Validation::MissingName.into());
        }

        ctx.enter(Guard::Protected, ROSTER_PATH).await?;
        let created = CreateStudent { form }.execute(&ctx.client).await?;
        print_details(&created)
    }
}

/// Change a student's details. Only the given fields change unless
/// `--replace` is passed.
#[derive(Debug, Parser)]
pub(crate) struct Update {
    #[clap()]
    code: String,

    /// Send the fields as a full replacement of the student.
    #[arg(long)]
    replace: bool,

    #[command(flatten)]
    fields: Fields,
}

#[async_trait]
impl super::Command for Update {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let form = Form::from(self.fields);
        if form == Form::default() {
            error!("Nothing to update; give at least one field");
            return Err(error::Error::Command);
        }

        ctx.enter(Guard::Protected, ROSTER_PATH).await?;
        let endpoint = if self.replace {
            UpdateStudent::replace(self.code, form)
        } else {
            UpdateStudent::patch(self.code, form)
        };
        let updated = endpoint.execute(&ctx.client).await?;
        print_details(&updated)
    }
}

/// Remove a student from the roster.
#[derive(Debug, Parser)]
pub(crate) struct Delete {
    #[clap()]
    code: String,
}

#[async_trait]
impl super::Command for Delete {
    async fn execute(self, ctx: &Context) -> Result<()> {
        ctx.enter(Guard::Protected, ROSTER_PATH).await?;

        _ = DeleteStudent {
            code: self.code.clone(),
        }
        .execute(&ctx.client)
        .await?;

        if ctx.selection.load().await.as_deref() == Some(self.code.as_str()) {
            ctx.selection.clear().await;
        }
        info!("Deleted student {}", self.code);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Datelike as _;
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
        Cli::try_parse_from(std::iter::once("students").chain(args.iter().copied()))
            .map(|cli| cli.command)
            .map_err(|_| Error::Command)
    }

    fn teacher() -> Scripted {
        Scripted::new().on(
            Method::GET,
            "/api/v1/me",
            [Reply::json(200, &json!({"code": "D-1", "first_name": "Amina"}))],
        )
    }

    #[tokio::test]
    async fn list_looks_up_todays_attendance() -> Result<()> {
        let today = Local::now().date_naive();
        let backend = teacher()
            .on(
                Method::GET,
                "/api/v1/student/list",
                [Reply::json(200, &json!([{"code": "S-1", "name": "Maryam Ali"}]))],
            )
            .on(
                Method::GET,
                "/api/v1/attendance/S-1/record",
                [Reply::json(
                    200,
                    &json!([{"attendance_date": today.to_string(), "state": "present"}]),
                )],
            );
        let ctx = testing::context(&backend).await?;

        parse(&["list"])?.execute(&ctx).await?;

        let lookup = backend
            .sent()
            .into_iter()
            .find(|req| req.url.path() == "/api/v1/attendance/S-1/record")
            .map(|req| req.url.query().map(str::to_owned));
        assert_eq!(
            lookup,
            Some(Some(format!("year={}&month={}", today.year(), today.month())))
        );
        Ok(())
    }

    #[tokio::test]
    async fn list_survives_missing_attendance() -> Result<()> {
        let backend = teacher().on(
            Method::GET,
            "/api/v1/student/list",
            [Reply::json(200, &json!([{"code": "S-1"}, {"code": "S-2"}]))],
        );
        let ctx = testing::context(&backend).await?;

        parse(&["list", "--per-page", "1"])?.execute(&ctx).await?;
        assert_eq!(backend.count(&Method::GET, "/api/v1/attendance/S-1/record"), 1);
        assert_eq!(backend.count(&Method::GET, "/api/v1/attendance/S-2/record"), 0);
        Ok(())
    }

    #[tokio::test]
    async fn list_needs_a_teacher() -> Result<()> {
        let backend = Scripted::new().on(Method::GET, "/api/v1/me", [Reply::json(401, &json!({}))]);
        let ctx = testing::context(&backend).await?;

        assert!(matches!(
            parse(&["list"])?.execute(&ctx).await,
            Err(Error::Command)
        ));
        assert_eq!(backend.count(&Method::GET, "/api/v1/student/list"), 0);
        Ok(())
    }

    #[tokio::test]
    async fn create_sends_the_form() -> Result<()> {
        let backend = teacher().on(
            Method::POST,
            "/api/v1/student/create",
            [Reply::json(201, &json!({"code": "S-3"}))],
        );
        let ctx = testing::context(&backend).await?;

        parse(&[
            "create",
            "--first-name",
            "Omar",
            "--last-name",
            " Saleh ",
            "--gender",
            "male",
            "--age",
            "12",
            "--parent",
            "",
        ])?
        .execute(&ctx)
        .await?;

        let sent = backend.sent();
        let body = sent
            .iter()
            .find(|req| req.method == Method::POST)
            .and_then(|req| req.body.as_deref())
            .unwrap_or_default();
        assert_eq!(
            serde_json::from_slice::<Value>(body)?,
            json!({"first_name": "Omar", "last_name": "Saleh", "gender": "M", "age": 12})
        );
        Ok(())
    }

    #[tokio::test]
    async fn create_requires_a_name() -> Result<()> {
        let backend = teacher();
        let ctx = testing::context(&backend).await?;

        let result = parse(&["create", "--first-name", "Omar"])?.execute(&ctx).await;
        assert!(matches!(
            result,
            Err(Error::Validation(error::Validation::MissingName))
        ));
        assert_eq!(backend.count(&Method::POST, "/api/v1/student/create"), 0);
        Ok(())
    }

    #[tokio::test]
    async fn update_patches_unless_replacing() -> Result<()> {
        let backend = teacher()
            .on(Method::PATCH, "/api/v1/student/S-1/update", [Reply::json(200, &json!({}))])
            .on(Method::PUT, "/api/v1/student/S-1/update", [Reply::json(200, &json!({}))]);
        let ctx = testing::context(&backend).await?;

        parse(&["update", "S-1", "--age", "13"])?.execute(&ctx).await?;
        parse(&["update", "S-1", "--replace", "--first-name", "Omar"])?
            .execute(&ctx)
            .await?;
        assert!(matches!(
            parse(&["update", "S-1"])?.execute(&ctx).await,
            Err(Error::Command)
        ));

        assert_eq!(backend.count(&Method::PATCH, "/api/v1/student/S-1/update"), 1);
        assert_eq!(backend.count(&Method::PUT, "/api/v1/student/S-1/update"), 1);
        Ok(())
    }

    #[tokio::test]
    async fn delete_forgets_the_selected_student() -> Result<()> {
        let backend = teacher()
            .on(Method::GET, "/api/v1/student/S-1/detail", [Reply::json(200, &json!({"code": "S-1"}))])
            .on(Method::DELETE, "/api/v1/student/S-1/delete", [Reply::json(200, &json!({}))]);
        let ctx = testing::context(&backend).await?;

        parse(&["show", "S-1"])?.execute(&ctx).await?;
        assert_eq!(ctx.selection.load().await.as_deref(), Some("S-1"));

        parse(&["delete", "S-1"])?.execute(&ctx).await?;
        assert_eq!(ctx.selection.load().await, None);
        assert_eq!(backend.count(&Method::DELETE, "/api/v1/student/S-1/delete"), 1);
        Ok(())
    }
}
