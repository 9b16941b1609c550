// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use chrono::{Datelike as _, Local};
use clap::{Parser, Subcommand};
use log::{error, info};
use tabled::Tabled;

use crate::{
    api::{
        payments::{self, AllPayments, CreatePayment, Payment, ReportEntry, StudentPayments, TotalPayments},
        Endpoint as _,
    },
    error::{self, Result},
    guard::{Guard, DASHBOARD_PATH},
};

use super::{print_table, Context};

/// Record and review tuition payments.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    Add(Add),
    List(List),
    Report(Report),
    /// Print the total the teacher has been paid.
    Total,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        ctx.enter(Guard::Protected, DASHBOARD_PATH).await?;

        match self {
            Self::Add(cmd) => cmd.execute(ctx).await,
            Self::List(cmd) => cmd.execute(ctx).await,
            Self::Report(cmd) => cmd.execute(ctx).await,
            Self::Total => {
                let total = TotalPayments.execute(&ctx.client).await?;
                println!("{:.2}", total.amount());
                Ok(())
            }
        }
    }
}

/// Record a student's payment for a month. The month and year default to
/// the current ones.
#[derive(Debug, Parser)]
pub(crate) struct Add {
    #[clap()]
    code: String,

    #[clap()]
    amount: f64,

    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,

    #[arg(long)]
    year: Option<i32>,

    /// Overwrite a payment already recorded for the month.
    #[arg(long)]
    replace: bool,
}

#[async_trait]
impl super::Command for Add {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let now = Local::now();
        let month = self.month.unwrap_or_else(|| now.month());
        let year = self.year.unwrap_or_else(|| now.year());
        let payment = CreatePayment::new(self.code.clone(), month, year, self.amount)?;

        if !self.replace {
            let existing = StudentPayments {
                code: self.code.clone(),
            }
            .execute(&ctx.client)
            .await?;
            if let Some(earlier) = existing.iter().find(|earlier| payment.covers(earlier)) {
                error!(
                    "Student {} already paid {:.2} for {:02}-{}; pass --replace to overwrite it",
                    self.code,
                    payments::amount(&earlier.amount),
                    month,
                    year
                );
                return Err(error::Error::Command);
            }
        }

        _ = payment.execute(&ctx.client).await?;
        info!("Recorded {:.2} from student {} for {:02}-{}", self.amount, self.code, month, year);
        Ok(())
    }
}

#[derive(Clone, Debug, Tabled)]
struct PaymentRow {
    #[tabled(rename = "Month")]
    date: String,
    #[tabled(rename = "Amount")]
    amount: String,
}

impl From<&Payment> for PaymentRow {
    fn from(value: &Payment) -> Self {
        Self {
            date: value.date.clone().unwrap_or_default(),
            amount: format!("{:.2}", payments::amount(&value.amount)),
        }
    }
}

/// List one student's payments.
#[derive(Debug, Parser)]
pub(crate) struct List {
    #[clap()]
    code: String,
}

#[async_trait]
impl super::Command for List {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let history = StudentPayments { code: self.code }.execute(&ctx.client).await?;
        let total: f64 = history.iter().map(|p| payments::amount(&p.amount)).sum();

        if !history.is_empty() {
            print_table(history.iter().map(PaymentRow::from));
        }
        println!("{} payments, {:.2} in total", history.len(), total);
        Ok(())
    }
}

#[derive(Clone, Debug, Tabled)]
struct ReportRow {
    #[tabled(rename = "Student")]
    name: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Status")]
    status: &'static str,
}

impl From<&ReportEntry> for ReportRow {
    fn from(value: &ReportEntry) -> Self {
        let paid = value.is_paid();
        Self {
            name: value.student_name.clone(),
            amount: if paid {
                format!("{:.2}", payments::amount(&value.amount))
            } else {
                "-".to_owned()
            },
            status: if paid { "Paid" } else { "Unpaid" },
        }
    }
}

/// Show who has paid for a month.
#[derive(Debug, Parser)]
pub(crate) struct Report {
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,

    #[arg(long)]
    year: Option<i32>,
}

#[async_trait]
impl super::Command for Report {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let report = AllPayments {
            month: self.month,
            year: self.year,
        }
        .execute(&ctx.client)
        .await?;

        if report.is_empty() {
            println!("No students");
            return Ok(());
        }

        let paid = report.iter().filter(|entry| entry.is_paid()).count();
        let total: f64 = report.iter().map(|entry| payments::amount(&entry.amount)).sum();
        print_table(report.iter().map(ReportRow::from));
        println!("{} of {} students paid, {:.2} in total", paid, report.len(), total);
        Ok(())
    }
}
