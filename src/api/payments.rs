// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error;

use super::{students::segment, Endpoint, Request};

/// Reads an amount the backend may send as a number or a decimal string.
pub(crate) fn amount(value: &Value) -> f64 {
    match *value {
        Value::Number(ref n) => n.as_f64().unwrap_or_default(),
        Value::String(ref s) => s.trim().parse().unwrap_or_default(),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => 0.0,
    }
}

/// One of a student's recorded payments.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub(crate) struct Payment {
    /// The month paid for, as `MM-YYYY`.
    #[serde(default)]
    pub(crate) date: Option<String>,
    #[serde(default)]
    pub(crate) amount: Value,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl Payment {
    /// The `(month, year)` this payment covers, if its date can be read.
    pub(crate) fn period(&self) -> Option<(u32, i32)> {
        let (month, year) = self.date.as_deref()?.split_once('-')?;
        Some((month.trim().parse().ok()?, year.trim().parse().ok()?))
    }
}

/// One student's line in the monthly report. Students who have not paid are
/// listed with a zero amount.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub(crate) struct ReportEntry {
    #[serde(default)]
    pub(crate) student_name: String,
    #[serde(default)]
    pub(crate) amount: Value,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl ReportEntry {
    pub(crate) fn is_paid(&self) -> bool {
        amount(&self.amount) > 0.0
    }
}

/// Records what a student paid for a month. Paying again for the same month
/// replaces the earlier amount.
#[derive(Debug)]
pub(crate) struct CreatePayment {
    code: String,
    month: u32,
    year: i32,
    amount: f64,
}

impl CreatePayment {
    pub(crate) fn new(code: String, month: u32, year: i32, amount: f64) -> Result<Self, error::Validation> {
        if !(1..=12).contains(&month) {
            return Err(error::Validation::Month(month));
        }
        if amount.is_nan() || amount <= 0.0 {
            return Err(error::Validation::Amount);
        }
        Ok(Self {
            code,
            month,
            year,
            amount,
        })
    }

    pub(crate) fn covers(&self, payment: &Payment) -> bool {
        payment.period() == Some((self.month, self.year))
    }
}

impl Endpoint for CreatePayment {
    type Response = Value;

    fn into_request(self) -> Request {
        Request::post(&format!("/payments/{}/create", segment(&self.code))).with_json(json!({
            "month": self.month,
            "year": self.year,
            "amount": self.amount,
        }))
    }
}

pub(crate) struct StudentPayments {
    pub(crate) code: String,
}

impl Endpoint for StudentPayments {
    type Response = Vec<Payment>;

    fn into_request(self) -> Request {
        Request::get(&format!("/payments/{}/all", segment(&self.code)))
    }
}

/// The monthly report across every student. An unset month or year is left
/// for the server to default.
pub(crate) struct AllPayments {
    pub(crate) month: Option<u32>,
    pub(crate) year: Option<i32>,
}

impl Endpoint for AllPayments {
    type Response = Vec<ReportEntry>;

    fn into_request(self) -> Request {
        Request::get("/payments/all")
            .with_param("month", self.month)
            .with_param("year", self.year)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub(crate) struct Total {
    #[serde(default)]
    total: Value,
}

impl Total {
    pub(crate) fn amount(&self) -> f64 {
        amount(&self.total)
    }
}

pub(crate) struct TotalPayments;

impl Endpoint for TotalPayments {
    type Response = Total;

    fn into_request(self) -> Request {
        Request::get("/payments/total")
    }
}
