// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::identity::Code;

use super::{students::segment, Endpoint, Request};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum State {
    Present,
    Absent,
}

impl State {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
        }
    }
}

/// One day of a student's attendance.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub(crate) struct Record {
    /// `YYYY-MM-DD`.
    pub(crate) attendance_date: String,
    pub(crate) state: String,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

/// The state recorded for `date`, if there is one.
pub(crate) fn state_on(records: &[Record], date: NaiveDate) -> Option<&str> {
    let date = date.to_string();
    records
        .iter()
        .find(|record| record.attendance_date == date)
        .map(|record| record.state.as_str())
}

/// Marks a student present or absent for a day, replacing any earlier mark.
pub(crate) struct CreateAttendance {
    pub(crate) code: String,
    pub(crate) date: NaiveDate,
    pub(crate) state: State,
}

impl Endpoint for CreateAttendance {
    type Response = Value;

    fn into_request(self) -> Request {
        Request::post(&format!("/attendance/{}/create", segment(&self.code))).with_json(json!({
            "attendance_date": self.date.to_string(),
            "state": self.state.as_str(),
        }))
    }
}

/// A student's attendance for one month; the server picks the current year
/// or month for whichever is unset.
pub(crate) struct AttendanceRecord {
    pub(crate) code: String,
    pub(crate) year: Option<i32>,
    pub(crate) month: Option<u32>,
}

impl Endpoint for AttendanceRecord {
    type Response = Vec<Record>;

    fn into_request(self) -> Request {
        Request::get(&format!("/attendance/{}/record", segment(&self.code)))
            .with_param("year", self.year)
            .with_param("month", self.month)
    }
}

/// A student's line in the attendance sheet for one day. `status` is unset
/// for students nobody has marked.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub(crate) struct SheetEntry {
    #[serde(default)]
    pub(crate) code: Option<Code>,
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) status: Option<String>,
}

pub(crate) struct AttendanceSheet {
    pub(crate) date: NaiveDate,
}

impl Endpoint for AttendanceSheet {
    type Response = Vec<SheetEntry>;

    fn into_request(self) -> Request {
        Request::get("/attendance/all").with_param("date", self.date.to_string())
    }
}
