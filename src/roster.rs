// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::num::NonZeroUsize;

use clap::ValueEnum;
use inflector::Inflector as _;
use tabled::Tabled;

use crate::api::students::Student;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Gender {
    Male,
    Female,
}

impl Gender {
    /// How the backend stores the gender.
    pub(crate) fn code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }

    /// The backend stores `M` for boys; anything else is listed as a girl.
    fn of(student: &Student) -> Self {
        match student.gender.as_deref() {
            Some("M") => Self::Male,
            Some(_) | None => Self::Female,
        }
    }
}

/// Narrowing applied to an already-fetched roster.
#[derive(Clone, Debug, Default)]
pub(crate) struct Filter {
    pub(crate) query: Option<String>,
    pub(crate) gender: Option<Gender>,
}

impl Filter {
    pub(crate) fn matches(&self, student: &Student) -> bool {
        let matches_query = self.query.as_deref().map_or(true, |query| {
            student.name.contains(query) || student.code.to_string().contains(query)
        });
        let matches_gender = self
            .gender
            .map_or(true, |gender| Gender::of(student) == gender);
        matches_query && matches_gender
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Page<T> {
    pub(crate) items: Vec<T>,
    pub(crate) number: usize,
    pub(crate) pages: usize,
    pub(crate) total: usize,
}

/// Filters `students` and cuts out page `number` (1-based). Pages past the end
/// come back empty rather than wrapping.
pub(crate) fn page(
    students: Vec<Student>,
    filter: &Filter,
    number: NonZeroUsize,
    per_page: NonZeroUsize,
) -> Page<Student> {
    let matching: Vec<_> = students.into_iter().filter(|s| filter.matches(s)).collect();
    let total = matching.len();
    let pages = total.div_ceil(per_page.get());
    let items = matching
        .into_iter()
        .skip((number.get() - 1).saturating_mul(per_page.get()))
        .take(per_page.get())
        .collect();

    Page {
        items,
        number: number.get(),
        pages,
        total,
    }
}

#[derive(Clone, Debug, Tabled)]
pub(crate) struct Row {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Gender")]
    gender: String,
    #[tabled(rename = "Next Memorization")]
    memorization: String,
    #[tabled(rename = "Next Review")]
    review: String,
    #[tabled(rename = "Today")]
    attendance: String,
}

impl Row {
    pub(crate) fn with_attendance(mut self, state: Option<&str>) -> Self {
        self.attendance = state.map(|s| s.to_title_case()).unwrap_or_default();
        self
    }
}

impl From<&Student> for Row {
    fn from(value: &Student) -> Self {
        Self {
            code: value.code.to_string(),
            name: value.name.clone(),
            gender: match Gender::of(value) {
                Gender::Male => "Male".to_owned(),
                Gender::Female => "Female".to_owned(),
            },
            memorization: value.next_memorization_session.clone().unwrap_or_default(),
            review: value.next_review_session.clone().unwrap_or_default(),
            attendance: String::new(),
        }
    }
}
