// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use tokio::sync::watch;

use crate::session::Snapshot;

pub(crate) const LOGIN_PATH: &str = "/teacher/login";
pub(crate) const DASHBOARD_PATH: &str = "/teacher/dashboard";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Guard {
    /// Only for a logged-in teacher.
    Protected,
    /// Only for visitors; a logged-in teacher is sent to the dashboard.
    PublicOnly,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Decision {
    Loading,
    Render,
    /// Navigate to `to`. `from` is the location that was asked for, kept so a
    /// successful login can return there.
    Redirect {
        to: String,
        from: Option<String>,
    },
    NotFound,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Loading => f.write_str("loading"),
            Self::Render => f.write_str("render"),
            Self::Redirect {
                ref to,
                from: Some(ref from),
            } => write!(f, "redirect to {to} (from {from})"),
            Self::Redirect { ref to, from: None } => write!(f, "redirect to {to}"),
            Self::NotFound => f.write_str("not found"),
        }
    }
}

impl Guard {
    pub(crate) fn decide(self, session: &Snapshot, location: &str) -> Decision {
        if session.loading {
            return Decision::Loading;
        }

        match (self, session.identity.is_some()) {
            (Self::Protected, false) => Decision::Redirect {
                to: LOGIN_PATH.to_owned(),
                from: Some(location.to_owned()),
            },
            (Self::PublicOnly, true) => Decision::Redirect {
                to: DASHBOARD_PATH.to_owned(),
                from: None,
            },
            (Self::Protected, true) | (Self::PublicOnly, false) => Decision::Render,
        }
    }

    /// Waits for the session to finish loading and then decides. Returns
    /// `Loading` only if the session went away before that happened.
    pub(crate) async fn settle(
        self,
        session: &mut watch::Receiver<Snapshot>,
        location: &str,
    ) -> Decision {
        loop {
            let decision = self.decide(&session.borrow_and_update(), location);
            if decision != Decision::Loading || session.changed().await.is_err() {
                return decision;
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Route {
    Redirect(&'static str),
    Open,
    Guarded(Guard),
}

/// The application's page table.
pub(crate) struct Router {
    routes: Vec<(&'static str, Route)>,
}

impl Default for Router {
    fn default() -> Self {
        Self {
            routes: vec![
                ("/", Route::Redirect("/welcome")),
                ("/welcome", Route::Open),
                ("/student/login", Route::Open),
                ("/student/dashboard", Route::Open),
                (LOGIN_PATH, Route::Guarded(Guard::PublicOnly)),
                ("/teacher/register", Route::Guarded(Guard::PublicOnly)),
                (DASHBOARD_PATH, Route::Guarded(Guard::Protected)),
                ("/teacher/students", Route::Guarded(Guard::Protected)),
                ("/teacher/review-session", Route::Guarded(Guard::Protected)),
                (
                    "/teacher/memorization-session",
                    Route::Guarded(Guard::Protected),
                ),
            ],
        }
    }
}

impl Router {
    fn route(&self, location: &str) -> Option<Route> {
        let path = location.split(['?', '#']).next().unwrap_or(location);
        self.routes
            .iter()
            .find(|(pattern, _)| *pattern == path)
            .map(|(_, route)| *route)
    }

    pub(crate) fn guard(&self, location: &str) -> Option<Guard> {
        match self.route(location)? {
            Route::Guarded(guard) => Some(guard),
            Route::Redirect(_) | Route::Open => None,
        }
    }

    pub(crate) fn decide(&self, session: &Snapshot, location: &str) -> Decision {
        match self.route(location) {
            None => Decision::NotFound,
            Some(Route::Redirect(to)) => Decision::Redirect {
                to: to.to_owned(),
                from: None,
            },
            Some(Route::Open) => Decision::Render,
            Some(Route::Guarded(guard)) => guard.decide(session, location),
        }
    }
}
