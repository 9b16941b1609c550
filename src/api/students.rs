// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::identity::Code;

use super::{Endpoint, Request};

/// One row of the teacher's roster as the backend lists it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Student {
    pub(crate) code: Code,
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) gender: Option<String>,
    #[serde(default)]
    pub(crate) age: Option<Value>,
    #[serde(default)]
    pub(crate) next_memorization_session: Option<String>,
    #[serde(default)]
    pub(crate) next_review_session: Option<String>,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

/// Encodes one path segment the way `encodeURIComponent` would treat codes.
pub(crate) fn segment(code: &str) -> String {
    form_urlencoded::byte_serialize(code.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

pub(crate) struct ListStudents;

impl Endpoint for ListStudents {
    type Response = Vec<Student>;

    fn into_request(self) -> Request {
        Request::get("/student/list")
    }
}

pub(crate) struct StudentDetail {
    pub(crate) code: String,
}

impl Endpoint for StudentDetail {
    type Response = Value;

    fn into_request(self) -> Request {
        Request::get(&format!("/student/{}/detail", segment(&self.code)))
    }
}

/// The editable fields of a student. Fields left as `None` are not sent, so
/// the same form serves creation, replacement and partial updates.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub(crate) struct Form {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) last_name: Option<String>,
    /// The guardian's name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) memorization_method: Option<String>,
    /// `M` or `F`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) age: Option<u32>,
}

impl Form {
    fn body(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

pub(crate) struct CreateStudent {
    pub(crate) form: Form,
}

impl Endpoint for CreateStudent {
    type Response = Value;

    fn into_request(self) -> Request {
        Request::post("/student/create").with_json(self.form.body())
    }
}

/// Replaces a student's fields with `PUT`, or changes only the given ones
/// with `PATCH`.
pub(crate) struct UpdateStudent {
    code: String,
    form: Form,
    method: Method,
}

impl UpdateStudent {
    pub(crate) fn replace(code: String, form: Form) -> Self {
        Self {
            code,
            form,
            method: Method::PUT,
        }
    }

    pub(crate) fn patch(code: String, form: Form) -> Self {
        Self {
            code,
            form,
            method: Method::PATCH,
        }
    }
}

impl Endpoint for UpdateStudent {
    type Response = Value;

    fn into_request(self) -> Request {
        Request::new(self.method, &format!("/student/{}/update", segment(&self.code)))
            .with_json(self.form.body())
    }
}

pub(crate) struct DeleteStudent {
    pub(crate) code: String,
}

impl Endpoint for DeleteStudent {
    type Response = Value;

    fn into_request(self) -> Request {
        Request::new(Method::DELETE, &format!("/student/{}/delete", segment(&self.code)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        api::transport::testing::{Reply, Scripted},
        error::Result,
    };

    use super::*;

    fn amina() -> Form {
        Form {
            first_name: Some("Amina".to_owned()),
            last_name: Some("Yusuf".to_owned()),
            gender: Some("F".to_owned()),
            age: Some(9),
            ..Form::default()
        }
    }

    #[test]
    fn detail_path_escapes_the_code() {
        let req = StudentDetail {
            code: "S 1/2".to_owned(),
        }
        .into_request();
        assert_eq!(req.path, "/student/S%201%2F2/detail");
    }

    #[test]
    fn list_rows_keep_unknown_fields() -> crate::error::Result<()> {
        let students: Vec<Student> = serde_json::from_value(json!([
            {"code": 31, "name": "Maryam Ali", "gender": "F", "age": 11, "memorization_method": "juz"},
            {"code": "S-2"}
        ]))?;

        assert_eq!(students[0].code.to_string(), "31");
        assert_eq!(students[0].extra.get("memorization_method"), Some(&json!("juz")));
        assert_eq!(students[1].name, "");
        assert_eq!(students[1].gender, None);
        Ok(())
    }

    #[tokio::test]
    async fn create_sends_only_given_fields() -> Result<()> {
        let backend = Scripted::new().on(
            Method::POST,
            "/api/v1/student/create",
            [Reply::json(201, &json!({"code": "S-9"}))],
        );

        let created = CreateStudent { form: amina() }
            .execute(&backend.client()?)
            .await?;
        assert_eq!(created, json!({"code": "S-9"}));

        let sent = backend.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            serde_json::from_slice::<Value>(sent[0].body.as_deref().unwrap_or_default())?,
            json!({"first_name": "Amina", "last_name": "Yusuf", "gender": "F", "age": 9})
        );
        Ok(())
    }

    #[tokio::test]
    async fn update_uses_put_or_patch() -> Result<()> {
        let backend = Scripted::new()
            .on(Method::PUT, "/api/v1/student/S%201/update", [Reply::json(200, &json!({}))])
            .on(Method::PATCH, "/api/v1/student/S%201/update", [Reply::json(200, &json!({}))]);
        let client = backend.client()?;

        _ = UpdateStudent::replace("S 1".to_owned(), amina())
            .execute(&client)
            .await?;
        let partial = Form {
            age: Some(10),
            ..Form::default()
        };
        _ = UpdateStudent::patch("S 1".to_owned(), partial).execute(&client).await?;

        let sent = backend.sent();
        assert_eq!(backend.count(&Method::PUT, "/api/v1/student/S%201/update"), 1);
        assert_eq!(backend.count(&Method::PATCH, "/api/v1/student/S%201/update"), 1);
        assert_eq!(
            serde_json::from_slice::<Value>(sent[1].body.as_deref().unwrap_or_default())?,
            json!({"age": 10})
        );
        Ok(())
    }

    #[tokio::test]
    async fn delete_reports_missing_student() -> Result<()> {
        let backend = Scripted::new().on(
            Method::DELETE,
            "/api/v1/student/S-1/delete",
            [Reply::json(200, &json!({"message": "deleted"}))],
        );
        let client = backend.client()?;

        _ = DeleteStudent {
            code: "S-1".to_owned(),
        }
        .execute(&client)
        .await?;

        let missing = DeleteStudent {
            code: "S-2".to_owned(),
        }
        .execute(&client)
        .await;
        assert!(matches!(
            missing,
            Err(crate::error::Error::Http(ref e)) if e.status.as_u16() == 404
        ));
        Ok(())
    }
}
