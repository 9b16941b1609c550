// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use inflector::Inflector as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tabled::Tabled;

/// The unique teacher code. The backend sends it either as a string or as a
/// number, so the wire form is kept and comparisons go through `Display`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum Code {
    Text(String),
    Number(Number),
}

impl Code {
    /// Whether this code can stand in as a login credential. Empty strings and
    /// a numeric zero never identify anyone.
    pub(crate) fn is_usable(&self) -> bool {
        match *self {
            Self::Text(ref s) => !s.is_empty(),
            Self::Number(ref n) => n.as_f64().map_or(true, |f| f != 0.0),
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Text(ref s) => f.write_str(s),
            Self::Number(ref n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Code {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// The authenticated teacher's profile. Everything beyond `code` belongs to
/// the backend and is carried through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Identity {
    pub(crate) code: Code,
    #[serde(flatten)]
    pub(crate) profile: Map<String, Value>,
}

impl Identity {
    pub(crate) fn new<C: Into<Code>>(code: C) -> Self {
        Self {
            code: code.into(),
            profile: Map::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_field<V: Into<Value>>(mut self, key: &str, value: V) -> Self {
        _ = self.profile.insert(key.to_owned(), value.into());
        self
    }

    pub(crate) fn usable_code(&self) -> Option<String> {
        self.code.is_usable().then(|| self.code.to_string())
    }

    pub(crate) fn display_name(&self) -> Option<String> {
        let name = ["first_name", "last_name"]
            .iter()
            .filter_map(|key| self.profile.get(*key).and_then(Value::as_str))
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if name.is_empty() {
            self.profile
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_owned)
        } else {
            Some(name)
        }
    }

    /// Key/value rows for display, code first.
    pub(crate) fn rows(&self) -> Vec<Field> {
        std::iter::once(Field {
            name: "Code".to_owned(),
            value: self.code.to_string(),
        })
        .chain(self.profile.iter().map(|(key, value)| Field::new(key, value)))
        .collect()
    }
}

#[derive(Clone, Debug, Tabled)]
pub(crate) struct Field {
    #[tabled(rename = "Field")]
    pub(crate) name: String,
    #[tabled(rename = "Value")]
    pub(crate) value: String,
}

impl Field {
    /// A backend field with its key title-cased for display.
    pub(crate) fn new(key: &str, value: &Value) -> Self {
        Self {
            name: key.to_title_case(),
            value: match *value {
                Value::String(ref s) => s.clone(),
                Value::Null => String::new(),
                Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
                    value.to_string()
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_test::{assert_de_tokens, assert_ser_tokens, Token};

    use super::*;

    #[test]
    fn serializes_flat() {
        let identity = Identity::new("D-100").with_field("first_name", "Amina");

        assert_ser_tokens(
            &identity,
            &[
                Token::Map { len: None },
                Token::Str("code"),
                Token::Str("D-100"),
                Token::Str("first_name"),
                Token::Str("Amina"),
                Token::MapEnd,
            ],
        );
    }

    #[test]
    fn deserializes_numeric_code() {
        let identity = Identity {
            code: Code::Number(17_u64.into()),
            profile: Map::new(),
        }
        .with_field("email", "teacher@example.com");

        assert_de_tokens(
            &identity,
            &[
                Token::Map { len: Some(2) },
                Token::Str("code"),
                Token::U64(17),
                Token::Str("email"),
                Token::Str("teacher@example.com"),
                Token::MapEnd,
            ],
        );
        assert_eq!(identity.usable_code().as_deref(), Some("17"));
    }

    #[test]
    fn unusable_codes() {
        assert_eq!(Identity::new("").usable_code(), None);
        assert_eq!(
            Identity {
                code: Code::Number(0_u64.into()),
                profile: Map::new(),
            }
            .usable_code(),
            None
        );
        assert_eq!(Identity::new("0").usable_code().as_deref(), Some("0"));
    }

    #[test]
    fn display_name_joins_parts() {
        let identity = Identity::new("D-1")
            .with_field("first_name", "Amina")
            .with_field("last_name", "Haddad");
        assert_eq!(identity.display_name().as_deref(), Some("Amina Haddad"));

        let identity = Identity::new("D-2").with_field("name", "Yusuf");
        assert_eq!(identity.display_name().as_deref(), Some("Yusuf"));

        assert_eq!(Identity::new("D-3").display_name(), None);
    }

    #[test]
    fn rows_start_with_code() {
        let rows = Identity::new("D-1")
            .with_field("phone_number", "0100")
            .with_field("age", 40)
            .rows();
        let rendered: Vec<_> = rows
            .iter()
            .map(|row| (row.name.as_str(), row.value.as_str()))
            .collect();
        assert_eq!(
            rendered,
            [("Code", "D-1"), ("Age", "40"), ("Phone Number", "0100")]
        );
    }
}
