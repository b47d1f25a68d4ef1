//! Wire types of the ledger REST API (`/api`).
//!
//! Every body is JSON. Amounts travel as JSON numbers (decimal, not minor units)
//! because the backend stores them as floats.

use serde::{Deserialize, Serialize};

/// Server-assigned account identifier.
pub type AccountId = i64;

pub mod auth {
    use super::*;

    /// Request body for `POST /auth/login` and `POST /auth/register`.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Credentials {
        pub username: String,
        pub password: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct TokenResponse {
        pub access_token: String,
    }

    /// Response body for `GET /me`.
    ///
    /// The backend may add fields; only `username` is required.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Me {
        pub username: String,
    }
}

pub mod account {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Account {
        pub id: AccountId,
        pub owner: String,
        pub balance: f64,
    }
}

pub mod operation {
    use chrono::{DateTime, Utc};

    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum OperationKind {
        #[default]
        Deposit,
        Withdraw,
    }

    impl OperationKind {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Deposit => "deposit",
                Self::Withdraw => "withdraw",
            }
        }

        #[must_use]
        pub fn toggled(self) -> Self {
            match self {
                Self::Deposit => Self::Withdraw,
                Self::Withdraw => Self::Deposit,
            }
        }
    }

    /// Request body for `POST /accounts/{id}/transactions`.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct OperationNew {
        #[serde(rename = "type")]
        pub kind: OperationKind,
        pub amount: f64,
    }

    /// Response body for `POST /accounts/{id}/transactions`.
    ///
    /// All fields are optional: callers only rely on the request having
    /// succeeded.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct OperationReceipt {
        #[serde(default)]
        pub message: Option<String>,
        #[serde(default)]
        pub transaction: Option<StatementRow>,
        #[serde(default)]
        pub balance: Option<f64>,
    }

    /// One entry of `GET /accounts/{id}/statement`.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct StatementRow {
        #[serde(default)]
        pub id: Option<i64>,
        #[serde(rename = "type")]
        pub kind: OperationKind,
        pub amount: f64,
        /// ISO-8601 timestamp. Naive values (no offset) are read as UTC.
        #[serde(with = "timestamp")]
        pub timestamp: DateTime<Utc>,
    }

    mod timestamp {
        use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
        use serde::{Deserialize, Deserializer, Serializer, de::Error};

        pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
            s.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Micros, true))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
            let raw = String::deserialize(d)?;
            if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
                return Ok(dt.with_timezone(&Utc));
            }
            NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc())
                .map_err(|err| D::Error::custom(format!("invalid timestamp {raw:?}: {err}")))
        }
    }
}

pub mod error {
    use super::*;

    /// Error body returned by the backend on non-2xx responses.
    ///
    /// `detail` is usually a string; request validation failures carry a list
    /// of objects with a `msg` field instead.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ErrorBody {
        pub detail: Detail,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum Detail {
        Message(String),
        Issues(Vec<Issue>),
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Issue {
        pub msg: String,
    }

    impl ErrorBody {
        /// Human readable message, `None` when the detail carries no text.
        pub fn message(&self) -> Option<String> {
            let text = match &self.detail {
                Detail::Message(message) => message.trim().to_string(),
                Detail::Issues(issues) => issues
                    .iter()
                    .map(|issue| issue.msg.trim())
                    .filter(|msg| !msg.is_empty())
                    .collect::<Vec<_>>()
                    .join("; "),
            };
            (!text.is_empty()).then_some(text)
        }
    }
}
