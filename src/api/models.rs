use bon::Builder;
use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Debug, Display, Formatter};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Identifiers arrive as strings from some backend revisions and as numbers from others.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq, Hash)]
#[serde(untagged)]
pub enum IdValue {
    Number(i64),
    Text(String),
}

impl Display for IdValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IdValue::Number(n) => write!(f, "{n}"),
            IdValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for IdValue {
    fn from(value: i64) -> Self {
        IdValue::Number(value)
    }
}

impl From<&str> for IdValue {
    fn from(value: &str) -> Self {
        IdValue::Text(value.to_string())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(untagged)]
pub enum PaidFlag {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl PaidFlag {
    pub fn is_paid(&self) -> bool {
        match self {
            PaidFlag::Bool(b) => *b,
            PaidFlag::Number(n) => *n == 1,
            PaidFlag::Text(s) => s == "1",
        }
    }
}

#[derive(Builder, Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<IdValue>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<IdValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<IdValue>,
    #[serde(default, deserialize_with = "loose::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose::text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "loose::text")]
    pub mobile: Option<String>,
    #[serde(default)]
    pub is_paid: Option<PaidFlag>,
    #[serde(default, deserialize_with = "loose::text")]
    pub picture: Option<String>,
    #[serde(default, deserialize_with = "loose::text")]
    pub google_id: Option<String>,
    #[serde(default, deserialize_with = "loose::text")]
    pub created_at: Option<String>,
}

impl User {
    pub fn identifier(&self) -> Option<&IdValue> {
        self.id
            .as_ref()
            .or(self.object_id.as_ref())
            .or(self.user_id.as_ref())
    }

    pub fn is_paid(&self) -> bool {
        self.is_paid.as_ref().is_some_and(PaidFlag::is_paid)
    }

    pub fn initials(&self) -> String {
        let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) else {
            return "U".to_string();
        };
        name.split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .collect::<String>()
            .to_uppercase()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Failed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Builder, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Payment {
    #[serde(deserialize_with = "loose::unsigned")]
    pub payment_id: u64,
    #[serde(deserialize_with = "loose::unsigned")]
    pub user_id: u64,
    #[serde(default, deserialize_with = "loose::string")]
    #[builder(default)]
    pub name: String,
    #[serde(default, deserialize_with = "loose::string")]
    #[builder(default)]
    pub email: String,
    #[serde(default, deserialize_with = "loose::string")]
    #[builder(default)]
    pub stripe_session_id: String,
    #[serde(deserialize_with = "loose::decimal")]
    pub amount: f64,
    pub status: PaymentStatus,
    #[serde(default, deserialize_with = "loose::string")]
    #[builder(default)]
    pub created_at: String,
    #[serde(default, alias = "receiptUrl", skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
}

impl Payment {
    pub fn can_export_receipt(&self) -> bool {
        self.status == PaymentStatus::Paid
    }

    pub fn formatted_amount(&self) -> String {
        if self.amount.fract() == 0.0 && self.amount.abs() < 1e15 {
            format!("₹{}", self.amount as i64)
        } else {
            format!("₹{:.2}", self.amount)
        }
    }
}

/// Field decoders for values some backend revisions send as strings and others as numbers.
mod loose {
    use serde::de::{Deserializer, Error};
    use serde::Deserialize;
    use serde_json::Value;

    /// Scalars become their text form; anything else reads as absent.
    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        text(deserializer).map(Option::unwrap_or_default)
    }

    pub fn unsigned<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match &value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| D::Error::custom(format!("expected an unsigned integer, got {value}")))
    }

    pub fn decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match &value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok().filter(|n: &f64| n.is_finite()),
            _ => None,
        }
        .ok_or_else(|| D::Error::custom(format!("expected a number, got {value}")))
    }
}

/// The authenticated administrator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Admin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<IdValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Admin {
    pub fn with_email(email: &str) -> Self {
        Admin {
            id: None,
            name: None,
            email: email.to_string(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginResponse {
    pub token: String,
    pub admin: Admin,
}

#[derive(Serialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Secret {
    Password(String),
    Otp(String),
}

impl Debug for Secret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Secret::Password(_) => f.write_str("Password(***)"),
            Secret::Otp(_) => f.write_str("Otp(***)"),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Credentials {
    pub email: String,
    #[serde(flatten)]
    pub secret: Secret,
}

impl Credentials {
    pub fn password(email: &str, password: &str) -> Self {
        Credentials {
            email: email.to_string(),
            secret: Secret::Password(password.to_string()),
        }
    }

    pub fn otp(email: &str, code: &str) -> Self {
        Credentials {
            email: email.to_string(),
            secret: Secret::Otp(code.to_string()),
        }
    }
}

/// Renders a backend timestamp in local time, the raw value when it does not parse,
/// or `-` when it is missing.
pub fn format_timestamp(value: Option<&str>) -> String {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return "-".to_string();
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return parsed.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT) {
        return parsed.format(TIMESTAMP_FORMAT).to_string();
    }
    value.to_string()
}
