//! Turns loosely shaped backend payloads into the canonical shapes the console works with.
//!
//! Different backend revisions wrap list results differently. Every known wrapping is a
//! variant of [`RawList`]; anything else is [`RawList::Unrecognized`]. Probing never goes
//! deeper than `data.<key>`.

use crate::api::models::{Admin, LoginResponse, User};
use crate::api::Error;
use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

const DATA: &str = "data";
const TOKEN_KEYS: [&str; 2] = ["token", "accessToken"];
const PRINCIPAL_KEYS: [&str; 2] = ["admin", "user"];
const RECEIPT_KEYS: [&str; 3] = ["receiptUrl", "receipt_url", "url"];

/// The canonical list result every adapter hands to the views.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub items: Vec<T>,
    pub total: Option<u64>,
    pub total_pages: Option<u64>,
}

impl<T> Default for Envelope<T> {
    fn default() -> Self {
        Envelope {
            items: Vec::new(),
            total: None,
            total_pages: None,
        }
    }
}

impl<T> Envelope<T> {
    pub fn new(items: Vec<T>) -> Self {
        Envelope {
            items,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct PageMeta {
    pub total: Option<u64>,
    pub total_pages: Option<u64>,
}

impl PageMeta {
    fn from_object(object: &Map<String, Value>) -> Self {
        PageMeta {
            total: object.get("total").and_then(as_count),
            total_pages: object.get("totalPages").and_then(as_count),
        }
    }

    fn or(self, other: PageMeta) -> Self {
        PageMeta {
            total: self.total.or(other.total),
            total_pages: self.total_pages.or(other.total_pages),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum RawList<'a> {
    /// `[...]`
    Bare(&'a [Value]),
    /// `{ "<key>": [...] }`
    Keyed(&'a [Value], PageMeta),
    /// `{ "data": [...] }`
    Data(&'a [Value], PageMeta),
    /// `{ "data": { "<key>": [...] } }`
    NestedKeyed(&'a [Value], PageMeta),
    Unrecognized(String),
}

impl<'a> RawList<'a> {
    pub fn classify(payload: &'a Value, key: &str) -> Self {
        let object = match payload {
            Value::Array(items) => return RawList::Bare(items),
            Value::Object(object) => object,
            other => return RawList::Unrecognized(format!("payload is {}", describe(other))),
        };

        let data = present(object.get(DATA));
        let meta = match data {
            Some(Value::Object(nested)) => PageMeta::from_object(object).or(PageMeta::from_object(nested)),
            _ => PageMeta::from_object(object),
        };

        if let Some(value) = present(object.get(key)) {
            return match value {
                Value::Array(items) => RawList::Keyed(items, meta),
                other => RawList::Unrecognized(format!("`{key}` is {}", describe(other))),
            };
        }

        match data {
            Some(Value::Array(items)) => RawList::Data(items, meta),
            Some(Value::Object(nested)) => match present(nested.get(key)) {
                Some(Value::Array(items)) => RawList::NestedKeyed(items, meta),
                Some(other) => RawList::Unrecognized(format!("`data.{key}` is {}", describe(other))),
                None => RawList::Unrecognized(format!("`data` has no `{key}` field")),
            },
            Some(other) => RawList::Unrecognized(format!("`data` is {}", describe(other))),
            None => RawList::Unrecognized(format!("no `{key}` or `data` field")),
        }
    }
}

fn recognized<'a>(payload: &'a Value, key: &str) -> Result<(&'a [Value], PageMeta), Error> {
    match RawList::classify(payload, key) {
        RawList::Bare(items) => Ok((items, PageMeta::default())),
        RawList::Keyed(items, meta) | RawList::Data(items, meta) | RawList::NestedKeyed(items, meta) => {
            Ok((items, meta))
        }
        RawList::Unrecognized(reason) => Err(Error::UnexpectedPayload(reason)),
    }
}

/// Strict normalization: unknown shapes and undecodable items are errors.
pub fn normalize_strict<T: DeserializeOwned>(payload: &Value, key: &str) -> Result<Envelope<T>, Error> {
    let (items, meta) = recognized(payload, key)?;
    let items = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            T::deserialize(item).map_err(|e| Error::UnexpectedPayload(format!("{key}[{index}]: {e}")))
        })
        .collect::<Result<Vec<T>, Error>>()?;
    Ok(Envelope {
        items,
        total: meta.total,
        total_pages: meta.total_pages,
    })
}

/// Lenient normalization: never fails. An unknown shape becomes an empty envelope and
/// rows that don't decode are skipped; the remaining rows keep the page metadata.
pub fn normalize<T: DeserializeOwned>(payload: &Value, key: &str) -> Envelope<T> {
    let (items, meta) = match recognized(payload, key) {
        Ok(found) => found,
        Err(e) => {
            warn!("Treating `{key}` payload as empty: {e}");
            return Envelope::default();
        }
    };
    let items = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match T::deserialize(item) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping {key}[{index}]: {e}");
                None
            }
        })
        .collect();
    Envelope {
        items,
        total: meta.total,
        total_pages: meta.total_pages,
    }
}

pub fn normalize_login(payload: &Value, email: &str) -> Result<LoginResponse, Error> {
    let token = probe(payload, &TOKEN_KEYS)
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or(Error::MissingToken)?
        .to_string();

    let admin = match probe(payload, &PRINCIPAL_KEYS) {
        Some(Value::Object(principal)) => {
            let mut principal = principal.clone();
            principal
                .entry("email")
                .or_insert_with(|| Value::String(email.to_string()));
            Admin::deserialize(Value::Object(principal))?
        }
        _ => Admin::with_email(email),
    };

    Ok(LoginResponse { token, admin })
}

pub fn extract_user(payload: &Value) -> Result<User, Error> {
    let candidate = probe(payload, &["user"])
        .or_else(|| present(payload.get(DATA)).filter(|d| d.is_object()))
        .unwrap_or(payload);
    if !candidate.is_object() {
        return Err(Error::UnexpectedPayload(format!("user is {}", describe(candidate))));
    }
    Ok(User::deserialize(candidate)?)
}

pub fn extract_receipt_url(payload: &Value) -> Result<String, Error> {
    probe(payload, &RECEIPT_KEYS)
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::UnexpectedPayload("no receipt url in response".to_string()))
}

/// First non-null value under any of `keys` at the top level, then under `data`.
fn probe<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let top = keys.iter().find_map(|k| present(payload.get(k)));
    top.or_else(|| {
        let data = present(payload.get(DATA))?;
        keys.iter().find_map(|k| present(data.get(k)))
    })
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
