//! Post records as the API sends them, and the normalized form the rest of
//! the client works with.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{serde_as, DefaultOnNull, NoneAsEmptyString};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

pub mod feed;
pub mod preview;

pub use feed::{sort_by_recent_update, FeedView, PostList};

/// Opaque server identifier. The API may send it as a string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PostId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl<'de> Deserialize<'de> for PostId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => PostId(text),
            RawId::Number(number) => PostId(number.to_string()),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorRef {
    #[serde(default)]
    pub username: Option<String>,
}

/// A post exactly as decoded from the wire; every field but the id may be
/// missing or malformed.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    #[serde(alias = "_id")]
    pub id: PostId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde_as(as = "DefaultOnNull<NoneAsEmptyString>")]
    #[serde(default)]
    pub username: Option<String>,
    #[serde_as(as = "DefaultOnNull<NoneAsEmptyString>")]
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author: Option<AuthorRef>,
    #[serde(default)]
    pub created_at: Option<serde_json::Value>,
    #[serde(default)]
    pub updated_at: Option<serde_json::Value>,
}

impl PostRecord {
    fn author_name(&self) -> Option<String> {
        self.username
            .clone()
            .or_else(|| self.author_name.clone())
            .or_else(|| self.author.as_ref().and_then(|a| a.username.clone()))
            .filter(|name| !name.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    /// Opaque HTML produced by the editor.
    pub content: String,
    pub author_name: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    /// The server's creation timestamp when it was present but unreadable.
    /// `created_at` still holds a usable fallback for ordering.
    pub created_at_raw: Option<String>,
}

impl Post {
    /// Creation date as shown next to the post; an unreadable server value
    /// renders as "Date not available".
    pub fn created_label(&self, style: preview::DateStyle) -> String {
        match &self.created_at_raw {
            Some(raw) => preview::raw_date_label(raw, style),
            None => preview::date_label(&self.created_at, style),
        }
    }

    pub fn was_edited(&self) -> bool {
        self.updated_at != self.created_at
    }

    pub fn author_label(&self) -> &str {
        self.author_name.as_deref().unwrap_or("Anonymous")
    }
}

/// Fills in missing or unparseable timestamps so that both are real and
/// `updated_at >= created_at`.
pub fn normalize(record: PostRecord, now: OffsetDateTime) -> Post {
    let author_name = record.author_name();
    let parsed_created = record.created_at.as_ref().and_then(parse_timestamp);
    let created_at_raw = match (&record.created_at, parsed_created) {
        (Some(serde_json::Value::Null), _) | (None, _) | (_, Some(_)) => None,
        (Some(serde_json::Value::String(raw)), None) => Some(raw.clone()),
        (Some(other), None) => Some(other.to_string()),
    };
    let created_at = parsed_created.unwrap_or(now);
    let updated_at = record
        .updated_at
        .as_ref()
        .and_then(parse_timestamp)
        .unwrap_or(created_at)
        .max(created_at);

    Post {
        id: record.id,
        title: record.title.unwrap_or_default(),
        content: record.content.unwrap_or_default(),
        author_name,
        created_at,
        updated_at,
        created_at_raw,
    }
}

pub fn normalize_all(records: Vec<PostRecord>, now: OffsetDateTime) -> Vec<Post> {
    records
        .into_iter()
        .map(|record| normalize(record, now))
        .collect()
}

/// Accepts RFC 3339 strings, naive `YYYY-MM-DD[ T]HH:MM:SS[.fff]` (read as
/// UTC), bare dates, and epoch milliseconds.
pub fn parse_timestamp(value: &serde_json::Value) -> Option<OffsetDateTime> {
    match value {
        serde_json::Value::String(raw) => parse_timestamp_str(raw),
        serde_json::Value::Number(number) => {
            let millis = number
                .as_i64()
                .or_else(|| number.as_f64().map(|f| f as i64))?;
            OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
        }
        _ => None,
    }
}

pub fn parse_timestamp_str(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(dt);
    }
    let naive_formats = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ];
    for format in naive_formats {
        if let Ok(dt) = PrimitiveDateTime::parse(raw, format) {
            return Some(dt.assume_utc());
        }
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.with_time(Time::MIDNIGHT).assume_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn record(value: serde_json::Value) -> PostRecord {
        serde_json::from_value(value).expect("valid post record")
    }

    #[test]
    fn missing_created_at_defaults_both_timestamps_to_now() {
        let now = datetime!(2024-03-01 12:00 UTC);
        let post = normalize(record(json!({ "id": 1, "title": "t" })), now);
        assert_eq!(post.created_at, now);
        assert_eq!(post.updated_at, post.created_at);
        assert!(!post.was_edited());
    }

    #[test]
    fn invalid_updated_at_falls_back_to_created_at() {
        let now = datetime!(2024-03-01 12:00 UTC);
        let post = normalize(
            record(json!({
                "id": "a1",
                "createdAt": "2024-01-05T10:00:00Z",
                "updatedAt": "Invalid Date"
            })),
            now,
        );
        assert_eq!(post.created_at, datetime!(2024-01-05 10:00 UTC));
        assert_eq!(post.updated_at, post.created_at);
    }

    #[test]
    fn unparseable_created_at_is_replaced_with_now() {
        let now = datetime!(2024-03-01 12:00 UTC);
        let post = normalize(
            record(json!({ "id": "a1", "createdAt": "yesterday-ish" })),
            now,
        );
        assert_eq!(post.created_at, now);
        assert_eq!(post.updated_at, now);
    }

    #[test]
    fn updated_before_created_is_clamped() {
        let now = datetime!(2024-03-01 12:00 UTC);
        let post = normalize(
            record(json!({
                "id": 7,
                "createdAt": "2024-02-01T00:00:00Z",
                "updatedAt": "2024-01-01T00:00:00Z"
            })),
            now,
        );
        assert_eq!(post.updated_at, post.created_at);
    }

    #[test]
    fn numeric_ids_and_mongo_style_ids_are_accepted() {
        assert_eq!(record(json!({ "id": 42 })).id, PostId::new("42"));
        assert_eq!(
            record(json!({ "_id": "65f0c0ffee" })).id,
            PostId::new("65f0c0ffee")
        );
    }

    #[test]
    fn author_name_prefers_username_then_falls_back() {
        let now = datetime!(2024-03-01 12:00 UTC);
        let from_username = normalize(record(json!({ "id": 1, "username": "ada" })), now);
        assert_eq!(from_username.author_label(), "ada");

        let from_nested = normalize(
            record(json!({ "id": 2, "username": "", "author": { "username": "grace" } })),
            now,
        );
        assert_eq!(from_nested.author_label(), "grace");

        let anonymous = normalize(record(json!({ "id": 3, "username": null })), now);
        assert_eq!(anonymous.author_label(), "Anonymous");
    }

    #[test]
    fn parses_the_timestamp_shapes_servers_send() {
        let expected = datetime!(2024-01-05 10:30:00 UTC);
        for raw in [
            json!("2024-01-05T10:30:00Z"),
            json!("2024-01-05T10:30:00.000Z"),
            json!("2024-01-05T12:30:00+02:00"),
            json!("2024-01-05 10:30:00"),
            json!("2024-01-05T10:30:00"),
            json!(1_704_450_600_000_i64),
        ] {
            assert_eq!(parse_timestamp(&raw), Some(expected), "input {raw}");
        }
        assert_eq!(
            parse_timestamp(&json!("2024-01-05")),
            Some(datetime!(2024-01-05 00:00 UTC))
        );
        assert_eq!(parse_timestamp(&json!(null)), None);
        assert_eq!(parse_timestamp(&json!("")), None);
    }
}
