use serde_json::{Map, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

pub const SCHEMA_VERSION: &str = "1.0";

/// Parses model output as a JSON object, tolerating one surrounding markdown fence.
pub fn parse_model_json(raw: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(strip_code_fence(raw)).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return trimmed;
    };
    let inner = inner.trim_start();
    if inner.starts_with(['{', '[']) {
        return inner.trim_end();
    }
    // Info string ("json") on the opening fence, with or without a newline after it.
    inner
        .trim_start_matches(|c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
        .trim()
}

/// Stamps the reply with schema version, caller id and response time.
pub fn finalize(mut body: Map<String, Value>, user_id: &str, now: OffsetDateTime) -> Value {
    body.entry("schema_version")
        .or_insert_with(|| Value::String(SCHEMA_VERSION.into()));
    body.insert("user_id".into(), Value::String(user_id.into()));
    body.insert("datetime_utc".into(), Value::String(utc_iso(now)));
    Value::Object(body)
}

pub fn utc_iso(now: OffsetDateTime) -> String {
    now.to_offset(time::UtcOffset::UTC)
        .format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}
