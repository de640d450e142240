use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

pub fn from_rfc3339(s: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

/// Parses RFC 3339 timestamps, falling back to zone-less ISO date-times
/// (read as UTC) the API emits for some records.
pub fn parse_timestamp(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let trimmed = s.trim();
    if let Ok(dt) = from_rfc3339(trimmed) {
        return Ok(dt);
    }
    let naive = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f"))?;
    Ok(naive.and_utc())
}

pub fn deserialize_flexible_opt<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => parse_timestamp(&raw)
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("Invalid timestamp {}: {}", raw, e))),
        _ => Ok(None),
    }
}

pub fn format_display(dt: &DateTime<Utc>) -> String {
    dt.format("%d/%m/%Y %H:%M").to_string()
}

pub fn format_display_opt(dt: Option<&DateTime<Utc>>) -> String {
    dt.map(format_display)
        .unwrap_or_else(|| "Fecha no disponible".to_string())
}
