use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use std::path::PathBuf;

const SEED_DIR_NAME: &str = "weather_collector";

/// Default directory holding seed files: the platform data directory, or
/// `./data` when the platform has none.
pub fn default_seed_dir() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join(SEED_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Normalises a display name into a resource slug: lowercase, every run of
/// non-alphanumeric characters collapsed into one `-`, no leading or
/// trailing `-`.
///
/// `"Pelabuhan Pomalaa/Dawi-dawi"` becomes `"pelabuhan-pomalaa-dawi-dawi"`.
pub fn create_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Parses a stored fetch timestamp.
///
/// Accepts RFC 3339 with a `Z` suffix or an explicit offset, and naive ISO
/// timestamps (read as UTC). Anything else yields `None`.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    // Offsets without a colon, e.g. "+0700"
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Formats a timestamp the way every stored document carries it.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
