use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Contents of the installed-version descriptor (`metadata.json`).
///
/// ```json
/// { "Version": "1.0" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstalledVersionInfo {
    /// Installed version string. Compared verbatim, never parsed.
    #[serde(default)]
    pub version: Option<String>,
}

/// Contents of the available-update descriptor (`update.json`).
///
/// ```json
/// { "DownloadUrl": "https://example.com/update.zip", "Version": "1.1", "Released": "2024-05-01T10:00:00Z" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AvailableUpdateInfo {
    /// Where the package was downloaded from.
    #[serde(default)]
    pub download_url: Option<String>,

    /// Version the package installs.
    #[serde(default)]
    pub version: Option<String>,

    /// Release timestamp. Offsets are honored; timestamps without one are read as UTC.
    #[serde(default, deserialize_with = "deserialize_released")]
    pub released: Option<DateTime<Utc>>,
}

impl InstalledVersionInfo {
    /// `true` when the version contains an `a`, in any case.
    #[must_use]
    pub fn is_alpha(&self) -> bool {
        contains_marker(self.version.as_deref(), 'a')
    }

    /// `true` when the version contains a `b`, in any case.
    #[must_use]
    pub fn is_beta(&self) -> bool {
        contains_marker(self.version.as_deref(), 'b')
    }
}

impl AvailableUpdateInfo {
    /// `true` when the version contains an `a`, in any case.
    #[must_use]
    pub fn is_alpha(&self) -> bool {
        contains_marker(self.version.as_deref(), 'a')
    }

    /// `true` when the version contains a `b`, in any case.
    #[must_use]
    pub fn is_beta(&self) -> bool {
        contains_marker(self.version.as_deref(), 'b')
    }
}

// Plain substring match: "beta" is both alpha and beta, "1.0a" is alpha.
fn contains_marker(version: Option<&str>, marker: char) -> bool {
    version.is_some_and(|v| v.chars().any(|c| c.eq_ignore_ascii_case(&marker)))
}

fn deserialize_released<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(text) => parse_timestamp(&text).map(Some).map_err(serde::de::Error::custom),
    }
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").map(|n| n.and_utc()))
}
