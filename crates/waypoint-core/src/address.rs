//! Structured address details attached to a [`Location`](crate::Location).

use serde::{Deserialize, Serialize};

const COUNTRY_SUFFIXES: &[&str] = &["usa", "us", "united states", "united states of america"];

/// Street / city / state / zip breakdown of a formatted address.
///
/// Every field is optional while a location is being resolved; an address
/// is considered complete once both `city` and `state` are known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedAddress {
    #[serde(rename = "streetAddress", default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

impl DetailedAddress {
    /// Returns `true` when both city and state are present and non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        non_blank(self.city.as_deref()) && non_blank(self.state.as_deref())
    }

    /// Best-effort breakdown of a comma-separated formatted address such as
    /// `"100 Main St, Springfield, IL 62701, USA"`.
    ///
    /// Used when a provider (or the degrade path) hands back only a display
    /// string. A single-segment address yields an empty breakdown.
    #[must_use]
    pub fn parse_formatted(formatted: &str) -> Self {
        let mut parts: Vec<&str> = formatted
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        if parts.len() >= 2 {
            if let Some(last) = parts.last() {
                if COUNTRY_SUFFIXES.contains(&last.to_lowercase().as_str()) {
                    parts.pop();
                }
            }
        }

        let (street, city, region) = match parts.as_slice() {
            [] | [_] => return Self::default(),
            [city, region] => (None, Some(*city), *region),
            [street, .., city, region] => (Some(*street), Some(*city), *region),
        };

        let (state, zip_code) = split_region(region);

        Self {
            street: street.map(ToOwned::to_owned),
            city: city.map(ToOwned::to_owned),
            state,
            zip_code,
        }
    }

    /// Fills every missing field from `other`, keeping fields already set.
    #[must_use]
    pub fn or(self, other: DetailedAddress) -> Self {
        Self {
            street: self.street.or(other.street),
            city: self.city.or(other.city),
            state: self.state.or(other.state),
            zip_code: self.zip_code.or(other.zip_code),
        }
    }
}

fn non_blank(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Splits `"IL 62701"` / `"Illinois 62701"` / `"IL"` into state and zip.
fn split_region(region: &str) -> (Option<String>, Option<String>) {
    let mut tokens: Vec<&str> = region.split_whitespace().collect();
    let zip_code = match tokens.last() {
        Some(last)
            if last.chars().any(|c| c.is_ascii_digit())
                && last.chars().all(|c| c.is_ascii_digit() || c == '-') =>
        {
            let zip = (*last).to_owned();
            tokens.pop();
            Some(zip)
        }
        _ => None,
    };
    let state = if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    };
    (state, zip_code)
}
