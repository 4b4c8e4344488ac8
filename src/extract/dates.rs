//! Date range parsing
//!
//! Profile captions look like `Jan 2020 - Present · 3 yrs 2 mos`,
//! `2015 - 2019` or `Issued Mar 2021`. Anything that does not fit a known
//! pattern is kept verbatim as `DateRange::Raw`.

use phf::phf_map;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static MONTHS: phf::Map<&'static str, u8> = phf_map! {
    "jan" => 1, "january" => 1,
    "feb" => 2, "february" => 2,
    "mar" => 3, "march" => 3,
    "apr" => 4, "april" => 4,
    "may" => 5,
    "jun" => 6, "june" => 6,
    "jul" => 7, "july" => 7,
    "aug" => 8, "august" => 8,
    "sep" => 9, "sept" => 9, "september" => 9,
    "oct" => 10, "october" => 10,
    "nov" => 11, "november" => 11,
    "dec" => 12, "december" => 12,
};

static OPEN_ENDED: [&str; 4] = ["present", "current", "now", "today"];

static PARTIAL_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:([A-Za-z]{3,9})\.?\s+)?(\d{4})$").expect("valid date regex"));

static RANGE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(?:\s-\s|\u{2013}|\u{2014}|\bto\b)\s*").expect("valid separator regex"));

static LEADING_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:issued|expires|expired|from)\s+").expect("valid label regex"));

/// A year with an optional month, rendered `YYYY` or `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PartialDate {
    pub year: u16,
    pub month: Option<u8>,
}

impl PartialDate {
    pub fn parse(text: &str) -> Option<Self> {
        let caps = PARTIAL_DATE.captures(text.trim())?;
        let year: u16 = caps[2].parse().ok()?;
        let month = match caps.get(1) {
            Some(m) => Some(*MONTHS.get(m.as_str().to_lowercase().as_str())?),
            None => None,
        };
        Some(Self { year, month })
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            Some(month) => write!(f, "{:04}-{:02}", self.year, month),
            None => write!(f, "{:04}", self.year),
        }
    }
}

impl From<PartialDate> for String {
    fn from(date: PartialDate) -> Self {
        date.to_string()
    }
}

impl TryFrom<String> for PartialDate {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let (year, month) = match value.split_once('-') {
            Some((y, m)) => (y, Some(m)),
            None => (value.as_str(), None),
        };
        let year = year.parse().map_err(|_| format!("invalid year in {}", value))?;
        let month = match month {
            Some(m) => match m.parse::<u8>() {
                Ok(m @ 1..=12) => Some(m),
                _ => return Err(format!("invalid month in {}", value)),
            },
            None => None,
        };
        Ok(Self { year, month })
    }
}

/// A normalized `{start, end}` range (`end: null` for ongoing) or the
/// caption text exactly as shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateRange {
    Parsed {
        start: PartialDate,
        end: Option<PartialDate>,
    },
    Raw(String),
}

impl DateRange {
    pub fn parse(text: &str) -> Self {
        Self::parse_range(text).unwrap_or_else(|| DateRange::Raw(text.to_string()))
    }

    fn parse_range(text: &str) -> Option<Self> {
        // Drop the duration suffix (`· 3 yrs 2 mos`)
        let dates = text.split('\u{b7}').next()?.trim();
        let dates = LEADING_LABEL.replace(dates, "");

        let mut parts = RANGE_SEPARATOR.splitn(&dates, 2);
        let start = PartialDate::parse(parts.next()?)?;

        let end = match parts.next().map(str::trim) {
            None => Some(start),
            Some(end) if OPEN_ENDED.contains(&end.to_lowercase().as_str()) => None,
            Some(end) => Some(PartialDate::parse(end)?),
        };
        Some(DateRange::Parsed { start, end })
    }

    /// Still ongoing: parsed with no end, or raw text mentioning "present"
    pub fn is_current(&self) -> bool {
        match self {
            DateRange::Parsed { end, .. } => end.is_none(),
            DateRange::Raw(text) => text.to_lowercase().contains("present"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: u16, month: u8) -> PartialDate {
        PartialDate {
            year,
            month: Some(month),
        }
    }

    #[test]
    fn test_month_year_range_with_duration() {
        assert_eq!(
            DateRange::parse("Jan 2020 - Present · 3 yrs 2 mos"),
            DateRange::Parsed {
                start: ym(2020, 1),
                end: None
            }
        );
        assert_eq!(
            DateRange::parse("Sept 2016 – Dec 2019 · 3 yrs 4 mos"),
            DateRange::Parsed {
                start: ym(2016, 9),
                end: Some(ym(2019, 12))
            }
        );
    }

    #[test]
    fn test_year_only_and_single_dates() {
        let y = |year| PartialDate { year, month: None };
        assert_eq!(
            DateRange::parse("2015 - 2019"),
            DateRange::Parsed {
                start: y(2015),
                end: Some(y(2019))
            }
        );
        assert_eq!(
            DateRange::parse("Issued Mar 2021"),
            DateRange::Parsed {
                start: ym(2021, 3),
                end: Some(ym(2021, 3))
            }
        );
    }

    #[test]
    fn test_malformed_dates_are_preserved_verbatim() {
        for text in ["Spring semester", "Jan 20 - ???", "Smarch 2020 - 2021", "2019 - sometime", ""] {
            assert_eq!(DateRange::parse(text), DateRange::Raw(text.to_string()));
        }
    }

    #[test]
    fn test_serialized_shape() {
        let parsed = DateRange::parse("Feb 2021 - Present");
        assert_eq!(
            serde_json::to_value(&parsed).unwrap(),
            serde_json::json!({"start": "2021-02", "end": null})
        );
        let raw = DateRange::parse("whenever");
        assert_eq!(serde_json::to_value(&raw).unwrap(), serde_json::json!("whenever"));
    }

    #[test]
    fn test_is_current() {
        assert!(DateRange::parse("Jan 2020 - Present").is_current());
        assert!(!DateRange::parse("2015 - 2019").is_current());
        assert!(DateRange::Raw("since forever (present)".into()).is_current());
    }
}
