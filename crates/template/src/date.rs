//! Certificate dates: parsed when possible, raw text otherwise

use chrono::NaiveDate;
use std::fmt;

/// Canonical input pattern for record dates
pub const INPUT_PATTERN: &str = "%Y-%m-%d";

/// Pattern used on the certificate and in the verification payload
pub const DISPLAY_PATTERN: &str = "%B %d, %Y";

/// Date text from a record plus its parsed value, if it parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateDate {
    raw: String,
    parsed: Option<NaiveDate>,
}

impl CertificateDate {
    /// Parse `raw` against [`INPUT_PATTERN`]; failure keeps the raw text
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim().to_string();
        let parsed = NaiveDate::parse_from_str(&raw, INPUT_PATTERN).ok();
        Self { raw, parsed }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn parsed(&self) -> Option<NaiveDate> {
        self.parsed
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Formatted with [`DISPLAY_PATTERN`], or the raw text verbatim
    pub fn display(&self) -> String {
        match self.parsed {
            Some(date) => date.format(DISPLAY_PATTERN).to_string(),
            None => self.raw.clone(),
        }
    }
}

impl fmt::Display for CertificateDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<NaiveDate> for CertificateDate {
    fn from(date: NaiveDate) -> Self {
        Self {
            raw: date.format(INPUT_PATTERN).to_string(),
            parsed: Some(date),
        }
    }
}
