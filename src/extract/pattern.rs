//! Pattern extraction from element text
//!
//! Each [`TextPattern`] is a fixed regular expression compiled on first use.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

const EMAIL: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";

// (123) 456-7890, 123-456-7890, 123.456.7890, 1234567890
const PHONE: &str = r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}";

// 12/31/2023, 2023-12-31, January 1, 2023
const DATE: &str = r"(?i)\d{1,2}/\d{1,2}/\d{2,4}|\d{4}-\d{2}-\d{2}|\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]* \d{1,2},? \d{4}\b";

/// Built-in text patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextPattern {
    Email,
    Phone,
    Date,
}

impl TextPattern {
    fn regex(self) -> Option<&'static Regex> {
        static EMAIL_RE: OnceLock<Option<Regex>> = OnceLock::new();
        static PHONE_RE: OnceLock<Option<Regex>> = OnceLock::new();
        static DATE_RE: OnceLock<Option<Regex>> = OnceLock::new();

        let (cell, source) = match self {
            Self::Email => (&EMAIL_RE, EMAIL),
            Self::Phone => (&PHONE_RE, PHONE),
            Self::Date => (&DATE_RE, DATE),
        };
        cell.get_or_init(|| Regex::new(source).ok()).as_ref()
    }

    /// All matches in `text`, in order of appearance
    pub fn find_all(self, text: &str) -> Vec<String> {
        self.find_in([text])
    }

    /// All matches across `texts`, in order
    ///
    /// Phone numbers are reported once each; emails and dates keep repeats.
    /// Matches never span two texts.
    pub fn find_in<'a, I>(self, texts: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let Some(re) = self.regex() else {
            return Vec::new();
        };

        let matches = texts
            .into_iter()
            .flat_map(|text| re.find_iter(text).map(|m| m.as_str().to_string()).collect::<Vec<_>>());
        match self {
            Self::Phone => {
                let mut seen = HashSet::new();
                matches.filter(|m| seen.insert(m.clone())).collect()
            }
            Self::Email | Self::Date => matches.collect(),
        }
    }
}
