use crate::catalog::{Catalog, Record};
use crate::error::{KaraokeError, Result};
use clap::ValueEnum;
use log::warn;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Substring,
    Regex,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Substring => write!(f, "substring"),
            MatchMode::Regex => write!(f, "regex"),
        }
    }
}

/// A compiled query, applied to both the performer and the title.
///
/// Both modes compile to a case-insensitive regex; substring mode escapes
/// the query first so it is matched literally under Unicode case folding.
#[derive(Debug, Clone)]
pub enum Matcher {
    Substring(Regex),
    Regex(Regex),
}

impl Matcher {
    pub fn new(query: &str, mode: MatchMode) -> Result<Self> {
        let pattern = match mode {
            MatchMode::Substring => regex::escape(query),
            MatchMode::Regex => query.to_string(),
        };
        let re = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(KaraokeError::Regex)?;
        Ok(match mode {
            MatchMode::Substring => Matcher::Substring(re),
            MatchMode::Regex => Matcher::Regex(re),
        })
    }

    pub fn is_match(&self, record: &Record) -> bool {
        match self {
            Matcher::Substring(re) if re.as_str().is_empty() => false,
            Matcher::Substring(re) | Matcher::Regex(re) => {
                re.is_match(&record.performer) || re.is_match(&record.title)
            }
        }
    }
}

/// Case-insensitive substring search over performer and title.
///
/// An empty query matches nothing. Deciding whether to show the whole
/// catalog when nothing was typed is up to the caller (see
/// [`Catalog::preview`]); this function is never the way to get it.
pub fn search<'a>(catalog: &'a Catalog, query: &str) -> Vec<&'a Record> {
    if query.is_empty() {
        return Vec::new();
    }
    match Matcher::new(query, MatchMode::Substring) {
        Ok(matcher) => search_with(catalog, &matcher),
        Err(e) => {
            warn!("Query too large to compile: {e}");
            Vec::new()
        }
    }
}

pub fn search_with<'a>(catalog: &'a Catalog, matcher: &Matcher) -> Vec<&'a Record> {
    catalog
        .records()
        .iter()
        .filter(|record| matcher.is_match(record))
        .collect()
}
