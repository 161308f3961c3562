//! Frame tagging for metadata and historical lines.
//!
//! Live log lines travel verbatim. Metadata frames look like
//! `<meta_prefix>:<KIND>:<field>...` and historical lines like
//! `<historical_prefix>:<line>`, so a viewer can tell them apart from log
//! content. The prefixes belong to the viewer protocol and are configurable;
//! lines are never rewritten beyond adding the prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_META_PREFIX: &str = "__META__";
pub const DEFAULT_HISTORICAL_PREFIX: &str = "__HISTORICAL__";

/// A structured metadata record sent alongside log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaRecord {
    /// Sent after the join snapshot: total lines in the file and lines just sent.
    InitialLoad { total: usize, shown: usize },
    /// Reply to a `LOAD_MORE` control message.
    LoadMoreResponse { total: usize },
}

impl MetaRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            MetaRecord::InitialLoad { .. } => "INITIAL_LOAD",
            MetaRecord::LoadMoreResponse { .. } => "LOAD_MORE_RESPONSE",
        }
    }
}

impl fmt::Display for MetaRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaRecord::InitialLoad { total, shown } => {
                write!(f, "{}:{}:{}", self.kind(), total, shown)
            }
            MetaRecord::LoadMoreResponse { total } => write!(f, "{}:{}", self.kind(), total),
        }
    }
}

/// Prefixes distinguishing metadata and historical frames from log content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Framing {
    pub meta_prefix: String,
    pub historical_prefix: String,
}

impl Default for Framing {
    fn default() -> Self {
        Self {
            meta_prefix: DEFAULT_META_PREFIX.to_string(),
            historical_prefix: DEFAULT_HISTORICAL_PREFIX.to_string(),
        }
    }
}

impl Framing {
    pub fn meta(&self, record: MetaRecord) -> String {
        format!("{}:{}", self.meta_prefix, record)
    }

    pub fn historical(&self, line: &str) -> String {
        format!("{}:{}", self.historical_prefix, line)
    }

    /// Parses a metadata frame produced by [`Framing::meta`].
    ///
    /// Returns `None` for ordinary log lines and for unknown kinds.
    pub fn parse_meta(&self, frame: &str) -> Option<MetaRecord> {
        let body = frame
            .strip_prefix(self.meta_prefix.as_str())?
            .strip_prefix(':')?;
        let mut fields = body.split(':');

        match fields.next()? {
            "INITIAL_LOAD" => {
                let total = fields.next()?.parse().ok()?;
                let shown = fields.next()?.parse().ok()?;
                Some(MetaRecord::InitialLoad { total, shown })
            }
            "LOAD_MORE_RESPONSE" => {
                let total = fields.next()?.parse().ok()?;
                Some(MetaRecord::LoadMoreResponse { total })
            }
            _ => None,
        }
    }

    /// Strips the historical prefix, if present.
    pub fn parse_historical<'a>(&self, frame: &'a str) -> Option<&'a str> {
        frame
            .strip_prefix(self.historical_prefix.as_str())?
            .strip_prefix(':')
    }
}
