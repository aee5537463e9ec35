//! Edge names as they appear in page URLs (`pw0&pw1`)

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while parsing an edge name from a route
#[derive(Error, Debug, PartialEq)]
pub enum EdgeNameError {
    #[error("Edge name must contain exactly two pathways separated by '&': {0}")]
    Malformed(String),
}

/// A network edge identified by its two pathway names, in URL order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeName {
    pub pw0: String,
    pub pw1: String,
}

impl EdgeName {
    pub fn new(pw0: impl Into<String>, pw1: impl Into<String>) -> Self {
        Self {
            pw0: pw0.into(),
            pw1: pw1.into(),
        }
    }

    /// Parse `"pw0&pw1"`. Exactly one separator is accepted.
    pub fn parse(raw: &str) -> Result<Self, EdgeNameError> {
        let mut parts = raw.split('&');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(pw0), Some(pw1), None) => Ok(Self::new(pw0, pw1)),
            _ => Err(EdgeNameError::Malformed(raw.to_string())),
        }
    }

    /// Names used to query `pathcore_edge_data`.
    ///
    /// The loaded KEGG pathway names spell the organism `PA01`, so the
    /// `PAO1` prefix shown to users is rewritten before lookup.
    pub fn lookup_names(&self) -> (String, String) {
        (
            self.pw0.replace("PAO1", "PA01"),
            self.pw1.replace("PAO1", "PA01"),
        )
    }

    /// Stem of the spreadsheet export file
    pub fn export_stem(&self) -> String {
        format!(
            "{}-{}_edge_heatmap_data",
            self.pw0.replace(',', ""),
            self.pw1.replace(',', "")
        )
    }
}

impl fmt::Display for EdgeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}&{}", self.pw0, self.pw1)
    }
}
