//! Core data types shared by the CLI and the HTTP server.

use serde::Serialize;
use std::path::PathBuf;

/// One fortune cookie: a body of text stored in a jar under a row id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fortune {
    pub jar: String,
    pub id: i64,
    pub body: String,
}

/// Fortune count for one jar and its share of the requested total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JarInfo {
    pub jar: String,
    #[serde(rename = "numfortunes")]
    pub num_fortunes: i64,
    /// Percentage in `[0, 100]`.
    #[serde(rename = "pcttotal")]
    pub pct_total: f64,
}

/// Result of loading one fortune file.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub jar: String,
    /// The file the fortunes were read from.
    pub path: PathBuf,
    pub fortunes: usize,
}
