//! Gold relevance judgments

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Candidate id -> relevant?
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Relevance {
    judgments: BTreeMap<String, bool>,
}

impl Relevance {
    /// Create an empty set of judgments
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a judgment, replacing any previous one
    pub fn insert(&mut self, candidate: impl Into<String>, relevant: bool) {
        self.judgments.insert(candidate.into(), relevant);
    }

    /// Judgment of a candidate, if any
    pub fn get(&self, candidate: &str) -> Option<bool> {
        self.judgments.get(candidate).copied()
    }

    /// Number of judged candidates
    pub fn len(&self) -> usize {
        self.judgments.len()
    }

    /// Whether nothing is judged
    pub fn is_empty(&self) -> bool {
        self.judgments.is_empty()
    }

    /// Number of candidates judged relevant
    pub fn relevant_count(&self) -> usize {
        self.judgments.values().filter(|r| **r).count()
    }

    /// Parse a tab-separated relevancy file
    ///
    /// Column 2 holds the candidate id and column 5 the literal `true` for
    /// relevant candidates; any other value is irrelevant.
    pub fn from_relevancy_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut relevance = Relevance::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let columns: Vec<&str> = line.split('\t').collect();
            if columns.len() < 5 {
                return Err(Error::ParseError {
                    line: idx + 1,
                    message: format!("expected at least 5 tab-separated columns, got {}", columns.len()),
                });
            }
            relevance.insert(columns[1], columns[4] == "true");
        }
        Ok(relevance)
    }

    /// Read a relevancy file from disk
    pub fn load_relevancy<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Relevance::from_relevancy_reader(BufReader::new(file))
    }

    /// Parse a JSON object `{candidate_id: bool}`
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Read judgments from disk, JSON if the extension says so, relevancy
    /// format otherwise
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            let file = File::open(path)?;
            Relevance::from_json_reader(BufReader::new(file))
        } else {
            Relevance::load_relevancy(path)
        }
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for Relevance {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Self {
        let mut relevance = Relevance::new();
        for (candidate, relevant) in iter {
            relevance.insert(candidate, relevant);
        }
        relevance
    }
}
