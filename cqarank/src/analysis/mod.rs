//! Corpus inspection helpers

use crate::corpus::{Document, DocumentTree};
use crate::filter::{FilterCombination, Stopwords};
use serde::Serialize;
use std::collections::BTreeMap;

/// Token length distribution of a document tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LengthHistogram {
    /// Length in characters -> token count
    pub counts: BTreeMap<usize, usize>,
    /// Threshold the two totals are split on
    pub threshold: usize,
    /// Tokens strictly longer than the threshold
    pub above: usize,
    /// Tokens at or below the threshold
    pub at_or_below: usize,
}

impl LengthHistogram {
    /// Total number of tokens
    pub fn total(&self) -> usize {
        self.above + self.at_or_below
    }
}

/// Count token lengths over every document of a tree
pub fn length_histogram(tree: &DocumentTree, threshold: usize) -> LengthHistogram {
    let mut histogram = LengthHistogram {
        threshold,
        ..LengthHistogram::default()
    };
    for token in tree.documents().flat_map(|doc| doc.tokens.iter()) {
        let length = token.text.chars().count();
        *histogram.counts.entry(length).or_insert(0) += 1;
        if length > threshold {
            histogram.above += 1;
        } else {
            histogram.at_or_below += 1;
        }
    }
    histogram
}

/// Tokens of a document that pass every filter
pub fn kept_tokens<'a>(
    document: &'a Document,
    filters: &FilterCombination,
    stopwords: &Stopwords,
) -> Vec<&'a str> {
    document
        .tokens
        .iter()
        .map(|t| t.text.as_str())
        .filter(|text| filters.accepts(text, stopwords))
        .collect()
}

/// Number of tokens the filters remove from each candidate of an original
/// question, or None if the question is unknown
pub fn removed_tokens(
    tree: &DocumentTree,
    original: &str,
    filters: &FilterCombination,
    stopwords: &Stopwords,
) -> Option<BTreeMap<String, usize>> {
    let node = tree.get(original)?;
    Some(
        node.candidates
            .iter()
            .map(|(candidate, document)| {
                let kept = kept_tokens(document, filters, stopwords).len();
                (candidate.clone(), document.tokens.len() - kept)
            })
            .collect(),
    )
}
