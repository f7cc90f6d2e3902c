//! # cqarank - question similarity ranking for SemEval CQA
//!
//! Scores candidate questions against an original question with TF-IDF
//! weighted bag-of-words similarities, ranks them and measures the ranking
//! with Mean Average Precision.
//!
//! cqarank provides:
//! - **Document trees** built from annotated corpus records, cached on disk
//! - **Filter combinations** (stopwords, length thresholds) searched exhaustively
//! - **Similarity variants**: baseline, filtered, lemma, scaled and feature-weighted
//! - **Evaluation** with Average Precision / MAP and SemEval prediction files
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cqarank::{evaluate, out_of_corpus_value, score_with, IdfTable, Indicator, Relevance, ScoringContext, Similarity};
//!
//! let tree = /* DocumentTree built from annotated records */;
//! let idf = Arc::new(IdfTable::from_tree(&training, Indicator::Tokens, true));
//! let out_of_corpus = out_of_corpus_value(training.documents());
//!
//! let similarity = Similarity::Filtered;
//! let spec = similarity.bag_spec(Indicator::Tokens, "nostopwords+gtr2".parse()?);
//! let ctx = ScoringContext::new(idf, out_of_corpus, spec, Arc::new(cqarank::Stopwords::english()));
//!
//! let scores = score_with(&tree, &similarity, &ctx);
//! let evaluation = evaluate(&scores, &Relevance::load("test.relevancy")?)?;
//! println!("MAP = {:.4}", evaluation.map);
//! ```

pub mod analysis;
pub mod bag;
pub mod config;
pub mod corpus;
pub mod error;
pub mod evaluation;
pub mod filter;
pub mod prediction;
pub mod scoring;
pub mod search;
pub mod similarity;
pub mod stats;

// Re-exports for convenience
pub use bag::{make_bag, Bag, BagSpec, Indicator};
pub use config::ExperimentConfig;
pub use corpus::{classify_id, ContentScope, Document, DocumentTree, IdKind, Token, TreeCache};
pub use error::{Error, Result};
pub use evaluation::{average_precision, evaluate, mean_average_precision, Evaluation, Relevance};
pub use filter::{search_space, Filter, FilterCombination, Stopwords};
pub use scoring::{build_score_tree, score_with, ScoreTree};
pub use search::{SearchDriver, SearchReport};
pub use similarity::{ScoringContext, Similarity};
pub use stats::{out_of_corpus_value, IdfTable};

use std::cmp::Ordering;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default document tree cache directory
pub fn default_cache_dir() -> std::path::PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("cqarank")
}

/// One run of a natural sort key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum NaturalChunk {
    /// Non-digit run
    Text(String),
    /// Digit run, compared by value
    Number {
        /// Significant digit count
        digits: usize,
        /// Digits without leading zeros
        value: String,
    },
}

/// Split a string into alternating text and number runs
///
/// The key always starts with a text run (possibly empty), so keys of two
/// strings compare text with text and numbers with numbers.
///
/// # Examples
/// ```
/// use cqarank::{natural_sort_key, NaturalChunk};
///
/// let key = natural_sort_key("Q12_R3");
/// assert_eq!(key[0], NaturalChunk::Text("Q".to_string()));
/// assert_eq!(key.len(), 4);
/// ```
pub fn natural_sort_key(key: &str) -> Vec<NaturalChunk> {
    let mut chunks = Vec::new();
    let mut rest = key;
    let mut expect_digits = false;
    while !rest.is_empty() || chunks.is_empty() {
        let split = rest
            .find(|c: char| c.is_ascii_digit() != expect_digits)
            .unwrap_or(rest.len());
        let (run, tail) = rest.split_at(split);
        if expect_digits {
            let value = run.trim_start_matches('0');
            chunks.push(NaturalChunk::Number {
                digits: value.len(),
                value: value.to_string(),
            });
        } else {
            chunks.push(NaturalChunk::Text(run.to_string()));
        }
        rest = tail;
        expect_digits = !expect_digits;
    }
    chunks
}

/// Compare two strings with numbers ordered by value
///
/// # Examples
/// ```
/// use std::cmp::Ordering;
/// use cqarank::natural_cmp;
///
/// assert_eq!(natural_cmp("Q1_R2", "Q1_R10"), Ordering::Less);
/// assert_eq!(natural_cmp("Q10", "Q9"), Ordering::Greater);
/// ```
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_sort_key(a).cmp(&natural_sort_key(b))
}
