//! Similarity between an original question and a candidate
//!
//! Every variant builds one bag per document, intersects them, computes term
//! frequencies over the combined bag and sums TF-IDF weights over the shared
//! terms. Variants differ in how bags are built and how the sum is scaled or
//! weighted.

mod weighter;

pub use weighter::{FeatureWeighting, Weighter, DEFAULT_WEIGHT};

use crate::bag::{bag_of, make_unit_dict, Bag, BagSpec, Indicator};
use crate::corpus::Document;
use crate::error::{Error, Result};
use crate::filter::{FilterCombination, Stopwords};
use crate::stats::{term_frequencies, tf_idf, IdfTable, TermFrequencies};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Read-only inputs shared by every scoring call of a trial
#[derive(Debug, Clone)]
pub struct ScoringContext {
    /// IDF table of the training corpus
    pub idf: Arc<IdfTable>,
    /// IDF assumed for terms missing from `idf`
    pub out_of_corpus: f64,
    /// How documents are turned into bags
    pub bag: BagSpec,
    /// Stopwords used by `nostopwords`
    pub stopwords: Arc<Stopwords>,
}

impl ScoringContext {
    /// Context of one trial; `out_of_corpus` usually comes from
    /// [`out_of_corpus_value`](crate::stats::out_of_corpus_value)
    pub fn new(
        idf: Arc<IdfTable>,
        out_of_corpus: f64,
        bag: BagSpec,
        stopwords: Arc<Stopwords>,
    ) -> Self {
        ScoringContext {
            idf,
            out_of_corpus,
            bag,
            stopwords,
        }
    }

    /// Override the out-of-corpus value
    pub fn with_out_of_corpus(mut self, value: f64) -> Self {
        self.out_of_corpus = value;
        self
    }

    fn tf_idf(&self, term: &str, termfreq: &TermFrequencies) -> f64 {
        tf_idf(term, termfreq, &self.idf, self.out_of_corpus)
    }
}

/// How the summed TF-IDF of shared terms is scaled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleRule {
    /// Sum of contributions, multiplied once by the number of distinct
    /// shared terms
    #[default]
    Distinct,
    /// Contributions weighted by their shared occurrence count, the sum
    /// multiplied by the total shared occurrence count
    Occurrences,
}

impl ScaleRule {
    /// Scale the contributions of the terms of an intersection
    pub fn apply(&self, intersection: &Bag, contribution: impl Fn(&str) -> f64) -> f64 {
        match self {
            ScaleRule::Distinct => {
                let sum: f64 = intersection.iter().map(|(term, _)| contribution(term)).sum();
                sum * intersection.distinct() as f64
            }
            ScaleRule::Occurrences => {
                let sum: f64 = intersection
                    .iter()
                    .map(|(term, count)| contribution(term) * count as f64)
                    .sum();
                sum * intersection.total() as f64
            }
        }
    }
}

/// Similarity variant
#[derive(Debug, Clone, PartialEq)]
pub enum Similarity {
    /// Raw surface tokens, unfiltered
    Baseline,
    /// Filtered, lower-cased terms
    Filtered,
    /// Filtered lemmas
    Lemma,
    /// Filtered, lower-cased terms, sum scaled by the intersection size
    Scaled(ScaleRule),
    /// As `Scaled`, each term additionally weighted by linguistic features
    FeatureWeighted(FeatureWeighting),
}

impl Similarity {
    /// Name used on the command line, in reports and in file names
    pub fn name(&self) -> &'static str {
        match self {
            Similarity::Baseline => "baseline",
            Similarity::Filtered => "filtered",
            Similarity::Lemma => "lemma",
            Similarity::Scaled(ScaleRule::Distinct) => "scaled",
            Similarity::Scaled(ScaleRule::Occurrences) => "scaled_occurrences",
            Similarity::FeatureWeighted(_) => "weighted",
        }
    }

    /// Indicator the variant actually compares
    ///
    /// Baseline always reads surface tokens and lemma always reads lemmas,
    /// whatever the requested indicator.
    pub fn effective_indicator(&self, requested: Indicator) -> Indicator {
        match self {
            Similarity::Baseline => Indicator::Tokens,
            Similarity::Lemma => Indicator::Lemmas,
            _ => requested,
        }
    }

    /// Whether bags are lower-cased
    pub fn lowercases(&self) -> bool {
        matches!(
            self,
            Similarity::Filtered | Similarity::Scaled(_) | Similarity::FeatureWeighted(_)
        )
    }

    /// Whether the variant honors a filter combination
    pub fn uses_filters(&self) -> bool {
        !matches!(self, Similarity::Baseline)
    }

    /// Bag construction for an indicator and filter combination
    pub fn bag_spec(&self, indicator: Indicator, filters: FilterCombination) -> BagSpec {
        let filters = if self.uses_filters() {
            filters
        } else {
            FilterCombination::no_filter()
        };
        BagSpec::new(self.effective_indicator(indicator), filters, self.lowercases())
    }

    /// Similarity of two documents; 0 when they share no term
    pub fn score(&self, ctx: &ScoringContext, a: &Document, b: &Document) -> f64 {
        let units_a = make_unit_dict(&ctx.bag, a, &ctx.stopwords);
        let units_b = make_unit_dict(&ctx.bag, b, &ctx.stopwords);
        let bag_a = bag_of(&units_a);
        let bag_b = bag_of(&units_b);

        let intersection = bag_a.intersection(&bag_b);
        if intersection.is_empty() {
            return 0.0;
        }
        let termfreq = term_frequencies(&(&bag_a + &bag_b));

        match self {
            Similarity::Baseline | Similarity::Filtered | Similarity::Lemma => intersection
                .iter()
                .map(|(term, _)| ctx.tf_idf(term, &termfreq))
                .sum(),
            Similarity::Scaled(rule) => {
                rule.apply(&intersection, |term| ctx.tf_idf(term, &termfreq))
            }
            Similarity::FeatureWeighted(weighting) => {
                weighting.scale.apply(&intersection, |term| {
                    let occurrences_a = units_a.get(term).map(Vec::as_slice).unwrap_or(&[]);
                    let occurrences_b = units_b.get(term).map(Vec::as_slice).unwrap_or(&[]);
                    ctx.tf_idf(term, &termfreq) * weighting.coefficient(occurrences_a, occurrences_b)
                })
            }
        }
    }
}

impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Similarity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "baseline" => Ok(Similarity::Baseline),
            "filtered" => Ok(Similarity::Filtered),
            "lemma" | "lemmas" => Ok(Similarity::Lemma),
            "scaled" | "bruteforce" => Ok(Similarity::Scaled(ScaleRule::Distinct)),
            "scaled_occurrences" => Ok(Similarity::Scaled(ScaleRule::Occurrences)),
            "weighted" => Ok(Similarity::FeatureWeighted(FeatureWeighting::default())),
            _ => Err(Error::UnknownSimilarity(s.to_string())),
        }
    }
}
