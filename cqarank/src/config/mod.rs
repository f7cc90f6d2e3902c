//! Experiment configuration
//!
//! An experiment is described by a YAML document:
//!
//! ```yaml
//! method: semeval
//! training: data/train.jsonl
//! corpora:
//!   - name: "2016"
//!     records: data/test2016.jsonl
//!     relevancy: scorer/SemEval2016-Task3-CQA-QL-test.xml.subtaskB.relevancy
//! indicators: [tokens, lemmas]
//! similarities: [baseline, filtered, scaled]
//! filters:
//!   semantic: [nostopwords]
//!   length: [gtr1, gtr2, gtr3, gtr4]
//! weight: 0.6
//! weighters: [entity]
//! predictions_dir: predictions
//! ```
//!
//! Relative paths are resolved against the directory of the configuration
//! file.

use crate::bag::Indicator;
use crate::corpus::ContentScope;
use crate::error::{Error, Result};
use crate::filter::{search_space, Filter, FilterClass, FilterCombination, Stopwords};
use crate::similarity::{FeatureWeighting, Similarity, Weighter, DEFAULT_WEIGHT};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One evaluation corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Name used in reports and prediction file names
    pub name: String,
    /// Annotated records (JSON lines)
    pub records: PathBuf,
    /// Gold judgments (relevancy file, or JSON object)
    pub relevancy: PathBuf,
}

/// Filters searched by the driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Vocabulary-based filters
    pub semantic: Vec<Filter>,
    /// Length thresholds
    pub length: Vec<Filter>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            semantic: Filter::semantic_filters(),
            length: Filter::length_filters(),
        }
    }
}

/// A complete experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Label of the experiment
    pub method: String,
    /// Annotated records of the IDF training corpus
    pub training: Option<PathBuf>,
    /// Evaluation corpora
    pub corpora: Vec<CorpusConfig>,
    /// Which records become candidates
    pub scope: ContentScope,
    /// Indicators compared
    pub indicators: Vec<Indicator>,
    /// Similarity variants tried
    pub similarities: Vec<String>,
    /// Filters searched
    pub filters: FilterConfig,
    /// Stopword list, one word per line; built-in English list if unset
    pub stopwords: Option<PathBuf>,
    /// Weight of the feature-weighted similarity
    pub weight: f64,
    /// Weighters of the feature-weighted similarity
    pub weighters: Vec<Weighter>,
    /// Directory receiving one prediction file per trial
    pub predictions_dir: Option<PathBuf>,
    /// Document tree cache directory
    pub cache_dir: Option<PathBuf>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        ExperimentConfig {
            method: "cqarank".to_string(),
            training: None,
            corpora: Vec::new(),
            scope: ContentScope::default(),
            indicators: vec![Indicator::Tokens],
            similarities: vec!["baseline".to_string(), "filtered".to_string()],
            filters: FilterConfig::default(),
            stopwords: None,
            weight: DEFAULT_WEIGHT,
            weighters: vec![Weighter::Entity],
            predictions_dir: None,
            cache_dir: None,
        }
    }
}

impl ExperimentConfig {
    /// Parse a YAML document
    pub fn from_yaml(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Read, resolve and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let mut config = ExperimentConfig::from_yaml(&source)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.validate()?;
        Ok(config)
    }

    /// Make relative paths relative to `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        for corpus in &mut self.corpora {
            resolve(&mut corpus.records);
            resolve(&mut corpus.relevancy);
        }
        for path in [
            &mut self.training,
            &mut self.stopwords,
            &mut self.predictions_dir,
            &mut self.cache_dir,
        ]
        .into_iter()
        .flatten()
        {
            resolve(path);
        }
    }

    /// Reject configurations the search driver cannot run
    pub fn validate(&self) -> Result<()> {
        if self.corpora.is_empty() {
            return Err(Error::ConfigError("No corpus configured".to_string()));
        }
        let mut names = HashSet::new();
        for corpus in &self.corpora {
            if corpus.name.trim().is_empty() {
                return Err(Error::ConfigError("Corpus name cannot be empty".to_string()));
            }
            if !names.insert(corpus.name.as_str()) {
                return Err(Error::ConfigError(format!(
                    "Corpus {} is configured twice",
                    corpus.name
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.weight) {
            return Err(Error::ConfigError(format!(
                "Weight must be within [0, 1], got {}",
                self.weight
            )));
        }
        if self.indicators.is_empty() {
            return Err(Error::ConfigError("No indicator configured".to_string()));
        }
        if self.similarities.is_empty() {
            return Err(Error::ConfigError("No similarity configured".to_string()));
        }
        self.similarity_variants()?;

        for filter in &self.filters.semantic {
            if filter.class() != FilterClass::Semantic {
                return Err(Error::ConfigError(format!(
                    "{} is not a semantic filter",
                    filter
                )));
            }
        }
        for filter in &self.filters.length {
            if filter.class() != FilterClass::Length {
                return Err(Error::ConfigError(format!("{} is not a length filter", filter)));
            }
        }
        Ok(())
    }

    /// Similarity variants, with the configured feature weighting applied
    pub fn similarity_variants(&self) -> Result<Vec<Similarity>> {
        self.similarities
            .iter()
            .map(|name| {
                let similarity: Similarity = name.parse()?;
                Ok(match similarity {
                    Similarity::FeatureWeighted(weighting) => {
                        Similarity::FeatureWeighted(FeatureWeighting {
                            weight: self.weight,
                            weighters: self.weighters.clone(),
                            scale: weighting.scale,
                        })
                    }
                    other => other,
                })
            })
            .collect()
    }

    /// Filter combinations searched
    pub fn filter_space(&self) -> Vec<FilterCombination> {
        search_space(&self.filters.semantic, &self.filters.length)
    }

    /// Configured stopwords, or the built-in English list
    pub fn load_stopwords(&self) -> Result<Stopwords> {
        match &self.stopwords {
            Some(path) => Stopwords::load(path),
            None => Ok(Stopwords::english()),
        }
    }

    /// Configured cache directory, or the platform default
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(crate::default_cache_dir)
    }
}
