//! Search over similarity variants, indicators and filter combinations
//!
//! Every trial is an independent pure computation over read-only inputs: the
//! document tree of its corpus and the IDF table of its indicator. Trials run
//! on the rayon thread pool and the best trial of each corpus is picked by a
//! max-reduction keyed by (MAP, trial name), so completion order never
//! changes the outcome.

use crate::bag::Indicator;
use crate::config::ExperimentConfig;
use crate::corpus::{load_document_tree, Document, DocumentTree, TreeCache};
use crate::error::{Error, Result};
use crate::evaluation::{ap_difference, evaluate, Evaluation, Relevance};
use crate::filter::{FilterCombination, Stopwords};
use crate::prediction::{prediction_file_name, save_predictions};
use crate::scoring::score_with;
use crate::similarity::{ScoringContext, Similarity};
use crate::stats::{out_of_corpus_value, IdfTable};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

/// One point of the search space
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    /// Corpus name
    pub corpus: String,
    /// Similarity variant
    pub similarity: Similarity,
    /// Indicator actually compared
    pub indicator: Indicator,
    /// Active filters
    pub filters: FilterCombination,
}

impl Trial {
    /// Unique, human-readable name
    pub fn name(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.similarity,
            self.corpus,
            self.indicator,
            self.filters.name()
        )
    }

    /// Name of the prediction file of this trial
    pub fn prediction_file_name(&self) -> String {
        prediction_file_name(
            self.similarity.name(),
            &self.corpus,
            self.indicator,
            &self.filters,
        )
    }

    /// Whether this is the baseline of its corpus
    pub fn is_baseline(&self) -> bool {
        self.similarity == Similarity::Baseline
    }

    fn summary(&self, map: f64) -> TrialSummary {
        TrialSummary {
            name: self.name(),
            corpus: self.corpus.clone(),
            similarity: self.similarity.name().to_string(),
            indicator: self.indicator,
            filters: self.filters.clone(),
            map,
        }
    }
}

/// Ordered, duplicate-free list of trials
#[derive(Debug, Clone, Default)]
pub struct SearchPlan {
    trials: Vec<Trial>,
}

impl SearchPlan {
    /// Cross product of corpora, similarities, indicators and filters
    ///
    /// Axes a variant ignores collapse: baseline runs once per corpus and
    /// lemma runs once per filter combination.
    pub fn new(
        corpora: &[String],
        similarities: &[Similarity],
        indicators: &[Indicator],
        filters: &[FilterCombination],
    ) -> Self {
        let mut plan = SearchPlan::default();
        let mut seen = BTreeSet::new();
        for corpus in corpora {
            for similarity in similarities {
                for &indicator in indicators {
                    for combination in filters {
                        let spec = similarity.bag_spec(indicator, combination.clone());
                        let trial = Trial {
                            corpus: corpus.clone(),
                            similarity: similarity.clone(),
                            indicator: similarity.effective_indicator(indicator),
                            filters: spec.filters,
                        };
                        if seen.insert(trial.name()) {
                            plan.trials.push(trial);
                        }
                    }
                }
            }
        }
        plan
    }

    /// Plan described by an experiment configuration
    ///
    /// A baseline trial is always added so every corpus gets a reference
    /// point.
    pub fn from_config(config: &ExperimentConfig) -> Result<Self> {
        let corpora: Vec<String> = config.corpora.iter().map(|c| c.name.clone()).collect();
        let mut similarities = config.similarity_variants()?;
        if !similarities.contains(&Similarity::Baseline) {
            similarities.insert(0, Similarity::Baseline);
        }
        Ok(SearchPlan::new(
            &corpora,
            &similarities,
            &config.indicators,
            &config.filter_space(),
        ))
    }

    /// Trials in plan order
    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    /// Number of trials
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    /// Whether the plan is empty
    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// (indicator, lowercase) pairs needing an IDF table
    fn idf_keys(&self) -> BTreeSet<(Indicator, bool)> {
        self.trials
            .iter()
            .map(|t| (t.indicator, t.similarity.lowercases()))
            .collect()
    }
}

/// An evaluation corpus, loaded
#[derive(Debug, Clone)]
pub struct CorpusData {
    /// Corpus name
    pub name: String,
    /// Document tree
    pub tree: DocumentTree,
    /// Gold judgments
    pub relevance: Relevance,
}

impl CorpusData {
    /// Load every corpus of a configuration, through the tree cache
    pub fn load_all(config: &ExperimentConfig, cache: Option<&TreeCache>) -> Result<Vec<Self>> {
        config
            .corpora
            .iter()
            .map(|corpus| {
                tracing::info!("Loading corpus {}", corpus.name);
                Ok(CorpusData {
                    name: corpus.name.clone(),
                    tree: load_document_tree(&corpus.records, config.scope, cache)?,
                    relevance: Relevance::load(&corpus.relevancy)?,
                })
            })
            .collect()
    }
}

/// Result of one trial
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    /// The trial
    pub trial: Trial,
    /// Its evaluation
    pub evaluation: Evaluation,
    /// Prediction file written, if any
    pub prediction_file: Option<PathBuf>,
}

impl TrialOutcome {
    fn key(&self) -> (f64, String) {
        (self.evaluation.map, self.trial.name())
    }
}

/// Higher MAP wins; equal MAP goes to the smaller trial name
pub fn best_of(a: TrialOutcome, b: TrialOutcome) -> TrialOutcome {
    let (map_a, name_a) = a.key();
    let (map_b, name_b) = b.key();
    match map_a.total_cmp(&map_b).then_with(|| name_b.cmp(&name_a)) {
        Ordering::Less => b,
        _ => a,
    }
}

/// A trial and its MAP, as reported
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialSummary {
    /// Trial name
    pub name: String,
    /// Corpus name
    pub corpus: String,
    /// Similarity variant
    pub similarity: String,
    /// Indicator
    pub indicator: Indicator,
    /// Filters
    pub filters: FilterCombination,
    /// Mean Average Precision
    pub map: f64,
}

/// Per-question Average Precision gain over the baseline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionGain {
    /// Original question id
    pub original: String,
    /// AP(best) - AP(baseline)
    pub difference: f64,
}

/// Best trial of one corpus
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusBest {
    /// Winning trial
    pub best: TrialSummary,
    /// Average Precision of the winner per original question
    pub per_question: BTreeMap<String, f64>,
    /// Baseline trial of the corpus
    pub baseline: Option<TrialSummary>,
    /// Gains over the baseline, largest first
    pub gains: Vec<QuestionGain>,
}

/// Outcome of a search
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    /// Experiment label
    pub method: String,
    /// When the report was produced
    pub generated_at: DateTime<Utc>,
    /// Every trial, by corpus then descending MAP
    pub trials: Vec<TrialSummary>,
    /// Corpus name -> best trial
    pub best: BTreeMap<String, CorpusBest>,
}

/// Runs a search plan
#[derive(Debug)]
pub struct SearchDriver {
    method: String,
    idf: HashMap<(Indicator, bool), Arc<IdfTable>>,
    out_of_corpus: f64,
    stopwords: Arc<Stopwords>,
    predictions_dir: Option<PathBuf>,
}

impl SearchDriver {
    /// Build the IDF tables a plan needs from the training documents
    ///
    /// Every trial shares one out-of-corpus value, taken from the lowercased
    /// token table.
    pub fn new<'a, I>(training: I, plan: &SearchPlan, stopwords: Stopwords) -> Self
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let documents: Vec<&Document> = training.into_iter().collect();
        let idf: HashMap<(Indicator, bool), Arc<IdfTable>> = plan
            .idf_keys()
            .into_par_iter()
            .map(|(indicator, lowercase)| {
                let table = IdfTable::from_documents(documents.iter().copied(), indicator, lowercase);
                ((indicator, lowercase), Arc::new(table))
            })
            .collect();
        let out_of_corpus = match idf.get(&(Indicator::Tokens, true)) {
            Some(table) => table.max_idf(),
            None => out_of_corpus_value(documents.iter().copied()),
        };
        SearchDriver {
            method: "cqarank".to_string(),
            idf,
            out_of_corpus,
            stopwords: Arc::new(stopwords),
            predictions_dir: None,
        }
    }

    /// Label used in the report
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Write one prediction file per trial into `dir`
    pub fn with_predictions_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.predictions_dir = Some(dir.into());
        self
    }

    /// IDF given to terms missing from a trial's table
    pub fn out_of_corpus(&self) -> f64 {
        self.out_of_corpus
    }

    /// Scoring context of a trial
    pub fn context(&self, trial: &Trial) -> Result<ScoringContext> {
        let key = (trial.indicator, trial.similarity.lowercases());
        let idf = self.idf.get(&key).cloned().ok_or_else(|| {
            Error::Other(format!("No IDF table for indicator {}", trial.indicator))
        })?;
        let spec = trial.similarity.bag_spec(trial.indicator, trial.filters.clone());
        Ok(ScoringContext::new(
            idf,
            self.out_of_corpus,
            spec,
            Arc::clone(&self.stopwords),
        ))
    }

    /// Score and evaluate one trial
    pub fn run_trial(&self, trial: &Trial, corpus: &CorpusData) -> Result<TrialOutcome> {
        let ctx = self.context(trial)?;
        let scores = score_with(&corpus.tree, &trial.similarity, &ctx);
        let evaluation = evaluate(&scores, &corpus.relevance)?;

        let prediction_file = match &self.predictions_dir {
            Some(dir) => {
                let path = dir.join(trial.prediction_file_name());
                save_predictions(&path, &scores)?;
                Some(path)
            }
            None => None,
        };

        tracing::debug!(trial = %trial.name(), map = evaluation.map, "Trial done");
        Ok(TrialOutcome {
            trial: trial.clone(),
            evaluation,
            prediction_file,
        })
    }

    /// Run every trial of a plan and report the best per corpus
    pub fn run(&self, plan: &SearchPlan, corpora: &[CorpusData]) -> Result<SearchReport> {
        let by_name: HashMap<&str, &CorpusData> =
            corpora.iter().map(|c| (c.name.as_str(), c)).collect();
        for trial in plan.trials() {
            if !by_name.contains_key(trial.corpus.as_str()) {
                return Err(Error::ConfigError(format!(
                    "Corpus {} is not loaded",
                    trial.corpus
                )));
            }
        }
        if let Some(dir) = &self.predictions_dir {
            std::fs::create_dir_all(dir)?;
        }

        tracing::info!("Running {} trials", plan.len());
        let outcomes: Vec<TrialOutcome> = plan
            .trials()
            .par_iter()
            .map(|trial| self.run_trial(trial, by_name[trial.corpus.as_str()]))
            .collect::<Result<Vec<_>>>()?;

        let mut best = BTreeMap::new();
        for corpus in corpora {
            let winner = outcomes
                .par_iter()
                .filter(|o| o.trial.corpus == corpus.name)
                .cloned()
                .reduce_with(best_of);
            let Some(winner) = winner else {
                continue;
            };
            let baseline = outcomes
                .iter()
                .find(|o| o.trial.corpus == corpus.name && o.trial.is_baseline());
            let gains = baseline
                .map(|base| {
                    ap_difference(&winner.evaluation, &base.evaluation)
                        .into_iter()
                        .map(|(original, difference)| QuestionGain {
                            original,
                            difference,
                        })
                        .collect()
                })
                .unwrap_or_default();

            tracing::info!(
                corpus = %corpus.name,
                map = winner.evaluation.map,
                "Best trial {}",
                winner.trial.name()
            );
            best.insert(
                corpus.name.clone(),
                CorpusBest {
                    best: winner.trial.summary(winner.evaluation.map),
                    per_question: winner.evaluation.per_question.clone(),
                    baseline: baseline.map(|b| b.trial.summary(b.evaluation.map)),
                    gains,
                },
            );
        }

        let mut trials: Vec<TrialSummary> = outcomes
            .iter()
            .map(|o| o.trial.summary(o.evaluation.map))
            .collect();
        trials.sort_by(|a, b| {
            a.corpus
                .cmp(&b.corpus)
                .then_with(|| b.map.total_cmp(&a.map))
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(SearchReport {
            method: self.method.clone(),
            generated_at: Utc::now(),
            trials,
            best,
        })
    }
}

/// Load everything a configuration needs and run its search
pub fn run_experiment(config: &ExperimentConfig, cache: Option<&TreeCache>) -> Result<SearchReport> {
    config.validate()?;
    let plan = SearchPlan::from_config(config)?;
    let corpora = CorpusData::load_all(config, cache)?;

    let training = match &config.training {
        Some(path) => Some(load_document_tree(path, config.scope, cache)?),
        None => {
            tracing::warn!("No training corpus configured, IDF is computed on the evaluation corpora");
            None
        }
    };
    let documents: Vec<&Document> = match &training {
        Some(tree) => tree.documents().collect(),
        None => corpora.iter().flat_map(|c| c.tree.documents()).collect(),
    };

    let mut driver = SearchDriver::new(documents, &plan, config.load_stopwords()?)
        .with_method(config.method.clone());
    if let Some(dir) = &config.predictions_dir {
        driver = driver.with_predictions_dir(dir.clone());
    }
    driver.run(&plan, &corpora)
}
