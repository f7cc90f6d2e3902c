//! Integration tests for the cqarank pipeline
//!
//! These tests verify end-to-end behavior including:
//! - Document tree construction from annotated records, with caching
//! - Scoring and MAP evaluation against relevancy files
//! - Prediction file round trips
//! - Running a YAML-described experiment

use assert_fs::prelude::*;
use cqarank::corpus::{load_document_tree, AnnotatedRecord, ContentScope, Document, TreeCache};
use cqarank::prediction::{load_predictions, save_predictions};
use cqarank::search::run_experiment;
use cqarank::{
    evaluate, out_of_corpus_value, score_with, Error, ExperimentConfig, IdfTable, Indicator,
    Relevance, ScoringContext, Similarity, Stopwords,
};
use predicates::prelude::*;
use std::sync::Arc;

const TEST_RECORDS: &[(&str, &str)] = &[
    ("Q1", "how can I renew my visa in Doha"),
    ("Q1_R1", "visa renewal office in Doha"),
    ("Q1_R1_C1", "go to the immigration office"),
    ("Q1_R2", "best beach for kids"),
    ("Q2", "which school is good for kids"),
    ("Q2_R1", "good school for small kids"),
    ("Q2_R2", "selling my car"),
];

const TRAINING_RECORDS: &[(&str, &str)] = &[
    ("Q7", "where to buy a used car"),
    ("Q7_R1", "used car market"),
    ("Q8", "visa office opening hours"),
    ("Q8_R1", "school fees in Doha"),
];

const RELEVANCY: &str = "Q1\tQ1_R1\t0\t1.0\ttrue
Q1\tQ1_R2\t0\t0.0\tfalse
Q2\tQ2_R1\t0\t1.0\ttrue
Q2\tQ2_R2\t0\t0.0\tfalse
";

fn jsonl(records: &[(&str, &str)]) -> String {
    records
        .iter()
        .map(|(id, text)| {
            serde_json::to_string(&AnnotatedRecord {
                id: id.to_string(),
                document: Document::from_text(text),
            })
            .unwrap()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write the fixture corpus into a temp dir
fn fixture_dir() -> assert_fs::TempDir {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("test.jsonl").write_str(&jsonl(TEST_RECORDS)).unwrap();
    temp.child("train.jsonl")
        .write_str(&jsonl(TRAINING_RECORDS))
        .unwrap();
    temp.child("test.relevancy").write_str(RELEVANCY).unwrap();
    temp
}

#[test]
fn test_baseline_ranks_overlapping_candidates_first() {
    let temp = fixture_dir();
    let tree = load_document_tree(temp.path().join("test.jsonl"), ContentScope::Questions, None).unwrap();
    let training = load_document_tree(temp.path().join("train.jsonl"), ContentScope::Questions, None).unwrap();
    assert_eq!(tree.len(), 2);
    assert_eq!(tree.candidate_count(), 4);

    let similarity = Similarity::Baseline;
    let ctx = ScoringContext::new(
        Arc::new(IdfTable::from_tree(&training, Indicator::Tokens, false)),
        out_of_corpus_value(training.documents()),
        similarity.bag_spec(Indicator::Tokens, cqarank::FilterCombination::no_filter()),
        Arc::new(Stopwords::english()),
    );
    let scores = score_with(&tree, &similarity, &ctx);
    assert!(scores["Q1"]["Q1_R1"] > scores["Q1"]["Q1_R2"]);
    assert_eq!(scores["Q1"]["Q1_R2"], 0.0);

    let relevance = Relevance::load(temp.path().join("test.relevancy")).unwrap();
    let evaluation = evaluate(&scores, &relevance).unwrap();
    assert_eq!(evaluation.map, 1.0);
    assert_eq!(evaluation.per_question["Q1"], 1.0);
}

#[test]
fn test_comments_extend_candidates() {
    let temp = fixture_dir();
    let path = temp.path().join("test.jsonl");
    let questions = load_document_tree(&path, ContentScope::Questions, None).unwrap();
    let threads = load_document_tree(&path, ContentScope::QuestionsWithComments, None).unwrap();

    let short = &questions.get("Q1").unwrap().candidates["Q1_R1"];
    let long = &threads.get("Q1").unwrap().candidates["Q1_R1"];
    assert_eq!(short.len(), 5);
    assert_eq!(long.len(), 10);
}

#[test]
fn test_prediction_file_round_trip() {
    let temp = fixture_dir();
    let tree = load_document_tree(temp.path().join("test.jsonl"), ContentScope::Questions, None).unwrap();
    let similarity = Similarity::Filtered;
    let ctx = ScoringContext::new(
        Arc::new(IdfTable::from_tree(&tree, Indicator::Tokens, true)),
        out_of_corpus_value(tree.documents()),
        similarity.bag_spec(Indicator::Tokens, "nostopwords".parse().unwrap()),
        Arc::new(Stopwords::english()),
    );
    let scores = score_with(&tree, &similarity, &ctx);

    let pred = temp.child("filtered.pred");
    save_predictions(pred.path(), &scores).unwrap();
    pred.assert(predicate::str::starts_with("Q1\tQ1_R1\t0\t"));
    pred.assert(predicate::str::contains("\ttrue\nQ2\tQ2_R1\t0\t"));
    pred.assert(predicate::str::ends_with("\n").not());

    let back = load_predictions(pred.path()).unwrap();
    assert_eq!(back, scores);
}

#[test]
fn test_tree_cache_serves_stored_tree() {
    let temp = fixture_dir();
    let cache = TreeCache::new(temp.path().join("cache"));
    let records = temp.path().join("test.jsonl");

    let first = load_document_tree(&records, ContentScope::Questions, Some(&cache)).unwrap();
    temp.child("cache").assert(predicate::path::is_dir());

    // same content under a new name hits the same entry
    let copy = temp.child("copy.jsonl");
    copy.write_str(&jsonl(TEST_RECORDS)).unwrap();
    let second = load_document_tree(copy.path(), ContentScope::Questions, Some(&cache)).unwrap();
    assert_eq!(first, second);
    assert_eq!(std::fs::read_dir(cache.dir()).unwrap().count(), 1);

    // the scope is part of the key
    load_document_tree(&records, ContentScope::QuestionsWithComments, Some(&cache)).unwrap();
    assert_eq!(std::fs::read_dir(cache.dir()).unwrap().count(), 2);
}

#[test]
fn test_missing_judgment_fails_evaluation() {
    let temp = fixture_dir();
    let tree = load_document_tree(temp.path().join("test.jsonl"), ContentScope::Questions, None).unwrap();
    let ctx = ScoringContext::new(
        Arc::new(IdfTable::from_tree(&tree, Indicator::Tokens, false)),
        out_of_corpus_value(tree.documents()),
        Similarity::Baseline.bag_spec(Indicator::Tokens, cqarank::FilterCombination::no_filter()),
        Arc::new(Stopwords::english()),
    );
    let scores = score_with(&tree, &Similarity::Baseline, &ctx);

    let partial = Relevance::from_relevancy_reader("Q1\tQ1_R1\t0\t1.0\ttrue\n".as_bytes()).unwrap();
    let err = evaluate(&scores, &partial).unwrap_err();
    assert!(matches!(err, Error::MissingJudgment { .. }));
}

#[test]
fn test_run_experiment_from_yaml() {
    let temp = fixture_dir();
    let config_file = temp.child("experiment.yaml");
    config_file
        .write_str(
            r#"
method: fixture
training: train.jsonl
corpora:
  - name: "2016"
    records: test.jsonl
    relevancy: test.relevancy
indicators: [tokens, lemmas]
similarities: [filtered, scaled, weighted]
filters:
  semantic: [nostopwords]
  length: [gtr2]
predictions_dir: predictions
cache_dir: cache
"#,
        )
        .unwrap();

    let config = ExperimentConfig::load(config_file.path()).unwrap();
    let cache = TreeCache::new(config.cache_dir());
    let report = run_experiment(&config, Some(&cache)).unwrap();

    assert_eq!(report.method, "fixture");
    let best = &report.best["2016"];
    assert_eq!(best.best.map, 1.0);
    assert_eq!(best.baseline.as_ref().unwrap().similarity, "baseline");

    temp.child("predictions")
        .child("baseline_2016_tokens_nofilter_scores.pred")
        .assert(predicate::path::is_file());
    temp.child("predictions")
        .child("filtered_2016_lemmas_nostopwords_gtr2_scores.pred")
        .assert(predicate::path::is_file());

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"generated_at\""));
}
