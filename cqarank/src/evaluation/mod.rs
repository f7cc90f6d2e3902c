//! Ranking evaluation: Average Precision and MAP
//!
//! Candidates are ranked by score with a natural-order id tie-break, mapped to
//! their gold relevance and scored with Average Precision. MAP is the mean
//! over every original question of the score tree.

mod relevance;

pub use relevance::Relevance;

use crate::error::{Error, Result};
use crate::natural_cmp;
use crate::scoring::{CandidateScores, ScoreTree};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Candidates ordered by descending score
///
/// Candidates are first sorted by natural id order, then stable-sorted by
/// score, so equal scores keep a reproducible id order.
pub fn rank_candidates(scores: &CandidateScores) -> Vec<(&str, f64)> {
    let mut ranked: Vec<(&str, f64)> = scores
        .iter()
        .map(|(candidate, &score)| (candidate.as_str(), score))
        .collect();
    ranked.sort_by(|a, b| natural_cmp(a.0, b.0));
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

/// Mean of precision@i over the relevant positions; 0 without any
pub fn average_precision(relevances: &[bool]) -> f64 {
    let mut hits = 0usize;
    let mut sum = 0.0;
    for (idx, &relevant) in relevances.iter().enumerate() {
        if relevant {
            hits += 1;
            sum += hits as f64 / (idx + 1) as f64;
        }
    }
    if hits == 0 {
        0.0
    } else {
        sum / hits as f64
    }
}

/// Mean of the Average Precision of every sequence; 0 for no sequence
pub fn mean_average_precision<S: AsRef<[bool]>>(sequences: impl IntoIterator<Item = S>) -> f64 {
    let mut count = 0usize;
    let mut sum = 0.0;
    for sequence in sequences {
        count += 1;
        sum += average_precision(sequence.as_ref());
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Gold relevance of the ranked candidates of one original question
pub fn relevance_sequence(
    original: &str,
    scores: &CandidateScores,
    relevance: &Relevance,
) -> Result<Vec<bool>> {
    rank_candidates(scores)
        .into_iter()
        .map(|(candidate, _)| {
            relevance
                .get(candidate)
                .ok_or_else(|| Error::MissingJudgment {
                    original: original.to_string(),
                    candidate: candidate.to_string(),
                })
        })
        .collect()
}

/// MAP of a score tree and the Average Precision of each original question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Mean Average Precision
    pub map: f64,
    /// Original-question id -> Average Precision
    pub per_question: BTreeMap<String, f64>,
}

/// Evaluate a score tree against gold judgments
///
/// A scored candidate without a judgment fails the whole evaluation with
/// [`Error::MissingJudgment`].
pub fn evaluate(scores: &ScoreTree, relevance: &Relevance) -> Result<Evaluation> {
    let mut per_question = BTreeMap::new();
    for (original, candidates) in scores {
        let sequence = relevance_sequence(original, candidates, relevance)?;
        per_question.insert(original.clone(), average_precision(&sequence));
    }
    let map = if per_question.is_empty() {
        0.0
    } else {
        per_question.values().sum::<f64>() / per_question.len() as f64
    };
    Ok(Evaluation { map, per_question })
}

/// Per-question Average Precision gain of `best` over `baseline`, largest first
///
/// Questions missing from either side are skipped.
pub fn ap_difference(best: &Evaluation, baseline: &Evaluation) -> Vec<(String, f64)> {
    let mut differences: Vec<(String, f64)> = best
        .per_question
        .iter()
        .filter_map(|(original, ap)| {
            baseline
                .per_question
                .get(original)
                .map(|base| (original.clone(), ap - base))
        })
        .collect();
    differences.sort_by(|a, b| natural_cmp(&a.0, &b.0));
    differences.sort_by(|a, b| b.1.total_cmp(&a.1));
    differences
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(&str, f64)]) -> CandidateScores {
        pairs.iter().map(|(c, s)| (c.to_string(), *s)).collect()
    }

    #[test]
    fn test_average_precision_values() {
        assert_eq!(average_precision(&[]), 0.0);
        assert_eq!(average_precision(&[true]), 1.0);
        assert_eq!(average_precision(&[false, true]), 0.5);
        assert!((average_precision(&[true, false, true]) - (1.0 + 2.0 / 3.0) / 2.0).abs() < 1e-12);
        assert_eq!(average_precision(&[false, false]), 0.0);
    }

    #[test]
    fn test_mean_average_precision() {
        let sequences = vec![vec![true], vec![false, true], vec![false]];
        assert!((mean_average_precision(&sequences) - 0.5).abs() < 1e-12);
        assert_eq!(mean_average_precision(Vec::<Vec<bool>>::new()), 0.0);
    }

    #[test]
    fn test_rank_candidates_natural_tie_break() {
        let score_map = scores(&[
            ("Q1_R10", 0.5),
            ("Q1_R2", 0.5),
            ("Q1_R1", 0.1),
            ("Q1_R3", 0.9),
        ]);
        let ranked = rank_candidates(&score_map);
        let ids: Vec<&str> = ranked.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec!["Q1_R3", "Q1_R2", "Q1_R10", "Q1_R1"]);
    }

    #[test]
    fn test_single_question_scenario() {
        let mut tree = ScoreTree::new();
        tree.insert("Q1".to_string(), scores(&[("Q1_R1", 1.2), ("Q1_R2", 0.0)]));
        let relevance: Relevance = [("Q1_R1", true), ("Q1_R2", false)].into_iter().collect();

        let evaluation = evaluate(&tree, &relevance).unwrap();
        assert_eq!(evaluation.map, 1.0);
        assert_eq!(evaluation.per_question["Q1"], 1.0);
    }

    #[test]
    fn test_ties_are_deterministic() {
        let relevance: Relevance = [("Q1_R1", false), ("Q1_R2", true), ("Q1_R3", true)]
            .into_iter()
            .collect();
        let first = scores(&[("Q1_R1", 0.3), ("Q1_R2", 0.7), ("Q1_R3", 0.7)]);
        let second = scores(&[("Q1_R3", 0.7), ("Q1_R1", 0.3), ("Q1_R2", 0.7)]);

        let a = relevance_sequence("Q1", &first, &relevance).unwrap();
        let b = relevance_sequence("Q1", &second, &relevance).unwrap();
        assert_eq!(a, b);
        assert_eq!(average_precision(&a), 1.0);
    }

    #[test]
    fn test_missing_judgment_is_error() {
        let mut tree = ScoreTree::new();
        tree.insert("Q1".to_string(), scores(&[("Q1_R1", 1.0), ("Q1_R9", 0.5)]));
        let relevance: Relevance = [("Q1_R1", true)].into_iter().collect();
        let err = evaluate(&tree, &relevance).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingJudgment { ref original, ref candidate } if original == "Q1" && candidate == "Q1_R9"
        ));
    }

    #[test]
    fn test_empty_score_tree() {
        let evaluation = evaluate(&ScoreTree::new(), &Relevance::new()).unwrap();
        assert_eq!(evaluation.map, 0.0);
        assert!(evaluation.per_question.is_empty());
    }

    #[test]
    fn test_ap_difference_sorted_descending() {
        let best = Evaluation {
            map: 0.0,
            per_question: [("Q1", 1.0), ("Q2", 0.5), ("Q3", 0.2)]
                .into_iter()
                .map(|(q, ap)| (q.to_string(), ap))
                .collect(),
        };
        let baseline = Evaluation {
            map: 0.0,
            per_question: [("Q1", 0.5), ("Q2", 0.5), ("Q3", 0.7)]
                .into_iter()
                .map(|(q, ap)| (q.to_string(), ap))
                .collect(),
        };
        let diff = ap_difference(&best, &baseline);
        let ids: Vec<&str> = diff.iter().map(|(q, _)| q.as_str()).collect();
        assert_eq!(ids, vec!["Q1", "Q2", "Q3"]);
        assert_eq!(diff[0].1, 0.5);
    }
}
