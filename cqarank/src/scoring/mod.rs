//! Score trees: one similarity score per (original, candidate) pair

use crate::corpus::{Document, DocumentTree};
use crate::similarity::{ScoringContext, Similarity};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Candidate id -> score
pub type CandidateScores = BTreeMap<String, f64>;

/// Original-question id -> candidate scores
pub type ScoreTree = BTreeMap<String, CandidateScores>;

/// Score every candidate of every original question
///
/// Original questions are scored in parallel; the scorer must not rely on
/// any shared mutable state.
pub fn build_score_tree<F>(tree: &DocumentTree, scorer: F) -> ScoreTree
where
    F: Fn(&Document, &Document) -> f64 + Sync,
{
    let nodes: Vec<_> = tree.iter().collect();
    nodes
        .into_par_iter()
        .map(|(original, node)| {
            let scores: CandidateScores = node
                .candidates
                .iter()
                .map(|(candidate, document)| (candidate.clone(), scorer(&node.original, document)))
                .collect();
            (original.clone(), scores)
        })
        .collect()
}

/// Score tree of a similarity variant under a context
pub fn score_with(tree: &DocumentTree, similarity: &Similarity, ctx: &ScoringContext) -> ScoreTree {
    build_score_tree(tree, |original, candidate| {
        similarity.score(ctx, original, candidate)
    })
}
