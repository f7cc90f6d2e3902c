//! Prediction files read by the SemEval scorer
//!
//! One line per (original, candidate) pair:
//!
//! ```text
//! Q268\tQ268_R4\t0\t0.8125\ttrue
//! ```
//!
//! Lines are ordered by the natural order of the candidate id and joined by
//! `\n` without a trailing newline.

use crate::bag::Indicator;
use crate::error::{Error, Result};
use crate::filter::FilterCombination;
use crate::natural_cmp;
use crate::scoring::ScoreTree;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Render a score the way the scorer expects (`1.0`, `0.25`, `0.0`)
fn format_score(score: f64) -> String {
    format!("{:?}", score)
}

/// Write a score tree in prediction format
pub fn write_predictions<W: Write>(mut writer: W, scores: &ScoreTree) -> Result<()> {
    let mut lines: Vec<(&str, &str, f64)> = scores
        .iter()
        .flat_map(|(original, candidates)| {
            candidates
                .iter()
                .map(move |(candidate, &score)| (original.as_str(), candidate.as_str(), score))
        })
        .collect();
    lines.sort_by(|a, b| natural_cmp(a.1, b.1));

    for (idx, (original, candidate, score)) in lines.iter().enumerate() {
        if idx > 0 {
            writer.write_all(b"\n")?;
        }
        write!(
            writer,
            "{}\t{}\t0\t{}\ttrue",
            original,
            candidate,
            format_score(*score)
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a score tree to a prediction file
pub fn save_predictions<P: AsRef<Path>>(path: P, scores: &ScoreTree) -> Result<()> {
    let path = path.as_ref();
    tracing::debug!("Writing scores to {}", path.display());
    let file = File::create(path)?;
    write_predictions(BufWriter::new(file), scores)
}

/// Parse a prediction file back into a score tree
pub fn read_predictions<R: BufRead>(reader: R) -> Result<ScoreTree> {
    let mut scores = ScoreTree::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parse_error = |message: String| Error::ParseError {
            line: idx + 1,
            message,
        };
        let columns: Vec<&str> = line.trim_end_matches('\r').split('\t').collect();
        if columns.len() < 4 {
            return Err(parse_error(format!(
                "expected at least 4 tab-separated columns, got {}",
                columns.len()
            )));
        }
        let score: f64 = columns[3]
            .parse()
            .map_err(|_| parse_error(format!("invalid score {:?}", columns[3])))?;
        let previous = scores
            .entry(columns[0].to_string())
            .or_default()
            .insert(columns[1].to_string(), score);
        if previous.is_some() {
            return Err(Error::DuplicateId(columns[1].to_string()));
        }
    }
    Ok(scores)
}

/// Read a prediction file from disk
pub fn load_predictions<P: AsRef<Path>>(path: P) -> Result<ScoreTree> {
    let file = File::open(path)?;
    read_predictions(BufReader::new(file))
}

/// `<method>_<corpus>_<indicator>_<filters>_scores.pred`
pub fn prediction_file_name(
    method: &str,
    corpus: &str,
    indicator: Indicator,
    filters: &FilterCombination,
) -> String {
    format!(
        "{}_{}_{}_{}_scores.pred",
        method,
        corpus,
        indicator,
        filters.name()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> ScoreTree {
        let mut tree = ScoreTree::new();
        tree.entry("Q2".into()).or_default().insert("Q2_R1".into(), 0.25);
        let q1 = tree.entry("Q1".into()).or_default();
        q1.insert("Q1_R10".into(), 1.0);
        q1.insert("Q1_R2".into(), 0.0);
        tree
    }

    #[test]
    fn test_write_format() {
        let mut out = Vec::new();
        write_predictions(&mut out, &tree()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Q1\tQ1_R2\t0\t0.0\ttrue\nQ1\tQ1_R10\t0\t1.0\ttrue\nQ2\tQ2_R1\t0\t0.25\ttrue"
        );
    }

    #[test]
    fn test_write_empty_tree() {
        let mut out = Vec::new();
        write_predictions(&mut out, &ScoreTree::new()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_read_accepts_integer_zero() {
        let scores = read_predictions("Q1\tQ1_R1\t0\t0\ttrue\nQ1\tQ1_R2\t0\t0.5\ttrue".as_bytes()).unwrap();
        assert_eq!(scores["Q1"]["Q1_R1"], 0.0);
        assert_eq!(scores["Q1"]["Q1_R2"], 0.5);
    }

    #[test]
    fn test_read_rejects_bad_score() {
        let err = read_predictions("Q1\tQ1_R1\t0\tabc\ttrue".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::ParseError { line: 1, .. }));
    }

    #[test]
    fn test_read_rejects_duplicate_pair() {
        let input = "Q1\tQ1_R1\t0\t1.0\ttrue\nQ1\tQ1_R1\t0\t2.0\ttrue";
        assert!(matches!(
            read_predictions(input.as_bytes()),
            Err(Error::DuplicateId(_))
        ));
    }

    #[test]
    fn test_file_name() {
        let filters: FilterCombination = "nostopwords+gtr2".parse().unwrap();
        assert_eq!(
            prediction_file_name("filtered", "2016", Indicator::Lemmas, &filters),
            "filtered_2016_lemmas_nostopwords_gtr2_scores.pred"
        );
    }
}
