//! Document tree: original questions and their candidates

use super::ids::{classify_id, IdKind};
use super::{AnnotatedRecord, Document};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Which records become candidate documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentScope {
    /// Related questions only, comments ignored
    #[default]
    Questions,
    /// Related questions followed by their comments
    QuestionsWithComments,
}

impl ContentScope {
    /// Name used in cache keys and configuration
    pub fn name(&self) -> &'static str {
        match self {
            ContentScope::Questions => "questions",
            ContentScope::QuestionsWithComments => "questions_with_comments",
        }
    }
}

impl std::str::FromStr for ContentScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "questions" => Ok(ContentScope::Questions),
            "questions_with_comments" | "comments" => Ok(ContentScope::QuestionsWithComments),
            _ => Err(Error::ConfigError(format!("Unknown content scope: {}", s))),
        }
    }
}

/// An original question and the candidates to rank against it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionNode {
    /// The original question
    pub original: Document,
    /// Candidate id -> candidate document
    pub candidates: BTreeMap<String, Document>,
}

/// Original-question id -> question node
///
/// The original document lives in its own field, so no candidate id can
/// shadow it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTree {
    nodes: BTreeMap<String, QuestionNode>,
}

/// What happened while building a tree from records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Original questions kept
    pub originals: usize,
    /// Candidates inserted
    pub candidates: usize,
    /// Original questions seen more than once (first occurrence kept)
    pub duplicate_originals: usize,
    /// Ids that do not follow the corpus scheme
    pub unrecognized: Vec<String>,
    /// Comment records ignored by the scope
    pub ignored_comments: usize,
    /// Comment records whose related question is absent
    pub orphan_comments: usize,
}

impl DocumentTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an original question. Returns false if it already existed.
    pub fn insert_original(&mut self, id: &str, document: Document) -> bool {
        match self.nodes.entry(id.to_string()) {
            btree_map::Entry::Occupied(_) => false,
            btree_map::Entry::Vacant(slot) => {
                slot.insert(QuestionNode {
                    original: document,
                    candidates: BTreeMap::new(),
                });
                true
            }
        }
    }

    /// Insert a candidate under an existing original question
    pub fn insert_candidate(
        &mut self,
        original: &str,
        candidate: &str,
        document: Document,
    ) -> Result<()> {
        let node = self
            .nodes
            .get_mut(original)
            .ok_or_else(|| Error::MissingOriginal {
                original: original.to_string(),
                candidate: candidate.to_string(),
            })?;
        match node.candidates.entry(candidate.to_string()) {
            btree_map::Entry::Occupied(_) => Err(Error::DuplicateId(candidate.to_string())),
            btree_map::Entry::Vacant(slot) => {
                slot.insert(document);
                Ok(())
            }
        }
    }

    /// Build a tree from annotator records
    pub fn from_records(
        records: impl IntoIterator<Item = AnnotatedRecord>,
        scope: ContentScope,
    ) -> Result<(Self, BuildReport)> {
        let mut tree = DocumentTree::new();
        let mut report = BuildReport::default();
        let mut related: BTreeMap<String, (String, Document)> = BTreeMap::new();
        let mut comments: BTreeMap<String, Vec<(String, Document)>> = BTreeMap::new();

        for record in records {
            match classify_id(&record.id) {
                IdKind::Original { .. } => {
                    if tree.insert_original(&record.id, record.document) {
                        report.originals += 1;
                    } else {
                        report.duplicate_originals += 1;
                        tracing::warn!("Duplicate original question {}, keeping first", record.id);
                    }
                }
                IdKind::Related { org, .. } => {
                    if related.contains_key(&record.id) {
                        return Err(Error::DuplicateId(record.id));
                    }
                    related.insert(record.id, (org, record.document));
                }
                kind @ IdKind::Comment { .. } => {
                    if scope == ContentScope::Questions {
                        report.ignored_comments += 1;
                        continue;
                    }
                    if let Some(rel_id) = kind.related_id() {
                        comments
                            .entry(rel_id)
                            .or_default()
                            .push((record.id, record.document));
                    }
                }
                IdKind::Unrecognized => {
                    tracing::warn!("Skipping unrecognized id {:?}", record.id);
                    report.unrecognized.push(record.id);
                }
            }
        }

        for (rel_id, (org, mut document)) in related {
            if let Some(mut thread) = comments.remove(&rel_id) {
                thread.sort_by(|a, b| crate::natural_cmp(&a.0, &b.0));
                for (_, comment) in &thread {
                    document.append(comment);
                }
            }
            tree.insert_candidate(&org, &rel_id, document)?;
            report.candidates += 1;
        }

        report.orphan_comments = comments.values().map(Vec::len).sum();
        if report.orphan_comments > 0 {
            tracing::warn!(
                "{} comments refer to related questions that are not in the corpus",
                report.orphan_comments
            );
        }

        tracing::debug!(
            originals = report.originals,
            candidates = report.candidates,
            "Built document tree"
        );
        Ok((tree, report))
    }

    /// Look up a question node
    pub fn get(&self, original: &str) -> Option<&QuestionNode> {
        self.nodes.get(original)
    }

    /// Iterate question nodes in id order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &QuestionNode)> {
        self.nodes.iter()
    }

    /// Every document of the tree, originals and candidates
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.nodes
            .values()
            .flat_map(|node| std::iter::once(&node.original).chain(node.candidates.values()))
    }

    /// Number of original questions
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no original questions
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of candidates across all original questions
    pub fn candidate_count(&self) -> usize {
        self.nodes.values().map(|n| n.candidates.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, text: &str) -> AnnotatedRecord {
        AnnotatedRecord {
            id: id.to_string(),
            document: Document::from_text(text),
        }
    }

    #[test]
    fn test_from_records_questions() {
        let records = vec![
            record("Q1", "where to buy a car"),
            record("Q1_R1", "buy a used car"),
            record("Q1_R1_C1", "try the souq"),
            record("Q1_R2", "visa renewal"),
            record("Q2", "best school"),
        ];
        let (tree, report) = DocumentTree::from_records(records, ContentScope::Questions).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.candidate_count(), 2);
        assert_eq!(report.ignored_comments, 1);
        assert!(tree.get("Q2").unwrap().candidates.is_empty());
        assert_eq!(tree.documents().count(), 4);
    }

    #[test]
    fn test_from_records_with_comments_in_natural_order() {
        let records = vec![
            record("Q1", "car"),
            record("Q1_R1", "buy"),
            record("Q1_R1_C10", "ten"),
            record("Q1_R1_C2", "two"),
        ];
        let (tree, _) =
            DocumentTree::from_records(records, ContentScope::QuestionsWithComments).unwrap();
        let doc = &tree.get("Q1").unwrap().candidates["Q1_R1"];
        let words: Vec<&str> = doc.tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(words, vec!["buy", "two", "ten"]);
    }

    #[test]
    fn test_duplicate_original_keeps_first() {
        let records = vec![record("Q1", "first"), record("Q1", "second")];
        let (tree, report) = DocumentTree::from_records(records, ContentScope::Questions).unwrap();
        assert_eq!(report.duplicate_originals, 1);
        assert_eq!(tree.get("Q1").unwrap().original.tokens[0].text, "first");
    }

    #[test]
    fn test_duplicate_candidate_is_error() {
        let records = vec![record("Q1", "a"), record("Q1_R1", "b"), record("Q1_R1", "c")];
        let err = DocumentTree::from_records(records, ContentScope::Questions).unwrap_err();
        assert!(matches!(err, Error::DuplicateId(id) if id == "Q1_R1"));
    }

    #[test]
    fn test_missing_original_is_error() {
        let records = vec![record("Q1_R1", "orphan")];
        let err = DocumentTree::from_records(records, ContentScope::Questions).unwrap_err();
        assert!(matches!(err, Error::MissingOriginal { .. }));
    }

    #[test]
    fn test_unrecognized_ids_reported() {
        let records = vec![record("Q1", "a"), record("thread-7", "b")];
        let (tree, report) = DocumentTree::from_records(records, ContentScope::Questions).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(report.unrecognized, vec!["thread-7".to_string()]);
    }

    #[test]
    fn test_content_scope_from_str() {
        assert_eq!(
            "questions".parse::<ContentScope>().unwrap(),
            ContentScope::Questions
        );
        assert_eq!(
            "QUESTIONS_WITH_COMMENTS".parse::<ContentScope>().unwrap(),
            ContentScope::QuestionsWithComments
        );
        assert!("threads".parse::<ContentScope>().is_err());
    }
}
