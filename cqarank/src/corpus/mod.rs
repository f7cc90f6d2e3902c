//! Annotated corpus model
//!
//! Documents arrive already tokenized and annotated by an external NLP
//! pipeline. This module holds the value types for that output, the id
//! scheme of the SemEval corpora and the document tree built from it.

pub mod cache;
pub mod ids;
pub mod tree;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::Path;

pub use cache::{CacheKey, TreeCache};
pub use ids::{classify_id, IdKind};
pub use tree::{BuildReport, ContentScope, DocumentTree, QuestionNode};

/// One annotated token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface text
    pub text: String,
    /// Lemma form
    pub lemma: String,
    /// Coarse part-of-speech tag (NOUN, VERB, ADJ, ...)
    #[serde(default)]
    pub pos: String,
    /// Named-entity type, if the token belongs to an entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ent_type: Option<String>,
}

impl Token {
    /// Create a token whose lemma equals its text and carries no annotation
    pub fn plain(text: &str) -> Self {
        Token {
            text: text.to_string(),
            lemma: text.to_string(),
            pos: String::new(),
            ent_type: None,
        }
    }

    /// Builder-style part-of-speech tag
    pub fn with_pos(mut self, pos: &str) -> Self {
        self.pos = pos.to_string();
        self
    }

    /// Builder-style lemma
    pub fn with_lemma(mut self, lemma: &str) -> Self {
        self.lemma = lemma.to_string();
        self
    }

    /// Builder-style entity type
    pub fn with_ent_type(mut self, ent_type: &str) -> Self {
        self.ent_type = Some(ent_type.to_string());
        self
    }
}

/// A named-entity span over a document's tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Surface text of the span
    pub text: String,
    /// Entity label (PERSON, GPE, ORG, ...)
    pub label: String,
    /// First token index (inclusive)
    pub start: usize,
    /// Last token index (exclusive)
    pub end: usize,
}

/// An ordered sequence of annotated tokens plus its entity spans
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Tokens in reading order
    #[serde(default)]
    pub tokens: Vec<Token>,
    /// Named entities
    #[serde(default)]
    pub entities: Vec<Entity>,
}

impl Document {
    /// Create a document from tokens only
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Document {
            tokens,
            entities: Vec::new(),
        }
    }

    /// Create an unannotated document by splitting on whitespace
    pub fn from_text(text: &str) -> Self {
        Document::from_tokens(text.split_whitespace().map(Token::plain).collect())
    }

    /// Tokens covered by an entity, clamped to the document bounds
    pub fn entity_tokens(&self, entity: &Entity) -> &[Token] {
        let end = entity.end.min(self.tokens.len());
        let start = entity.start.min(end);
        &self.tokens[start..end]
    }

    /// Append another document, shifting its entity spans
    pub fn append(&mut self, other: &Document) {
        let offset = self.tokens.len();
        self.tokens.extend(other.tokens.iter().cloned());
        self.entities.extend(other.entities.iter().map(|e| Entity {
            text: e.text.clone(),
            label: e.label.clone(),
            start: e.start + offset,
            end: e.end + offset,
        }));
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the document has no tokens
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// One line of annotator output: a corpus id and its annotated document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    /// Corpus-assigned id (Q1, Q1_R2, Q1_R2_C3)
    pub id: String,
    /// Annotated content
    #[serde(flatten)]
    pub document: Document,
}

/// Read annotated records from a JSON-lines reader
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<AnnotatedRecord>> {
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|e| Error::ParseError {
            line: i + 1,
            message: e.to_string(),
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Read annotated records from a JSON-lines file
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<AnnotatedRecord>> {
    let file = std::fs::File::open(path.as_ref())?;
    read_records(std::io::BufReader::new(file))
}

/// Document tree of a record file, through the cache when one is given
pub fn load_document_tree<P: AsRef<Path>>(
    path: P,
    scope: ContentScope,
    cache: Option<&TreeCache>,
) -> Result<DocumentTree> {
    let path = path.as_ref();
    let build = || -> Result<DocumentTree> {
        let records = load_records(path)?;
        let (tree, report) = DocumentTree::from_records(records, scope)?;
        if !report.unrecognized.is_empty() {
            tracing::warn!(
                "{} records of {} have unrecognized ids",
                report.unrecognized.len(),
                path.display()
            );
        }
        Ok(tree)
    };
    match cache {
        Some(cache) => {
            let key = CacheKey::from_file(path, scope)?;
            cache.load_or_build(&key, build)
        }
        None => build(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_records_jsonl() {
        let input = concat!(
            r#"{"id":"Q1","tokens":[{"text":"Where","lemma":"where","pos":"ADV"}]}"#,
            "\n\n",
            r#"{"id":"Q1_R1","tokens":[{"text":"Doha","lemma":"Doha","pos":"PROPN","ent_type":"GPE"}],"entities":[{"text":"Doha","label":"GPE","start":0,"end":1}]}"#,
            "\n"
        );
        let records = read_records(input.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "Q1");
        assert_eq!(records[1].document.entities[0].label, "GPE");
        assert_eq!(records[1].document.tokens[0].ent_type.as_deref(), Some("GPE"));
    }

    #[test]
    fn test_read_records_reports_line() {
        let input = "{\"id\":\"Q1\"}\nnot json\n";
        match read_records(input.as_bytes()) {
            Err(Error::ParseError { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_append_shifts_entities() {
        let mut doc = Document::from_text("visa office");
        let mut other = Document::from_text("in Doha");
        other.entities.push(Entity {
            text: "Doha".to_string(),
            label: "GPE".to_string(),
            start: 1,
            end: 2,
        });
        doc.append(&other);
        assert_eq!(doc.len(), 4);
        assert_eq!(doc.entities[0].start, 3);
        assert_eq!(doc.entity_tokens(&doc.entities[0])[0].text, "Doha");
    }

    #[test]
    fn test_entity_tokens_clamped() {
        let doc = Document::from_text("one two");
        let entity = Entity {
            text: "x".to_string(),
            label: "ORG".to_string(),
            start: 1,
            end: 9,
        };
        assert_eq!(doc.entity_tokens(&entity).len(), 1);
    }
}
