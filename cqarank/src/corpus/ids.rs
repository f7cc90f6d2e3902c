//! SemEval corpus identifiers
//!
//! Ids come in three shapes:
//! - `Q268` original question
//! - `Q268_R4` related question
//! - `Q268_R4_C2` related comment

use once_cell::sync::Lazy;
use regex::Regex;

static ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(Q[0-9]+)(?:_(R[0-9]+)(?:_(C[0-9]+))?)?$").expect("id pattern is valid")
});

/// Classification of a corpus id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdKind {
    /// Original question
    Original { org: String },
    /// Related question of an original question
    Related { org: String, rel: String },
    /// Comment of a related question
    Comment {
        org: String,
        rel: String,
        com: String,
    },
    /// Anything that does not follow the scheme
    Unrecognized,
}

impl IdKind {
    /// Original-question id this id belongs to
    pub fn original_id(&self) -> Option<&str> {
        match self {
            IdKind::Original { org }
            | IdKind::Related { org, .. }
            | IdKind::Comment { org, .. } => Some(org),
            IdKind::Unrecognized => None,
        }
    }

    /// Related-question id (`Q1_R2`) this id belongs to
    pub fn related_id(&self) -> Option<String> {
        match self {
            IdKind::Related { org, rel } | IdKind::Comment { org, rel, .. } => {
                Some(format!("{}_{}", org, rel))
            }
            _ => None,
        }
    }
}

/// Classify an id. Malformed ids map to [`IdKind::Unrecognized`].
pub fn classify_id(identifier: &str) -> IdKind {
    let Some(caps) = ID_PATTERN.captures(identifier) else {
        return IdKind::Unrecognized;
    };
    let org = caps[1].to_string();
    match (caps.get(2), caps.get(3)) {
        (None, _) => IdKind::Original { org },
        (Some(rel), None) => IdKind::Related {
            org,
            rel: rel.as_str().to_string(),
        },
        (Some(rel), Some(com)) => IdKind::Comment {
            org,
            rel: rel.as_str().to_string(),
            com: com.as_str().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_original() {
        assert_eq!(
            classify_id("Q4"),
            IdKind::Original {
                org: "Q4".to_string()
            }
        );
    }

    #[test]
    fn test_classify_related() {
        let kind = classify_id("Q4_R8");
        assert_eq!(
            kind,
            IdKind::Related {
                org: "Q4".to_string(),
                rel: "R8".to_string()
            }
        );
        assert_eq!(kind.original_id(), Some("Q4"));
        assert_eq!(kind.related_id().as_deref(), Some("Q4_R8"));
    }

    #[test]
    fn test_classify_comment_multi_digit() {
        let kind = classify_id("Q4_R8_C154");
        assert_eq!(
            kind,
            IdKind::Comment {
                org: "Q4".to_string(),
                rel: "R8".to_string(),
                com: "C154".to_string()
            }
        );
        assert_eq!(kind.related_id().as_deref(), Some("Q4_R8"));
    }

    #[test]
    fn test_classify_unrecognized() {
        assert_eq!(classify_id("R8"), IdKind::Unrecognized);
        assert_eq!(classify_id(""), IdKind::Unrecognized);
        assert_eq!(classify_id("Q4_R8_X1"), IdKind::Unrecognized);
        assert_eq!(classify_id("Q4_"), IdKind::Unrecognized);
        assert_eq!(classify_id("Q4_R8_C1 "), IdKind::Unrecognized);
        assert_eq!(IdKind::Unrecognized.original_id(), None);
    }
}
