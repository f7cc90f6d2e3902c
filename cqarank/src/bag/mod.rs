//! Bags of words
//!
//! A bag is built in three steps: pick the units of a document (every token,
//! or every named-entity span), map each unit to its term (surface text,
//! lemma or entity label), and count the terms the active filters accept.

use crate::corpus::{Document, Entity, Token};
use crate::error::{Error, Result};
use crate::filter::{FilterCombination, Stopwords};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Add;

/// Which string a unit contributes to the bag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermExtractor {
    /// Surface text
    Text,
    /// Lemma
    Lemma,
    /// Named-entity label
    Label,
}

/// Which units a document is split into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitExtractor {
    /// Every token
    Document,
    /// Named-entity spans only
    Entities,
}

/// A (term, unit) extractor pair, the "indicator" compared between documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    /// Token surface forms
    Tokens,
    /// Token lemmas
    Lemmas,
    /// Named-entity surface forms
    NamedEntitiesText,
    /// Named-entity labels
    NamedEntitiesLabel,
}

impl Indicator {
    /// All indicators
    pub const ALL: [Indicator; 4] = [
        Indicator::Tokens,
        Indicator::Lemmas,
        Indicator::NamedEntitiesText,
        Indicator::NamedEntitiesLabel,
    ];

    /// Term extractor of this indicator
    pub fn term(&self) -> TermExtractor {
        match self {
            Indicator::Tokens | Indicator::NamedEntitiesText => TermExtractor::Text,
            Indicator::Lemmas => TermExtractor::Lemma,
            Indicator::NamedEntitiesLabel => TermExtractor::Label,
        }
    }

    /// Unit extractor of this indicator
    pub fn unit(&self) -> UnitExtractor {
        match self {
            Indicator::Tokens | Indicator::Lemmas => UnitExtractor::Document,
            Indicator::NamedEntitiesText | Indicator::NamedEntitiesLabel => {
                UnitExtractor::Entities
            }
        }
    }

    /// Name used on the command line and in file names
    pub fn name(&self) -> &'static str {
        match self {
            Indicator::Tokens => "tokens",
            Indicator::Lemmas => "lemmas",
            Indicator::NamedEntitiesText => "named_entities_text",
            Indicator::NamedEntitiesLabel => "named_entities_label",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Indicator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Indicator::ALL
            .into_iter()
            .find(|i| i.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownIndicator(s.to_string()))
    }
}

/// One unit of a document: a token or an entity span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit<'a> {
    /// A single token
    Token(&'a Token),
    /// An entity and the tokens it covers
    Entity {
        entity: &'a Entity,
        tokens: &'a [Token],
    },
}

impl<'a> Unit<'a> {
    /// Term under an extractor
    ///
    /// Pairs no `Indicator` uses (token labels, entity lemmas) yield None.
    pub fn term(&self, extractor: TermExtractor) -> Option<Cow<'a, str>> {
        match (*self, extractor) {
            (Unit::Token(token), TermExtractor::Text) => Some(Cow::Borrowed(&token.text)),
            (Unit::Token(token), TermExtractor::Lemma) => Some(Cow::Borrowed(&token.lemma)),
            (Unit::Entity { entity, .. }, TermExtractor::Text) => {
                Some(Cow::Borrowed(&entity.text))
            }
            (Unit::Entity { entity, .. }, TermExtractor::Label) => {
                Some(Cow::Borrowed(&entity.label))
            }
            (Unit::Token(_), TermExtractor::Label) | (Unit::Entity { .. }, TermExtractor::Lemma) => {
                None
            }
        }
    }

    /// Tokens making up the unit
    pub fn tokens(&self) -> &'a [Token] {
        match *self {
            Unit::Token(token) => std::slice::from_ref(token),
            Unit::Entity { tokens, .. } => tokens,
        }
    }

    /// Whether the unit is, or belongs to, a named entity
    pub fn is_entity(&self) -> bool {
        match *self {
            Unit::Token(token) => token.ent_type.is_some(),
            Unit::Entity { .. } => true,
        }
    }
}

/// Split a document into units
pub fn units(document: &Document, extractor: UnitExtractor) -> Vec<Unit<'_>> {
    match extractor {
        UnitExtractor::Document => document.tokens.iter().map(Unit::Token).collect(),
        UnitExtractor::Entities => document
            .entities
            .iter()
            .map(|entity| Unit::Entity {
                entity,
                tokens: document.entity_tokens(entity),
            })
            .collect(),
    }
}

/// Multiset of terms
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bag {
    counts: BTreeMap<String, usize>,
}

impl Bag {
    /// Create an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every term of an iterator
    pub fn from_terms<S: Into<String>>(terms: impl IntoIterator<Item = S>) -> Self {
        let mut bag = Bag::new();
        for term in terms {
            bag.insert(term);
        }
        bag
    }

    /// Add one occurrence
    pub fn insert<S: Into<String>>(&mut self, term: S) {
        *self.counts.entry(term.into()).or_insert(0) += 1;
    }

    /// Occurrences of a term
    pub fn count(&self, term: &str) -> usize {
        self.counts.get(term).copied().unwrap_or(0)
    }

    /// Whether the term occurs at least once
    pub fn contains(&self, term: &str) -> bool {
        self.counts.contains_key(term)
    }

    /// Total number of occurrences
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Number of distinct terms
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Whether the bag is empty
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterate (term, count) in term order
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(term, &count)| (term.as_str(), count))
    }

    /// Term-wise minimum, keeping only terms present in both bags
    pub fn intersection(&self, other: &Bag) -> Bag {
        let (small, large) = if self.distinct() <= other.distinct() {
            (self, other)
        } else {
            (other, self)
        };
        Bag {
            counts: small
                .counts
                .iter()
                .filter_map(|(term, &count)| {
                    let min = count.min(large.count(term));
                    (min > 0).then(|| (term.clone(), min))
                })
                .collect(),
        }
    }
}

impl<'a> Add<&'a Bag> for &'a Bag {
    type Output = Bag;

    /// Combined counts
    fn add(self, other: &'a Bag) -> Bag {
        let mut counts = self.counts.clone();
        for (term, &count) in &other.counts {
            *counts.entry(term.clone()).or_insert(0) += count;
        }
        Bag { counts }
    }
}

/// How a document is turned into a bag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BagSpec {
    /// Term extractor
    pub term: TermExtractor,
    /// Unit extractor
    pub unit: UnitExtractor,
    /// Active filters
    pub filters: FilterCombination,
    /// Lower-case terms before counting
    pub lowercase: bool,
}

impl BagSpec {
    /// Bag of an indicator with filters
    pub fn new(indicator: Indicator, filters: FilterCombination, lowercase: bool) -> Self {
        BagSpec {
            term: indicator.term(),
            unit: indicator.unit(),
            filters,
            lowercase,
        }
    }

    /// Unfiltered, case-preserving bag of an indicator
    pub fn raw(indicator: Indicator) -> Self {
        BagSpec::new(indicator, FilterCombination::no_filter(), false)
    }

    /// Term of a unit, or None if the unit is rejected
    ///
    /// Filters see the extracted term before lowercasing.
    pub fn term_of(&self, unit: &Unit<'_>, stopwords: &Stopwords) -> Option<String> {
        let term = unit.term(self.term)?;
        if !self.filters.accepts(&term, stopwords) {
            return None;
        }
        Some(if self.lowercase {
            term.to_lowercase()
        } else {
            term.into_owned()
        })
    }
}

/// Units of a document grouped by the term they contribute
pub type UnitDict<'a> = BTreeMap<String, Vec<Unit<'a>>>;

/// Group the accepted units of a document by term
pub fn make_unit_dict<'a>(
    spec: &BagSpec,
    document: &'a Document,
    stopwords: &Stopwords,
) -> UnitDict<'a> {
    let mut dict: UnitDict<'a> = BTreeMap::new();
    for unit in units(document, spec.unit) {
        if let Some(term) = spec.term_of(&unit, stopwords) {
            dict.entry(term).or_default().push(unit);
        }
    }
    dict
}

/// Bag of a unit dictionary
pub fn bag_of(dict: &UnitDict<'_>) -> Bag {
    Bag {
        counts: dict
            .iter()
            .map(|(term, units)| (term.clone(), units.len()))
            .collect(),
    }
}

/// Build the bag of a document
pub fn make_bag(spec: &BagSpec, document: &Document, stopwords: &Stopwords) -> Bag {
    Bag::from_terms(
        units(document, spec.unit)
            .iter()
            .filter_map(|unit| spec.term_of(unit, stopwords)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotated() -> Document {
        let tokens = vec![
            Token::plain("The"),
            Token::plain("Visa").with_lemma("visa").with_pos("NOUN"),
            Token::plain("office").with_pos("NOUN"),
            Token::plain("in"),
            Token::plain("Doha").with_pos("PROPN").with_ent_type("GPE"),
            Token::plain("Visa").with_lemma("visa").with_pos("NOUN"),
        ];
        Document {
            tokens,
            entities: vec![Entity {
                text: "Doha".to_string(),
                label: "GPE".to_string(),
                start: 4,
                end: 5,
            }],
        }
    }

    #[test]
    fn test_bag_of_tokens() {
        let bag = make_bag(&BagSpec::raw(Indicator::Tokens), &annotated(), &Stopwords::english());
        assert_eq!(bag.count("Visa"), 2);
        assert_eq!(bag.count("The"), 1);
        assert_eq!(bag.total(), 6);
        assert_eq!(bag.distinct(), 5);
    }

    #[test]
    fn test_bag_of_lemmas_lowercased_and_filtered() {
        let spec = BagSpec::new(Indicator::Lemmas, "nostopwords,gtr2".parse().unwrap(), true);
        let bag = make_bag(&spec, &annotated(), &Stopwords::english());
        assert_eq!(bag.count("visa"), 2);
        assert!(!bag.contains("the"));
        assert!(!bag.contains("in"));
        assert_eq!(bag.count("doha"), 1);
    }

    #[test]
    fn test_bag_of_entity_labels() {
        let doc = annotated();
        let bag = make_bag(&BagSpec::raw(Indicator::NamedEntitiesLabel), &doc, &Stopwords::english());
        assert_eq!(bag.count("GPE"), 1);
        assert_eq!(bag.total(), 1);
    }

    #[test]
    fn test_empty_units_empty_bag() {
        let doc = Document::from_text("no entities here");
        let bag = make_bag(&BagSpec::raw(Indicator::NamedEntitiesText), &doc, &Stopwords::english());
        assert!(bag.is_empty());
    }

    #[test]
    fn test_nofilter_matches_unfiltered_bag() {
        let doc = annotated();
        let stopwords = Stopwords::english();
        let unfiltered = Bag::from_terms(doc.tokens.iter().map(|t| t.text.clone()));
        let nofilter = make_bag(
            &BagSpec::new(Indicator::Tokens, FilterCombination::no_filter(), false),
            &doc,
            &stopwords,
        );
        assert_eq!(unfiltered, nofilter);
    }

    #[test]
    fn test_intersection_and_union() {
        let a = Bag::from_terms(["car", "car", "visa"]);
        let b = Bag::from_terms(["car", "school", "visa", "visa"]);
        let inter = a.intersection(&b);
        assert_eq!(inter.count("car"), 1);
        assert_eq!(inter.count("visa"), 1);
        assert!(!inter.contains("school"));
        assert_eq!(inter, b.intersection(&a));

        let union = &a + &b;
        assert_eq!(union.count("car"), 3);
        assert_eq!(union.count("visa"), 3);
        assert_eq!(union.total(), 7);
    }

    #[test]
    fn test_unit_dict_matches_bag() {
        let doc = annotated();
        let stopwords = Stopwords::english();
        let spec = BagSpec::raw(Indicator::Lemmas);
        let dict = make_unit_dict(&spec, &doc, &stopwords);
        assert_eq!(dict["visa"].len(), 2);
        assert_eq!(bag_of(&dict), make_bag(&spec, &doc, &stopwords));
    }

    #[test]
    fn test_from_terms_counts_repeats() {
        let bag = Bag::from_terms(vec!["visa".to_string(), "visa".to_string(), "doha".to_string()]);
        assert_eq!(bag.count("visa"), 2);
        assert_eq!(bag.count("doha"), 1);
        assert_eq!(bag.total(), 3);

        let mut grown = Bag::from_terms(["visa"]);
        grown.insert("visa");
        assert_eq!(grown.count("visa"), 2);
        assert!(Bag::from_terms(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_length_filter_sees_lemma() {
        let doc = Document::from_tokens(vec![
            Token::plain("was").with_lemma("be"),
            Token::plain("visas").with_lemma("visa"),
        ]);
        let spec = BagSpec::new(Indicator::Lemmas, "gtr2".parse().unwrap(), false);
        let bag = make_bag(&spec, &doc, &Stopwords::english());
        assert!(!bag.contains("be"));
        assert_eq!(bag.count("visa"), 1);
        assert_eq!(bag.total(), 1);
    }

    #[test]
    fn test_length_filter_sees_entity_label() {
        let doc = annotated();
        let spec = BagSpec::new(Indicator::NamedEntitiesLabel, "gtr3".parse().unwrap(), false);
        assert!(make_bag(&spec, &doc, &Stopwords::english()).is_empty());

        let spec = BagSpec::new(Indicator::NamedEntitiesText, "gtr3".parse().unwrap(), false);
        assert_eq!(make_bag(&spec, &doc, &Stopwords::english()).count("Doha"), 1);
    }

    #[test]
    fn test_indicator_from_str() {
        assert_eq!("lemmas".parse::<Indicator>().unwrap(), Indicator::Lemmas);
        assert_eq!(
            "NAMED_ENTITIES_LABEL".parse::<Indicator>().unwrap(),
            Indicator::NamedEntitiesLabel
        );
        assert!("words".parse::<Indicator>().is_err());
    }
}
