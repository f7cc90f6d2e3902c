//! Linguistic-feature weighters

use super::ScaleRule;
use crate::bag::Unit;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default weight given to terms whose occurrences carry the feature
pub const DEFAULT_WEIGHT: f64 = 0.6;

/// Predicate over the occurrences of a shared term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weighter {
    /// Part of speech is NOUN
    Noun,
    /// Part of speech is ADJ
    Adjective,
    /// Part of speech is VERB
    Verb,
    /// Occurrence is part of a named entity
    Entity,
}

impl Weighter {
    /// All weighters
    pub const ALL: [Weighter; 4] = [
        Weighter::Noun,
        Weighter::Adjective,
        Weighter::Verb,
        Weighter::Entity,
    ];

    /// Name used in configuration
    pub fn name(&self) -> &'static str {
        match self {
            Weighter::Noun => "noun",
            Weighter::Adjective => "adjective",
            Weighter::Verb => "verb",
            Weighter::Entity => "entity",
        }
    }

    /// Whether one occurrence carries the feature
    pub fn matches(&self, unit: &Unit<'_>) -> bool {
        let has_pos = |tag: &str| unit.tokens().iter().any(|t| t.pos == tag);
        match self {
            Weighter::Noun => has_pos("NOUN"),
            Weighter::Adjective => has_pos("ADJ"),
            Weighter::Verb => has_pos("VERB"),
            Weighter::Entity => unit.is_entity(),
        }
    }

    /// `weight` if any occurrence on either side matches, `1 - weight` otherwise
    pub fn coefficient(&self, a: &[Unit<'_>], b: &[Unit<'_>], weight: f64) -> f64 {
        if a.iter().chain(b).any(|unit| self.matches(unit)) {
            weight
        } else {
            1.0 - weight
        }
    }
}

impl fmt::Display for Weighter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Weighter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "noun" => Ok(Weighter::Noun),
            "adjective" | "adj" => Ok(Weighter::Adjective),
            "verb" => Ok(Weighter::Verb),
            "entity" => Ok(Weighter::Entity),
            _ => Err(Error::UnknownWeighter(s.to_string())),
        }
    }
}

/// Settings of the feature-weighted similarity
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureWeighting {
    /// Coefficient for matching terms; non-matching terms get `1 - weight`
    pub weight: f64,
    /// Weighters, chained multiplicatively
    pub weighters: Vec<Weighter>,
    /// How the weighted sum is scaled
    pub scale: ScaleRule,
}

impl Default for FeatureWeighting {
    fn default() -> Self {
        FeatureWeighting {
            weight: DEFAULT_WEIGHT,
            weighters: vec![Weighter::Entity],
            scale: ScaleRule::default(),
        }
    }
}

impl FeatureWeighting {
    /// Product of every weighter's coefficient. No weighters yields 1.
    pub fn coefficient(&self, a: &[Unit<'_>], b: &[Unit<'_>]) -> f64 {
        self.weighters
            .iter()
            .map(|w| w.coefficient(a, b, self.weight))
            .product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Token;

    #[test]
    fn test_pos_weighters() {
        let noun = Token::plain("visa").with_pos("NOUN");
        let verb = Token::plain("renew").with_pos("VERB");
        let a = [Unit::Token(&noun)];
        let b = [Unit::Token(&verb)];

        assert_eq!(Weighter::Noun.coefficient(&a, &[], 0.6), 0.6);
        assert_eq!(Weighter::Noun.coefficient(&[], &b, 0.6), 1.0 - 0.6);
        assert_eq!(Weighter::Verb.coefficient(&a, &b, 0.6), 0.6);
        assert_eq!(Weighter::Adjective.coefficient(&a, &b, 0.6), 1.0 - 0.6);
    }

    #[test]
    fn test_entity_weighter() {
        let doha = Token::plain("Doha").with_ent_type("GPE");
        let car = Token::plain("car");
        assert_eq!(Weighter::Entity.coefficient(&[Unit::Token(&car)], &[Unit::Token(&doha)], 0.7), 0.7);
        assert!((Weighter::Entity.coefficient(&[Unit::Token(&car)], &[], 0.7) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_chained_coefficient() {
        let token = Token::plain("Doha").with_pos("PROPN").with_ent_type("GPE");
        let units = [Unit::Token(&token)];
        let weighting = FeatureWeighting {
            weight: 0.6,
            weighters: vec![Weighter::Entity, Weighter::Noun],
            scale: ScaleRule::Distinct,
        };
        assert!((weighting.coefficient(&units, &units) - 0.6 * 0.4).abs() < 1e-12);

        let none = FeatureWeighting {
            weighters: Vec::new(),
            ..FeatureWeighting::default()
        };
        assert_eq!(none.coefficient(&units, &units), 1.0);
    }

    #[test]
    fn test_weighter_from_str() {
        assert_eq!("NOUN".parse::<Weighter>().unwrap(), Weighter::Noun);
        assert_eq!("adj".parse::<Weighter>().unwrap(), Weighter::Adjective);
        assert!("adverb".parse::<Weighter>().is_err());
    }
}
