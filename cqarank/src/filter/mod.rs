//! Token filters and the filter-combination search space
//!
//! A [`Filter`] is a total predicate over a token's string form. A
//! [`FilterCombination`] is a non-empty conjunction of filters, and
//! [`search_space`] enumerates the combinations tried by the search driver.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::io::BufRead;
use std::path::Path;

const ENGLISH_STOPWORDS: &str = include_str!("stopwords_en.txt");

/// Stopword list used by [`Filter::NoStopwords`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stopwords {
    words: HashSet<String>,
}

impl Stopwords {
    /// Built-in English list
    pub fn english() -> Self {
        Stopwords::from_words(ENGLISH_STOPWORDS.lines())
    }

    /// Build from an iterator of words (blank entries ignored)
    pub fn from_words<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        Stopwords {
            words: words
                .into_iter()
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .map(str::to_lowercase)
                .collect(),
        }
    }

    /// Read one word per line
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let lines = reader.lines().collect::<std::io::Result<Vec<_>>>()?;
        Ok(Stopwords::from_words(lines.iter().map(String::as_str)))
    }

    /// Read one word per line from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Stopwords::from_reader(std::io::BufReader::new(file))
    }

    /// Case-insensitive membership
    pub fn contains(&self, word: &str) -> bool {
        if self.words.contains(word) {
            return true;
        }
        word.chars().any(char::is_uppercase) && self.words.contains(&word.to_lowercase())
    }

    /// Number of stopwords
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Family a filter belongs to when building the search space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterClass {
    /// Vocabulary-based filters (stopwords)
    Semantic,
    /// Length thresholds
    Length,
    /// Accepts everything
    Identity,
}

/// A token predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Filter {
    /// Keep words strictly longer than `n` characters (`gtrN`)
    LongerThan(usize),
    /// Drop stopwords (`nostopwords`)
    NoStopwords,
    /// Keep everything (`nofilter`)
    NoFilter,
}

impl Filter {
    /// Filter family
    pub fn class(&self) -> FilterClass {
        match self {
            Filter::LongerThan(_) => FilterClass::Length,
            Filter::NoStopwords => FilterClass::Semantic,
            Filter::NoFilter => FilterClass::Identity,
        }
    }

    /// Whether the word passes the filter
    pub fn accepts(&self, word: &str, stopwords: &Stopwords) -> bool {
        match self {
            Filter::LongerThan(n) => word.chars().count() > *n,
            Filter::NoStopwords => !stopwords.contains(word),
            Filter::NoFilter => true,
        }
    }

    /// Default length thresholds: gtr1 through gtr4
    pub fn length_filters() -> Vec<Filter> {
        (1..=4).map(Filter::LongerThan).collect()
    }

    /// Default semantic filters
    pub fn semantic_filters() -> Vec<Filter> {
        vec![Filter::NoStopwords]
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::LongerThan(n) => write!(f, "gtr{}", n),
            Filter::NoStopwords => f.write_str("nostopwords"),
            Filter::NoFilter => f.write_str("nofilter"),
        }
    }
}

impl std::str::FromStr for Filter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_lowercase();
        match name.as_str() {
            "nostopwords" => return Ok(Filter::NoStopwords),
            "nofilter" => return Ok(Filter::NoFilter),
            _ => {}
        }
        name.strip_prefix("gtr")
            .and_then(|n| n.parse::<usize>().ok())
            .map(Filter::LongerThan)
            .ok_or_else(|| Error::UnknownFilter(s.to_string()))
    }
}

impl TryFrom<String> for Filter {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Filter> for String {
    fn from(filter: Filter) -> Self {
        filter.to_string()
    }
}

/// A non-empty conjunction of filters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Filter>", into = "Vec<Filter>")]
pub struct FilterCombination {
    filters: Vec<Filter>,
}

impl FilterCombination {
    /// Create a combination; empty input is rejected
    pub fn new(filters: Vec<Filter>) -> Result<Self> {
        if filters.is_empty() {
            return Err(Error::ConfigError(
                "A filter combination needs at least one filter".to_string(),
            ));
        }
        Ok(FilterCombination { filters })
    }

    /// The `nofilter` sentinel
    pub fn no_filter() -> Self {
        FilterCombination {
            filters: vec![Filter::NoFilter],
        }
    }

    /// Whether every filter accepts the word
    pub fn accepts(&self, word: &str, stopwords: &Stopwords) -> bool {
        self.filters.iter().all(|f| f.accepts(word, stopwords))
    }

    /// Member filters in construction order
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Underscore-joined name, as used in prediction file names
    pub fn name(&self) -> String {
        self.filters
            .iter()
            .map(Filter::to_string)
            .collect::<Vec<_>>()
            .join("_")
    }
}

impl fmt::Display for FilterCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.filters.iter().map(Filter::to_string).collect();
        f.write_str(&names.join("+"))
    }
}

impl std::str::FromStr for FilterCombination {
    type Err = Error;

    /// Parse `nostopwords+gtr2` or `nostopwords,gtr2`
    fn from_str(s: &str) -> Result<Self> {
        let filters = s
            .split(|c| c == '+' || c == ',')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<Filter>>>()?;
        FilterCombination::new(filters)
    }
}

impl TryFrom<Vec<Filter>> for FilterCombination {
    type Error = Error;

    fn try_from(filters: Vec<Filter>) -> Result<Self> {
        FilterCombination::new(filters)
    }
}

impl From<FilterCombination> for Vec<Filter> {
    fn from(combination: FilterCombination) -> Self {
        combination.filters
    }
}

/// Every non-empty subset of `items`, by increasing size, each in input order
pub fn nonempty_partitions<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    let mut result = Vec::new();
    for size in 1..=items.len() {
        let mut indices: Vec<usize> = (0..size).collect();
        loop {
            result.push(indices.iter().map(|&i| items[i].clone()).collect());

            // Advance to the next combination in lexicographic order
            let Some(pos) = (0..size).rev().find(|&i| indices[i] != i + items.len() - size) else {
                break;
            };
            indices[pos] += 1;
            for j in pos + 1..size {
                indices[j] = indices[j - 1] + 1;
            }
        }
    }
    result
}

/// Combinations searched for a set of semantic and length filters
///
/// 1. every non-empty subset of the semantic filters
/// 2. each semantic filter paired with each length filter
/// 3. each length filter alone
/// 4. the `nofilter` sentinel
///
/// Duplicates are dropped so every combination appears once.
pub fn search_space(semantic: &[Filter], length: &[Filter]) -> Vec<FilterCombination> {
    let mut space: Vec<FilterCombination> = Vec::new();
    let mut push = |filters: Vec<Filter>| {
        if let Ok(combination) = FilterCombination::new(filters) {
            if !space.contains(&combination) {
                space.push(combination);
            }
        }
    };

    for subset in nonempty_partitions(semantic) {
        push(subset);
    }
    for s in semantic {
        for l in length {
            push(vec![*s, *l]);
        }
    }
    for l in length {
        push(vec![*l]);
    }
    push(vec![Filter::NoFilter]);

    space
}
