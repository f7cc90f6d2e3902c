//! Term statistics: term frequency, document frequency and IDF

use crate::bag::{make_bag, Bag, BagSpec, Indicator};
use crate::corpus::{Document, DocumentTree};
use crate::filter::{FilterCombination, Stopwords};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Term -> relative frequency within one bag
pub type TermFrequencies = BTreeMap<String, f64>;

/// Occurrence count divided by bag size. An empty bag yields an empty map.
pub fn term_frequencies(bag: &Bag) -> TermFrequencies {
    let total = bag.total();
    if total == 0 {
        return TermFrequencies::new();
    }
    bag.iter()
        .map(|(term, count)| (term.to_string(), count as f64 / total as f64))
        .collect()
}

/// Number of documents each term appears in, and the number of documents
pub fn document_frequencies<D, S>(corpus: impl IntoIterator<Item = D>) -> (HashMap<String, usize>, usize)
where
    D: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut frequencies: HashMap<String, usize> = HashMap::new();
    let mut documents = 0;
    for document in corpus {
        documents += 1;
        let distinct: HashSet<String> = document
            .into_iter()
            .map(|term| term.as_ref().to_string())
            .collect();
        for term in distinct {
            *frequencies.entry(term).or_insert(0) += 1;
        }
    }
    (frequencies, documents)
}

/// `log2(N / df(term))` for every term observed in the corpus
pub fn inverse_document_frequencies<D, S>(corpus: impl IntoIterator<Item = D>) -> HashMap<String, f64>
where
    D: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let (frequencies, documents) = document_frequencies(corpus);
    idf_values(frequencies, documents)
}

fn idf_values(frequencies: HashMap<String, usize>, documents: usize) -> HashMap<String, f64> {
    frequencies
        .into_iter()
        .map(|(term, df)| (term, (documents as f64 / df as f64).log2()))
        .collect()
}

/// IDF values computed once from a training corpus
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdfTable {
    values: HashMap<String, f64>,
    documents: usize,
}

impl IdfTable {
    /// IDF table of a tokenized corpus
    pub fn from_corpus<D, S>(corpus: impl IntoIterator<Item = D>) -> Self
    where
        D: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (frequencies, documents) = document_frequencies(corpus);
        IdfTable {
            values: idf_values(frequencies, documents),
            documents,
        }
    }

    /// IDF table of every document of a tree under an indicator, unfiltered
    pub fn from_tree(tree: &DocumentTree, indicator: Indicator, lowercase: bool) -> Self {
        IdfTable::from_documents(tree.documents(), indicator, lowercase)
    }

    /// IDF table of annotated documents under an indicator, unfiltered
    pub fn from_documents<'a>(
        documents: impl IntoIterator<Item = &'a Document>,
        indicator: Indicator,
        lowercase: bool,
    ) -> Self {
        let spec = BagSpec::new(indicator, FilterCombination::no_filter(), lowercase);
        let stopwords = Stopwords::default();
        let bags: Vec<Bag> = documents
            .into_iter()
            .map(|doc| make_bag(&spec, doc, &stopwords))
            .collect();
        let table = IdfTable::from_corpus(
            bags.iter()
                .map(|bag| bag.iter().map(|(term, _)| term).collect::<Vec<_>>()),
        );
        tracing::debug!(
            indicator = %indicator,
            terms = table.len(),
            documents = table.documents(),
            "Built IDF table"
        );
        table
    }

    /// IDF of a term, if it was observed
    pub fn get(&self, term: &str) -> Option<f64> {
        self.values.get(term).copied()
    }

    /// Largest IDF in the table, or 0 for an empty table
    pub fn max_idf(&self) -> f64 {
        self.values.values().copied().fold(0.0, f64::max)
    }

    /// Number of training documents
    pub fn documents(&self) -> usize {
        self.documents
    }

    /// Number of distinct terms
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// TF-IDF weight of a term
///
/// - 0 if the term is absent from the local frequencies
/// - `out_of_corpus` if the term is unknown to the IDF table
/// - `tf * idf` otherwise
pub fn tf_idf(term: &str, termfreq: &TermFrequencies, idf: &IdfTable, out_of_corpus: f64) -> f64 {
    let Some(tf) = termfreq.get(term) else {
        return 0.0;
    };
    match idf.get(term) {
        Some(value) => tf * value,
        None => out_of_corpus,
    }
}

/// IDF given to terms a training corpus never saw
///
/// The largest IDF of the lowercased token table, shared by every indicator
/// so unseen labels and lemmas are rewarded like rare words.
pub fn out_of_corpus_value<'a>(training: impl IntoIterator<Item = &'a Document>) -> f64 {
    IdfTable::from_documents(training, Indicator::Tokens, true).max_idf()
}
