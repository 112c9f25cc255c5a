use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Document frequencies of a fitted corpus.
///
/// It does not store document text or ids; it only keeps:
/// - the number of documents
/// - the number of documents each term appears in
///
/// It is the base data for the IDF calculation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Corpus {
    doc_num: u64,
    #[serde(with = "indexmap::map::serde_seq")]
    term_counts: IndexMap<Box<str>, u64>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document's distinct terms to the corpus
    pub fn add_set<T>(&mut self, terms: &[T])
    where
        T: AsRef<str>,
    {
        self.doc_num += 1;
        for term in terms {
            *self.term_counts.entry(term.as_ref().into()).or_insert(0) += 1;
        }
    }

    /// Get the number of documents in the corpus
    #[inline]
    pub fn get_doc_num(&self) -> u64 {
        self.doc_num
    }

    /// Get the number of documents containing `term`
    #[inline]
    pub fn get_term_count(&self, term: &str) -> u64 {
        self.term_counts.get(term).copied().unwrap_or(0)
    }

    /// Get the current vocabulary size (number of unique terms)
    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.term_counts.len()
    }

    /// All terms, sorted lexicographically
    pub fn sorted_terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = self.term_counts.keys().map(|t| t.to_string()).collect();
        terms.sort_unstable();
        terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_frequencies() {
        let mut corpus = Corpus::new();
        corpus.add_set(&["cats", "great"]);
        corpus.add_set(&["dogs", "great"]);
        assert_eq!(corpus.get_doc_num(), 2);
        assert_eq!(corpus.get_term_count("great"), 2);
        assert_eq!(corpus.get_term_count("cats"), 1);
        assert_eq!(corpus.get_term_count("birds"), 0);
        assert_eq!(corpus.vocab_size(), 3);
        assert_eq!(corpus.sorted_terms(), vec!["cats", "dogs", "great"]);
    }
}
