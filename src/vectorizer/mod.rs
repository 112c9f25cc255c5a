pub mod analyzer;
pub mod corpus;
pub mod tfidf;
pub mod token;

use std::marker::PhantomData;

use indexmap::IndexMap;
use num::Float;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{RecommendError, Result},
    vectorizer::{
        analyzer::Analyzer,
        corpus::Corpus,
        tfidf::{DefaultTFIDFEngine, TFIDFEngine},
        token::TermFrequency,
    },
};

/// TF-IDF content vectorizer for post text.
///
/// `fit` learns the vocabulary and IDF weights of a corpus; `transform` turns any text into a
/// dense vector with one column per vocabulary term (lexicographic column order).
/// Fitting again discards the previous vocabulary.
///
/// `ContentVectorizer<N, E>` has the following generic parameters:
/// - `N`: Vector element type (f32, f64)
/// - `E`: TF-IDF calculation engine
///
/// # Serialization
/// Supported. The vocabulary and the IDF vector are stored; the analyzer is rebuilt on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentVectorizer<N = f32, E = DefaultTFIDFEngine>
where
    N: Float,
    E: TFIDFEngine<N>,
{
    /// term -> column index
    #[serde(with = "indexmap::map::serde_seq")]
    vocabulary: IndexMap<String, usize>,
    /// IDF weight of each column
    idf: Vec<N>,
    /// number of documents seen by the last fit
    doc_num: u64,
    #[serde(skip)]
    analyzer: Analyzer,
    #[serde(skip)]
    _marker: PhantomData<E>,
}

impl<N, E> Default for ContentVectorizer<N, E>
where
    N: Float,
    E: TFIDFEngine<N>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> ContentVectorizer<N, E>
where
    N: Float,
    E: TFIDFEngine<N>,
{
    /// Create an unfitted vectorizer with the English stop word list
    pub fn new() -> Self {
        Self::with_analyzer(Analyzer::english())
    }

    pub fn with_analyzer(analyzer: Analyzer) -> Self {
        Self {
            vocabulary: IndexMap::new(),
            idf: Vec::new(),
            doc_num: 0,
            analyzer,
            _marker: PhantomData,
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    /// Output dimension (vocabulary size)
    pub fn dim(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn doc_num(&self) -> u64 {
        self.doc_num
    }

    /// Terms in column order
    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.vocabulary.keys().map(String::as_str)
    }

    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self) -> &[N] {
        &self.idf
    }
}

impl<N, E> ContentVectorizer<N, E>
where
    N: Float + Send + Sync,
    E: TFIDFEngine<N> + Send + Sync,
{
    fn analyze<S>(&self, docs: &[S]) -> Vec<TermFrequency>
    where
        S: AsRef<str> + Sync,
    {
        docs.par_iter()
            .map(|doc| self.analyzer.analyze(doc.as_ref()).into_iter().collect::<TermFrequency>())
            .collect()
    }

    /// Learn vocabulary and IDF weights from `docs`
    pub fn fit<S>(&mut self, docs: &[S]) -> Result<()>
    where
        S: AsRef<str> + Sync,
    {
        let freqs = self.analyze(docs);
        self.fit_freqs(&freqs)
    }

    fn fit_freqs(&mut self, freqs: &[TermFrequency]) -> Result<()> {
        if freqs.is_empty() {
            return Err(RecommendError::EmptyCorpus);
        }
        let mut corpus = Corpus::new();
        for freq in freqs {
            corpus.add_set(&freq.term_set_ref_str());
        }
        if corpus.vocab_size() == 0 {
            return Err(RecommendError::EmptyVocabulary);
        }

        let terms = corpus.sorted_terms();
        self.idf = E::idf_vec(&corpus, &terms);
        self.vocabulary = terms.into_iter().enumerate().map(|(idx, term)| (term, idx)).collect();
        self.doc_num = corpus.get_doc_num();
        debug!(docs = self.doc_num, vocab = self.dim(), "fitted content vectorizer");
        Ok(())
    }

    /// Vectorize `docs` against the fitted vocabulary, index aligned with the input
    pub fn transform<S>(&self, docs: &[S]) -> Vec<Vec<N>>
    where
        S: AsRef<str> + Sync,
    {
        self.analyze(docs)
            .par_iter()
            .map(|freq| E::tf_idf_vec(freq, &self.vocabulary, &self.idf))
            .collect()
    }

    pub fn transform_one(&self, doc: &str) -> Vec<N> {
        let freq: TermFrequency = self.analyzer.analyze(doc).into_iter().collect();
        E::tf_idf_vec(&freq, &self.vocabulary, &self.idf)
    }

    /// `fit` then `transform` on the same documents, tokenizing only once
    pub fn fit_transform<S>(&mut self, docs: &[S]) -> Result<Vec<Vec<N>>>
    where
        S: AsRef<str> + Sync,
    {
        let freqs = self.analyze(docs);
        self.fit_freqs(&freqs)?;
        Ok(freqs
            .par_iter()
            .map(|freq| E::tf_idf_vec(freq, &self.vocabulary, &self.idf))
            .collect())
    }
}
