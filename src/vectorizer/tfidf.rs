use indexmap::IndexMap;
use num::{Float, NumCast};
use serde::{Deserialize, Serialize};

use crate::{
    utils::math::l2_normalize,
    vectorizer::{corpus::Corpus, token::TermFrequency},
};

pub trait TFIDFEngine<N>
where
    N: Float,
{
    /// Build the IDF vector
    /// # Arguments
    /// * `corpus` - fitted corpus
    /// * `vocabulary` - term dimension sample, in column order
    fn idf_vec(corpus: &Corpus, vocabulary: &[String]) -> Vec<N>;

    /// Build the TF-IDF vector of one document
    /// # Arguments
    /// * `freq` - term counts of the document
    /// * `vocabulary` - term -> column index
    /// * `idf` - IDF vector, aligned with the columns
    fn tf_idf_vec(freq: &TermFrequency, vocabulary: &IndexMap<String, usize>, idf: &[N]) -> Vec<N>;
}

/// Default TF-IDF engine.
///
/// - tf: raw term count
/// - idf: smoothed, `ln((1 + n) / (1 + df)) + 1`
/// - rows are L2 normalized
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DefaultTFIDFEngine;

impl<N> TFIDFEngine<N> for DefaultTFIDFEngine
where
    N: Float,
{
    fn idf_vec(corpus: &Corpus, vocabulary: &[String]) -> Vec<N> {
        let doc_num = corpus.get_doc_num() as f64;
        vocabulary
            .iter()
            .map(|term| {
                let doc_freq = corpus.get_term_count(term) as f64;
                let idf = ((1.0 + doc_num) / (1.0 + doc_freq)).ln() + 1.0;
                <N as NumCast>::from(idf).unwrap_or_else(N::zero)
            })
            .collect()
    }

    fn tf_idf_vec(freq: &TermFrequency, vocabulary: &IndexMap<String, usize>, idf: &[N]) -> Vec<N> {
        let mut vec = vec![N::zero(); vocabulary.len()];
        // out of vocabulary terms are ignored
        for (term, count) in freq.iter() {
            if let Some(&idx) = vocabulary.get(term) {
                let count = <N as NumCast>::from(count).unwrap_or_else(N::zero);
                vec[idx] = count * idf[idx];
            }
        }
        l2_normalize(&mut vec);
        vec
    }
}
