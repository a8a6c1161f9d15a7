//! Visiting order for a run.
//!
//! Order is random per run so repeated runs surface order-dependent
//! anomalies. A seed makes a given order reproducible while debugging.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::corpus::Corpus;

/// The corpus URLs in the order they will be checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOrder {
    urls: Vec<String>,
}

impl RunOrder {
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Uniformly permute the corpus. `None` draws from the thread RNG.
pub fn shuffle(corpus: Corpus, seed: Option<u64>) -> RunOrder {
    let mut urls = corpus.into_urls();
    match seed {
        Some(seed) => urls.shuffle(&mut StdRng::seed_from_u64(seed)),
        None => urls.shuffle(&mut rand::thread_rng()),
    }
    RunOrder { urls }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(n: usize) -> Corpus {
        let contents: String = (0..n)
            .map(|i| format!("http://site{i}.example\n"))
            .collect();
        Corpus::parse(&contents)
    }

    fn sorted(urls: &[String]) -> Vec<String> {
        let mut urls = urls.to_vec();
        urls.sort();
        urls
    }

    #[test]
    fn preserves_multiset() {
        let mut input = corpus(50).into_urls();
        input.push("http://site3.example".to_string());
        let order = shuffle(Corpus::parse(&input.join("\n")), None);
        assert_eq!(sorted(order.urls()), sorted(&input));
    }

    #[test]
    fn seeded_order_is_reproducible() {
        let first = shuffle(corpus(100), Some(1234));
        let second = shuffle(corpus(100), Some(1234));
        assert_eq!(first, second);
    }

    #[test]
    fn seeded_order_differs_from_file_order() {
        let order = shuffle(corpus(100), Some(99));
        assert_ne!(order.urls(), corpus(100).urls());
    }

    #[test]
    fn empty_corpus_gives_empty_order() {
        let order = shuffle(Corpus::default(), None);
        assert!(order.is_empty());
    }
}
