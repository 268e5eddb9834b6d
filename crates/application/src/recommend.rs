//! Genre recommendations: subject-filter queries for the online catalog and
//! history-aware draws from a local, bucketed library.

use std::collections::{BTreeMap, HashMap};

use libris_core::{BookRecord, POPULAR_SUBJECTS};
use rand::Rng;
use rand::seq::SliceRandom as _;

use crate::selection::{SelectionError, parse_selection};

/// Builds a catalog query matching every subject, e.g.
/// `subject:"Science Fiction" subject:"Adventure"`.
pub fn subject_query<S: AsRef<str>>(subjects: &[S]) -> String {
    subjects
        .iter()
        .map(|subject| format!("subject:\"{}\"", escape_subject(subject.as_ref().trim())))
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape_subject(subject: &str) -> String {
    let mut out = String::with_capacity(subject.len());
    for ch in subject.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Resolves numbered picks from the [`POPULAR_SUBJECTS`] menu.
///
/// A lone `0` yields no subjects; starting a session with that is refused.
pub fn choose_subjects(input: &str) -> Result<Vec<String>, SelectionError> {
    let indices = parse_selection(input, 0, POPULAR_SUBJECTS.len())?;
    Ok(indices
        .into_iter()
        .map(|idx| POPULAR_SUBJECTS[idx].to_string())
        .collect())
}

#[derive(Debug, Clone)]
struct Category {
    name: String,
    books: Vec<BookRecord>,
}

/// Draws random picks per category while steering away from whatever that
/// category showed last time.
#[derive(Debug)]
pub struct HistoryRecommender<R> {
    categories: BTreeMap<String, Category>,
    last_shown: HashMap<String, Vec<BookRecord>>,
    rng: R,
}

impl<R: Rng> HistoryRecommender<R> {
    pub fn new<I>(buckets: I, rng: R) -> Self
    where
        I: IntoIterator<Item = (String, Vec<BookRecord>)>,
    {
        let mut categories: BTreeMap<String, Category> = BTreeMap::new();
        for (name, books) in buckets {
            let name = name.trim().to_string();
            if name.is_empty() {
                continue;
            }
            categories
                .entry(category_key(&name))
                .or_insert_with(|| Category {
                    name: name.clone(),
                    books: Vec::new(),
                })
                .books
                .extend(books);
        }
        Self {
            categories,
            last_shown: HashMap::new(),
            rng,
        }
    }

    pub fn categories(&self) -> Vec<&str> {
        self.categories.values().map(|c| c.name.as_str()).collect()
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains_key(&category_key(category))
    }

    pub fn last_shown(&self, category: &str) -> &[BookRecord] {
        self.last_shown
            .get(&category_key(category))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Draws up to `count` distinct records from `category`.
    ///
    /// Records from the previous draw of the same category are excluded
    /// unless that leaves nothing, in which case the full pool is used.
    pub fn recommend(&mut self, category: &str, count: usize) -> Vec<BookRecord> {
        let key = category_key(category);
        let Some(pool) = self.categories.get(&key) else {
            tracing::debug!(category, "unknown recommendation category");
            return Vec::new();
        };

        let previous = self.last_shown.get(&key);
        let mut candidates: Vec<&BookRecord> = pool
            .books
            .iter()
            .filter(|book| previous.is_none_or(|prev| !prev.contains(*book)))
            .collect();
        if candidates.is_empty() {
            tracing::debug!(category = %pool.name, "recommendation pool exhausted, resetting");
            candidates = pool.books.iter().collect();
        }

        let take = count.min(candidates.len());
        let drawn: Vec<BookRecord> = candidates
            .choose_multiple(&mut self.rng, take)
            .map(|book| (*book).clone())
            .collect();

        self.last_shown.insert(key, drawn.clone());
        drawn
    }
}

fn category_key(name: &str) -> String {
    name.trim().to_lowercase()
}
