use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context as _;
use libris_core::{BookRecord, CatalogProvider, NOT_AVAILABLE, UNKNOWN_AUTHOR};

pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Eq)]
struct LocalBook {
    record: BookRecord,
    category: String,
}

/// Books listed one per line as `Title: .., Date: .., Author: .., Description: .., Type: ..`.
#[derive(Debug, Clone, Default)]
pub struct LocalLibrary {
    books: Vec<LocalBook>,
}

impl LocalLibrary {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("read library file {}", path.display()))?;
        let library = Self::parse(&text);
        tracing::info!(path = %path.display(), books = library.len(), "loaded library file");
        Ok(library)
    }

    pub fn parse(text: &str) -> Self {
        let books = text.lines().filter_map(parse_line).collect();
        Self { books }
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Records grouped by their `Type` field, in file order within each group.
    pub fn buckets(&self) -> BTreeMap<String, Vec<BookRecord>> {
        let mut out: BTreeMap<String, Vec<BookRecord>> = BTreeMap::new();
        for book in &self.books {
            out.entry(book.category.clone())
                .or_default()
                .push(book.record.clone());
        }
        out
    }
}

fn parse_line(line: &str) -> Option<LocalBook> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let mut title = None;
    let mut author = None;
    let mut date = None;
    let mut category = None;
    for segment in line.split(',') {
        let Some((key, value)) = segment.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key.trim() {
            "Title" => title = Some(value.to_string()),
            "Author" => author = Some(value.to_string()),
            "Date" => date = Some(value.to_string()),
            "Type" => category = Some(value.to_string()),
            _ => {}
        }
    }

    let title = title?;
    let category = category.unwrap_or_else(|| UNCATEGORIZED.to_string());
    let record = BookRecord {
        title,
        author: author.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        publish_year: date.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        subjects: vec![category.clone()],
        cover_url: None,
        url: None,
    };
    Some(LocalBook { record, category })
}

/// Splits a query into `subject:"…"` filters (unescaped) and leftover free text.
fn split_query(query: &str) -> (Vec<String>, String) {
    let mut subjects = Vec::new();
    let mut text = String::new();
    let mut rest = query;
    while let Some(start) = rest.find("subject:\"") {
        text.push_str(&rest[..start]);
        let mut subject = String::new();
        let mut chars = rest[start + "subject:\"".len()..].char_indices();
        let mut end = None;
        while let Some((i, ch)) = chars.next() {
            match ch {
                '\\' => {
                    if let Some((_, escaped)) = chars.next() {
                        subject.push(escaped);
                    }
                }
                '"' => {
                    end = Some(i + 1);
                    break;
                }
                _ => subject.push(ch),
            }
        }
        subjects.push(subject.trim().to_lowercase());
        let body = &rest[start + "subject:\"".len()..];
        rest = match end {
            Some(end) => &body[end..],
            None => "",
        };
    }
    text.push_str(rest);
    (subjects, text.trim().to_lowercase())
}

impl LocalBook {
    fn has_subject(&self, subject: &str) -> bool {
        self.category.to_lowercase() == subject
            || self
                .record
                .subjects
                .iter()
                .any(|s| s.to_lowercase() == subject)
    }

    fn matches(&self, subjects: &[String], text: &str) -> bool {
        subjects.iter().all(|subject| self.has_subject(subject))
            && (text.is_empty() || self.record.title.to_lowercase().contains(text))
    }
}

impl CatalogProvider for LocalLibrary {
    fn search(&self, query: &str, limit: usize, offset: usize) -> Vec<BookRecord> {
        let (subjects, text) = split_query(query);
        if subjects.is_empty() && text.is_empty() {
            return Vec::new();
        }
        self.books
            .iter()
            .filter(|book| book.matches(&subjects, &text))
            .skip(offset)
            .take(limit)
            .map(|book| book.record.clone())
            .collect()
    }
}
