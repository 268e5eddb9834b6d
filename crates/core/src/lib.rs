//! Core domain types for Libris.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

pub const PAGE_SIZE: usize = 5;
pub const MAX_SUBJECTS: usize = 5;
pub const LOAN_PERIOD_DAYS: i64 = 21;
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
pub const NOT_AVAILABLE: &str = "N/A";
pub const OFFLINE_CATALOG: &str = "offline";
pub const DEFAULT_CATALOG_URL: &str = "https://openlibrary.org";

pub const POPULAR_SUBJECTS: [&str; 16] = [
    "Fiction",
    "Science Fiction",
    "Fantasy",
    "Mystery",
    "Thriller",
    "Romance",
    "Historical Fiction",
    "Horror",
    "Adventure",
    "Biography",
    "History",
    "Psychology",
    "Science",
    "Business",
    "Programming",
    "Art",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    pub publish_year: String,
    pub subjects: Vec<String>,
    pub cover_url: Option<String>,
    pub url: Option<String>,
}

impl BookRecord {
    /// A record with placeholder author and year, as the catalog reports missing fields.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: UNKNOWN_AUTHOR.to_string(),
            publish_year: NOT_AVAILABLE.to_string(),
            subjects: Vec::new(),
            cover_url: None,
            url: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.publish_year = year.into();
        self
    }

    pub fn with_subjects<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subjects = subjects
            .into_iter()
            .map(Into::into)
            .take(MAX_SUBJECTS)
            .collect();
        self
    }

    pub fn joined_subjects(&self) -> String {
        self.subjects.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub title: String,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl LoanRecord {
    /// Loans start the day after `today` and run for [`LOAN_PERIOD_DAYS`].
    pub fn starting(title: impl Into<String>, today: NaiveDate) -> Self {
        let borrow_date = today + Duration::days(1);
        let due_date = borrow_date + Duration::days(LOAN_PERIOD_DAYS);
        Self {
            title: title.into(),
            borrow_date,
            due_date,
        }
    }

    pub fn borrow_date_str(&self) -> String {
        format_date(self.borrow_date)
    }

    pub fn due_date_str(&self) -> String {
        format_date(self.due_date)
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Source of book metadata for a query.
///
/// Transport or decoding failures surface as an empty page; callers cannot
/// tell them apart from "no matches".
pub trait CatalogProvider {
    fn search(&self, query: &str, limit: usize, offset: usize) -> Vec<BookRecord>;
}

/// Append-only read list.
pub trait ReadListStore {
    fn insert(&mut self, book: &BookRecord) -> bool;

    fn entries(&self) -> Vec<BookRecord>;
}

/// Append-only loan request log.
pub trait LoanStore {
    fn insert_loan(&mut self, loan: &LoanRecord) -> bool;

    fn loans(&self) -> Vec<LoanRecord>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub page_size: usize,
    pub catalog_url: String,
    pub library_file: Option<String>,
    pub recommendation_count: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            library_file: None,
            recommendation_count: 3,
        }
    }
}

impl Settings {
    pub fn normalize(&mut self) {
        self.page_size = self.page_size.clamp(1, 50);
        self.recommendation_count = self.recommendation_count.clamp(1, 20);
        self.catalog_url = self.catalog_url.trim().trim_end_matches('/').to_string();
        if self.catalog_url.is_empty() {
            self.catalog_url = DEFAULT_CATALOG_URL.to_string();
        }
        self.library_file = self
            .library_file
            .take()
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty());
    }

    pub fn is_offline(&self) -> bool {
        self.catalog_url.eq_ignore_ascii_case(OFFLINE_CATALOG)
    }
}
