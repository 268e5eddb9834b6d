//! Sqlite-backed persistence.

use std::path::Path;

use anyhow::Context as _;
use libris_core::{
    BookRecord, LoanRecord, LoanStore, ReadListStore, Settings, parse_date,
};
use rusqlite::{Connection, OptionalExtension as _};

#[derive(Debug)]
pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("open sqlite db at {}", path.as_ref().display()))?;
        let storage = Self { conn };
        storage.migrate()?;
        tracing::info!(path = %path.as_ref().display(), "database opened");
        Ok(storage)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    fn migrate(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                page_size INTEGER NOT NULL,
                catalog_url TEXT NOT NULL
            );
            INSERT OR IGNORE INTO settings (id, page_size, catalog_url)
            VALUES (1, 5, 'https://openlibrary.org');

            CREATE TABLE IF NOT EXISTS read_list (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                author TEXT,
                publish_year TEXT,
                genres TEXT,
                url TEXT,
                added_at INTEGER NOT NULL DEFAULT (unixepoch())
            );

            CREATE TABLE IF NOT EXISTS loan_requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                book_title TEXT NOT NULL,
                borrow_date TEXT,
                due_date TEXT,
                created_at INTEGER NOT NULL DEFAULT (unixepoch())
            );
            "#,
        )?;

        self.add_column(
            "ALTER TABLE settings ADD COLUMN library_file TEXT",
            "add settings.library_file column",
        )?;
        self.add_column(
            "ALTER TABLE settings ADD COLUMN recommendation_count INTEGER NOT NULL DEFAULT 3",
            "add settings.recommendation_count column",
        )?;

        Ok(())
    }

    fn add_column(&self, sql: &str, what: &'static str) -> anyhow::Result<()> {
        match self.conn.execute(sql, []) {
            Ok(_) => Ok(()),
            Err(err) => {
                let msg = err.to_string();
                if msg.contains("duplicate column name") {
                    Ok(())
                } else {
                    Err(err).context(what)
                }
            }
        }
    }

    pub fn load_settings(&self) -> anyhow::Result<Settings> {
        let row = self
            .conn
            .query_row(
                "SELECT page_size, catalog_url, library_file, recommendation_count FROM settings WHERE id = 1",
                [],
                |row| {
                    let page_size: i64 = row.get(0)?;
                    let catalog_url: String = row.get(1)?;
                    let library_file: Option<String> = row.get(2)?;
                    let recommendation_count: i64 = row.get(3)?;
                    Ok((page_size, catalog_url, library_file, recommendation_count))
                },
            )
            .optional()?;

        let defaults = Settings::default();
        let mut settings = match row {
            Some((page_size, catalog_url, library_file, recommendation_count)) => Settings {
                page_size: usize::try_from(page_size).unwrap_or(defaults.page_size),
                catalog_url,
                library_file,
                recommendation_count: usize::try_from(recommendation_count)
                    .unwrap_or(defaults.recommendation_count),
            },
            None => defaults,
        };
        settings.normalize();
        Ok(settings)
    }

    pub fn save_settings(&self, settings: &Settings) -> anyhow::Result<()> {
        let mut settings = settings.clone();
        settings.normalize();

        self.conn.execute(
            "UPDATE settings SET page_size = ?, catalog_url = ?, library_file = ?, recommendation_count = ? WHERE id = 1",
            (
                settings.page_size as i64,
                &settings.catalog_url,
                &settings.library_file,
                settings.recommendation_count as i64,
            ),
        )?;
        Ok(())
    }

    pub fn insert_book(&self, book: &BookRecord) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO read_list (title, author, publish_year, genres, url)
                VALUES (?, ?, ?, ?, ?)
                "#,
                (
                    &book.title,
                    &book.author,
                    &book.publish_year,
                    book.joined_subjects(),
                    &book.url,
                ),
            )
            .with_context(|| format!("insert '{}' into read list", book.title))?;
        Ok(())
    }

    pub fn list_read_list(&self) -> anyhow::Result<Vec<BookRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT title, author, publish_year, genres, url FROM read_list ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            let author: Option<String> = row.get(1)?;
            let publish_year: Option<String> = row.get(2)?;
            let genres: Option<String> = row.get(3)?;
            let mut book = BookRecord::titled(row.get::<_, String>(0)?);
            if let Some(author) = author {
                book.author = author;
            }
            if let Some(year) = publish_year {
                book.publish_year = year;
            }
            book.subjects = split_genres(genres.as_deref().unwrap_or_default());
            book.url = row.get(4)?;
            Ok(book)
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn record_loan(&self, loan: &LoanRecord) -> anyhow::Result<()> {
        self.conn
            .execute(
                "INSERT INTO loan_requests (book_title, borrow_date, due_date) VALUES (?, ?, ?)",
                (&loan.title, loan.borrow_date_str(), loan.due_date_str()),
            )
            .with_context(|| format!("insert loan for '{}'", loan.title))?;
        Ok(())
    }

    pub fn list_loans(&self) -> anyhow::Result<Vec<LoanRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT book_title, borrow_date, due_date FROM loan_requests ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            let title: String = row.get(0)?;
            let borrow: Option<String> = row.get(1)?;
            let due: Option<String> = row.get(2)?;
            Ok((title, borrow, due))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (title, borrow, due) = row?;
            let dates = borrow
                .as_deref()
                .and_then(parse_date)
                .zip(due.as_deref().and_then(parse_date));
            match dates {
                Some((borrow_date, due_date)) => out.push(LoanRecord {
                    title,
                    borrow_date,
                    due_date,
                }),
                None => tracing::warn!(title, "skipping loan row with malformed dates"),
            }
        }
        Ok(out)
    }
}

fn split_genres(genres: &str) -> Vec<String> {
    genres
        .split(", ")
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

impl ReadListStore for Storage {
    fn insert(&mut self, book: &BookRecord) -> bool {
        match self.insert_book(book) {
            Ok(()) => {
                tracing::info!(title = %book.title, "book added to read list");
                true
            }
            Err(err) => {
                tracing::error!("{err:#}");
                false
            }
        }
    }

    fn entries(&self) -> Vec<BookRecord> {
        self.list_read_list().unwrap_or_else(|err| {
            tracing::error!("read list unavailable: {err:#}");
            Vec::new()
        })
    }
}

impl LoanStore for Storage {
    fn insert_loan(&mut self, loan: &LoanRecord) -> bool {
        match self.record_loan(loan) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!("{err:#}");
                false
            }
        }
    }

    fn loans(&self) -> Vec<LoanRecord> {
        self.list_loans().unwrap_or_else(|err| {
            tracing::error!("loan history unavailable: {err:#}");
            Vec::new()
        })
    }
}
