//! Book catalog providers: the Open Library search API and a local text file.

mod local;

use anyhow::Context as _;
use libris_core::{BookRecord, CatalogProvider, MAX_SUBJECTS, NOT_AVAILABLE, UNKNOWN_AUTHOR};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

pub use local::{LocalLibrary, UNCATEGORIZED};

const SEARCH_FIELDS: &str = "key,title,author_name,first_publish_year,cover_i,subject";
const COVERS_URL: &str = "https://covers.openlibrary.org/b/id";

#[derive(Debug, Clone)]
pub struct OpenLibrary {
    client: Client,
    base_url: String,
}

impl OpenLibrary {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("libris/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn fetch(&self, query: &str, limit: usize, offset: usize) -> anyhow::Result<Vec<BookRecord>> {
        let url = format!("{}/search.json", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query.to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("fields", SEARCH_FIELDS.to_string()),
            ])
            .send()
            .with_context(|| format!("request {url}"))?;

        let status = response.status();
        let body = response.text().context("read catalog response")?;
        read_search_response(status, &body, &self.base_url)
    }
}

impl CatalogProvider for OpenLibrary {
    fn search(&self, query: &str, limit: usize, offset: usize) -> Vec<BookRecord> {
        books_or_empty(self.fetch(query, limit, offset), query, offset)
    }
}

/// Anything but `200 OK` is a failed search, whatever the body says.
fn read_search_response(
    status: StatusCode,
    body: &str,
    base_url: &str,
) -> anyhow::Result<Vec<BookRecord>> {
    if status != StatusCode::OK {
        anyhow::bail!("catalog responded with status {status}");
    }
    parse_search_response(body, base_url)
}

fn books_or_empty(
    result: anyhow::Result<Vec<BookRecord>>,
    query: &str,
    offset: usize,
) -> Vec<BookRecord> {
    match result {
        Ok(books) => books,
        Err(err) => {
            tracing::warn!(query, offset, "catalog search failed: {err:#}");
            Vec::new()
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<Value>,
}

/// Decodes an Open Library `search.json` body.
///
/// Missing fields fall back to placeholders; non-object entries are skipped.
pub fn parse_search_response(body: &str, base_url: &str) -> anyhow::Result<Vec<BookRecord>> {
    let response: SearchResponse =
        serde_json::from_str(body).context("decode catalog search response")?;
    Ok(response
        .docs
        .iter()
        .filter(|doc| doc.is_object())
        .map(|doc| book_from_doc(doc, base_url))
        .collect())
}

fn book_from_doc(doc: &Value, base_url: &str) -> BookRecord {
    let title = doc
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(NOT_AVAILABLE)
        .to_string();

    let author = doc
        .get("author_name")
        .and_then(Value::as_array)
        .and_then(|names| names.first())
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_AUTHOR)
        .to_string();

    let publish_year = doc
        .get("first_publish_year")
        .and_then(Value::as_i64)
        .map(|year| year.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let subjects = doc
        .get("subject")
        .and_then(Value::as_array)
        .map(|subjects| {
            subjects
                .iter()
                .filter_map(Value::as_str)
                .take(MAX_SUBJECTS)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let cover_url = doc
        .get("cover_i")
        .and_then(Value::as_i64)
        .map(|id| format!("{COVERS_URL}/{id}-M.jpg"));

    let url = doc
        .get("key")
        .and_then(Value::as_str)
        .map(|key| format!("{base_url}{key}"));

    BookRecord {
        title,
        author,
        publish_year,
        subjects,
        cover_url,
        url,
    }
}
