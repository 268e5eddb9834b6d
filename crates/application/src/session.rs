//! Paginated browsing of catalog results.

use libris_core::{BookRecord, CatalogProvider};
use thiserror::Error;

use crate::recommend::subject_query;
use crate::selection::{SelectionError, display_index, parse_selection};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no subjects were selected")]
    EmptySelection,
    #[error("search text is empty")]
    EmptyQuery,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("there are no more results for this query")]
    NoMorePages,
    #[error("finish the current page before navigating")]
    SelectionPending,
    #[error("no query is active")]
    NoActiveQuery,
}

/// What a session browses: free text or an AND-combined set of subjects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Text(String),
    Subjects(Vec<String>),
}

impl Query {
    pub fn text(text: &str) -> Result<Self, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyQuery);
        }
        Ok(Self::Text(text.to_string()))
    }

    pub fn subjects(subjects: Vec<String>) -> Result<Self, SessionError> {
        if subjects.is_empty() {
            return Err(SessionError::EmptySelection);
        }
        Ok(Self::Subjects(subjects))
    }

    pub fn catalog_query(&self) -> String {
        match self {
            Query::Text(text) => text.clone(),
            Query::Subjects(subjects) => subject_query(subjects),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Query::Text(text) => format!("\"{text}\""),
            Query::Subjects(subjects) => subjects.join(" + "),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Querying,
    ShowingPage,
    AwaitingSelection,
    AwaitingNavigation,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    NextPage,
    NewQuery,
    /// Quit the whole program.
    Exit,
    /// Leave this session and return to the caller's menu.
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Nothing matched the query on its first page.
    NoResults,
    /// A page of records is ready to show; `last` when it came back short.
    Page { shown: usize, last: bool },
    /// A later page came back empty.
    EndOfResults,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Page(PageOutcome),
    NewQuery,
    Exit,
    Back,
}

pub struct Session<'a> {
    catalog: &'a dyn CatalogProvider,
    page_size: usize,
    query: Option<Query>,
    offset: usize,
    page: Vec<BookRecord>,
    state: SessionState,
}

impl<'a> Session<'a> {
    pub fn new(catalog: &'a dyn CatalogProvider, page_size: usize) -> Self {
        Self {
            catalog,
            page_size: page_size.max(1),
            query: None,
            offset: 0,
            page: Vec::new(),
            state: SessionState::Querying,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page(&self) -> &[BookRecord] {
        &self.page
    }

    /// Records on the current page paired with their visible number.
    pub fn numbered_page(&self) -> impl Iterator<Item = (usize, &BookRecord)> + '_ {
        self.page
            .iter()
            .enumerate()
            .map(|(pos, book)| (display_index(self.offset, pos), book))
    }

    pub fn has_next_page(&self) -> bool {
        self.query.is_some() && self.page.len() == self.page_size
    }

    /// Starts browsing a new query from its first page.
    pub fn start(&mut self, query: Query) -> PageOutcome {
        tracing::info!(query = %query.describe(), "session started");
        self.query = Some(query);
        self.offset = 0;
        self.fetch()
    }

    fn fetch(&mut self) -> PageOutcome {
        let Some(query) = self.query.as_ref() else {
            self.state = SessionState::Querying;
            return PageOutcome::NoResults;
        };

        let catalog_query = query.catalog_query();
        self.page = self
            .catalog
            .search(&catalog_query, self.page_size, self.offset);
        self.page.truncate(self.page_size);
        tracing::debug!(
            query = %catalog_query,
            offset = self.offset,
            received = self.page.len(),
            "fetched page"
        );

        if self.page.is_empty() {
            if self.offset == 0 {
                self.query = None;
                self.state = SessionState::Querying;
                return PageOutcome::NoResults;
            }
            self.state = SessionState::AwaitingNavigation;
            return PageOutcome::EndOfResults;
        }

        self.state = SessionState::ShowingPage;
        PageOutcome::Page {
            shown: self.page.len(),
            last: self.page.len() < self.page_size,
        }
    }

    /// Marks the current page as rendered; selection input is expected next.
    pub fn page_shown(&mut self) {
        if self.state == SessionState::ShowingPage {
            self.state = SessionState::AwaitingSelection;
        }
    }

    /// Resolves numbered input against the current page.
    ///
    /// On error the session keeps waiting for a selection. Only a page that is
    /// showing or awaiting a selection accepts input.
    pub fn select(&mut self, input: &str) -> Result<Vec<BookRecord>, SelectionError> {
        if !matches!(
            self.state,
            SessionState::ShowingPage | SessionState::AwaitingSelection
        ) {
            return Err(SelectionError::NotAwaiting);
        }
        let indices = parse_selection(input, self.offset, self.page.len())?;
        self.state = SessionState::AwaitingNavigation;
        Ok(indices
            .into_iter()
            .filter_map(|idx| self.page.get(idx).cloned())
            .collect())
    }

    pub fn skip_selection(&mut self) {
        if matches!(
            self.state,
            SessionState::ShowingPage | SessionState::AwaitingSelection
        ) {
            self.state = SessionState::AwaitingNavigation;
        }
    }

    pub fn navigate(&mut self, nav: Navigation) -> Result<Transition, NavigationError> {
        match nav {
            Navigation::NextPage => {
                if self.query.is_none() {
                    return Err(NavigationError::NoActiveQuery);
                }
                if self.state != SessionState::AwaitingNavigation {
                    return Err(NavigationError::SelectionPending);
                }
                if !self.has_next_page() {
                    return Err(NavigationError::NoMorePages);
                }
                self.offset += self.page_size;
                Ok(Transition::Page(self.fetch()))
            }
            Navigation::NewQuery => {
                self.reset(SessionState::Querying);
                Ok(Transition::NewQuery)
            }
            Navigation::Exit => {
                self.reset(SessionState::Terminated);
                Ok(Transition::Exit)
            }
            Navigation::Back => {
                self.reset(SessionState::Terminated);
                Ok(Transition::Back)
            }
        }
    }

    fn reset(&mut self, state: SessionState) {
        self.query = None;
        self.offset = 0;
        self.page.clear();
        self.state = state;
    }
}
