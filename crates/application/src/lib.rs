//! Application orchestration layer for Libris.

pub mod loan;
pub mod recommend;
pub mod selection;
pub mod session;

use libris_core::{BookRecord, ReadListStore};

pub use loan::{BorrowOutcome, LoanService};
pub use recommend::{HistoryRecommender, choose_subjects, subject_query};
pub use selection::{SKIP_TOKEN, SelectionError, display_index, parse_selection};
pub use session::{
    Navigation, NavigationError, PageOutcome, Query, Session, SessionError, SessionState,
    Transition,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddReport {
    pub added: Vec<String>,
    pub failed: Vec<String>,
}

impl AddReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.failed.is_empty()
    }
}

/// Stores each book independently; one failed insert doesn't stop the rest.
pub fn add_to_read_list(store: &mut dyn ReadListStore, books: &[BookRecord]) -> AddReport {
    let mut report = AddReport::default();
    for book in books {
        if store.insert(book) {
            report.added.push(book.title.clone());
        } else {
            tracing::warn!(title = %book.title, "book not added to read list");
            report.failed.push(book.title.clone());
        }
    }
    report
}
