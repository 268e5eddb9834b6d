//! Book loans against the catalog.

use chrono::NaiveDate;
use libris_core::{CatalogProvider, LoanRecord, LoanStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BorrowOutcome {
    Borrowed(LoanRecord),
    /// Dates were computed but the loan store rejected the record.
    NotSaved(LoanRecord),
    NotFound,
    InvalidTitle,
}

pub struct LoanService<'a> {
    catalog: &'a dyn CatalogProvider,
}

impl<'a> LoanService<'a> {
    pub fn new(catalog: &'a dyn CatalogProvider) -> Self {
        Self { catalog }
    }

    pub fn exists_in_catalog(&self, title: &str) -> bool {
        !self.catalog.search(title, 1, 0).is_empty()
    }

    /// Borrows `title` starting the day after `today`.
    pub fn borrow(
        &self,
        store: &mut dyn LoanStore,
        title: &str,
        today: NaiveDate,
    ) -> BorrowOutcome {
        let title = title.trim();
        if title.is_empty() {
            return BorrowOutcome::InvalidTitle;
        }
        if !self.exists_in_catalog(title) {
            tracing::info!(title, "loan refused, title not in catalog");
            return BorrowOutcome::NotFound;
        }

        let loan = LoanRecord::starting(title, today);
        if store.insert_loan(&loan) {
            tracing::info!(
                title,
                borrow = %loan.borrow_date_str(),
                due = %loan.due_date_str(),
                "loan recorded"
            );
            BorrowOutcome::Borrowed(loan)
        } else {
            BorrowOutcome::NotSaved(loan)
        }
    }
}
