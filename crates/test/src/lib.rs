//! Test helpers and fixtures.

use std::cell::RefCell;

use libris_core::{BookRecord, CatalogProvider, LoanRecord, LoanStore, ReadListStore, Settings};

pub fn make_settings(page_size: usize) -> Settings {
    Settings {
        page_size,
        ..Settings::default()
    }
}

pub fn make_books(prefix: &str, count: usize) -> Vec<BookRecord> {
    (1..=count)
        .map(|i| {
            BookRecord::titled(format!("{prefix} {i}"))
                .with_author(format!("Author {i}"))
                .with_year((1900 + i).to_string())
        })
        .collect()
}

/// Serves a fixed result list page by page, whatever the query.
#[derive(Debug, Default)]
pub struct FakeCatalog {
    books: Vec<BookRecord>,
    calls: RefCell<Vec<(String, usize, usize)>>,
}

impl FakeCatalog {
    pub fn returning(books: Vec<BookRecord>) -> Self {
        Self {
            books,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Behaves like a provider whose transport always fails.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(String, usize, usize)> {
        self.calls.borrow().clone()
    }
}

impl CatalogProvider for FakeCatalog {
    fn search(&self, query: &str, limit: usize, offset: usize) -> Vec<BookRecord> {
        self.calls
            .borrow_mut()
            .push((query.to_string(), limit, offset));
        self.books.iter().skip(offset).take(limit).cloned().collect()
    }
}

#[derive(Debug, Default)]
pub struct MemoryShelf {
    pub read_list: Vec<BookRecord>,
    pub loans: Vec<LoanRecord>,
    pub reject_titles: Vec<String>,
}

impl ReadListStore for MemoryShelf {
    fn insert(&mut self, book: &BookRecord) -> bool {
        if self.reject_titles.contains(&book.title) {
            return false;
        }
        self.read_list.push(book.clone());
        true
    }

    fn entries(&self) -> Vec<BookRecord> {
        self.read_list.clone()
    }
}

impl LoanStore for MemoryShelf {
    fn insert_loan(&mut self, loan: &LoanRecord) -> bool {
        if self.reject_titles.contains(&loan.title) {
            return false;
        }
        self.loans.push(loan.clone());
        true
    }

    fn loans(&self) -> Vec<LoanRecord> {
        self.loans.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use chrono::NaiveDate;
    use libris_application::{
        BorrowOutcome, HistoryRecommender, LoanService, Navigation, NavigationError, PageOutcome,
        Query, Session, SessionState, add_to_read_list,
    };
    use libris_catalog::LocalLibrary;
    use libris_core::PAGE_SIZE;
    use libris_storage::Storage;
    use libris_ui::{Console, Ui, UiExit};
    use rand::SeedableRng as _;
    use rand::rngs::StdRng;

    use super::*;

    fn hobbit_results() -> Vec<BookRecord> {
        vec![
            BookRecord::titled("The Hobbit").with_author("J.R.R. Tolkien").with_year("1937"),
            BookRecord::titled("The Annotated Hobbit").with_author("Douglas A. Anderson"),
            BookRecord::titled("The History of the Hobbit").with_author("John D. Rateliff"),
        ]
    }

    fn run_ui(
        catalog: &FakeCatalog,
        shelf: &mut MemoryShelf,
        settings: Settings,
        script: &str,
    ) -> (UiExit, String) {
        let console = Console::new(Cursor::new(script.to_string()), Vec::new());
        let mut ui = Ui::new(console, catalog, shelf, settings);
        let exit = ui.run().expect("ui run").exit;
        let out = String::from_utf8_lossy(ui.console().output()).to_string();
        (exit, out)
    }

    #[test]
    fn builds_settings() {
        let settings = make_settings(12);
        assert_eq!(settings.page_size, 12);
    }

    #[test]
    fn hobbit_selection_adds_two_books() {
        let catalog = FakeCatalog::returning(hobbit_results());
        let mut shelf = MemoryShelf::default();
        let mut session = Session::new(&catalog, PAGE_SIZE);

        let outcome = session.start(Query::text("Hobbit").unwrap());
        assert_eq!(outcome, PageOutcome::Page { shown: 3, last: true });
        session.page_shown();

        let picked = session.select("1 3").unwrap();
        let report = add_to_read_list(&mut shelf, &picked);
        assert_eq!(report.added.len(), 2);

        let titles: Vec<&str> = shelf.read_list.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["The Hobbit", "The History of the Hobbit"]);
        assert!(!session.has_next_page());
        assert_eq!(
            session.navigate(Navigation::NextPage),
            Err(NavigationError::NoMorePages)
        );
        assert_eq!(catalog.calls(), vec![("Hobbit".to_string(), 5, 0)]);
    }

    #[test]
    fn hobbit_scenario_through_the_menus() {
        let catalog = FakeCatalog::returning(hobbit_results());
        let mut shelf = MemoryShelf::default();
        let (exit, out) = run_ui(
            &catalog,
            &mut shelf,
            make_settings(PAGE_SIZE),
            "1\nHobbit\n1 3\nq\n",
        );

        assert_eq!(exit, UiExit::Quit);
        assert_eq!(shelf.read_list.len(), 2);
        assert_eq!(shelf.read_list[1].title, "The History of the Hobbit");
        assert!(out.contains("-- End of results --"));
        assert!(!out.contains("n) Next page"));
        assert!(out.contains("Added \"The Hobbit\" to your read list."));
    }

    #[test]
    fn hobbit_scenario_persists_to_sqlite() -> anyhow::Result<()> {
        let catalog = FakeCatalog::returning(hobbit_results());
        let mut storage = Storage::open_in_memory()?;
        let mut session = Session::new(&catalog, PAGE_SIZE);
        session.start(Query::text("Hobbit").unwrap());
        session.page_shown();
        let picked = session.select("3 1 1")?;
        add_to_read_list(&mut storage, &picked);

        let stored = storage.list_read_list()?;
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].author, "J.R.R. Tolkien");
        assert_eq!(stored[0].publish_year, "1937");
        Ok(())
    }

    #[test]
    fn invalid_selection_is_retried_without_partial_insert() {
        let catalog = FakeCatalog::returning(hobbit_results());
        let mut shelf = MemoryShelf::default();
        let (_, out) = run_ui(
            &catalog,
            &mut shelf,
            make_settings(PAGE_SIZE),
            "1\nHobbit\n1 4 7\nabc\n2\nb\n6\n",
        );
        assert!(out.contains("invalid selection(s): 4, 7; valid range is 1 to 3"));
        assert!(out.contains("'abc' is not a number"));
        assert_eq!(shelf.read_list.len(), 1);
        assert_eq!(shelf.read_list[0].title, "The Annotated Hobbit");
    }

    #[test]
    fn numbering_is_contiguous_across_pages() {
        let catalog = FakeCatalog::returning(make_books("Book", 13));
        let mut session = Session::new(&catalog, 5);
        let mut outcome = session.start(Query::text("book").unwrap());
        let mut seen = Vec::new();
        loop {
            let PageOutcome::Page { shown, last } = outcome else {
                break;
            };
            let numbers: Vec<usize> = session.numbered_page().map(|(n, _)| n).collect();
            let offset = session.offset();
            assert_eq!(numbers, (offset + 1..=offset + shown).collect::<Vec<_>>());
            seen.extend(numbers);

            session.page_shown();
            session.select("0").unwrap();
            if last {
                assert_eq!(
                    session.navigate(Navigation::NextPage),
                    Err(NavigationError::NoMorePages)
                );
                break;
            }
            outcome = match session.navigate(Navigation::NextPage).unwrap() {
                libris_application::Transition::Page(next) => next,
                other => panic!("unexpected transition {other:?}"),
            };
        }
        assert_eq!(seen, (1..=13).collect::<Vec<_>>());
        assert_eq!(
            catalog.calls().iter().map(|c| c.2).collect::<Vec<_>>(),
            vec![0, 5, 10]
        );
    }

    #[test]
    fn paging_through_the_menus_adds_from_second_page() {
        let catalog = FakeCatalog::returning(make_books("Book", 8));
        let mut shelf = MemoryShelf::default();
        let (_, out) = run_ui(
            &catalog,
            &mut shelf,
            make_settings(5),
            "1\nbook\n0\nn\n2\n7 6\nb\n6\n",
        );
        assert!(out.contains("Results 6-8 for \"book\""));
        assert!(out.contains("invalid selection(s): 2; valid range is 6 to 8"));
        let titles: Vec<&str> = shelf.read_list.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Book 6", "Book 7"]);
    }

    #[test]
    fn new_search_restarts_at_offset_zero() {
        let catalog = FakeCatalog::returning(make_books("Book", 12));
        let mut shelf = MemoryShelf::default();
        run_ui(
            &catalog,
            &mut shelf,
            make_settings(5),
            "1\nbook\n0\nn\n0\ns\nother\n0\nb\n6\n",
        );
        let offsets: Vec<(String, usize)> =
            catalog.calls().into_iter().map(|(q, _, o)| (q, o)).collect();
        assert_eq!(
            offsets,
            vec![
                ("book".to_string(), 0),
                ("book".to_string(), 5),
                ("other".to_string(), 0),
            ]
        );
    }

    #[test]
    fn genre_recommendations_combine_subjects() {
        let catalog = FakeCatalog::returning(make_books("Tale", 2));
        let mut shelf = MemoryShelf::default();
        let (_, out) = run_ui(
            &catalog,
            &mut shelf,
            make_settings(5),
            "2\n3 8 3\n2\ng\nb\n6\n",
        );
        assert_eq!(
            catalog.calls()[0].0,
            "subject:\"Fantasy\" subject:\"Horror\""
        );
        assert!(out.contains("Fantasy + Horror"));
        assert_eq!(shelf.read_list.len(), 1);
        assert_eq!(out.matches("=== Popular Genres ===").count(), 2);
    }

    #[test]
    fn provider_failure_looks_like_no_results() {
        let catalog = FakeCatalog::unavailable();
        let mut session = Session::new(&catalog, 5);
        assert_eq!(
            session.start(Query::text("Hobbit").unwrap()),
            PageOutcome::NoResults
        );
        assert_eq!(session.state(), SessionState::Querying);
    }

    #[test]
    fn failed_inserts_are_reported_and_skipped() {
        let catalog = FakeCatalog::returning(hobbit_results());
        let mut shelf = MemoryShelf {
            reject_titles: vec!["The Hobbit".to_string()],
            ..MemoryShelf::default()
        };
        let (_, out) = run_ui(
            &catalog,
            &mut shelf,
            make_settings(5),
            "1\nHobbit\n1 2\nq\n",
        );
        assert!(out.contains("Could not add \"The Hobbit\" to your read list."));
        assert_eq!(shelf.read_list.len(), 1);
    }

    #[test]
    fn loan_is_stored_with_computed_dates() -> anyhow::Result<()> {
        let catalog = FakeCatalog::returning(hobbit_results());
        let mut storage = Storage::open_in_memory()?;
        let service = LoanService::new(&catalog);
        let today = NaiveDate::from_ymd_opt(2024, 10, 31).unwrap();

        let outcome = service.borrow(&mut storage, "The Hobbit", today);
        assert!(matches!(outcome, BorrowOutcome::Borrowed(_)));
        let loans = storage.list_loans()?;
        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0].borrow_date_str(), "2024-11-01");
        assert_eq!(loans[0].due_date_str(), "2024-11-22");

        let empty = FakeCatalog::unavailable();
        let service = LoanService::new(&empty);
        assert_eq!(
            service.borrow(&mut storage, "The Hobbit", today),
            BorrowOutcome::NotFound
        );
        assert_eq!(storage.list_loans()?.len(), 1);
        Ok(())
    }

    #[test]
    fn local_library_recommendations_avoid_repeats() {
        let text: String = (1..=8)
            .map(|i| format!("Title: Ghost {i}, Author: A{i}, Type: Horror\n"))
            .collect();
        let library = LocalLibrary::parse(&text);
        let mut picks = HistoryRecommender::new(library.buckets(), StdRng::seed_from_u64(42));

        let mut previous = picks.recommend("horror", 4);
        for _ in 0..10 {
            let next = picks.recommend("Horror", 4);
            assert_eq!(next.len(), 4);
            assert!(next.iter().all(|b| !previous.contains(b)));
            previous = next;
        }
    }

    #[test]
    fn offline_catalog_serves_sessions() {
        let library = LocalLibrary::parse(
            "Title: The Hobbit, Type: Fantasy\nTitle: Hobbit Tales, Type: Fantasy\nTitle: Emma, Type: Romance\n",
        );
        let mut session = Session::new(&library, 5);
        assert_eq!(
            session.start(Query::text("hobbit").unwrap()),
            PageOutcome::Page { shown: 2, last: true }
        );
    }

    #[test]
    fn offline_catalog_serves_genre_sessions() {
        let library = LocalLibrary::parse(
            "Title: The Hobbit, Type: Fantasy\nTitle: Dracula, Type: Horror\nTitle: Earthsea, Type: fantasy\n",
        );
        let mut session = Session::new(&library, 5);
        let query = Query::subjects(vec!["Fantasy".to_string()]).unwrap();
        assert_eq!(session.start(query), PageOutcome::Page { shown: 2, last: true });
        let titles: Vec<&str> = session.page().iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["The Hobbit", "Earthsea"]);

        let both = Query::subjects(vec!["Fantasy".to_string(), "Horror".to_string()]).unwrap();
        assert_eq!(session.start(both), PageOutcome::NoResults);

        let mut shelf = MemoryShelf::default();
        let console = Console::new(Cursor::new("2\n3\n1 2\nq\n".to_string()), Vec::new());
        let mut ui = Ui::new(console, &library, &mut shelf, make_settings(5));
        assert_eq!(ui.run().expect("ui run").exit, UiExit::Quit);
        let out = String::from_utf8_lossy(ui.console().output()).to_string();
        assert!(out.contains("Results 1-2 for Fantasy"));
        drop(ui);
        assert_eq!(shelf.read_list.len(), 2);
    }
}
