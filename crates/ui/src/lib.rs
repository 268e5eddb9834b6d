//! Console menus for Libris.

use std::io::{BufRead, Write};

use chrono::NaiveDate;
use libris_application::{
    AddReport, BorrowOutcome, HistoryRecommender, LoanService, Navigation, PageOutcome, Query,
    Session, Transition, add_to_read_list, choose_subjects, parse_selection,
};
use libris_core::{
    BookRecord, CatalogProvider, LoanStore, POPULAR_SUBJECTS, ReadListStore, Settings,
};
use rand::rngs::StdRng;

mod console;

pub use console::{Console, clip};

const TITLE_WIDTH: usize = 60;
const BACK_TOKEN: &str = "b";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiExit {
    /// The user asked to quit.
    Quit,
    /// Standard input was closed.
    InputClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiOutcome {
    pub exit: UiExit,
}

/// Persistence used by the menus: the read list and the loan log.
pub trait Shelf {
    fn read_list(&mut self) -> &mut dyn ReadListStore;

    fn loan_log(&mut self) -> &mut dyn LoanStore;
}

impl<T: ReadListStore + LoanStore> Shelf for T {
    fn read_list(&mut self) -> &mut dyn ReadListStore {
        self
    }

    fn loan_log(&mut self) -> &mut dyn LoanStore {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit(UiExit),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Browse {
    NewQuery,
    Back,
    Exit(UiExit),
}

#[derive(Debug, Clone, Copy)]
struct NewQueryKey {
    key: &'static str,
    label: &'static str,
}

const NEW_SEARCH: NewQueryKey = NewQueryKey {
    key: "s",
    label: "New search",
};

const NEW_GENRES: NewQueryKey = NewQueryKey {
    key: "g",
    label: "New genres",
};

pub struct Ui<'a, R, W> {
    console: Console<R, W>,
    catalog: &'a dyn CatalogProvider,
    shelf: &'a mut dyn Shelf,
    settings: Settings,
    picks: Option<HistoryRecommender<StdRng>>,
    clock: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

impl<'a, R: BufRead, W: Write> Ui<'a, R, W> {
    pub fn new(
        console: Console<R, W>,
        catalog: &'a dyn CatalogProvider,
        shelf: &'a mut dyn Shelf,
        mut settings: Settings,
    ) -> Self {
        settings.normalize();
        Self {
            console,
            catalog,
            shelf,
            settings,
            picks: None,
            clock: local_today,
        }
    }

    pub fn with_library_picks(mut self, picks: HistoryRecommender<StdRng>) -> Self {
        self.picks = Some(picks);
        self
    }

    pub fn with_clock(mut self, clock: fn() -> NaiveDate) -> Self {
        self.clock = clock;
        self
    }

    pub fn console(&self) -> &Console<R, W> {
        &self.console
    }

    pub fn run(&mut self) -> anyhow::Result<UiOutcome> {
        loop {
            self.console.heading("Library Main Menu")?;
            self.console.say("1) Search for books")?;
            self.console.say("2) Genre recommendations")?;
            self.console.say("3) Library picks")?;
            self.console.say("4) Borrow a book")?;
            self.console.say("5) Show read list")?;
            self.console.say("6) Exit")?;

            let Some(choice) = self.console.ask("Choice: ")? else {
                return Ok(UiOutcome {
                    exit: UiExit::InputClosed,
                });
            };
            let flow = match choice.as_str() {
                "1" => self.search_books()?,
                "2" => self.recommend_by_genre()?,
                "3" => self.library_picks()?,
                "4" => self.loan_menu()?,
                "5" => self.show_read_list()?,
                "6" => Flow::Exit(UiExit::Quit),
                _ => {
                    self.console
                        .warn("Invalid choice. Please enter a number between 1 and 6.")?;
                    Flow::Continue
                }
            };
            if let Flow::Exit(exit) = flow {
                if exit == UiExit::Quit {
                    self.console.say("Goodbye!")?;
                }
                return Ok(UiOutcome { exit });
            }
        }
    }

    fn search_books(&mut self) -> anyhow::Result<Flow> {
        let catalog = self.catalog;
        let mut session = Session::new(catalog, self.settings.page_size);
        loop {
            let Some(text) = self
                .console
                .ask("Enter book name (blank to go back): ")?
            else {
                return Ok(Flow::Exit(UiExit::InputClosed));
            };
            if text.is_empty() {
                return Ok(Flow::Continue);
            }
            let query = match Query::text(&text) {
                Ok(query) => query,
                Err(err) => {
                    self.console.warn(&format!("{err}."))?;
                    continue;
                }
            };
            match self.browse(&mut session, query, NEW_SEARCH)? {
                Browse::NewQuery => continue,
                Browse::Back => return Ok(Flow::Continue),
                Browse::Exit(exit) => return Ok(Flow::Exit(exit)),
            }
        }
    }

    fn recommend_by_genre(&mut self) -> anyhow::Result<Flow> {
        let catalog = self.catalog;
        let mut session = Session::new(catalog, self.settings.page_size);
        loop {
            self.console.heading("Popular Genres")?;
            for (idx, subject) in POPULAR_SUBJECTS.iter().enumerate() {
                self.console.say(&format!("{:>2}) {subject}", idx + 1))?;
            }
            let Some(input) = self.console.ask(&format!(
                "Select genres (numbers separated by spaces, '{BACK_TOKEN}' to go back): "
            ))?
            else {
                return Ok(Flow::Exit(UiExit::InputClosed));
            };
            if input.eq_ignore_ascii_case(BACK_TOKEN) {
                return Ok(Flow::Continue);
            }

            let subjects = match choose_subjects(&input) {
                Ok(subjects) => subjects,
                Err(err) => {
                    self.console.warn(&format!("{err}. Please try again."))?;
                    continue;
                }
            };
            let query = match Query::subjects(subjects) {
                Ok(query) => query,
                Err(err) => {
                    self.console
                        .warn(&format!("{err}. Pick at least one genre."))?;
                    continue;
                }
            };
            match self.browse(&mut session, query, NEW_GENRES)? {
                Browse::NewQuery => continue,
                Browse::Back => return Ok(Flow::Continue),
                Browse::Exit(exit) => return Ok(Flow::Exit(exit)),
            }
        }
    }

    /// Drives one session from its first page until the user leaves it.
    fn browse(
        &mut self,
        session: &mut Session<'_>,
        query: Query,
        new_query: NewQueryKey,
    ) -> anyhow::Result<Browse> {
        let label = query.describe();
        let mut outcome = session.start(query);
        loop {
            match outcome {
                PageOutcome::NoResults => {
                    self.console
                        .warn(&format!("No results found for {label}."))?;
                    return Ok(Browse::NewQuery);
                }
                PageOutcome::EndOfResults => {
                    self.console.dim("-- No more results --")?;
                }
                PageOutcome::Page { last, .. } => {
                    self.render_page(session, &label)?;
                    session.page_shown();
                    if last {
                        self.console.dim("-- End of results --")?;
                    }
                    if let Some(exit) = self.select_from_page(session)? {
                        return Ok(Browse::Exit(exit));
                    }
                }
            }

            let Some(transition) = self.navigate(session, new_query)? else {
                return Ok(Browse::Exit(UiExit::InputClosed));
            };
            match transition {
                Transition::Page(next) => outcome = next,
                Transition::NewQuery => return Ok(Browse::NewQuery),
                Transition::Back => return Ok(Browse::Back),
                Transition::Exit => return Ok(Browse::Exit(UiExit::Quit)),
            }
        }
    }

    fn render_page(&mut self, session: &Session<'_>, label: &str) -> anyhow::Result<()> {
        let first = session.offset() + 1;
        let last = session.offset() + session.page().len();
        self.console
            .heading(&format!("Results {first}-{last} for {label}"))?;
        let lines: Vec<(String, Vec<String>)> = session
            .numbered_page()
            .map(|(number, book)| (format!("{number}) {}", book_line(book)), book_details(book)))
            .collect();
        for (line, details) in lines {
            self.console.say(&line)?;
            for detail in details {
                self.console.dim(&detail)?;
            }
        }
        Ok(())
    }

    /// Returns `Some` when input closed while waiting.
    fn select_from_page(&mut self, session: &mut Session<'_>) -> anyhow::Result<Option<UiExit>> {
        loop {
            let Some(input) = self
                .console
                .ask("Add to read list? (numbers separated by spaces, 0 to skip): ")?
            else {
                return Ok(Some(UiExit::InputClosed));
            };
            match session.select(&input) {
                Ok(books) => {
                    let report = add_to_read_list(self.shelf.read_list(), &books);
                    self.print_report(&report)?;
                    return Ok(None);
                }
                Err(err) => {
                    self.console.warn(&format!("{err}. Please try again."))?;
                }
            }
        }
    }

    /// `None` when input closed at the prompt.
    fn navigate(
        &mut self,
        session: &mut Session<'_>,
        new_query: NewQueryKey,
    ) -> anyhow::Result<Option<Transition>> {
        loop {
            if session.has_next_page() {
                self.console.say("n) Next page")?;
            }
            self.console
                .say(&format!("{}) {}", new_query.key, new_query.label))?;
            self.console.say("b) Back to main menu")?;
            self.console.say("q) Quit")?;

            let Some(choice) = self.console.ask("Choice: ")? else {
                return Ok(None);
            };
            let choice = choice.to_ascii_lowercase();
            let nav = match choice.as_str() {
                "n" => Navigation::NextPage,
                "b" => Navigation::Back,
                "q" => Navigation::Exit,
                key if key == new_query.key => Navigation::NewQuery,
                _ => {
                    self.console.warn("Invalid choice. Please try again.")?;
                    continue;
                }
            };
            match session.navigate(nav) {
                Ok(transition) => return Ok(Some(transition)),
                Err(err) => {
                    self.console.warn(&format!("{err}."))?;
                }
            }
        }
    }

    fn print_report(&mut self, report: &AddReport) -> anyhow::Result<()> {
        for title in &report.added {
            self.console
                .success(&format!("Added \"{title}\" to your read list."))?;
        }
        for title in &report.failed {
            self.console
                .warn(&format!("Could not add \"{title}\" to your read list."))?;
        }
        Ok(())
    }

    fn library_picks(&mut self) -> anyhow::Result<Flow> {
        if self.picks.is_none() {
            self.console.warn(
                "No local library file is configured. Set LIBRIS_LIBRARY_FILE to enable picks.",
            )?;
            return Ok(Flow::Continue);
        }

        loop {
            self.console.heading("Library Picks")?;
            self.console.say("1) List types")?;
            self.console.say("2) Recommend by type")?;
            self.console.say("3) Back to main menu")?;
            let Some(choice) = self.console.ask("Choice: ")? else {
                return Ok(Flow::Exit(UiExit::InputClosed));
            };
            match choice.as_str() {
                "1" => {
                    let types: Vec<String> = self
                        .picks
                        .as_ref()
                        .map(|p| p.categories().into_iter().map(str::to_string).collect())
                        .unwrap_or_default();
                    self.console.say("Available types:")?;
                    for name in types {
                        self.console.say(&format!("- {name}"))?;
                    }
                }
                "2" => {
                    if let Some(exit) = self.recommend_by_type()? {
                        return Ok(Flow::Exit(exit));
                    }
                }
                "3" => return Ok(Flow::Continue),
                _ => {
                    self.console
                        .warn("Invalid choice. Please enter a number between 1 and 3.")?;
                }
            }
        }
    }

    fn recommend_by_type(&mut self) -> anyhow::Result<Option<UiExit>> {
        let Some(category) = self.console.ask("Enter type: ")? else {
            return Ok(Some(UiExit::InputClosed));
        };
        let count = self.settings.recommendation_count;
        let recs = match self.picks.as_mut() {
            Some(picks) if picks.has_category(&category) => picks.recommend(&category, count),
            _ => {
                self.console
                    .warn(&format!("Unknown type \"{category}\"."))?;
                return Ok(None);
            }
        };

        for (idx, book) in recs.iter().enumerate() {
            self.console
                .say(&format!("{}) {}", idx + 1, book_line(book)))?;
        }
        loop {
            let Some(input) = self
                .console
                .ask("Add any to read list? (numbers separated by spaces, 0 to skip): ")?
            else {
                return Ok(Some(UiExit::InputClosed));
            };
            match parse_selection(&input, 0, recs.len()) {
                Ok(indices) => {
                    let chosen: Vec<BookRecord> =
                        indices.into_iter().map(|idx| recs[idx].clone()).collect();
                    let report = add_to_read_list(self.shelf.read_list(), &chosen);
                    self.print_report(&report)?;
                    return Ok(None);
                }
                Err(err) => {
                    self.console.warn(&format!("{err}. Please try again."))?;
                }
            }
        }
    }

    fn loan_menu(&mut self) -> anyhow::Result<Flow> {
        loop {
            self.console.heading("Loan Menu")?;
            self.console.say("1) Borrow a book")?;
            self.console.say("2) Show my loans")?;
            self.console.say("3) Back to main menu")?;
            let Some(choice) = self.console.ask("Choice: ")? else {
                return Ok(Flow::Exit(UiExit::InputClosed));
            };
            match choice.as_str() {
                "1" => {
                    if let Some(exit) = self.borrow_book()? {
                        return Ok(Flow::Exit(exit));
                    }
                }
                "2" => self.show_loans()?,
                "3" => return Ok(Flow::Continue),
                _ => {
                    self.console
                        .warn("Invalid choice. Please enter a number between 1 and 3.")?;
                }
            }
        }
    }

    fn borrow_book(&mut self) -> anyhow::Result<Option<UiExit>> {
        let Some(title) = self.console.ask("Enter book title to borrow: ")? else {
            return Ok(Some(UiExit::InputClosed));
        };
        let service = LoanService::new(self.catalog);
        let outcome = service.borrow(self.shelf.loan_log(), &title, (self.clock)());
        match outcome {
            BorrowOutcome::Borrowed(loan) => {
                self.console
                    .success(&format!("Loan recorded for \"{}\".", loan.title))?;
                self.console
                    .say(&format!("Borrow Date: {}", loan.borrow_date_str()))?;
                self.console
                    .say(&format!("Due Date:    {}", loan.due_date_str()))?;
            }
            BorrowOutcome::NotSaved(loan) => {
                self.console
                    .say(&format!("Borrow Date: {}", loan.borrow_date_str()))?;
                self.console
                    .say(&format!("Due Date:    {}", loan.due_date_str()))?;
                self.console
                    .warn("The loan could not be saved. Please try again later.")?;
            }
            BorrowOutcome::NotFound => {
                self.console.warn("Book not found in catalog.")?;
            }
            BorrowOutcome::InvalidTitle => {
                self.console.warn("Please enter a book title.")?;
            }
        }
        Ok(None)
    }

    fn show_loans(&mut self) -> anyhow::Result<()> {
        let loans = self.shelf.loan_log().loans();
        if loans.is_empty() {
            self.console.say("You have no loans.")?;
            return Ok(());
        }
        for loan in loans {
            self.console.say(&format!(
                "- {} (borrowed {}, due {})",
                clip(&loan.title, TITLE_WIDTH),
                loan.borrow_date_str(),
                loan.due_date_str()
            ))?;
        }
        Ok(())
    }

    fn show_read_list(&mut self) -> anyhow::Result<Flow> {
        let entries = self.shelf.read_list().entries();
        self.console.heading("Read List")?;
        if entries.is_empty() {
            self.console.say("Your read list is empty.")?;
            return Ok(Flow::Continue);
        }
        for (idx, book) in entries.iter().enumerate() {
            self.console
                .say(&format!("{}) {}", idx + 1, book_line(book)))?;
        }
        Ok(Flow::Continue)
    }
}

fn book_line(book: &BookRecord) -> String {
    format!(
        "{} by {} ({})",
        clip(&book.title, TITLE_WIDTH),
        book.author,
        book.publish_year
    )
}

fn book_details(book: &BookRecord) -> Vec<String> {
    let mut out = Vec::new();
    if !book.subjects.is_empty() {
        out.push(format!("   Subjects: {}", book.joined_subjects()));
    }
    if let Some(url) = book.url.as_deref() {
        out.push(format!("   More info: {url}"));
    }
    out
}
