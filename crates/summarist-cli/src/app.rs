//! Application state for the Summarist REPL.
//!
//! `App` owns the one `SessionManager`, the search client and the player,
//! and turns parsed commands into calls on them.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use summarist_core::api::fetch_shelves;
use summarist_core::auth::GoogleProfile;
use summarist_core::payment::{
    checkout, format_card_number, format_cvv, format_expiry, BillingCycle, CardDetails, TRIAL_DAYS,
};
use summarist_core::player::AudioPlayer;
use summarist_core::utils::{format_rating, truncate_string};
use summarist_core::{
    check_access, Access, ApiClient, ApiError, Book, BookApi, BookStatus, BookSummary, Config,
    FileStore, SearchClient, SessionManager,
};

use crate::command::{Command, HELP};
use crate::prompt::Prompt;

// ============================================================================
// Constants
// ============================================================================

/// Delay between simulated keystrokes when a search is typed in one go.
const KEYSTROKE_INTERVAL_MS: u64 = 40;

/// How often to look at the search state while a request settles.
const SEARCH_POLL_MS: u64 = 50;

/// Width of the title column in listings.
const TITLE_WIDTH: usize = 40;

pub struct App {
    config: Config,
    api: Arc<ApiClient>,
    sessions: SessionManager<FileStore>,
    search: SearchClient<ApiClient>,
    player: AudioPlayer,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let api = Arc::new(ApiClient::with_base_url(
            &config.api_base_url,
            config.request_timeout_secs,
        )?);
        let store = FileStore::open(&config.data_dir()?)?;
        let sessions = SessionManager::new(store);
        let search = SearchClient::with_timing(
            Arc::clone(&api),
            config.search_debounce(),
            config.request_timeout(),
        );
        debug!(base_url = api.base_url(), "App created");

        Ok(Self {
            config,
            api,
            sessions,
            search,
            player: AudioPlayer::new(),
        })
    }

    /// Sign in from SUMMARIST_EMAIL / SUMMARIST_PASSWORD when no session
    /// was restored.
    pub fn auto_login(&mut self) {
        if self.sessions.session().is_authenticated() {
            return;
        }
        let (Ok(email), Ok(password)) = (
            std::env::var("SUMMARIST_EMAIL"),
            std::env::var("SUMMARIST_PASSWORD"),
        ) else {
            return;
        };
        match self.sessions.login(&email, &password) {
            Ok(_) => info!(email = %email, "Signed in from environment"),
            Err(e) => warn!(email = %email, error = %e, "Sign-in from environment failed"),
        }
    }

    pub fn save_config(&self) -> Result<()> {
        self.config.save()
    }

    pub fn status_line(&self) -> String {
        let session = self.sessions.session();
        match session.identity() {
            Some(email) => format!("Signed in as {} ({} plan)", email, session.plan().display_name()),
            None => "Not signed in".to_string(),
        }
    }

    pub async fn handle(&mut self, command: Command, prompt: &mut Prompt) -> Result<()> {
        match command {
            Command::Login(email) => self.login(email, prompt).await?,
            Command::Register(email) => self.register(email, prompt).await?,
            Command::Guest => {
                self.sessions.login_as_guest();
                println!("{}", self.status_line());
            }
            Command::Google => {
                let profile = GoogleProfile::demo();
                match self.sessions.login_with_google(&profile.email, &profile.display_name) {
                    Ok(_) => println!("Welcome, {}. {}", profile.display_name, self.status_line()),
                    Err(e) => println!("{}", e),
                }
            }
            Command::Logout => {
                self.sessions.logout();
                println!("{}", self.status_line());
            }
            Command::WhoAmI => println!("{}", self.status_line()),
            Command::Search(text) => self.run_search(&text).await,
            Command::Book(id) => self.show_book(&id).await,
            Command::Open(id) => self.open_book(&id).await,
            Command::Shelf(status) => self.show_shelves(status).await,
            Command::Upgrade(cycle) => self.upgrade(cycle, prompt).await?,
            Command::Play => self.toggle_play(),
            Command::Forward => {
                self.player.skip_forward();
                println!("{}", self.player.time_label());
            }
            Command::Back => {
                self.player.skip_back();
                println!("{}", self.player.time_label());
            }
            Command::Seek(seconds) => {
                self.player.seek(seconds);
                println!("{}", self.player.time_label());
            }
            Command::Volume(volume) => {
                self.player.set_volume(volume);
                println!("Volume {:.0}%", self.player.volume() * 100.0);
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => {}
        }
        Ok(())
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    async fn ask_email(&self, email: Option<String>, prompt: &mut Prompt) -> Result<String> {
        if let Some(email) = email {
            return Ok(email);
        }
        let hint = self
            .config
            .last_email
            .as_deref()
            .map(|e| format!(" [{}]", e))
            .unwrap_or_default();
        let answer = prompt.ask(&format!("Email{}: ", hint)).await?;
        Ok(match (&self.config.last_email, answer.is_empty()) {
            (Some(last), true) => last.clone(),
            _ => answer,
        })
    }

    async fn login(&mut self, email: Option<String>, prompt: &mut Prompt) -> Result<()> {
        let email = self.ask_email(email, prompt).await?;
        let password = prompt.password("Password: ").await?;

        match self.sessions.login(&email, &password) {
            Ok(_) => {
                self.config.last_email = Some(email);
                println!("{}", self.status_line());
            }
            Err(e) => println!("{}", e),
        }
        Ok(())
    }

    async fn register(&mut self, email: Option<String>, prompt: &mut Prompt) -> Result<()> {
        let email = self.ask_email(email, prompt).await?;
        let password = prompt.password("Password: ").await?;
        let confirm = prompt.password("Confirm password: ").await?;
        if password != confirm {
            println!("Passwords do not match");
            return Ok(());
        }

        match self.sessions.register(&email, &password) {
            Ok(_) => {
                self.config.last_email = Some(email);
                println!("Account created. {}", self.status_line());
            }
            Err(e) => println!("{}", e),
        }
        Ok(())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Type `text` into the search box one keystroke at a time, then wait
    /// for the debounced request to settle.
    async fn run_search(&self, text: &str) {
        if text.trim().is_empty() {
            self.search.on_query_changed("");
            println!("Type something to search for.");
            return;
        }
        let mut typed = String::new();
        for c in text.chars() {
            typed.push(c);
            self.search.on_query_changed(&typed);
            tokio::time::sleep(Duration::from_millis(KEYSTROKE_INTERVAL_MS)).await;
        }

        let settle = self.config.search_debounce() + Duration::from_millis(SEARCH_POLL_MS);
        tokio::time::sleep(settle).await;
        let deadline = tokio::time::Instant::now() + self.config.request_timeout();
        while self.search.snapshot().is_loading && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(SEARCH_POLL_MS)).await;
        }

        let view = self.search.snapshot();
        if view.results.is_empty() {
            println!("No books found for \"{}\"", view.query);
        } else {
            for book in &view.results {
                print_summary(book);
            }
        }
        // Output moved on; treat it like a click outside the panel.
        self.search.on_pointer_down(false);
    }

    async fn fetch_book(&self, id: &str) -> Option<Book> {
        match self.api.fetch_book(id).await {
            Ok(book) => Some(book),
            Err(ApiError::NotFound(_)) => {
                println!("No book data found");
                None
            }
            Err(e) => {
                println!("Error: {}", e);
                None
            }
        }
    }

    async fn show_book(&self, id: &str) {
        let Some(book) = self.fetch_book(id).await else {
            return;
        };
        println!("{} - {}", book.title, book.author);
        if !book.sub_title.is_empty() {
            println!("  {}", book.sub_title);
        }
        println!(
            "  Rating {} ({} ratings) | {} key ideas | {}",
            format_rating(book.average_rating),
            book.total_rating,
            book.key_ideas,
            book.kind
        );
        if book.subscription_required {
            println!("  Premium");
        }
        if !book.tags.is_empty() {
            println!("  Tags: {}", book.tags.join(", "));
        }
        if !book.book_description.is_empty() {
            println!("\n{}", book.book_description);
        }
    }

    async fn open_book(&mut self, id: &str) {
        let Some(book) = self.fetch_book(id).await else {
            return;
        };
        match check_access(&book, self.sessions.session()) {
            Access::Granted => {
                println!("{} - {}\n", book.title, book.author);
                println!("{}", book.summary);
                if book.has_audio() {
                    self.player.load(&book.audio_link);
                    println!("\nAudio loaded. Use 'play' to start.");
                }
            }
            Access::LoginRequired => {
                println!("This book requires a subscription. Log in, then choose a plan with 'upgrade'.")
            }
            Access::UpgradeRequired => {
                println!("This book requires a subscription. Choose a plan with 'upgrade'.")
            }
        }
    }

    async fn show_shelves(&self, only: Option<BookStatus>) {
        for (status, result) in fetch_shelves(self.api.as_ref()).await {
            if only.is_some_and(|s| s != status) {
                continue;
            }
            println!("== {}", status.title());
            match result {
                Ok(books) if books.is_empty() => println!("  (empty)"),
                Ok(books) => books.iter().for_each(|b| print_summary(&b.to_summary())),
                Err(e) => println!("  Failed to load: {}", e),
            }
        }
    }

    // =========================================================================
    // Checkout / Player
    // =========================================================================

    async fn upgrade(&mut self, cycle: BillingCycle, prompt: &mut Prompt) -> Result<()> {
        if self.sessions.session().is_premium() {
            println!("You already have Premium.");
            return Ok(());
        }
        println!(
            "Premium {} - {} - {}-day free trial included",
            cycle,
            cycle.blurb(),
            TRIAL_DAYS
        );

        let card = CardDetails {
            number: format_card_number(&prompt.ask("Card number: ").await?),
            name: prompt.ask("Name on card: ").await?,
            expiry: format_expiry(&prompt.ask("Expiry (MM/YY): ").await?),
            cvv: format_cvv(&prompt.ask("CVV: ").await?),
        };

        println!("Processing...");
        match checkout(&mut self.sessions, &card, cycle, self.config.checkout_delay()).await {
            Ok(receipt) => println!(
                "Charged card ending {} for {}. {}",
                receipt.card_last4,
                receipt.cycle,
                self.status_line()
            ),
            Err(e) => println!("{}", e),
        }
        Ok(())
    }

    fn toggle_play(&mut self) {
        if self.player.source().is_none() {
            println!("Nothing loaded. Open a book with audio first.");
            return;
        }
        let state = if self.player.toggle_play() { "Playing" } else { "Paused" };
        println!("{} {}", state, self.player.time_label());
    }
}

fn print_summary(book: &BookSummary) {
    println!(
        "  {:<12} {:<width$} {}",
        book.id,
        truncate_string(&book.title, TITLE_WIDTH),
        book.author,
        width = TITLE_WIDTH
    );
}
