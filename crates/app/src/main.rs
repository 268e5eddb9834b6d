use std::fs;
use std::io::{self, IsTerminal as _};
use std::path::PathBuf;

use anyhow::Context as _;
use directories::ProjectDirs;
use libris_application::HistoryRecommender;
use libris_catalog::{LocalLibrary, OpenLibrary};
use libris_core::{CatalogProvider, Settings};
use libris_storage::Storage;
use libris_ui::{Console, Ui};
use rand::SeedableRng as _;
use rand::rngs::StdRng;

mod logging;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let data_dir = data_dir()?;
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("create data dir {}", data_dir.display()))?;
    let _log_guard = logging::init(&data_dir);

    let db_path = data_dir.join("libris.db");
    let mut storage = Storage::open(&db_path)?;
    let mut settings = storage.load_settings()?;
    apply_env_overrides(&mut settings);
    tracing::info!(
        catalog = %settings.catalog_url,
        page_size = settings.page_size,
        library_file = ?settings.library_file,
        "starting"
    );

    let local = load_library(&settings);
    let online;
    let catalog: &dyn CatalogProvider = if settings.is_offline() {
        local
            .as_ref()
            .context("the offline catalog needs a readable library file (LIBRIS_LIBRARY_FILE)")?
    } else {
        online = OpenLibrary::new(&settings.catalog_url)?;
        &online
    };

    let stdout = io::stdout();
    let color = stdout.is_terminal();
    let console = Console::new(io::stdin().lock(), stdout).with_color(color);
    let mut ui = Ui::new(console, catalog, &mut storage, settings);
    if let Some(library) = local.as_ref() {
        ui = ui.with_library_picks(HistoryRecommender::new(
            library.buckets(),
            StdRng::from_entropy(),
        ));
    }

    let outcome = ui.run()?;
    tracing::info!(exit = ?outcome.exit, "finished");
    Ok(())
}

fn data_dir() -> anyhow::Result<PathBuf> {
    if let Some(dir) = env_value("LIBRIS_DATA_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let project_dirs = ProjectDirs::from("dev", "libris", "libris").context("resolve project dirs")?;
    Ok(project_dirs.data_dir().to_path_buf())
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Environment values win over stored settings for this run only.
fn apply_env_overrides(settings: &mut Settings) {
    if let Some(url) = env_value("LIBRIS_CATALOG_URL") {
        settings.catalog_url = url;
    }
    if let Some(path) = env_value("LIBRIS_LIBRARY_FILE") {
        settings.library_file = Some(path);
    }
    settings.normalize();
}

fn load_library(settings: &Settings) -> Option<LocalLibrary> {
    let path = settings.library_file.as_deref()?;
    match LocalLibrary::load(path) {
        Ok(library) => Some(library),
        Err(err) => {
            tracing::warn!("library file unavailable: {err:#}");
            eprintln!("warning: {err:#}");
            None
        }
    }
}
