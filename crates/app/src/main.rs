use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context as _;
use bookconnect_application::AppContext;
use bookconnect_core::Catalog;
use bookconnect_ui::Ui;
use directories::ProjectDirs;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

mod config;

use config::Config;

const LOG_FILE: &str = "bookconnect.log";

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let project_dirs = ProjectDirs::from("dev", "bookconnect", "bookconnect")
        .context("resolve project dirs")?;

    let (config, issue) = Config::load(project_dirs.config_dir());
    init_logging(project_dirs.data_dir(), &config.log_filter())?;
    if let Some(issue) = issue {
        issue.report();
    }

    let (catalog, cover_dir) = load_catalog(config.catalog_path().as_deref())?;
    let ctx = AppContext::new(catalog, config.preferred_theme());

    let mut ui = Ui::new(ctx, cover_dir);
    ui.run()
}

/// The terminal belongs to the UI, so logs go to a file.
fn init_logging(data_dir: &Path, filter: &str) -> anyhow::Result<()> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("create data dir {}", data_dir.display()))?;
    let log_path = data_dir.join(LOG_FILE);
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("open log file {}", log_path.display()))?;

    let subscriber = log_subscriber(filter, Mutex::new(file))?;
    tracing::subscriber::set_global_default(subscriber).context("install log subscriber")?;
    Ok(())
}

fn log_subscriber<W>(
    filter: &str,
    writer: W,
) -> anyhow::Result<impl tracing::Subscriber + Send + Sync + 'static>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_new(filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("build log filter")?;
    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .finish())
}

/// Returns the catalog and the directory relative cover paths resolve against.
fn load_catalog(path: Option<&str>) -> anyhow::Result<(Catalog, Option<PathBuf>)> {
    let Some(path) = path else {
        let catalog = bookconnect_catalog::builtin().context("load builtin catalog")?;
        info!(books = catalog.len(), "builtin catalog loaded");
        return Ok((catalog, None));
    };

    let path = PathBuf::from(path);
    let catalog = bookconnect_catalog::load(&path)
        .with_context(|| format!("load catalog {}", path.display()))?;
    let cover_dir = match path.parent() {
        Some(dir) if dir.as_os_str().is_empty() => Some(PathBuf::from(".")),
        dir => dir.map(Path::to_path_buf),
    };
    info!(path = %path.display(), books = catalog.len(), "catalog loaded");
    Ok((catalog, cover_dir))
}
