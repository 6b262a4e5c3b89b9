use std::fs::File;
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use fieldmark::app::{App, run_app_with_event_source};
use fieldmark::event_source::TerminalEventSource;
use fieldmark::fixture::{Fixture, load_fixture};
use fieldmark::panic_handler;
use fieldmark::renderer::{BlankRenderer, DocumentRenderer, DocumentSource};
use fieldmark::session::{ViewerConfig, ViewerSession};
use fieldmark::settings;

#[derive(Parser, Debug)]
#[command(version, about = "Show where extracted fields come from in a PDF")]
struct Args {
    /// Fixture JSON with highlights and fields
    fixture: PathBuf,

    /// PDF to display; defaults to the fixture's `document`
    #[arg(short, long)]
    document: Option<PathBuf>,

    /// Number of blank pages to show when no PDF is given
    #[arg(long)]
    pages: Option<usize>,

    /// Validate the fixture, print the report and exit
    #[arg(long)]
    check: bool,

    /// Log level for fieldmark.log (overrides config.yaml)
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    settings::load_settings();

    let level_name = args.log_level.clone().unwrap_or_else(settings::get_log_level);
    let level = LevelFilter::from_str(&level_name).unwrap_or(LevelFilter::Info);
    WriteLogger::init(level, Config::default(), File::create("fieldmark.log")?)?;
    info!("Starting fieldmark");

    let fixture = load_fixture(&args.fixture)?;

    if args.check {
        let report = fixture.validate();
        print!("{report}");
        return Ok(if report.is_clean() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let (renderer, source) = choose_document(&args, &fixture)?;
    let session = ViewerSession::new(
        fixture.highlights,
        fixture.fields,
        ViewerConfig::from_settings(),
    )
    .with_title(fixture.title);
    let mut app = App::new(session).with_document(renderer, source);

    panic_handler::initialize_panic_handler();
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut event_source = TerminalEventSource;
    let res = run_app_with_event_source(&mut terminal, &mut app, &mut event_source);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {err:?}");
        println!("{err:?}");
        return Ok(ExitCode::FAILURE);
    }

    info!("Shutting down fieldmark");
    Ok(ExitCode::SUCCESS)
}

/// Pick the backend: MuPDF when there is a document to open, otherwise
/// blank pages enough to hold every highlight.
fn choose_document(
    args: &Args,
    fixture: &Fixture,
) -> Result<(Box<dyn DocumentRenderer>, DocumentSource)> {
    let document = args
        .document
        .clone()
        .or_else(|| fixture.document_path(&args.fixture));

    if let Some(path) = document {
        #[cfg(feature = "pdf")]
        {
            let renderer = fieldmark::renderer::MupdfRenderer::new();
            return Ok((Box::new(renderer), DocumentSource::Path(path)));
        }
        #[cfg(not(feature = "pdf"))]
        log::warn!("Built without PDF support, showing blank pages instead of {path:?}");
    }

    let pages = match args.pages {
        Some(0) => anyhow::bail!("--pages must be at least 1"),
        Some(pages) => pages,
        None => fixture
            .highlights
            .iter()
            .map(|h| h.page)
            .max()
            .unwrap_or(1)
            .max(1),
    };
    let name = args
        .fixture
        .file_stem()
        .map(Path::new)
        .map(Path::to_path_buf)
        .context("fixture path has no file name")?;
    Ok((Box::new(BlankRenderer::new(pages)), DocumentSource::Path(name)))
}
