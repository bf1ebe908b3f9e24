use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use shardwatch::app::{cluster_info, write_export};
use shardwatch::data::{parse_stats, History, ViewModel};
use shardwatch::{events, ui};
use shardwatch::{App, ClusterStats, CoordinatorClient, DataSource, FileSource, HttpSource};
use shardwatch::{Overview, Settings};

/// Cluster name used for a replayed file when none is given.
const DEFAULT_FILE_CLUSTER: &str = "local";

#[derive(Parser, Debug)]
#[command(name = "shardwatch")]
#[command(about = "Operator TUI for sharded key-value clusters behind a coordinator dashboard")]
struct Args {
    /// Coordinator dashboard address (host:port or URL)
    #[arg(short = 'C', long)]
    coordinator: Option<String>,

    /// Cluster to open at startup
    #[arg(short, long)]
    cluster: Option<String>,

    /// Stats refresh interval in seconds
    #[arg(short, long)]
    refresh: Option<u64>,

    /// Settings file (TOML, YAML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replay a saved stats JSON file instead of connecting
    #[arg(short, long, conflicts_with = "coordinator")]
    file: Option<PathBuf>,

    /// Export the cluster view to a JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (e.g. "debug", "shardwatch=trace")
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    /// Command-line flags win over file and environment settings.
    fn apply(&self, settings: &mut Settings) {
        if let Some(coordinator) = &self.coordinator {
            settings.coordinator = coordinator.clone();
        }
        if let Some(cluster) = &self.cluster {
            settings.cluster = Some(cluster.clone());
        }
        if let Some(refresh) = self.refresh {
            settings.refresh_interval = refresh;
        }
        if let Some(log_file) = &self.log_file {
            settings.log_file = Some(log_file.clone());
        }
        if let Some(log_level) = &self.log_level {
            settings.log_level = log_level.clone();
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    args.apply(&mut settings);
    init_logging(&settings)?;

    if let Some(export_path) = &args.export {
        return match &args.file {
            Some(path) => export_from_file(path, &settings, export_path),
            None => export_from_coordinator(&settings, export_path),
        };
    }

    match &args.file {
        Some(path) => run_with_file(path, &settings),
        None => run_with_coordinator(&settings),
    }
}

/// Send tracing output to the configured file. The terminal belongs to the TUI.
fn init_logging(settings: &Settings) -> Result<()> {
    let Some(path) = &settings.log_file else {
        return Ok(());
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .context("invalid log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "shardwatch starting");
    Ok(())
}

fn build_client(settings: &Settings) -> Result<CoordinatorClient> {
    CoordinatorClient::builder()
        .endpoint(settings.coordinator.as_str())
        .timeout(settings.request_timeout())
        .build()
        .with_context(|| format!("invalid coordinator address {}", settings.coordinator))
}

/// Run against a live coordinator
fn run_with_coordinator(settings: &Settings) -> Result<()> {
    let client = build_client(settings)?;

    // The runtime drives request tasks while the UI loop owns the main thread
    let rt = Runtime::new()?;
    let source = Box::new(HttpSource::new(client, rt.handle().clone()));

    run_tui(source, settings.cluster.as_deref(), settings.refresh())
}

/// Run against a saved stats file
fn run_with_file(path: &Path, settings: &Settings) -> Result<()> {
    let cluster = settings.cluster.as_deref().unwrap_or(DEFAULT_FILE_CLUSTER);
    let source = Box::new(FileSource::new(path, cluster));
    run_tui(source, Some(cluster), settings.refresh())
}

/// Run the TUI with the given data source
fn run_tui(source: Box<dyn DataSource>, cluster: Option<&str>, refresh: Duration) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let mut app = App::new(source);
    match cluster {
        Some(name) => {
            app.request_clusters();
            app.select_cluster(name);
        }
        None => app.open_cluster_picker(),
    }

    let result = run_app(&mut terminal, &mut app, refresh);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    refresh: Duration,
) -> Result<()> {
    let mut last_refresh = Instant::now();

    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        app.process_events();

        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let top = (area.height / 2).saturating_sub(2);
                let centered = ratatui::layout::Rect::new(0, top, area.width, 5.min(area.height));
                frame.render_widget(paragraph, centered);
                return;
            }

            ui::draw(frame, app);
        })?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                // Content starts after header (1) + tabs (1) + border (1) + table header (1)
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse, 3),
                _ => {}
            }
        }

        if last_refresh.elapsed() >= refresh {
            app.refresh();
            last_refresh = Instant::now();
        }
    }

    Ok(())
}

/// Fetch overview and stats once and write the export
fn export_from_coordinator(settings: &Settings, export_path: &Path) -> Result<()> {
    let cluster = settings
        .cluster
        .as_deref()
        .context("--export needs a cluster (--cluster or settings)")?;
    let client = build_client(settings)?;
    let rt = Runtime::new()?;

    let (overview, stats) = rt.block_on(async {
        let overview = client.overview(cluster).await?;
        let stats = client.stats(cluster).await?;
        Ok::<_, shardwatch::CoordinatorError>((overview, stats))
    })?;

    write_snapshot(cluster, Some(&overview), &stats, export_path)
}

fn export_from_file(path: &Path, settings: &Settings, export_path: &Path) -> Result<()> {
    let cluster = settings.cluster.as_deref().unwrap_or(DEFAULT_FILE_CLUSTER);
    let stats = FileSource::new(path, cluster).read_stats()?;
    write_snapshot(cluster, None, &stats, export_path)
}

fn write_snapshot(
    cluster: &str,
    overview: Option<&Overview>,
    stats: &ClusterStats,
    export_path: &Path,
) -> Result<()> {
    let mut view = ViewModel::new(cluster);
    if let Some(overview) = overview {
        view.info = cluster_info(overview);
    }
    view.apply(parse_stats(stats, cluster));

    let mut history = History::new();
    history.record(&view);

    write_export(&view, &history, export_path)?;
    println!("Exported {} to: {}", cluster, export_path.display());
    Ok(())
}
