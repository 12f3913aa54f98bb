//! Command-line interface.

mod replay;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::warn;

use recordtip::config::{load_settings, Settings};
use recordtip::details::{DetailSource, HttpDetailSource, StaticDetailSource};
use recordtip::geometry::Viewport;
use recordtip::registry::CellRegistry;
use recordtip::templates;
use recordtip::RecordId;

#[derive(Parser, Debug)]
#[command(name = "recordtip", version, about = "Record-detail hover tooltip engine")]
pub struct Cli {
    /// Base URL of the classification web application (overrides config)
    #[arg(long, global = true, env = "RECORDTIP_ENDPOINT")]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the record bindings found in a saved results page
    Scan {
        /// HTML file of the analysis results page
        page: PathBuf,
    },
    /// Fetch one record and print the tooltip HTML
    Details {
        /// Record id
        id: String,
        /// Serve details from a fixtures file instead of the backend
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },
    /// Drive the tooltip from a timed pointer trace and print what it did
    Replay {
        /// JSON array of trace steps
        trace: PathBuf,
        /// Results page used to resolve `cell` targets
        #[arg(long)]
        page: Option<PathBuf>,
        /// Serve details from a fixtures file instead of the backend
        #[arg(long)]
        fixtures: Option<PathBuf>,
        /// Viewport as WIDTHxHEIGHT
        #[arg(long, default_value = "1024x768", value_parser = parse_viewport)]
        viewport: Viewport,
        /// Extra time to keep running after the last step, in milliseconds
        #[arg(long, default_value_t = 1000)]
        settle_ms: u64,
    },
    /// Print the tooltip stylesheet
    Styles,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut settings = load_settings().await;
        if let Some(endpoint) = self.endpoint {
            settings.endpoint = endpoint;
        }

        match self.command {
            Commands::Scan { page } => cmd_scan(&settings, &page),
            Commands::Details { id, fixtures } => {
                cmd_details(&settings, &id, fixtures.as_deref()).await
            }
            Commands::Replay {
                trace,
                page,
                fixtures,
                viewport,
                settle_ms,
            } => {
                let registry = match page {
                    Some(ref page) => load_registry(&settings, page)?,
                    None => CellRegistry::default(),
                };
                let source = detail_source(&settings, fixtures.as_deref())?;
                let steps = replay::load_trace(&trace)?;
                replay::run(&settings, source, registry, viewport, &steps, settle_ms).await
            }
            Commands::Styles => {
                println!("{}", templates::TOOLTIP_CSS.trim());
                Ok(())
            }
        }
    }
}

fn cmd_scan(settings: &Settings, page: &Path) -> anyhow::Result<()> {
    let registry = load_registry(settings, page)?;
    let rows = registry.rows();

    println!(
        "{} rows, {} cells bound (columns {}..{})",
        rows.len(),
        registry.len(),
        settings.eligible_columns.start,
        settings.eligible_columns.end
    );
    for (row, id) in rows {
        println!("  row {:>4}  record {}", row + 1, id);
    }
    Ok(())
}

async fn cmd_details(settings: &Settings, id: &str, fixtures: Option<&Path>) -> anyhow::Result<()> {
    let source = detail_source(settings, fixtures)?;
    let id = RecordId::from(id);

    match source.fetch(&id).await {
        Ok(details) => {
            println!("{}", templates::record_details(&details).trim());
            Ok(())
        }
        Err(e) => {
            warn!("Failed to fetch record {}: {}", id, e);
            println!("{}", templates::error(&e.reason()).trim());
            Err(e.into())
        }
    }
}

fn load_registry(settings: &Settings, page: &Path) -> anyhow::Result<CellRegistry> {
    let html = std::fs::read_to_string(page)
        .with_context(|| format!("reading results page {}", page.display()))?;
    CellRegistry::scan_html(&html, settings.eligible_columns.clone())
}

fn detail_source(
    settings: &Settings,
    fixtures: Option<&Path>,
) -> anyhow::Result<Arc<dyn DetailSource>> {
    Ok(match fixtures {
        Some(path) => Arc::new(
            StaticDetailSource::from_json_file(path)
                .with_context(|| format!("loading fixtures {}", path.display()))?,
        ),
        None => Arc::new(HttpDetailSource::from_settings(settings)?),
    })
}

fn parse_viewport(s: &str) -> Result<Viewport, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {:?}", s))?;
    let width: f64 = w.trim().parse().map_err(|_| format!("bad width {:?}", w))?;
    let height: f64 = h.trim().parse().map_err(|_| format!("bad height {:?}", h))?;
    if width <= 0.0 || height <= 0.0 {
        return Err("viewport must be non-empty".to_string());
    }
    Ok(Viewport::new(width, height))
}
