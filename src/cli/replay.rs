//! Replay a recorded pointer trace against the tooltip controller.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{info, warn};

use recordtip::config::Settings;
use recordtip::details::DetailSource;
use recordtip::geometry::{Point, Viewport};
use recordtip::registry::{CellId, CellRegistry};
use recordtip::tooltip::{estimated_size, RecordingSurface, SurfaceEvent, TooltipController};
use recordtip::{HoverTarget, RecordId};

/// One timed pointer event.
#[derive(Debug, Clone, Deserialize)]
pub struct TraceStep {
    /// Offset from the start of the replay.
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: TraceEvent,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    /// Enter either a record directly or a table cell resolved through the page.
    Enter {
        #[serde(default)]
        record: Option<RecordId>,
        #[serde(default)]
        cell: Option<[usize; 2]>,
        x: f64,
        y: f64,
    },
    Move {
        x: f64,
        y: f64,
    },
    Leave,
    SurfaceEnter,
    SurfaceLeave,
}

pub fn load_trace(path: &Path) -> anyhow::Result<Vec<TraceStep>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading trace {}", path.display()))?;
    parse_trace(&raw)
}

fn parse_trace(raw: &str) -> anyhow::Result<Vec<TraceStep>> {
    let mut steps: Vec<TraceStep> = serde_json::from_str(raw).context("parsing trace")?;
    steps.sort_by_key(|step| step.at_ms);
    Ok(steps)
}

pub async fn run(
    settings: &Settings,
    source: Arc<dyn DetailSource>,
    registry: CellRegistry,
    viewport: Viewport,
    steps: &[TraceStep],
    settle_ms: u64,
) -> anyhow::Result<()> {
    let surface = RecordingSurface::with_sizer(viewport, estimated_size);
    let controller =
        TooltipController::new(&settings.tooltip, source, surface.clone()).with_registry(registry);
    let (handle, task) = controller.spawn();

    let start = Instant::now();
    for step in steps {
        tokio::time::sleep_until(start + Duration::from_millis(step.at_ms)).await;

        match &step.event {
            TraceEvent::Enter { record, cell, x, y } => {
                let at = Point::new(*x, *y);
                match (record, cell) {
                    (Some(record), _) => handle.enter(HoverTarget::new(record.clone(), at)),
                    (None, Some([row, column])) => {
                        if !handle.cell_enter(CellId::new(*row, *column), at) {
                            warn!("{}ms: cell ({}, {}) has no record, ignored", step.at_ms, row, column);
                        }
                    }
                    (None, None) => warn!("{}ms: enter without record or cell, ignored", step.at_ms),
                }
            }
            TraceEvent::Move { x, y } => handle.pointer_move(Point::new(*x, *y)),
            TraceEvent::Leave => handle.leave(),
            TraceEvent::SurfaceEnter => handle.surface_enter(),
            TraceEvent::SurfaceLeave => handle.surface_leave(),
        }
    }

    tokio::time::sleep(Duration::from_millis(settle_ms)).await;
    drop(handle);
    task.await.context("tooltip controller task failed")?;

    let log = surface.snapshot();
    info!(
        "Replayed {} steps: {} shows, {} moves",
        steps.len(),
        log.shows(),
        log.moves()
    );

    for event in &log.events {
        println!("{}", describe(event));
    }
    println!(
        "final: {}",
        if log.visible { "visible" } else { "hidden" }
    );
    Ok(())
}

fn describe(event: &SurfaceEvent) -> String {
    match event {
        SurfaceEvent::Content(html) => format!("content  {}", summarize(html)),
        SurfaceEvent::Shown(r) => format!(
            "show     ({:.0}, {:.0}) {:.0}x{:.0}",
            r.x, r.y, r.width, r.height
        ),
        SurfaceEvent::Moved(r) => format!(
            "move     ({:.0}, {:.0}) {:.0}x{:.0}",
            r.x, r.y, r.width, r.height
        ),
        SurfaceEvent::Hidden => "hide".to_string(),
    }
}

/// Text of an HTML fragment collapsed to one short line.
fn summarize(html: &str) -> String {
    let fragment = scraper::Html::parse_fragment(html);
    let text = fragment
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    if text.chars().count() > 72 {
        let cut: String = text.chars().take(72).collect();
        format!("{}…", cut)
    } else {
        text
    }
}
