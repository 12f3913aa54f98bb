//! End-to-end tooltip behaviour on a running controller.
//!
//! Time is paused, so sleeps in these tests advance the clock instantly and
//! the controller's timers fire in deadline order.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use recordtip::details::{DetailSource, FixtureEntry};
use recordtip::geometry::{Point, Rect, Size, Viewport};
use recordtip::registry::{CellId, CellRegistry, TableRow};
use recordtip::tooltip::{estimated_size, RecordingSurface, SurfaceEvent, TooltipController};
use recordtip::{
    ControllerHandle, DetailError, HoverTarget, RecordDetails, RecordId, StaticDetailSource,
    TooltipConfig,
};

const TOOLTIP: Size = Size::new(350.0, 200.0);

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn named(name: &str) -> RecordDetails {
    RecordDetails {
        mssql_sxclass_name: Some(name.to_string()),
        object_count: Some("3".to_string()),
        ..Default::default()
    }
}

type Running = (ControllerHandle, RecordingSurface, tokio::task::JoinHandle<RecordingSurface>);

fn start(source: StaticDetailSource, registry: CellRegistry) -> Running {
    let surface = RecordingSurface::new(Viewport::new(1024.0, 768.0), TOOLTIP);
    start_on(surface, Arc::new(source), registry)
}

fn start_on(
    surface: RecordingSurface,
    source: Arc<dyn DetailSource>,
    registry: CellRegistry,
) -> Running {
    let controller = TooltipController::new(&TooltipConfig::default(), source, surface.clone())
        .with_registry(registry);
    let (handle, task) = controller.spawn();
    (handle, surface, task)
}

/// Source whose lookups blow up.
struct PanickingSource;

#[async_trait]
impl DetailSource for PanickingSource {
    async fn fetch(&self, id: &RecordId) -> Result<RecordDetails, DetailError> {
        panic!("lookup of record {id} crashed");
    }
}

fn loading_renders(surface: &RecordingSurface) -> usize {
    surface
        .snapshot()
        .events
        .iter()
        .filter(|e| matches!(e, SurfaceEvent::Content(html) if html.contains("Загрузка данных")))
        .count()
}

fn ids(list: &[&str]) -> Vec<RecordId> {
    list.iter().map(|id| RecordId::from(*id)).collect()
}

fn hover(id: &str, x: f64, y: f64) -> HoverTarget {
    HoverTarget::new(id, Point::new(x, y))
}

// ============================================================================
// Showing
// ============================================================================

#[tokio::test(start_paused = true)]
async fn hover_shows_loading_then_details_near_the_pointer() {
    let source = StaticDetailSource::new()
        .with_latency(ms(50))
        .with_record("42", FixtureEntry::details(named("Foo")));
    let (handle, surface, _task) = start(source.clone(), CellRegistry::default());

    handle.enter(hover("42", 800.0, 700.0));
    tokio::time::sleep(ms(200)).await;
    let log = surface.snapshot();
    assert!(log.events.is_empty());
    assert!(source.requests().await.is_empty());

    tokio::time::sleep(ms(120)).await;
    let log = surface.snapshot();
    assert!(log.visible);
    assert!(log.html.contains("Загрузка данных"));
    // Shifted left off the right edge and flipped above the pointer.
    assert_eq!(log.rect, Some(Rect::new(664.0, 490.0, 350.0, 200.0)));

    tokio::time::sleep(ms(100)).await;
    let log = surface.snapshot();
    assert!(log.html.contains("Foo — Детальная информация"));
    assert!(log.html.contains(r#"<div class="record-tooltip-value">Да</div>"#));
    assert_eq!(log.shows(), 1);
    assert_eq!(log.moves(), 0);
    assert_eq!(source.requests().await, ids(&["42"]));
}

#[tokio::test(start_paused = true)]
async fn quick_pass_never_shows_or_fetches() {
    let source = StaticDetailSource::new().with_record("42", FixtureEntry::details(named("Foo")));
    let (handle, surface, _task) = start(source.clone(), CellRegistry::default());

    handle.enter(hover("42", 100.0, 100.0));
    tokio::time::sleep(ms(100)).await;
    handle.leave();
    tokio::time::sleep(ms(1000)).await;

    assert!(surface.snapshot().events.is_empty());
    assert!(source.requests().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn reentering_the_shown_record_does_not_refetch() {
    let source = StaticDetailSource::new().with_record("42", FixtureEntry::details(named("Foo")));
    let (handle, surface, _task) = start(source.clone(), CellRegistry::default());

    handle.enter(hover("42", 100.0, 100.0));
    tokio::time::sleep(ms(400)).await;
    handle.leave();
    tokio::time::sleep(ms(100)).await;
    handle.enter(hover("42", 120.0, 100.0));
    tokio::time::sleep(ms(1000)).await;

    let log = surface.snapshot();
    assert!(log.visible);
    assert_eq!(log.shows(), 1);
    assert_eq!(source.requests().await, ids(&["42"]));
}

#[tokio::test(start_paused = true)]
async fn brushing_a_neighbouring_row_keeps_the_shown_record() {
    let source = StaticDetailSource::new()
        .with_record("42", FixtureEntry::details(named("Foo")))
        .with_record("7", FixtureEntry::details(named("Bar")));
    let (handle, surface, _task) = start(source.clone(), CellRegistry::default());

    handle.enter(hover("42", 100.0, 100.0));
    tokio::time::sleep(ms(400)).await;

    // Cross row 7 and come back before its show delay ends.
    handle.leave();
    handle.enter(hover("7", 100.0, 130.0));
    tokio::time::sleep(ms(100)).await;
    handle.leave();
    handle.enter(hover("42", 100.0, 100.0));
    tokio::time::sleep(ms(1000)).await;

    let log = surface.snapshot();
    assert!(log.visible);
    assert!(log.html.contains("Foo — Детальная информация"));
    assert_eq!(log.shows(), 1);
    assert_eq!(loading_renders(&surface), 1);
    assert_eq!(source.requests().await, ids(&["42"]));
}

// ============================================================================
// Positioning
// ============================================================================

#[tokio::test(start_paused = true)]
async fn content_growth_reflows_inside_the_viewport() {
    let viewport = Viewport::new(1024.0, 768.0);
    let source = StaticDetailSource::new().with_record("42", FixtureEntry::details(named("Foo")));
    let surface = RecordingSurface::with_sizer(viewport, estimated_size);
    let (handle, surface, _task) = start_on(surface, Arc::new(source), CellRegistry::default());

    handle.enter(hover("42", 100.0, 600.0));
    tokio::time::sleep(ms(400)).await;

    let log = surface.snapshot();
    let placed: Vec<Rect> = log
        .events
        .iter()
        .filter_map(|e| match e {
            SurfaceEvent::Shown(rect) | SurfaceEvent::Moved(rect) => Some(*rect),
            _ => None,
        })
        .collect();
    // Small loading box below the pointer, then the taller details flipped above it.
    assert_eq!(
        placed,
        vec![
            Rect::new(105.0, 615.0, 350.0, 60.0),
            Rect::new(105.0, 250.0, 350.0, 340.0),
        ]
    );
    assert_eq!(log.moves(), 1);
    assert!(placed.iter().all(|rect| viewport.bounds().contains_rect(rect)));
}

#[tokio::test(start_paused = true)]
async fn same_size_content_does_not_move() {
    let viewport = Viewport::new(1024.0, 768.0);
    // No fixture: the error box is as small as the loading box.
    let surface = RecordingSurface::with_sizer(viewport, estimated_size);
    let (handle, surface, _task) =
        start_on(surface, Arc::new(StaticDetailSource::new()), CellRegistry::default());

    handle.enter(hover("7", 100.0, 600.0));
    tokio::time::sleep(ms(400)).await;

    let log = surface.snapshot();
    assert!(log.html.contains("record-tooltip-error"));
    assert_eq!(log.shows(), 1);
    assert_eq!(log.moves(), 0);
    assert_eq!(log.rect, Some(Rect::new(105.0, 615.0, 350.0, 60.0)));
}

#[tokio::test(start_paused = true)]
async fn frozen_tooltip_ignores_moves_then_follows() {
    let source = StaticDetailSource::new().with_record("42", FixtureEntry::details(named("Foo")));
    let (handle, surface, _task) = start(source, CellRegistry::default());

    handle.enter(hover("42", 100.0, 100.0));
    tokio::time::sleep(ms(400)).await;
    assert_eq!(surface.snapshot().rect, Some(Rect::new(105.0, 115.0, 350.0, 200.0)));

    handle.pointer_move(Point::new(200.0, 150.0));
    tokio::time::sleep(ms(1000)).await;
    let log = surface.snapshot();
    assert_eq!(log.moves(), 0);
    assert_eq!(log.rect, Some(Rect::new(105.0, 115.0, 350.0, 200.0)));

    // Freeze ends 3s after the tooltip appeared.
    tokio::time::sleep(ms(2000)).await;
    handle.pointer_move(Point::new(200.0, 150.0));
    tokio::time::sleep(ms(10)).await;
    let log = surface.snapshot();
    assert_eq!(log.moves(), 1);
    assert_eq!(log.rect, Some(Rect::new(205.0, 165.0, 350.0, 200.0)));
}

// ============================================================================
// Detail results
// ============================================================================

#[tokio::test(start_paused = true)]
async fn slow_response_for_previous_record_is_discarded() {
    let source = StaticDetailSource::new()
        .with_record("A", FixtureEntry::details(named("Alpha")).with_delay(ms(1000)))
        .with_record("B", FixtureEntry::details(named("Beta")).with_delay(ms(10)));
    let (handle, surface, _task) = start(source.clone(), CellRegistry::default());

    handle.enter(hover("A", 100.0, 100.0));
    tokio::time::sleep(ms(400)).await;
    handle.leave();
    handle.enter(hover("B", 100.0, 140.0));
    tokio::time::sleep(ms(400)).await;
    assert!(surface.snapshot().html.contains("Beta"));

    // A's response lands at 1.3s.
    tokio::time::sleep(ms(1000)).await;
    let log = surface.snapshot();
    assert!(log.visible);
    assert!(log.html.contains("Beta"));
    assert!(!log.events.iter().any(|e| matches!(e, SurfaceEvent::Content(html) if html.contains("Alpha"))));
    assert_eq!(source.requests().await, ids(&["A", "B"]));
}

#[tokio::test(start_paused = true)]
async fn failed_lookup_renders_the_reason() {
    let source = StaticDetailSource::new().with_record("9", FixtureEntry::unreachable());
    let (handle, surface, _task) = start(source, CellRegistry::default());

    handle.enter(hover("7", 100.0, 100.0));
    tokio::time::sleep(ms(400)).await;
    let log = surface.snapshot();
    assert!(log.visible);
    assert!(log.html.contains("record-tooltip-error"));
    assert!(log.html.contains("Запись не найдена"));

    handle.leave();
    tokio::time::sleep(ms(400)).await;
    handle.enter(hover("9", 100.0, 100.0));
    tokio::time::sleep(ms(400)).await;
    assert!(surface.snapshot().html.contains("Не удалось связаться с сервером"));
}

#[tokio::test(start_paused = true)]
async fn crashed_lookup_renders_transport_failure() {
    let surface = RecordingSurface::new(Viewport::new(1024.0, 768.0), TOOLTIP);
    let (handle, surface, task) = start_on(surface, Arc::new(PanickingSource), CellRegistry::default());

    handle.enter(hover("42", 100.0, 100.0));
    tokio::time::sleep(ms(400)).await;

    let log = surface.snapshot();
    assert!(log.visible);
    assert!(log.html.contains("Не удалось связаться с сервером"));

    // The controller survives the crash.
    drop(handle);
    assert!(task.await.is_ok());
}

// ============================================================================
// Hiding
// ============================================================================

#[tokio::test(start_paused = true)]
async fn hovering_the_tooltip_keeps_it_open() {
    let source = StaticDetailSource::new().with_record("42", FixtureEntry::details(named("Foo")));
    let (handle, surface, _task) = start(source.clone(), CellRegistry::default());

    handle.enter(hover("42", 100.0, 100.0));
    tokio::time::sleep(ms(400)).await;
    handle.leave();
    tokio::time::sleep(ms(100)).await;
    handle.surface_enter();
    tokio::time::sleep(ms(2000)).await;
    assert!(surface.snapshot().visible);

    handle.surface_leave();
    tokio::time::sleep(ms(400)).await;
    let log = surface.snapshot();
    assert!(!log.visible);
    assert_eq!(log.events.last(), Some(&SurfaceEvent::Hidden));

    // Hidden tooltip forgets its record: hovering again waits and refetches.
    handle.enter(hover("42", 100.0, 100.0));
    tokio::time::sleep(ms(100)).await;
    assert_eq!(surface.snapshot().shows(), 1);
    tokio::time::sleep(ms(300)).await;
    assert_eq!(surface.snapshot().shows(), 2);
    assert_eq!(source.requests().await, ids(&["42", "42"]));
}

#[tokio::test(start_paused = true)]
async fn controller_stops_when_handles_are_dropped() {
    let (handle, _surface, task) = start(StaticDetailSource::new(), CellRegistry::default());
    handle.enter(hover("42", 100.0, 100.0));
    drop(handle);

    let surface = task.await.unwrap();
    assert!(surface.snapshot().events.is_empty());
}

// ============================================================================
// Cell bindings
// ============================================================================

#[tokio::test(start_paused = true)]
async fn unregistered_cells_are_ignored() {
    let registry = CellRegistry::from_rows(
        vec![TableRow {
            record_id: Some("42".into()),
            cells: 5,
        }],
        1..4,
    );
    let source = StaticDetailSource::new().with_record("42", FixtureEntry::details(named("Foo")));
    let (handle, surface, _task) = start(source.clone(), registry);

    assert!(!handle.cell_enter(CellId::new(0, 0), Point::new(10.0, 10.0)));
    assert!(!handle.cell_enter(CellId::new(0, 4), Point::new(10.0, 10.0)));
    tokio::time::sleep(ms(1000)).await;
    assert!(surface.snapshot().events.is_empty());

    assert!(handle.cell_enter(CellId::new(0, 2), Point::new(10.0, 10.0)));
    tokio::time::sleep(ms(400)).await;
    assert!(surface.snapshot().visible);
    assert!(handle.cell_leave(CellId::new(0, 2)));
    tokio::time::sleep(ms(400)).await;
    assert!(!surface.snapshot().visible);
    assert_eq!(source.requests().await, ids(&["42"]));
}

#[tokio::test(start_paused = true)]
async fn fixtures_load_from_a_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("fixtures.json");
    std::fs::write(
        &path,
        r#"{"42": {"details": {"mssql_sxclass_name": "Foo", "object_count": 0}}}"#,
    )
    .unwrap();

    let source = StaticDetailSource::from_json_file(&path).unwrap();
    let (handle, surface, _task) = start(source, CellRegistry::default());
    handle.enter(hover("42", 100.0, 100.0));
    tokio::time::sleep(ms(400)).await;

    let html = surface.snapshot().html;
    assert!(html.contains("Foo — Детальная информация"));
    assert!(html.contains(r#"<div class="record-tooltip-value">Нет</div>"#));
}
