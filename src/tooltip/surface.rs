//! The element the tooltip is drawn into.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::geometry::{Rect, Size, Viewport};

/// Render target owned by the controller.
///
/// Implementations wrap whatever actually displays the tooltip (a DOM node,
/// a terminal overlay, a recording for tests). Styling is the
/// implementation's business; the controller only needs the rendered size
/// and the viewport to keep the tooltip on screen.
pub trait TooltipSurface: Send {
    /// Visible part of the page.
    fn viewport(&self) -> Viewport;

    /// Current rendered size, or `None` if it has not been laid out yet.
    fn measure(&self) -> Option<Size>;

    /// Replace the content with an HTML fragment.
    fn set_content(&mut self, html: &str);

    /// Place at `rect` and make visible.
    fn show_at(&mut self, rect: Rect);

    /// Move while visible.
    fn move_to(&mut self, rect: Rect);

    fn hide(&mut self);
}

/// One change applied to a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Content(String),
    Shown(Rect),
    Moved(Rect),
    Hidden,
}

/// Everything a [`RecordingSurface`] has been told so far.
#[derive(Debug, Clone, Default)]
pub struct SurfaceLog {
    pub visible: bool,
    pub rect: Option<Rect>,
    pub html: String,
    pub events: Vec<SurfaceEvent>,
}

impl SurfaceLog {
    pub fn shows(&self) -> usize {
        self.count(|e| matches!(e, SurfaceEvent::Shown(_)))
    }

    pub fn moves(&self) -> usize {
        self.count(|e| matches!(e, SurfaceEvent::Moved(_)))
    }

    fn count(&self, pred: impl Fn(&SurfaceEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

type Sizer = dyn Fn(&str) -> Size + Send + Sync;

/// Headless surface that records every change.
///
/// Clones share the same log, so a caller can keep one clone to inspect
/// while the controller owns another. Rendered size is derived from the
/// content by a sizing function.
#[derive(Clone)]
pub struct RecordingSurface {
    viewport: Viewport,
    sizer: Arc<Sizer>,
    log: Arc<Mutex<SurfaceLog>>,
}

impl std::fmt::Debug for RecordingSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingSurface")
            .field("viewport", &self.viewport)
            .field("log", &*self.log())
            .finish()
    }
}

impl RecordingSurface {
    /// Surface with a fixed rendered size.
    pub fn new(viewport: Viewport, size: Size) -> Self {
        Self::with_sizer(viewport, move |_| size)
    }

    /// Surface whose size depends on its content.
    pub fn with_sizer(
        viewport: Viewport,
        sizer: impl Fn(&str) -> Size + Send + Sync + 'static,
    ) -> Self {
        Self {
            viewport,
            sizer: Arc::new(sizer),
            log: Arc::new(Mutex::new(SurfaceLog::default())),
        }
    }

    pub fn snapshot(&self) -> SurfaceLog {
        self.log().clone()
    }

    fn log(&self) -> MutexGuard<'_, SurfaceLog> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TooltipSurface for RecordingSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn measure(&self) -> Option<Size> {
        let log = self.log();
        if log.html.is_empty() {
            return None;
        }
        Some((self.sizer)(&log.html))
    }

    fn set_content(&mut self, html: &str) {
        debug!("Tooltip content replaced ({} bytes)", html.len());
        let mut log = self.log();
        log.html = html.to_string();
        log.events.push(SurfaceEvent::Content(html.to_string()));
    }

    fn show_at(&mut self, rect: Rect) {
        info!(
            "Tooltip shown at ({:.0}, {:.0}) size {:.0}x{:.0}",
            rect.x, rect.y, rect.width, rect.height
        );
        let mut log = self.log();
        log.visible = true;
        log.rect = Some(rect);
        log.events.push(SurfaceEvent::Shown(rect));
    }

    fn move_to(&mut self, rect: Rect) {
        debug!("Tooltip moved to ({:.0}, {:.0})", rect.x, rect.y);
        let mut log = self.log();
        log.rect = Some(rect);
        log.events.push(SurfaceEvent::Moved(rect));
    }

    fn hide(&mut self) {
        info!("Tooltip hidden");
        let mut log = self.log();
        log.visible = false;
        log.events.push(SurfaceEvent::Hidden);
    }
}

/// Rough rendered size of tooltip HTML: fixed width, one line per row.
pub fn estimated_size(html: &str) -> Size {
    let rows = html.matches(r#"class="record-tooltip-row""#).count();
    let header = if html.contains("record-tooltip-header") { 40.0 } else { 0.0 };
    Size::new(350.0, 30.0 + header + 30.0 * rows.max(1) as f64)
}
