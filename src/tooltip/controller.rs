//! Event loop that drives the tooltip.
//!
//! One task owns the [`TooltipMachine`], the surface and all in-flight detail
//! requests. Pointer events arrive through a channel, timers are slept on
//! until the machine's next deadline, and detail results come back through a
//! `JoinSet`. Nothing here runs concurrently with anything else, so the state
//! needs no locking.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::state::{Command, FetchTicket, TooltipMachine, TooltipState};
use super::surface::TooltipSurface;
use crate::config::TooltipConfig;
use crate::details::{DetailError, DetailSource};
use crate::geometry::{Placement, Point, Rect, Size};
use crate::models::{HoverTarget, RecordDetails};
use crate::registry::{CellId, CellRegistry};

/// Input to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    /// Pointer entered a registered cell.
    Enter(HoverTarget),
    /// Pointer moved within a registered cell (viewport coordinates).
    Move(Point),
    /// Pointer left a registered cell.
    Leave,
    /// Pointer entered the tooltip itself.
    SurfaceEnter,
    /// Pointer left the tooltip.
    SurfaceLeave,
}

type FetchOutcome = (FetchTicket, Result<RecordDetails, DetailError>);

/// Owns the tooltip for the lifetime of the page.
pub struct TooltipController<S> {
    machine: TooltipMachine,
    source: Arc<dyn DetailSource>,
    surface: S,
    registry: Arc<CellRegistry>,
    placement: Placement,
    fallback_size: Size,
    /// Pointer position the visible tooltip was last placed for.
    anchor: Option<Point>,
    placed: Option<Rect>,
    fetches: JoinSet<FetchOutcome>,
}

impl<S: TooltipSurface + 'static> TooltipController<S> {
    pub fn new(config: &TooltipConfig, source: Arc<dyn DetailSource>, surface: S) -> Self {
        Self {
            machine: TooltipMachine::new(config),
            source,
            surface,
            registry: Arc::new(CellRegistry::default()),
            placement: config.placement(),
            fallback_size: config.fallback_size(),
            anchor: None,
            placed: None,
            fetches: JoinSet::new(),
        }
    }

    /// Cells whose events the handle translates into hover targets.
    pub fn with_registry(mut self, registry: CellRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn state(&self) -> &TooltipState {
        self.machine.state()
    }

    /// Run the controller on its own task.
    ///
    /// The task ends when every handle has been dropped and returns the
    /// surface.
    pub fn spawn(self) -> (ControllerHandle, JoinHandle<S>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = ControllerHandle {
            tx,
            registry: Arc::clone(&self.registry),
        };
        let task = tokio::spawn(self.run(rx));
        (handle, task)
    }

    /// Process events until the channel closes.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<PointerEvent>) -> S {
        info!("Tooltip controller started ({} cells registered)", self.registry.len());

        loop {
            let deadline = self.machine.next_deadline();

            tokio::select! {
                biased;

                event = events.recv() => match event {
                    Some(event) => self.handle_event(event, Instant::now()),
                    None => break,
                },

                Some(joined) = self.fetches.join_next(), if !self.fetches.is_empty() => {
                    match joined {
                        Ok((ticket, result)) => {
                            let commands = self.machine.fetch_finished(&ticket, result);
                            self.apply(commands);
                        }
                        Err(e) => warn!("Detail request task failed: {}", e),
                    }
                }

                _ = sleep_until(deadline) => {
                    let commands = self.machine.fire_due(Instant::now());
                    self.apply(commands);
                }
            }
        }

        debug!(
            "Tooltip controller stopped, dropping {} outstanding requests",
            self.fetches.len()
        );
        self.surface
    }

    /// Feed one event to the machine and carry out the result.
    pub fn handle_event(&mut self, event: PointerEvent, now: Instant) {
        let commands = match event {
            PointerEvent::Enter(target) => self.machine.enter(target, now),
            PointerEvent::Move(at) => self.machine.pointer_move(at),
            PointerEvent::Leave => self.machine.leave(now),
            PointerEvent::SurfaceEnter => self.machine.surface_enter(),
            PointerEvent::SurfaceLeave => self.machine.surface_leave(now),
        };
        self.apply(commands);
    }

    fn apply(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Render(content) => self.surface.set_content(&content.to_html()),
                Command::Show { pointer } => {
                    let rect = self.place(pointer);
                    self.surface.show_at(rect);
                }
                Command::Reposition { pointer } => {
                    let rect = self.place(pointer);
                    self.surface.move_to(rect);
                }
                Command::Reflow => {
                    if let Some(anchor) = self.anchor {
                        let previous = self.placed;
                        let rect = self.place(anchor);
                        if previous != Some(rect) {
                            self.surface.move_to(rect);
                        }
                    }
                }
                Command::Hide => {
                    self.anchor = None;
                    self.placed = None;
                    self.surface.hide();
                }
                Command::Fetch(ticket) => self.start_fetch(ticket),
            }
        }
    }

    /// Compute the rectangle for a pointer position and remember it.
    fn place(&mut self, pointer: Point) -> Rect {
        let size = self
            .surface
            .measure()
            .filter(|size| !size.is_empty())
            .unwrap_or(self.fallback_size);
        let rect = self
            .placement
            .place(pointer, size, &self.surface.viewport());
        self.anchor = Some(pointer);
        self.placed = Some(rect);
        rect
    }

    /// The source call runs on its own task so that a panic inside it still
    /// resolves the ticket, as a transport failure.
    fn start_fetch(&mut self, ticket: FetchTicket) {
        debug!(
            "Requesting details for record {} (request #{})",
            ticket.record_id, ticket.seq
        );
        let source = Arc::clone(&self.source);
        let record_id = ticket.record_id.clone();
        self.fetches.spawn(async move {
            let request = tokio::spawn(async move { source.fetch(&record_id).await });
            let result = match request.await {
                Ok(result) => result,
                Err(e) => {
                    warn!("Detail request for record {} died: {}", ticket.record_id, e);
                    Err(DetailError::Transport(e.to_string()))
                }
            };
            (ticket, result)
        });
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Sends pointer events to a running controller.
///
/// Sending never fails from the caller's point of view: once the controller
/// is gone, events are dropped.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<PointerEvent>,
    registry: Arc<CellRegistry>,
}

impl ControllerHandle {
    pub fn send(&self, event: PointerEvent) {
        if self.tx.send(event).is_err() {
            debug!("Tooltip controller is gone, event dropped");
        }
    }

    pub fn enter(&self, target: HoverTarget) {
        self.send(PointerEvent::Enter(target));
    }

    pub fn pointer_move(&self, at: Point) {
        self.send(PointerEvent::Move(at));
    }

    pub fn leave(&self) {
        self.send(PointerEvent::Leave);
    }

    pub fn surface_enter(&self) {
        self.send(PointerEvent::SurfaceEnter);
    }

    pub fn surface_leave(&self) {
        self.send(PointerEvent::SurfaceLeave);
    }

    /// Pointer entered a table cell. Returns false for cells without a
    /// binding, which are ignored.
    pub fn cell_enter(&self, cell: CellId, at: Point) -> bool {
        match self.registry.record_for(cell) {
            Some(id) => {
                self.enter(HoverTarget::new(id.clone(), at));
                true
            }
            None => false,
        }
    }

    pub fn cell_move(&self, cell: CellId, at: Point) -> bool {
        let bound = self.registry.record_for(cell).is_some();
        if bound {
            self.pointer_move(at);
        }
        bound
    }

    pub fn cell_leave(&self, cell: CellId) -> bool {
        let bound = self.registry.record_for(cell).is_some();
        if bound {
            self.leave();
        }
        bound
    }
}
