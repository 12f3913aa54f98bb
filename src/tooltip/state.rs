//! Tooltip lifecycle state machine.
//!
//! The machine is pure: it never sleeps, spawns or draws. Callers pass the
//! current time in, and get back the [`Command`]s the surface and the detail
//! source have to carry out. Timers are deadlines held in one slot per kind,
//! so starting a timer always replaces the previous one of the same kind.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::TooltipConfig;
use crate::details::DetailError;
use crate::geometry::Point;
use crate::models::{HoverTarget, RecordDetails, RecordId};
use crate::templates;

/// Lifecycle phase of the shared tooltip. Every phase except `Hidden`
/// carries the record the tooltip is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing bound.
    #[default]
    Hidden,
    /// Show delay running for this record.
    Pending(RecordId),
    /// Visible, ignoring pointer movement until the freeze timer fires.
    Frozen(RecordId),
    /// Visible and following the pointer.
    Following(RecordId),
}

impl Phase {
    /// The record bound to the tooltip, if any.
    pub fn record_id(&self) -> Option<&RecordId> {
        match self {
            Phase::Hidden => None,
            Phase::Pending(id) | Phase::Frozen(id) | Phase::Following(id) => Some(id),
        }
    }
}

/// What the tooltip surface displays.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TooltipContent {
    #[default]
    Empty,
    Loading,
    Details(RecordDetails),
    Error(String),
}

impl TooltipContent {
    pub fn to_html(&self) -> String {
        match self {
            TooltipContent::Empty => String::new(),
            TooltipContent::Loading => templates::loading(),
            TooltipContent::Details(details) => templates::record_details(details),
            TooltipContent::Error(reason) => templates::error(reason),
        }
    }
}

/// Page-wide tooltip state.
#[derive(Debug, Clone, Default)]
pub struct TooltipState {
    pub phase: Phase,
    pub content: TooltipContent,
    /// Whether the surface is on screen. A tooltip can stay visible with the
    /// previous record's details while the show delay for another record runs.
    pub visible: bool,
}

impl TooltipState {
    pub fn active_record_id(&self) -> Option<&RecordId> {
        self.phase.record_id()
    }
}

/// Timer kinds. At most one of each is armed at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Show,
    Freeze,
    Hide,
}

#[derive(Debug, Clone, Default)]
struct Timers {
    show: Option<Instant>,
    freeze: Option<Instant>,
    hide: Option<Instant>,
}

impl Timers {
    fn slot(&mut self, kind: TimerKind) -> &mut Option<Instant> {
        match kind {
            TimerKind::Show => &mut self.show,
            TimerKind::Freeze => &mut self.freeze,
            TimerKind::Hide => &mut self.hide,
        }
    }

    fn start(&mut self, kind: TimerKind, deadline: Instant) {
        *self.slot(kind) = Some(deadline);
    }

    fn cancel(&mut self, kind: TimerKind) -> bool {
        self.slot(kind).take().is_some()
    }

    fn is_armed(&self, kind: TimerKind) -> bool {
        match kind {
            TimerKind::Show => self.show.is_some(),
            TimerKind::Freeze => self.freeze.is_some(),
            TimerKind::Hide => self.hide.is_some(),
        }
    }

    /// Earliest armed timer.
    fn next(&self) -> Option<(TimerKind, Instant)> {
        [
            (TimerKind::Show, self.show),
            (TimerKind::Freeze, self.freeze),
            (TimerKind::Hide, self.hide),
        ]
        .into_iter()
        .filter_map(|(kind, deadline)| deadline.map(|d| (kind, d)))
        .min_by_key(|(_, deadline)| *deadline)
    }
}

/// Identifies one detail request. A result is only applied while its ticket
/// is the live one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub record_id: RecordId,
}

/// Side effects requested by the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Replace the surface content.
    Render(TooltipContent),
    /// Place the surface for this pointer position and make it visible.
    Show { pointer: Point },
    /// Place the visible surface for a new pointer position.
    Reposition { pointer: Point },
    /// Re-run placement at the current anchor after the content changed size.
    Reflow,
    /// Take the surface off screen.
    Hide,
    /// Start a detail request.
    Fetch(FetchTicket),
}

/// Record whose content is on the surface, and whether its freeze is over.
#[derive(Debug, Clone)]
struct OnScreen {
    record_id: RecordId,
    following: bool,
}

impl OnScreen {
    fn phase(&self) -> Phase {
        if self.following {
            Phase::Following(self.record_id.clone())
        } else {
            Phase::Frozen(self.record_id.clone())
        }
    }
}

/// The tooltip controller's state machine.
#[derive(Debug, Clone)]
pub struct TooltipMachine {
    show_delay: Duration,
    freeze_duration: Duration,
    hide_delay: Duration,
    state: TooltipState,
    timers: Timers,
    /// Last pointer position seen on a registered cell.
    pointer: Option<Point>,
    on_screen: Option<OnScreen>,
    live_fetch: Option<FetchTicket>,
    next_seq: u64,
}

impl TooltipMachine {
    pub fn new(config: &TooltipConfig) -> Self {
        Self {
            show_delay: config.show_delay(),
            freeze_duration: config.freeze_duration(),
            hide_delay: config.hide_delay(),
            state: TooltipState::default(),
            timers: Timers::default(),
            pointer: None,
            on_screen: None,
            live_fetch: None,
            next_seq: 0,
        }
    }

    pub fn state(&self) -> &TooltipState {
        &self.state
    }

    pub fn phase(&self) -> &Phase {
        &self.state.phase
    }

    /// The detail request whose result would currently be applied.
    pub fn live_fetch(&self) -> Option<&FetchTicket> {
        self.live_fetch.as_ref()
    }

    pub fn is_timer_armed(&self, kind: TimerKind) -> bool {
        self.timers.is_armed(kind)
    }

    /// When the next timer fires, if any is armed.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next().map(|(_, deadline)| deadline)
    }

    /// Pointer entered a registered cell.
    pub fn enter(&mut self, target: HoverTarget, now: Instant) -> Vec<Command> {
        if self.timers.cancel(TimerKind::Hide) {
            debug!("Hide cancelled by pointer entering record {}", target.record_id);
        }
        self.pointer = Some(target.anchor);

        // Back on the record already on screen, possibly after crossing
        // another row within the show delay.
        if let Some(on_screen) = self.on_screen.as_ref().filter(|s| s.record_id == target.record_id) {
            debug!("Tooltip already shows record {}", target.record_id);
            self.timers.cancel(TimerKind::Show);
            self.state.phase = on_screen.phase();
            return Vec::new();
        }

        debug!("Hover on record {}, show in {:?}", target.record_id, self.show_delay);
        self.timers.start(TimerKind::Show, now + self.show_delay);
        self.state.phase = Phase::Pending(target.record_id);
        Vec::new()
    }

    /// Pointer moved over a registered cell.
    pub fn pointer_move(&mut self, at: Point) -> Vec<Command> {
        self.pointer = Some(at);
        match self.state.phase {
            Phase::Following(_) if self.state.visible => vec![Command::Reposition { pointer: at }],
            _ => Vec::new(),
        }
    }

    /// Pointer left a registered cell.
    pub fn leave(&mut self, now: Instant) -> Vec<Command> {
        self.timers.cancel(TimerKind::Show);

        let never_shown = matches!(self.state.phase, Phase::Pending(_)) && !self.state.visible;
        if never_shown {
            if let Some(id) = self.state.phase.record_id() {
                debug!("Left record {} before the show delay elapsed", id);
            }
            self.state.phase = Phase::Hidden;
        } else if self.state.phase != Phase::Hidden {
            self.arm_hide(now);
        }
        Vec::new()
    }

    /// Pointer entered the tooltip surface itself.
    pub fn surface_enter(&mut self) -> Vec<Command> {
        if self.timers.cancel(TimerKind::Hide) {
            debug!("Hide cancelled by pointer entering the tooltip");
        }
        Vec::new()
    }

    /// Pointer left the tooltip surface.
    pub fn surface_leave(&mut self, now: Instant) -> Vec<Command> {
        if self.state.visible {
            self.arm_hide(now);
        }
        Vec::new()
    }

    /// Fire every timer whose deadline is at or before `now`, earliest first.
    pub fn fire_due(&mut self, now: Instant) -> Vec<Command> {
        let mut commands = Vec::new();
        while let Some((kind, deadline)) = self.timers.next() {
            if deadline > now {
                break;
            }
            self.timers.cancel(kind);
            commands.extend(self.on_timer(kind, deadline));
        }
        commands
    }

    /// A detail request finished. Results for superseded requests, or for a
    /// record the tooltip is no longer bound to, are dropped.
    pub fn fetch_finished(
        &mut self,
        ticket: &FetchTicket,
        result: Result<RecordDetails, DetailError>,
    ) -> Vec<Command> {
        let live = self.live_fetch.as_ref() == Some(ticket);
        let bound = self.state.phase.record_id() == Some(&ticket.record_id);
        if !live || !bound {
            debug!(
                "Discarding stale details for record {} (request #{})",
                ticket.record_id, ticket.seq
            );
            return Vec::new();
        }
        self.live_fetch = None;

        let content = match result {
            Ok(details) => {
                debug!("Details received for record {}", ticket.record_id);
                TooltipContent::Details(details)
            }
            Err(e) => {
                warn!("Failed to fetch details for record {}: {}", ticket.record_id, e);
                TooltipContent::Error(e.reason())
            }
        };
        self.state.content = content.clone();
        vec![Command::Render(content), Command::Reflow]
    }

    fn arm_hide(&mut self, now: Instant) {
        self.timers.start(TimerKind::Hide, now + self.hide_delay);
    }

    fn on_timer(&mut self, kind: TimerKind, deadline: Instant) -> Vec<Command> {
        match kind {
            TimerKind::Show => self.show(deadline),
            TimerKind::Freeze => {
                if let Some(on_screen) = self.on_screen.as_mut() {
                    on_screen.following = true;
                }
                if let Phase::Frozen(id) = &self.state.phase {
                    let id = id.clone();
                    debug!("Tooltip for record {} unfrozen, following pointer", id);
                    self.state.phase = Phase::Following(id);
                }
                Vec::new()
            }
            TimerKind::Hide => self.hide(),
        }
    }

    fn show(&mut self, deadline: Instant) -> Vec<Command> {
        let Phase::Pending(id) = &self.state.phase else {
            return Vec::new();
        };
        let id = id.clone();
        let pointer = self.pointer.unwrap_or_default();

        self.next_seq += 1;
        let ticket = FetchTicket {
            seq: self.next_seq,
            record_id: id.clone(),
        };

        info!("Showing tooltip for record {}", id);
        self.on_screen = Some(OnScreen {
            record_id: id.clone(),
            following: false,
        });
        self.state.phase = Phase::Frozen(id);
        self.state.visible = true;
        self.state.content = TooltipContent::Loading;
        self.live_fetch = Some(ticket.clone());
        self.timers
            .start(TimerKind::Freeze, deadline + self.freeze_duration);

        vec![
            Command::Render(TooltipContent::Loading),
            Command::Show { pointer },
            Command::Fetch(ticket),
        ]
    }

    fn hide(&mut self) -> Vec<Command> {
        let was_visible = self.state.visible;
        if let Some(id) = self.state.phase.record_id() {
            debug!("Hiding tooltip for record {}", id);
        }
        self.state.phase = Phase::Hidden;
        self.state.visible = false;
        self.on_screen = None;
        self.live_fetch = None;
        self.timers.cancel(TimerKind::Show);
        self.timers.cancel(TimerKind::Freeze);

        if was_visible {
            vec![Command::Hide]
        } else {
            Vec::new()
        }
    }
}
