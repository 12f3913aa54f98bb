//! Record-detail hover tooltip.
//!
//! - [`state`]: lifecycle state machine (hidden, pending, frozen, following)
//! - [`surface`]: the render target the tooltip is drawn into
//! - [`controller`]: tokio task wiring pointer events, timers and detail requests

pub mod controller;
pub mod state;
pub mod surface;

pub use controller::{ControllerHandle, PointerEvent, TooltipController};
pub use state::{Command, FetchTicket, Phase, TimerKind, TooltipContent, TooltipMachine, TooltipState};
pub use surface::{estimated_size, RecordingSurface, SurfaceEvent, SurfaceLog, TooltipSurface};
