//! recordtip
//!
//! Hover tooltip engine for the results table of the classification web
//! application: hovering a row shows a tooltip with the record's details,
//! fetched from the backend.

pub mod config;
pub mod details;
pub mod geometry;
pub mod models;
pub mod registry;
pub mod templates;
pub mod tooltip;

pub use config::{Settings, TooltipConfig};
pub use details::{DetailError, DetailSource, HttpDetailSource, StaticDetailSource};
pub use models::{HoverTarget, RecordDetails, RecordId};
pub use registry::{CellId, CellRegistry};
pub use tooltip::{ControllerHandle, Phase, TooltipController};
