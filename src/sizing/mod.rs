/// Cable cross-section selection and manual stepping.
pub mod cable;
pub mod device;
pub mod engine;
/// Operating current and panel aggregates.
pub mod load;
pub mod phase;
pub mod summary;
pub mod types;
/// Voltage-drop and short-circuit checks.
pub mod verify;

pub use engine::Engine;
pub use summary::PanelSummary;
pub use types::{Consumer, Panel, PanelSettings};
