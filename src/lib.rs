//! Distribution-panel sizing: load currents, phase balancing, protective
//! device and cable selection, and voltage-drop/short-circuit checks.

#[cfg(feature = "api")]
pub mod api;
/// Device and cable reference catalog.
pub mod catalog;
pub mod config;
pub mod error;
/// Export of consumer attributes.
pub mod io {
    pub mod export;
}
pub mod repository;
/// Sizing engine and its stages.
pub mod sizing;
