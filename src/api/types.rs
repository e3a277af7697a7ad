//! API response and query types.
//!
//! Consumer records use the same field names as the CSV export.

use serde::{Deserialize, Serialize};

use crate::sizing::device::Candidate;
use crate::sizing::summary::PanelSummary;
use crate::sizing::types::{Consumer, Panel, PanelSettings, PanelTotals};

/// Panel inputs and aggregates.
#[derive(Debug, Serialize)]
pub struct PanelResponse {
    pub name: String,
    pub settings: PanelSettings,
    pub totals: PanelTotals,
    pub summary: PanelSummary,
}

impl From<&Panel> for PanelResponse {
    fn from(panel: &Panel) -> Self {
        Self {
            name: panel.name.clone(),
            settings: panel.settings.clone(),
            totals: panel.totals().clone(),
            summary: PanelSummary::from_panel(panel),
        }
    }
}

/// One consumer as flat attribute strings, tagged with its panel position.
#[derive(Debug, Serialize)]
pub struct ConsumerRecord {
    /// Position in the panel; the index for `/candidates/{index}`.
    pub index: usize,
    pub name: String,
    pub room: String,
    pub power: String,
    pub current: String,
    pub protection: String,
    pub cable: String,
    pub phase: String,
}

impl ConsumerRecord {
    pub fn new(index: usize, consumer: &Consumer) -> Self {
        let [name, room, power, current, protection, cable, phase] =
            consumer.attributes().map(|(_, value)| value);
        Self {
            index,
            name,
            room,
            power,
            current,
            protection,
            cable,
            phase,
        }
    }
}

/// Ranked device candidate with its display designation.
#[derive(Debug, Serialize)]
pub struct CandidateRecord {
    pub description: String,
    #[serde(flatten)]
    pub candidate: Candidate,
}

impl From<Candidate> for CandidateRecord {
    fn from(candidate: Candidate) -> Self {
        Self {
            description: candidate.description(None),
            candidate,
        }
    }
}

/// Optional filter for the consumers endpoint.
#[derive(Debug, Deserialize)]
pub struct ConsumersQuery {
    /// Exact room name.
    pub room: Option<String>,
}

/// Error response body for 4xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
