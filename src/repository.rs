//! Panel storage behind a trait, so callers own persistence and the engine
//! never touches it.

use std::collections::HashMap;

use crate::sizing::types::Panel;

/// Keyed storage for panels.
pub trait PanelRepository {
    /// Returns a copy of the stored panel, if any.
    fn get(&self, id: &str) -> Option<Panel>;

    /// Stores `panel` under `id`, replacing any previous one.
    fn save(&mut self, id: &str, panel: Panel);

    /// Stored ids in ascending order.
    fn ids(&self) -> Vec<String>;
}

/// Repository that keeps panels in a map for the life of the process.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    panels: HashMap<String, Panel>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PanelRepository for InMemoryRepository {
    fn get(&self, id: &str) -> Option<Panel> {
        self.panels.get(id).cloned()
    }

    fn save(&mut self, id: &str, panel: Panel) {
        self.panels.insert(id.to_string(), panel);
    }

    fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.panels.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }
}
