//! Panel recomputation: runs every sizing stage over a panel in order.
//!
//! Load → phases → device → cable → verification. Each recompute rebuilds
//! all derived consumer values and panel totals from the inputs, so nothing
//! is carried over from a previous pass.

use tracing::{debug, warn};

use super::cable::{self, CableChoice, CableRequest, Step};
use super::device::{self, Candidate, SelectedDevice, SelectionRequest};
use super::load;
use super::phase::{self, PhaseLoad, Supply};
use super::types::{Consumer, ConsumerDerived, Panel, PanelSettings};
use super::verify::{self, Line};
use crate::catalog::CatalogStore;

/// Sizing engine bound to a read-only catalog.
///
/// Holds no state of its own; every method is a function of its arguments
/// and the catalog.
pub struct Engine<'c, S: CatalogStore> {
    catalog: &'c S,
}

impl<'c, S: CatalogStore> Engine<'c, S> {
    /// Creates an engine over `catalog`.
    pub fn new(catalog: &'c S) -> Self {
        Self { catalog }
    }

    /// Returns the catalog this engine selects from.
    pub fn catalog(&self) -> &'c S {
        self.catalog
    }

    /// Recomputes every derived consumer value and all panel totals.
    pub fn recompute(&self, panel: &mut Panel) {
        let currents: Vec<Option<f64>> =
            panel.consumers.iter().map(load::consumer_current).collect();

        let mut totals = load::aggregate(&panel.consumers, &panel.settings);

        let phase_loads: Vec<PhaseLoad> = panel
            .consumers
            .iter()
            .zip(&currents)
            .map(|(consumer, &current_a)| PhaseLoad {
                supply: consumer.voltage.value().map(|u| {
                    if load::is_three_phase(u) {
                        Supply::Three
                    } else {
                        Supply::Single
                    }
                }),
                current_a,
            })
            .collect();
        let balance = phase::balance(&phase_loads);
        totals.phase_l1_a = balance.totals[0];
        totals.phase_l2_a = balance.totals[1];
        totals.phase_l3_a = balance.totals[2];

        for ((consumer, current_a), phase) in panel
            .consumers
            .iter_mut()
            .zip(currents)
            .zip(balance.assignments)
        {
            let mut derived = self.size_consumer(consumer, current_a, &panel.settings);
            derived.phase = phase;
            consumer.derived = derived;
        }

        debug!(
            panel = %panel.name,
            consumers = panel.consumers.len(),
            total_current_a = totals.total_current_a,
            "panel recomputed"
        );
        panel.totals = totals;
    }

    /// Applies `edit` to one consumer and recomputes the panel.
    ///
    /// Returns `false`, leaving the panel untouched, if `index` is out of range.
    pub fn edit_consumer(
        &self,
        panel: &mut Panel,
        index: usize,
        edit: impl FnOnce(&mut Consumer),
    ) -> bool {
        let Some(consumer) = panel.consumers.get_mut(index) else {
            return false;
        };
        edit(consumer);
        self.recompute(panel);
        true
    }

    /// Applies `edit` to the panel settings and recomputes the panel.
    pub fn edit_settings(&self, panel: &mut Panel, edit: impl FnOnce(&mut PanelSettings)) {
        edit(&mut panel.settings);
        self.recompute(panel);
    }

    /// Ranked device candidates for one consumer.
    ///
    /// `None` if the index is out of range, the consumer has no protection
    /// request, or its current cannot be computed.
    pub fn candidates(&self, panel: &Panel, index: usize) -> Option<Vec<Candidate>> {
        let consumer = panel.consumers.get(index)?;
        let current_a = load::consumer_current(consumer)?;
        let req = selection_request(consumer, current_a, &panel.settings)?;
        Some(device::select(self.catalog, &req))
    }

    /// Steps a consumer's cross-section one rung up or down, stores it as a
    /// manual override, and recomputes.
    ///
    /// Starts from the current override, else the automatically sized
    /// section. Returns the new section, or `None` if the consumer has no
    /// section to step from.
    pub fn step_section(&self, panel: &mut Panel, index: usize, step: Step) -> Option<f64> {
        let consumer = panel.consumers.get(index)?;
        let current = consumer.section_override.or_else(|| {
            consumer
                .derived
                .cable
                .as_ref()
                .and_then(CableChoice::selection)
                .map(|s| s.section_mm2)
        })?;
        let (material, insulation) = cable::conductor(&consumer.cable_type, &panel.settings.cable);
        let ladder = cable::section_ladder(self.catalog, material, insulation);
        let next = cable::step_section(&ladder, current, step)?;
        self.edit_consumer(panel, index, |c| c.section_override = Some(next));
        Some(next)
    }

    fn size_consumer(
        &self,
        consumer: &Consumer,
        current_a: Option<f64>,
        settings: &PanelSettings,
    ) -> ConsumerDerived {
        let mut derived = ConsumerDerived {
            current_a,
            ..ConsumerDerived::default()
        };

        derived.device = current_a.and_then(|i| self.pick_device(consumer, i, settings));

        let voltage = consumer.voltage.value();
        let overload_protection = consumer
            .protection
            .as_ref()
            .is_none_or(|p| p.overload_protection);

        if let (Some(device), Some(voltage)) = (&derived.device, voltage) {
            let req = CableRequest {
                cable_type: &consumer.cable_type,
                rated_current_a: device.rated_current,
                overload_protection,
                voltage,
                laying: consumer.laying,
                length_m: consumer.cable_length.value(),
            };
            let choice = match consumer.section_override {
                Some(section) => {
                    CableChoice::Sized(cable::with_section(&req, &settings.cable, section))
                }
                None => cable::size(self.catalog, &req, &settings.cable),
            };
            if let CableChoice::NotFound {
                required_ampacity_a,
                ..
            } = &choice
            {
                warn!(
                    consumer = %consumer.name,
                    required_ampacity_a,
                    "no cable cross-section carries the required current"
                );
            }
            derived.cable = Some(choice);
        }

        let selection = derived.cable.as_ref().and_then(CableChoice::selection);
        if let (Some(selection), Some(length_m), Some(voltage)) =
            (selection, consumer.cable_length.value(), voltage)
        {
            let line = Line {
                material: selection.material,
                length_m,
                section_mm2: selection.section_mm2,
            };
            if let Some(current_a) = current_a {
                let cos_phi = consumer.cos_phi.value().unwrap_or(load::DEFAULT_COS_PHI);
                derived.voltage_drop =
                    verify::voltage_drop(&line, current_a, voltage, cos_phi, &settings.cable);
            }
            derived.short_circuit = settings
                .max_short_circuit_ka
                .and_then(|ik| verify::short_circuit(&line, voltage, ik, &settings.cable));
        }

        derived
    }

    fn pick_device(
        &self,
        consumer: &Consumer,
        current_a: f64,
        settings: &PanelSettings,
    ) -> Option<SelectedDevice> {
        let req = selection_request(consumer, current_a, settings)?;
        let candidates = device::select(self.catalog, &req);
        let requested_poles = req.poles;

        let chosen = match consumer.protection.as_ref().and_then(|p| p.device_id.as_deref()) {
            Some(id) => {
                let found = device::find_by_id(&candidates, id);
                if found.is_none() {
                    warn!(
                        consumer = %consumer.name,
                        device_id = id,
                        "selected device is not among compliant candidates"
                    );
                }
                found
            }
            None => candidates.first(),
        };

        if chosen.is_none() && candidates.is_empty() {
            warn!(
                consumer = %consumer.name,
                category = %req.category,
                current_a,
                "no catalog device satisfies the constraints"
            );
        }
        chosen.map(|c| SelectedDevice::from_candidate(c, requested_poles))
    }
}

/// Builds the device-selection constraints for a consumer, or `None` when it
/// has no protection request.
pub fn selection_request<'a>(
    consumer: &'a Consumer,
    current_a: f64,
    settings: &'a PanelSettings,
) -> Option<SelectionRequest<'a>> {
    let protection = consumer.protection.as_ref()?;
    Some(SelectionRequest {
        category: protection.category,
        series: protection.series.as_deref(),
        poles: protection.poles,
        curve: protection.curve,
        accessories: &protection.accessories,
        residual_ma: protection.residual_ma,
        load_current_a: current_a,
        max_short_circuit_ka: settings.max_short_circuit_ka,
        standard: settings.protection_standard,
        thresholds: &settings.selection,
    })
}
