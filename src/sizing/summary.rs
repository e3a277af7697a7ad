//! Panel summary derived from a recomputed panel.

use std::fmt;

use serde::Serialize;

use super::cable::CableChoice;
use super::types::Panel;

/// Headline figures of a recomputed panel.
///
/// Computed post-hoc from the panel so that it always agrees with the
/// per-consumer results it counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelSummary {
    pub name: String,
    /// Number of consumers on the panel.
    pub consumers: usize,
    /// Installed power (kW).
    pub installed_kw: f64,
    /// Calculated power after demand and simultaneity factors (kW).
    pub calculated_kw: f64,
    pub average_cos_phi: f64,
    /// Panel current (A).
    pub total_current_a: f64,
    /// Per-phase current (A).
    pub phase_currents_a: [f64; 3],
    /// Largest phase current over the smallest, minus one (%). Zero when a
    /// phase is unloaded.
    pub phase_imbalance_pct: f64,
    pub shield_demand_factor: f64,
    /// Consumers with a protection request but no device selected.
    pub without_device: usize,
    /// Consumers whose cable could not be sized.
    pub without_cable: usize,
    /// Consumers whose voltage drop exceeds the panel limit.
    pub voltage_drop_violations: usize,
}

impl PanelSummary {
    /// Builds the summary from a panel's last recompute.
    pub fn from_panel(panel: &Panel) -> Self {
        let totals = panel.totals();
        let phases = [totals.phase_l1_a, totals.phase_l2_a, totals.phase_l3_a];

        let max = phases.iter().copied().fold(f64::MIN, f64::max);
        let min = phases.iter().copied().fold(f64::MAX, f64::min);
        let phase_imbalance_pct = if min > 0.0 {
            (max / min - 1.0) * 100.0
        } else {
            0.0
        };

        let mut without_device = 0;
        let mut without_cable = 0;
        let mut voltage_drop_violations = 0;
        for consumer in &panel.consumers {
            let derived = consumer.derived();
            if consumer.protection.is_some() && derived.device.is_none() {
                without_device += 1;
            }
            if matches!(derived.cable, Some(CableChoice::NotFound { .. })) {
                without_cable += 1;
            }
            if derived.voltage_drop.is_some_and(|d| d.exceeds_limit) {
                voltage_drop_violations += 1;
            }
        }

        Self {
            name: panel.name.clone(),
            consumers: panel.consumers.len(),
            installed_kw: totals.total_installed_w / 1000.0,
            calculated_kw: totals.total_calculated_w / 1000.0,
            average_cos_phi: totals.average_cos_phi,
            total_current_a: totals.total_current_a,
            phase_currents_a: phases,
            phase_imbalance_pct,
            shield_demand_factor: totals.shield_demand_factor,
            without_device,
            without_cable,
            voltage_drop_violations,
        }
    }
}

impl fmt::Display for PanelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Panel {} ---", self.name)?;
        writeln!(f, "Consumers:             {}", self.consumers)?;
        writeln!(f, "Installed power:       {:.2} kW", self.installed_kw)?;
        writeln!(f, "Calculated power:      {:.2} kW", self.calculated_kw)?;
        writeln!(f, "Average cos φ:         {:.2}", self.average_cos_phi)?;
        writeln!(f, "Panel current:         {:.2} A", self.total_current_a)?;
        writeln!(
            f,
            "Phase currents:        L1 {:.2} A, L2 {:.2} A, L3 {:.2} A ({:.1}% imbalance)",
            self.phase_currents_a[0],
            self.phase_currents_a[1],
            self.phase_currents_a[2],
            self.phase_imbalance_pct
        )?;
        writeln!(f, "Demand factor:         {:.2}", self.shield_demand_factor)?;
        write!(
            f,
            "Unresolved:            {} without device, {} without cable, {} over drop limit",
            self.without_device, self.without_cable, self.voltage_drop_violations
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizing::types::PanelTotals;

    #[test]
    fn empty_panel_summary_is_zeroed() {
        let panel = Panel::default();
        let s = PanelSummary::from_panel(&panel);
        assert_eq!(s.consumers, 0);
        assert_eq!(s.installed_kw, 0.0);
        assert_eq!(s.phase_imbalance_pct, 0.0);
        assert_eq!(s.without_device, 0);
    }

    #[test]
    fn imbalance_from_phase_totals() {
        let mut panel = Panel::default();
        panel.totals = PanelTotals {
            phase_l1_a: 12.0,
            phase_l2_a: 10.0,
            phase_l3_a: 10.0,
            total_installed_w: 5000.0,
            ..PanelTotals::default()
        };
        let s = PanelSummary::from_panel(&panel);
        assert!((s.phase_imbalance_pct - 20.0).abs() < 1e-9);
        assert!((s.installed_kw - 5.0).abs() < 1e-12);
    }

    #[test]
    fn display_contains_headline_lines() {
        let s = PanelSummary::from_panel(&Panel::new("ЩР-2", Default::default()));
        let text = s.to_string();
        assert!(text.starts_with("--- Panel ЩР-2 ---"));
        assert!(text.contains("Phase currents:"));
        assert!(text.contains("0 without device"));
    }
}
