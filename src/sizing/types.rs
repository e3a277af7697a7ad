//! Panel and consumer data model shared by all sizing stages.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::cable::CableChoice;
use super::device::SelectedDevice;
use super::phase::PhaseAssignment;
use super::verify::{ShortCircuit, VoltageDrop};
use crate::catalog::{DeviceCategory, Insulation, LayingMethod, Material, PoleConfig};

/// A user-entered numeric field kept as text.
///
/// Editors hand over whatever was typed; parsing happens at use and a failed
/// parse means "absent". Project files may give the value as a number or a
/// string.
///
/// # Examples
///
/// ```
/// use shield_sizer::sizing::types::InputField;
///
/// assert_eq!(InputField::from("2,5").value(), Some(2.5));
/// assert_eq!(InputField::from("n/a").value(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawInput", into = "String")]
pub struct InputField(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInput {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<RawInput> for InputField {
    fn from(raw: RawInput) -> Self {
        match raw {
            RawInput::Int(v) => Self(v.to_string()),
            RawInput::Float(v) => Self(v.to_string()),
            RawInput::Text(s) => Self(s),
        }
    }
}

impl From<InputField> for String {
    fn from(field: InputField) -> Self {
        field.0
    }
}

impl From<&str> for InputField {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<f64> for InputField {
    fn from(v: f64) -> Self {
        Self(v.to_string())
    }
}

impl InputField {
    /// Parsed value; accepts a decimal comma. `None` for blank, non-numeric,
    /// or non-finite text.
    pub fn value(&self) -> Option<f64> {
        let text = self.0.trim();
        if text.is_empty() {
            return None;
        }
        text.replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which breaking-capacity rating the device must satisfy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtectionStandard {
    /// Household breakers: the per-variant service rating is checked.
    #[default]
    Iec60898,
    /// Industrial breakers: the model-level ultimate rating is checked.
    Iec60947,
}

/// Protective-device request attached to a consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProtectionRequest {
    /// Device family to select from.
    pub category: DeviceCategory,
    /// Restrict the search to one catalog series.
    pub series: Option<String>,
    /// Required pole configuration.
    pub poles: Option<PoleConfig>,
    /// Required trip curve (breaker/RCBO).
    pub curve: Option<char>,
    /// Accessory codes that must all be present (breaker/RCBO).
    pub accessories: Vec<String>,
    /// Required residual trip current in mA (RCD/RCBO).
    pub residual_ma: Option<u32>,
    /// Explicitly chosen catalog id; otherwise the first ranked candidate.
    pub device_id: Option<String>,
    /// Whether the device protects the cable against overload, not only
    /// against short circuit.
    pub overload_protection: bool,
}

impl Default for ProtectionRequest {
    fn default() -> Self {
        Self {
            category: DeviceCategory::Breaker,
            series: None,
            poles: None,
            curve: None,
            accessories: Vec::new(),
            residual_ma: None,
            device_id: None,
            overload_protection: true,
        }
    }
}

/// One electrical load connected to the panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Consumer {
    pub name: String,
    pub room: String,
    /// Nominal voltage (V).
    pub voltage: InputField,
    /// Power factor; 1.0 when blank.
    pub cos_phi: InputField,
    /// Installed power (W).
    pub installed_power: InputField,
    /// Calculated (demand) power (W).
    pub calculated_power: InputField,
    pub protection: Option<ProtectionRequest>,
    /// Cable type code, e.g. `ВВГнг-LS` or `АПвБбШв`.
    pub cable_type: String,
    /// Cable route length (m).
    pub cable_length: InputField,
    pub laying: LayingMethod,
    /// Cross-section fixed by hand (mm²); replaces the automatic choice.
    pub section_override: Option<f64>,
    /// Engine output. Replaced as a whole on every recompute.
    #[serde(skip_deserializing)]
    pub(crate) derived: ConsumerDerived,
}

impl Consumer {
    /// Creates a blank consumer with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Values computed by the engine at the last recompute.
    pub fn derived(&self) -> &ConsumerDerived {
        &self.derived
    }

    /// Flat key/value view for drawing and document export, keyed by
    /// [`ATTRIBUTE_KEYS`]. Absent values are blank.
    pub fn attributes(&self) -> [(&'static str, String); 7] {
        let d = &self.derived;
        [
            ("name", self.name.clone()),
            ("room", self.room.clone()),
            (
                "power",
                super::load::demand_power(self)
                    .map(compact_number)
                    .unwrap_or_default(),
            ),
            ("current", two_decimals(d.current_a)),
            (
                "protection",
                d.device
                    .as_ref()
                    .map(|device| device.description.clone())
                    .unwrap_or_default(),
            ),
            (
                "cable",
                d.cable.as_ref().map(ToString::to_string).unwrap_or_default(),
            ),
            (
                "phase",
                d.phase.map(|p| p.to_string()).unwrap_or_default(),
            ),
        ]
    }
}

/// Keys of [`Consumer::attributes`], in output order.
pub const ATTRIBUTE_KEYS: [&str; 7] = [
    "name",
    "room",
    "power",
    "current",
    "protection",
    "cable",
    "phase",
];

impl fmt::Display for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.derived;
        let or_dash = |text: String| if text.is_empty() { "-".to_string() } else { text };
        write!(
            f,
            "{:<24} {:<12} {:>8} A  {:<10} {:<30} {:<12} dU {:<9} Ik {}",
            self.name,
            or_dash(self.room.clone()),
            or_dash(two_decimals(d.current_a)),
            or_dash(d.phase.map(|p| p.to_string()).unwrap_or_default()),
            or_dash(
                d.device
                    .as_ref()
                    .map(|device| device.description.clone())
                    .unwrap_or_default()
            ),
            or_dash(d.cable.as_ref().map(ToString::to_string).unwrap_or_default()),
            or_dash(d.voltage_drop.map(|v| v.to_string()).unwrap_or_default()),
            or_dash(
                d.short_circuit
                    .map(|sc| format!("{sc} kA"))
                    .unwrap_or_default()
            ),
        )
    }
}

/// Values the engine derives for one consumer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsumerDerived {
    /// Operating current (A).
    pub current_a: Option<f64>,
    /// Phase assignment from the balancer.
    pub phase: Option<PhaseAssignment>,
    /// Selected protective device.
    pub device: Option<SelectedDevice>,
    /// Cable choice; `None` when no device rating is available to size from.
    pub cable: Option<CableChoice>,
    pub voltage_drop: Option<VoltageDrop>,
    pub short_circuit: Option<ShortCircuit>,
}

/// Panel-wide cable defaults and verification limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CableDefaults {
    /// Material used when a consumer has no cable type code.
    pub material: Material,
    /// Insulation used when a consumer has no cable type code.
    pub insulation: Insulation,
    /// Length reserve (% of route length).
    pub reserve_pct: f64,
    /// Vertical descent allowance (% of route length).
    pub descent_pct: f64,
    /// Extra length for terminations (m).
    pub termination_m: f64,
    /// Conductor temperature for resistivity (°C).
    pub ambient_temp_c: f64,
    /// Inductive reactance per kilometre; scaled by 1/1000 per metre of run.
    pub reactance_per_km: f64,
    /// Voltage-drop limit (%).
    pub max_voltage_drop_pct: f64,
    /// Route length above which single-core cables are used (m).
    pub single_core_threshold_m: f64,
}

impl Default for CableDefaults {
    fn default() -> Self {
        Self {
            material: Material::Cu,
            insulation: Insulation::Pvc,
            reserve_pct: 5.0,
            descent_pct: 0.0,
            termination_m: 1.0,
            ambient_temp_c: 25.0,
            reactance_per_km: 0.08,
            max_voltage_drop_pct: 4.0,
            single_core_threshold_m: 100.0,
        }
    }
}

/// Tunables of the margin/next-size rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionThresholds {
    /// Load current separating the low and high regimes (A).
    pub breakpoint_a: f64,
    /// Utilization at which a low-regime load escalates to the next tier.
    pub low_margin: f64,
    /// Utilization at which a high-regime load escalates to the next tier.
    pub high_margin: f64,
}

impl Default for SelectionThresholds {
    fn default() -> Self {
        Self {
            breakpoint_a: 40.0,
            low_margin: 0.87,
            high_margin: 0.9,
        }
    }
}

/// Scalar panel inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelSettings {
    pub demand_factor: f64,
    pub simultaneity_factor: f64,
    pub protection_standard: ProtectionStandard,
    /// Prospective short-circuit current at the panel busbar (kA).
    pub max_short_circuit_ka: Option<f64>,
    pub cable: CableDefaults,
    pub selection: SelectionThresholds,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            demand_factor: 1.0,
            simultaneity_factor: 1.0,
            protection_standard: ProtectionStandard::default(),
            max_short_circuit_ka: None,
            cable: CableDefaults::default(),
            selection: SelectionThresholds::default(),
        }
    }
}

/// Panel aggregates. Always a function of the consumers and settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PanelTotals {
    pub total_installed_w: f64,
    pub total_calculated_w: f64,
    pub average_cos_phi: f64,
    pub total_current_a: f64,
    pub phase_l1_a: f64,
    pub phase_l2_a: f64,
    pub phase_l3_a: f64,
    /// Installed over calculated power, kept in that orientation.
    pub shield_demand_factor: f64,
}

/// The distribution panel being designed.
///
/// Consumer order is significant: it drives phase balancing and export order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Panel {
    pub name: String,
    pub settings: PanelSettings,
    pub consumers: Vec<Consumer>,
    pub(crate) totals: PanelTotals,
}

impl Panel {
    pub fn new(name: impl Into<String>, settings: PanelSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            consumers: Vec::new(),
            totals: PanelTotals::default(),
        }
    }

    /// Aggregates computed at the last recompute.
    pub fn totals(&self) -> &PanelTotals {
        &self.totals
    }
}

/// Formats an optional value with two decimals, blank when absent.
pub fn two_decimals(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

/// Formats a catalog quantity without trailing zeros: `16`, `2.5`, `0.75`.
pub fn compact_number(value: f64) -> String {
    let text = format!("{value:.3}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_field_parsing() {
        assert_eq!(InputField::from("230").value(), Some(230.0));
        assert_eq!(InputField::from(" 0,95 ").value(), Some(0.95));
        assert_eq!(InputField::from("").value(), None);
        assert_eq!(InputField::from("abc").value(), None);
        assert_eq!(InputField::from("inf").value(), None);
        assert_eq!(InputField::from("NaN").value(), None);
    }

    #[test]
    fn input_field_from_toml_number_or_text() {
        #[derive(Deserialize)]
        struct Row {
            a: InputField,
            b: InputField,
            c: InputField,
        }
        let row: Row = toml::from_str("a = 400\nb = 0.9\nc = \"1,5\"").expect("toml parses");
        assert_eq!(row.a.value(), Some(400.0));
        assert_eq!(row.b.value(), Some(0.9));
        assert_eq!(row.c.value(), Some(1.5));
    }

    #[test]
    fn protection_request_defaults() {
        let req: ProtectionRequest = toml::from_str("category = \"rcbo\"").expect("toml parses");
        assert_eq!(req.category, DeviceCategory::Rcbo);
        assert!(req.overload_protection);
        assert!(req.accessories.is_empty());
    }

    #[test]
    fn attributes_follow_key_order_and_blank_when_absent() {
        let mut consumer = Consumer::new("Розетки кухни");
        consumer.room = "Кухня".to_string();
        consumer.installed_power = InputField::from("1800");
        let attrs = consumer.attributes();
        let keys: Vec<&str> = attrs.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ATTRIBUTE_KEYS);
        assert_eq!(attrs[0].1, "Розетки кухни");
        assert_eq!(attrs[2].1, "1800");
        assert_eq!(attrs[3].1, "");
        assert_eq!(attrs[6].1, "");
    }

    #[test]
    fn two_decimals_formatting() {
        assert_eq!(two_decimals(Some(10.0)), "10.00");
        assert_eq!(two_decimals(Some(3.14159)), "3.14");
        assert_eq!(two_decimals(None), "");
    }

    #[test]
    fn compact_number_formatting() {
        assert_eq!(compact_number(16.0), "16");
        assert_eq!(compact_number(2.5), "2.5");
        assert_eq!(compact_number(0.75), "0.75");
        assert_eq!(compact_number(240.0), "240");
    }
}
