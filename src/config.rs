//! TOML-based project configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub use crate::error::ConfigError;
use crate::catalog::{DeviceCategory, LayingMethod, PoleConfig};
use crate::catalog::store::{CABLES_FILE, DEVICES_FILE};
use crate::sizing::types::{
    CableDefaults, Consumer, InputField, Panel, PanelSettings, ProtectionRequest,
    ProtectionStandard, SelectionThresholds,
};

/// Top-level project configuration parsed from TOML.
///
/// All sections have defaults. Load from TOML with
/// [`ProjectConfig::from_toml_file`] or use [`ProjectConfig::from_preset`]
/// for a built-in panel.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Panel identity and scalar inputs.
    #[serde(default)]
    pub panel: PanelConfig,
    /// Cable defaults and verification limits.
    #[serde(default)]
    pub cable: CableDefaults,
    /// Device-selection margins.
    #[serde(default)]
    pub selection: SelectionThresholds,
    /// Catalog file locations.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Consumers in panel order.
    #[serde(default)]
    pub consumers: Vec<Consumer>,
}

/// Panel identity and scalar inputs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PanelConfig {
    pub name: String,
    /// Demand factor applied to calculated power (> 0).
    pub demand_factor: f64,
    /// Simultaneity factor applied to calculated power (> 0).
    pub simultaneity_factor: f64,
    /// Breaking-capacity rating devices are checked against.
    pub protection_standard: ProtectionStandard,
    /// Prospective short-circuit current at the busbar (kA, > 0).
    pub max_short_circuit_ka: Option<f64>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            name: "ЩР-1".to_string(),
            demand_factor: 1.0,
            simultaneity_factor: 1.0,
            protection_standard: ProtectionStandard::default(),
            max_short_circuit_ka: None,
        }
    }
}

/// Catalog CSV locations. Relative paths resolve against the project file's
/// directory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub devices: Option<PathBuf>,
    pub cables: Option<PathBuf>,
}

impl CatalogConfig {
    /// Device and cable catalog paths.
    ///
    /// # Arguments
    ///
    /// * `base_dir` - Directory relative paths are joined onto
    /// * `fallback_dir` - Directory holding the default file names when a
    ///   path is not configured
    pub fn resolve(&self, base_dir: &Path, fallback_dir: &Path) -> (PathBuf, PathBuf) {
        let pick = |configured: &Option<PathBuf>, file: &str| match configured {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => base_dir.join(path),
            None => fallback_dir.join(file),
        };
        (
            pick(&self.devices, DEVICES_FILE),
            pick(&self.cables, CABLES_FILE),
        )
    }
}

impl ProjectConfig {
    /// Returns the demo preset: a small apartment panel.
    pub fn demo() -> Self {
        let consumer = |name: &str, room: &str, voltage: &str, power: &str, cos_phi: &str| Consumer {
            name: name.to_string(),
            room: room.to_string(),
            voltage: InputField::from(voltage),
            cos_phi: InputField::from(cos_phi),
            installed_power: InputField::from(power),
            calculated_power: InputField::from(power),
            cable_type: "ВВГнг-LS".to_string(),
            ..Consumer::default()
        };
        let breaker = |poles: PoleConfig, curve: char| ProtectionRequest {
            category: DeviceCategory::Breaker,
            poles: Some(poles),
            curve: Some(curve),
            ..ProtectionRequest::default()
        };

        let consumers = vec![
            Consumer {
                protection: Some(breaker(PoleConfig::OneP, 'B')),
                cable_length: InputField::from("18"),
                ..consumer("Освещение", "Коридор", "230", "800", "0.95")
            },
            Consumer {
                protection: Some(ProtectionRequest {
                    category: DeviceCategory::Rcbo,
                    poles: Some(PoleConfig::OnePN),
                    curve: Some('C'),
                    residual_ma: Some(30),
                    ..ProtectionRequest::default()
                }),
                cable_length: InputField::from("12"),
                ..consumer("Розетки кухни", "Кухня", "230", "3000", "0.9")
            },
            Consumer {
                protection: Some(breaker(PoleConfig::OneP, 'C')),
                cable_length: InputField::from("9"),
                ..consumer("Водонагреватель", "Санузел", "230", "1800", "1")
            },
            Consumer {
                protection: Some(breaker(PoleConfig::ThreeP, 'C')),
                cable_length: InputField::from("10"),
                ..consumer("Варочная панель", "Кухня", "400", "7500", "1")
            },
            Consumer {
                protection: Some(ProtectionRequest {
                    category: DeviceCategory::Rcd,
                    poles: Some(PoleConfig::TwoP),
                    residual_ma: Some(30),
                    ..ProtectionRequest::default()
                }),
                cable_length: InputField::from("7"),
                laying: LayingMethod::Air,
                ..consumer("Стиральная машина", "Санузел", "230", "2200", "0.85")
            },
        ];

        Self {
            panel: PanelConfig {
                name: "ЩК-1".to_string(),
                demand_factor: 0.8,
                simultaneity_factor: 0.9,
                max_short_circuit_ka: Some(4.5),
                ..PanelConfig::default()
            },
            consumers,
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["demo"];

    /// Loads a project from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "demo" => Ok(Self::demo()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a project from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("project", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a project from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid. Consumer numeric
    /// fields are not checked: unparseable text is a legitimate "absent".
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let p = &self.panel;
        if !(p.demand_factor > 0.0) {
            errors.push(ConfigError::new("panel.demand_factor", "must be > 0"));
        }
        if !(p.simultaneity_factor > 0.0) {
            errors.push(ConfigError::new("panel.simultaneity_factor", "must be > 0"));
        }
        if p.max_short_circuit_ka.is_some_and(|ik| !(ik > 0.0)) {
            errors.push(ConfigError::new("panel.max_short_circuit_ka", "must be > 0"));
        }

        let c = &self.cable;
        for (field, value) in [
            ("cable.reserve_pct", c.reserve_pct),
            ("cable.descent_pct", c.descent_pct),
            ("cable.termination_m", c.termination_m),
            ("cable.reactance_per_km", c.reactance_per_km),
            ("cable.single_core_threshold_m", c.single_core_threshold_m),
        ] {
            if !(value >= 0.0) {
                errors.push(ConfigError::new(field, "must be >= 0"));
            }
        }
        if !(c.max_voltage_drop_pct > 0.0) {
            errors.push(ConfigError::new("cable.max_voltage_drop_pct", "must be > 0"));
        }

        let s = &self.selection;
        if !(s.breakpoint_a > 0.0) {
            errors.push(ConfigError::new("selection.breakpoint_a", "must be > 0"));
        }
        for (field, value) in [
            ("selection.low_margin", s.low_margin),
            ("selection.high_margin", s.high_margin),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                errors.push(ConfigError::new(field, "must be in (0.0, 1.0]"));
            }
        }

        for (i, consumer) in self.consumers.iter().enumerate() {
            if consumer.section_override.is_some_and(|s| !(s > 0.0)) {
                errors.push(ConfigError::new(
                    format!("consumers[{i}].section_override"),
                    "must be > 0",
                ));
            }
            let curve = consumer.protection.as_ref().and_then(|p| p.curve);
            if curve.is_some_and(|c| !c.is_alphabetic()) {
                errors.push(ConfigError::new(
                    format!("consumers[{i}].protection.curve"),
                    "must be a letter",
                ));
            }
        }

        errors
    }

    /// Panel settings assembled from the scalar sections.
    pub fn settings(&self) -> PanelSettings {
        PanelSettings {
            demand_factor: self.panel.demand_factor,
            simultaneity_factor: self.panel.simultaneity_factor,
            protection_standard: self.panel.protection_standard,
            max_short_circuit_ka: self.panel.max_short_circuit_ka,
            cable: self.cable.clone(),
            selection: self.selection.clone(),
        }
    }

    /// Builds the panel. Derived values stay empty until an engine
    /// recomputes it.
    pub fn into_panel(self) -> Panel {
        let mut panel = Panel::new(self.panel.name.clone(), self.settings());
        panel.consumers = self.consumers;
        panel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Insulation, Material};

    #[test]
    fn demo_preset_valid() {
        let cfg = ProjectConfig::demo();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "demo should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = ProjectConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ProjectConfig::PRESETS {
            let cfg = ProjectConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(errors.is_empty(), "preset \"{name}\" should be valid: {errors:?}");
        }
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[panel]
name = "ЩР-3"
demand_factor = 0.7
simultaneity_factor = 0.9
protection_standard = "iec60947"
max_short_circuit_ka = 6.0

[cable]
material = "Al"
insulation = "XLPE"
reserve_pct = 10

[selection]
high_margin = 0.85

[catalog]
devices = "catalog/devices.csv"

[[consumers]]
name = "Насос"
room = "Подвал"
voltage = 400
cos_phi = "0,8"
installed_power = 5500
cable_type = "АВБбШв"
cable_length = 40
laying = "ground"

[consumers.protection]
category = "breaker"
poles = "3P"
curve = "D"
accessories = ["НК"]

[[consumers]]
name = "Свет"
voltage = "230"
calculated_power = 400
section_override = 2.5
"#;
        let cfg = ProjectConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let Ok(cfg) = cfg else { return };
        assert!(cfg.validate().is_empty());
        assert_eq!(cfg.panel.protection_standard, ProtectionStandard::Iec60947);
        assert_eq!(cfg.cable.material, Material::Al);
        assert_eq!(cfg.cable.insulation, Insulation::Xlpe);
        // untouched fields keep defaults
        assert_eq!(cfg.cable.max_voltage_drop_pct, 4.0);
        assert_eq!(cfg.selection.low_margin, 0.87);
        assert_eq!(cfg.consumers.len(), 2);

        let pump = &cfg.consumers[0];
        assert_eq!(pump.cos_phi.value(), Some(0.8));
        assert_eq!(pump.laying, LayingMethod::Ground);
        let protection = pump.protection.as_ref().expect("protection parsed");
        assert_eq!(protection.poles, Some(PoleConfig::ThreeP));
        assert_eq!(protection.curve, Some('D'));
        assert!(protection.overload_protection);
        assert_eq!(cfg.consumers[1].section_override, Some(2.5));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[panel]
name = "x"
bogus_field = true
"#;
        assert!(ProjectConfig::from_toml_str(toml).is_err());

        let toml = r#"
[[consumers]]
name = "x"
wattage = 100
"#;
        assert!(ProjectConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_bad_margin() {
        let mut cfg = ProjectConfig::demo();
        cfg.selection.low_margin = 1.2;
        cfg.selection.high_margin = 0.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "selection.low_margin"));
        assert!(errors.iter().any(|e| e.field == "selection.high_margin"));
    }

    #[test]
    fn validation_catches_non_positive_factors() {
        let mut cfg = ProjectConfig::demo();
        cfg.panel.demand_factor = 0.0;
        cfg.panel.max_short_circuit_ka = Some(-1.0);
        cfg.cable.reserve_pct = -5.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "panel.demand_factor"));
        assert!(errors.iter().any(|e| e.field == "panel.max_short_circuit_ka"));
        assert!(errors.iter().any(|e| e.field == "cable.reserve_pct"));
    }

    #[test]
    fn validation_catches_bad_override() {
        let mut cfg = ProjectConfig::demo();
        cfg.consumers[1].section_override = Some(0.0);
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "consumers[1].section_override"));
    }

    #[test]
    fn catalog_paths_resolve_against_project_dir() {
        let catalog = CatalogConfig {
            devices: Some(PathBuf::from("cat/devices.csv")),
            cables: None,
        };
        let (devices, cables) = catalog.resolve(Path::new("/proj"), Path::new("/data"));
        assert_eq!(devices, PathBuf::from("/proj/cat/devices.csv"));
        assert_eq!(cables, PathBuf::from("/data/cables.csv"));
    }

    #[test]
    fn into_panel_carries_settings_and_order() {
        let panel = ProjectConfig::demo().into_panel();
        assert_eq!(panel.name, "ЩК-1");
        assert_eq!(panel.settings.demand_factor, 0.8);
        assert_eq!(panel.settings.max_short_circuit_ka, Some(4.5));
        assert_eq!(panel.consumers.len(), 5);
        assert_eq!(panel.consumers[0].name, "Освещение");
        assert!(panel.consumers[0].derived().current_a.is_none());
    }
}
