//! Cable cross-section sizing from the protective device rating.

use std::fmt;

use serde::Serialize;

use super::types::{CableDefaults, compact_number};
use crate::catalog::{CatalogStore, Insulation, LayingMethod, Material};

/// Cross-sections (mm²) stepped through when the catalog has no rows for a
/// material/insulation pair.
pub const FALLBACK_SECTIONS: [f64; 15] = [
    1.5, 2.5, 4.0, 6.0, 10.0, 16.0, 25.0, 35.0, 50.0, 70.0, 95.0, 120.0, 150.0, 185.0, 240.0,
];

/// Multiplier when the device only protects against short circuit.
pub const SHORT_CIRCUIT_ONLY_FACTOR: f64 = 1.45;
/// Multiplier when the device also protects against overload.
pub const OVERLOAD_PROTECTED_FACTOR: f64 = 1.13;
/// Ampacity derating for five-core cables.
pub const FIVE_CORE_DERATING: f64 = 0.93;

const ALUMINUM_MARKERS: [char; 2] = ['А', 'A'];
const XLPE_PREFIX: &str = "Пв";

/// Material and insulation encoded in a cable-type code.
///
/// The code may start with an aluminum marker (`А`); the rest starts with the
/// insulation marker. `Пв` means cross-linked polyethylene; PVC (`В`), generic
/// polymer (`П`), and anything unrecognized map to PVC.
///
/// # Examples
///
/// ```
/// use shield_sizer::catalog::{Insulation, Material};
/// use shield_sizer::sizing::cable::parse_cable_type;
///
/// assert_eq!(parse_cable_type("АПвБШв"), (Material::Al, Insulation::Xlpe));
/// assert_eq!(parse_cable_type("ВВГнг-LS"), (Material::Cu, Insulation::Pvc));
/// ```
pub fn parse_cable_type(code: &str) -> (Material, Insulation) {
    let code = code.trim();
    let (material, rest) = match code.strip_prefix(ALUMINUM_MARKERS) {
        Some(rest) => (Material::Al, rest),
        None => (Material::Cu, code),
    };
    let insulation = if rest.starts_with(XLPE_PREFIX) {
        Insulation::Xlpe
    } else {
        Insulation::Pvc
    };
    (material, insulation)
}

/// Number of cores for a supply voltage: five for three-phase, three otherwise.
pub fn core_count(voltage: f64) -> u8 {
    if voltage >= 380.0 { 5 } else { 3 }
}

/// Inputs for one sizing run.
#[derive(Debug, Clone)]
pub struct CableRequest<'a> {
    /// Cable type code; blank uses the panel's default material and insulation.
    pub cable_type: &'a str,
    /// Rated current of the protective device (A).
    pub rated_current_a: f64,
    pub overload_protection: bool,
    /// Nominal voltage (V).
    pub voltage: f64,
    pub laying: LayingMethod,
    /// Route length (m), when known.
    pub length_m: Option<f64>,
}

/// A sized cable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CableSelection {
    pub material: Material,
    pub insulation: Insulation,
    pub cores: u8,
    /// Conductor cross-section (mm²).
    pub section_mm2: f64,
    /// Run as single-core cables, one per conductor.
    pub single_core: bool,
    /// Ampacity the table had to meet (A).
    pub required_ampacity_a: f64,
}

impl CableSelection {
    /// Designation such as `3x2.5` or, for single-core runs, `5x(1x95)`.
    pub fn designation(&self) -> String {
        let section = compact_number(self.section_mm2);
        if self.single_core {
            format!("{}x(1x{section})", self.cores)
        } else {
            format!("{}x{section}", self.cores)
        }
    }
}

/// Outcome of sizing a cable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "cable", rename_all = "snake_case")]
pub enum CableChoice {
    Sized(CableSelection),
    /// No catalog cross-section carries the required current.
    NotFound {
        material: Material,
        insulation: Insulation,
        required_ampacity_a: f64,
    },
}

impl CableChoice {
    pub fn selection(&self) -> Option<&CableSelection> {
        match self {
            CableChoice::Sized(selection) => Some(selection),
            CableChoice::NotFound { .. } => None,
        }
    }
}

impl fmt::Display for CableChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CableChoice::Sized(selection) => f.write_str(&selection.designation()),
            CableChoice::NotFound { .. } => f.write_str("no section found"),
        }
    }
}

/// Material and insulation for a request, falling back to panel defaults for
/// a blank code.
pub fn conductor(cable_type: &str, defaults: &CableDefaults) -> (Material, Insulation) {
    if cable_type.trim().is_empty() {
        (defaults.material, defaults.insulation)
    } else {
        parse_cable_type(cable_type)
    }
}

/// Ampacity the table value must reach for a device rating.
pub fn required_ampacity(rated_current_a: f64, overload_protection: bool, cores: u8) -> f64 {
    let safety = if overload_protection {
        OVERLOAD_PROTECTED_FACTOR
    } else {
        SHORT_CIRCUIT_ONLY_FACTOR
    };
    let derating = if cores == 5 { FIVE_CORE_DERATING } else { 1.0 };
    rated_current_a * safety / derating
}

/// Selects the smallest compliant cross-section.
///
/// # Returns
///
/// [`CableChoice::NotFound`] when no catalog row for the material and
/// insulation reaches the required ampacity.
pub fn size(
    catalog: &impl CatalogStore,
    req: &CableRequest,
    defaults: &CableDefaults,
) -> CableChoice {
    let (material, insulation) = conductor(req.cable_type, defaults);
    let cores = core_count(req.voltage);
    let required = required_ampacity(req.rated_current_a, req.overload_protection, cores);

    let section = catalog
        .ampacity_rows(material, insulation)
        .into_iter()
        .filter(|row| row.ampacity(req.laying) >= required)
        .map(|row| row.section_mm2)
        .min_by(f64::total_cmp);

    match section {
        Some(section_mm2) => CableChoice::Sized(CableSelection {
            material,
            insulation,
            cores,
            section_mm2,
            single_core: is_single_core(req.length_m, defaults),
            required_ampacity_a: required,
        }),
        None => CableChoice::NotFound {
            material,
            insulation,
            required_ampacity_a: required,
        },
    }
}

/// Builds a selection for a hand-picked cross-section.
pub fn with_section(
    req: &CableRequest,
    defaults: &CableDefaults,
    section_mm2: f64,
) -> CableSelection {
    let (material, insulation) = conductor(req.cable_type, defaults);
    let cores = core_count(req.voltage);
    CableSelection {
        material,
        insulation,
        cores,
        section_mm2,
        single_core: is_single_core(req.length_m, defaults),
        required_ampacity_a: required_ampacity(req.rated_current_a, req.overload_protection, cores),
    }
}

fn is_single_core(length_m: Option<f64>, defaults: &CableDefaults) -> bool {
    length_m.is_some_and(|l| l > defaults.single_core_threshold_m)
}

/// Direction for manual cross-section stepping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Up,
    Down,
}

/// Sorted distinct cross-sections available for a material/insulation pair,
/// or [`FALLBACK_SECTIONS`] when the catalog has none.
pub fn section_ladder(
    catalog: &impl CatalogStore,
    material: Material,
    insulation: Insulation,
) -> Vec<f64> {
    let mut sections: Vec<f64> = catalog
        .ampacity_rows(material, insulation)
        .into_iter()
        .map(|row| row.section_mm2)
        .collect();
    if sections.is_empty() {
        return FALLBACK_SECTIONS.to_vec();
    }
    sections.sort_by(f64::total_cmp);
    sections.dedup();
    sections
}

/// Moves one position along `ladder`, clamping at either end.
///
/// A `current` value that is not on the ladder steps to the nearest rung in
/// the requested direction.
///
/// # Examples
///
/// ```
/// use shield_sizer::sizing::cable::{step_section, Step, FALLBACK_SECTIONS};
///
/// assert_eq!(step_section(&FALLBACK_SECTIONS, 2.5, Step::Up), Some(4.0));
/// assert_eq!(step_section(&FALLBACK_SECTIONS, 240.0, Step::Up), Some(240.0));
/// assert_eq!(step_section(&FALLBACK_SECTIONS, 1.5, Step::Down), Some(1.5));
/// ```
pub fn step_section(ladder: &[f64], current: f64, step: Step) -> Option<f64> {
    let first = *ladder.first()?;
    let last = *ladder.last()?;
    let next = match step {
        Step::Up => ladder.iter().copied().find(|&s| s > current).unwrap_or(last),
        Step::Down => ladder
            .iter()
            .rev()
            .copied()
            .find(|&s| s < current)
            .unwrap_or(first),
    };
    Some(next)
}
