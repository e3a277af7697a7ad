//! Voltage-drop and end-of-line short-circuit verification.

use std::fmt;

use serde::Serialize;

use super::types::CableDefaults;
use crate::catalog::Material;

/// Phase-to-neutral reference voltage for fault-loop calculations (V).
pub const FAULT_REFERENCE_VOLTAGE: f64 = 230.0;

/// Voltage at or above which a circuit is treated as three-phase for
/// verification and core count (V).
pub const THREE_PHASE_MIN_VOLTAGE: f64 = 380.0;

/// Conductor resistivity (Ω·mm²/m) at `temp_c`.
pub fn resistivity(material: Material, temp_c: f64) -> f64 {
    match material {
        Material::Cu => 0.018 * (1.0 + 0.00393 * (temp_c - 20.0)),
        Material::Al => 0.028 * (1.0 + 0.00403 * (temp_c - 20.0)),
    }
}

/// Route length plus reserve, descent, and termination allowances (m).
pub fn effective_length(length_m: f64, defaults: &CableDefaults) -> f64 {
    length_m * (1.0 + (defaults.reserve_pct + defaults.descent_pct) / 100.0)
        + defaults.termination_m
}

/// Cable geometry and conductor data shared by both checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub material: Material,
    /// Route length before allowances (m).
    pub length_m: f64,
    /// Conductor cross-section (mm²).
    pub section_mm2: f64,
}

impl Line {
    /// Resistance (Ω) and reactance (Ω) of one conductor over the effective
    /// length.
    fn impedance(&self, defaults: &CableDefaults) -> (f64, f64) {
        let length = effective_length(self.length_m, defaults);
        let r = resistivity(self.material, defaults.ambient_temp_c) * length / self.section_mm2;
        let x = defaults.reactance_per_km / 1000.0 * length;
        (r, x)
    }
}

/// Result of a voltage-drop check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoltageDrop {
    pub volts: f64,
    /// Drop relative to nominal voltage (%).
    pub percent: f64,
    /// Above the panel's permitted drop.
    pub exceeds_limit: bool,
}

impl fmt::Display for VoltageDrop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.percent)?;
        if self.exceeds_limit {
            f.write_str(" ⚠")?;
        }
        Ok(())
    }
}

/// Voltage drop along a cable.
///
/// * three-phase (U ≥ 380 V): `ΔU = √3 · I · (R cosφ + X sinφ)`
/// * single-phase: `ΔU = 2 · I · (R cosφ + X sinφ)`
///
/// # Returns
///
/// `None` for a non-positive voltage, a non-positive cross-section, or a
/// non-finite result.
pub fn voltage_drop(
    line: &Line,
    current_a: f64,
    voltage: f64,
    cos_phi: f64,
    defaults: &CableDefaults,
) -> Option<VoltageDrop> {
    if voltage <= 0.0 || line.section_mm2 <= 0.0 {
        return None;
    }
    let (r, x) = line.impedance(defaults);
    let sin_phi = (1.0 - cos_phi * cos_phi).max(0.0).sqrt();
    let factor = if voltage >= THREE_PHASE_MIN_VOLTAGE {
        3f64.sqrt()
    } else {
        2.0
    };
    let volts = factor * current_a * (r * cos_phi + x * sin_phi);
    let percent = volts / voltage * 100.0;
    if !(volts.is_finite() && percent.is_finite()) {
        return None;
    }
    Some(VoltageDrop {
        volts,
        percent,
        exceeds_limit: percent > defaults.max_voltage_drop_pct,
    })
}

/// Prospective short-circuit current at the cable end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortCircuit {
    /// Fault current (kA).
    CurrentKa(f64),
    /// Zero loop impedance.
    Unbounded,
}

impl fmt::Display for ShortCircuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShortCircuit::CurrentKa(ka) => write!(f, "{ka:.3}"),
            ShortCircuit::Unbounded => f.write_str("∞"),
        }
    }
}

/// Fault current at the end of a cable fed from a busbar with
/// `max_short_circuit_ka` available.
///
/// The source is modelled as a pure reactance `230 / Ik`. Single-phase
/// circuits double the conductor impedance for the phase-neutral loop.
///
/// An unlimited busbar (`f64::INFINITY`) has no source reactance, so a
/// zero-length line gives zero loop impedance and
/// [`ShortCircuit::Unbounded`].
///
/// # Returns
///
/// `None` when the busbar fault level or cross-section is not positive.
pub fn short_circuit(
    line: &Line,
    voltage: f64,
    max_short_circuit_ka: f64,
    defaults: &CableDefaults,
) -> Option<ShortCircuit> {
    if max_short_circuit_ka <= 0.0 || line.section_mm2 <= 0.0 {
        return None;
    }
    let x_system = FAULT_REFERENCE_VOLTAGE / (max_short_circuit_ka * 1000.0);
    let loop_factor = if voltage >= THREE_PHASE_MIN_VOLTAGE {
        1.0
    } else {
        2.0
    };
    let (r, x) = line.impedance(defaults);
    let r_cable = r * loop_factor;
    let x_cable = x * loop_factor;
    let z = (r_cable * r_cable + (x_cable + x_system).powi(2)).sqrt();
    if z == 0.0 {
        return Some(ShortCircuit::Unbounded);
    }
    let amps = FAULT_REFERENCE_VOLTAGE / z;
    amps.is_finite().then(|| ShortCircuit::CurrentKa(amps / 1000.0))
}
