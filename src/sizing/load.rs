//! Consumer operating current and panel-level load aggregates.

use super::types::{Consumer, PanelSettings, PanelTotals};

/// Line-to-line voltage of a three-phase supply (V).
pub const THREE_PHASE_VOLTAGE: f64 = 400.0;

/// Half-width of the band around 400 V classified as three-phase (V).
///
/// Used by current calculation and phase balancing alike.
pub const THREE_PHASE_TOLERANCE_V: f64 = 1.0;

/// Power factor assumed when none is given.
pub const DEFAULT_COS_PHI: f64 = 1.0;

/// Returns `true` when `voltage` denotes a three-phase supply.
pub fn is_three_phase(voltage: f64) -> bool {
    (voltage - THREE_PHASE_VOLTAGE).abs() <= THREE_PHASE_TOLERANCE_V
}

/// Operating current of a load.
///
/// * Single-phase: `I = P / (U · cosφ)`
/// * Three-phase: `I = P / (U · cosφ · √3)`
///
/// # Arguments
///
/// * `power_w` - Load power (W)
/// * `voltage` - Nominal voltage (V)
/// * `cos_phi` - Power factor; [`DEFAULT_COS_PHI`] when `None`
///
/// # Returns
///
/// `None` when power or voltage is missing or the result is not finite.
///
/// # Examples
///
/// ```
/// use shield_sizer::sizing::load::current;
///
/// let i = current(Some(2300.0), Some(230.0), None).unwrap();
/// assert!((i - 10.0).abs() < 1e-9);
/// ```
pub fn current(power_w: Option<f64>, voltage: Option<f64>, cos_phi: Option<f64>) -> Option<f64> {
    let power = power_w?;
    let voltage = voltage?;
    let cos_phi = cos_phi.unwrap_or(DEFAULT_COS_PHI);

    let divisor = if is_three_phase(voltage) {
        voltage * cos_phi * 3f64.sqrt()
    } else {
        voltage * cos_phi
    };

    Some(power / divisor).filter(|i| i.is_finite())
}

/// Power a consumer's current is computed from: calculated power, or the
/// installed power when no calculated value was entered.
pub fn demand_power(consumer: &Consumer) -> Option<f64> {
    consumer
        .calculated_power
        .value()
        .or_else(|| consumer.installed_power.value())
}

/// Operating current of a consumer from its own input fields, rounded to
/// two decimals.
///
/// The rounded value is the one shown to the user, and phase balancing and
/// device selection work from it too.
pub fn consumer_current(consumer: &Consumer) -> Option<f64> {
    current(
        demand_power(consumer),
        consumer.voltage.value(),
        consumer.cos_phi.value(),
    )
    .map(round_current)
}

/// Rounds a current to 0.01 A.
pub fn round_current(current_a: f64) -> f64 {
    (current_a * 100.0).round() / 100.0
}

/// Panel aggregates that depend only on consumer inputs and the two factors.
///
/// Phase totals are left at zero; the phase balancer fills them in.
pub fn aggregate(consumers: &[Consumer], settings: &PanelSettings) -> PanelTotals {
    let total_installed_w: f64 = consumers
        .iter()
        .filter_map(|c| c.installed_power.value())
        .sum();

    let total_calculated_w: f64 = consumers
        .iter()
        .filter_map(|c| c.calculated_power.value())
        .map(|p| p * settings.demand_factor * settings.simultaneity_factor)
        .sum();

    let cos_values: Vec<f64> = consumers.iter().filter_map(|c| c.cos_phi.value()).collect();
    let average_cos_phi = if cos_values.is_empty() {
        0.0
    } else {
        cos_values.iter().sum::<f64>() / cos_values.len() as f64
    };

    let total_current_a = if average_cos_phi > 0.0 {
        total_calculated_w / (3f64.sqrt() * THREE_PHASE_VOLTAGE * average_cos_phi)
    } else {
        0.0
    };

    // installed / calculated, the inverse of the textbook ratio
    let shield_demand_factor = if total_calculated_w > 0.0 {
        total_installed_w / total_calculated_w
    } else {
        0.0
    };

    PanelTotals {
        total_installed_w,
        total_calculated_w,
        average_cos_phi,
        total_current_a,
        shield_demand_factor,
        ..PanelTotals::default()
    }
}
