//! Catalog-driven protective-device selection.
//!
//! Selection runs in four steps:
//!
//! 1. Hard filters on every variant (breaking capacity, rated current, poles,
//!    curve, accessories, residual current).
//! 2. Per model, pick the smallest surviving rated current, or the next tier
//!    when the load would use too much of the smallest one.
//! 3. Collapse variants of the chosen tier that differ only in catalog id.
//! 4. Rank by rated current, then model name.
//!
//! An empty result means nothing in the catalog complies. There is no
//! relaxation or fallback.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use super::types::{ProtectionStandard, SelectionThresholds, compact_number};
use crate::catalog::additions::curve_letter;
use crate::catalog::{CatalogModel, CatalogStore, CatalogVariant, DeviceCategory, PoleConfig};

/// Constraints for one selection run.
#[derive(Debug, Clone)]
pub struct SelectionRequest<'a> {
    pub category: DeviceCategory,
    /// Restrict to one catalog series.
    pub series: Option<&'a str>,
    pub poles: Option<PoleConfig>,
    /// Trip curve; ignored for RCDs.
    pub curve: Option<char>,
    /// Accessories that must all be present; ignored for RCDs.
    pub accessories: &'a [String],
    /// Residual trip current (mA); ignored for breakers.
    pub residual_ma: Option<u32>,
    /// Load current the device must carry (A).
    pub load_current_a: f64,
    /// Prospective short-circuit current the device must break (kA).
    pub max_short_circuit_ka: Option<f64>,
    pub standard: ProtectionStandard,
    pub thresholds: &'a SelectionThresholds,
}

/// One ranked, selectable catalog row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub id: String,
    pub category: DeviceCategory,
    pub manufacturer: String,
    pub series: String,
    pub model: String,
    pub rated_current: f64,
    pub poles: Vec<PoleConfig>,
    pub curve: Option<char>,
    pub accessories: BTreeSet<String>,
    pub residual_ma: Option<u32>,
    /// The breaking capacity that was checked (kA).
    pub breaking_ka: Option<f64>,
}

impl Candidate {
    fn new(model: &CatalogModel, variant: &CatalogVariant, standard: ProtectionStandard) -> Self {
        Self {
            id: variant.id.clone(),
            category: model.category,
            manufacturer: model.manufacturer.clone(),
            series: model.series.clone(),
            model: model.name.clone(),
            rated_current: variant.rated_current,
            poles: variant.poles.clone(),
            curve: variant.additions.curve,
            accessories: variant.additions.accessories.clone(),
            residual_ma: variant.residual_ma,
            breaking_ka: breaking_capacity(model, variant, standard),
        }
    }

    /// Human-readable designation, e.g. `ABB S201 C16 1P` or
    /// `ABB F202 25A 30mA 2P`.
    pub fn description(&self, poles: Option<PoleConfig>) -> String {
        let mut text = format!("{} {} ", self.manufacturer, self.model);
        match self.curve {
            Some(curve) => {
                text.push(curve);
                text.push_str(&compact_number(self.rated_current));
            }
            None => {
                text.push_str(&compact_number(self.rated_current));
                text.push('A');
            }
        }
        if let Some(ma) = self.residual_ma {
            text.push_str(&format!(" {ma}mA"));
        }
        if let Some(pole) = poles.or_else(|| self.poles.first().copied()) {
            // some models carry the poles in their name ("ВД1-63 2P")
            if !self.model.split_whitespace().any(|token| token == pole.as_str()) {
                text.push(' ');
                text.push_str(pole.as_str());
            }
        }
        text
    }
}

/// Device recorded on a consumer after selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedDevice {
    pub id: String,
    pub category: DeviceCategory,
    pub description: String,
    pub poles: Option<PoleConfig>,
    pub rated_current: f64,
}

impl SelectedDevice {
    /// Records `candidate`, preferring the requested pole configuration for
    /// the pole count.
    pub fn from_candidate(candidate: &Candidate, requested_poles: Option<PoleConfig>) -> Self {
        let poles = requested_poles.or_else(|| candidate.poles.first().copied());
        Self {
            id: candidate.id.clone(),
            category: candidate.category,
            description: candidate.description(poles),
            poles,
            rated_current: candidate.rated_current,
        }
    }

    /// Number of switched conductors, when known.
    pub fn pole_count(&self) -> Option<u8> {
        self.poles.map(PoleConfig::conductor_count)
    }
}

/// Breaking capacity that applies under `standard`.
pub fn breaking_capacity(
    model: &CatalogModel,
    variant: &CatalogVariant,
    standard: ProtectionStandard,
) -> Option<f64> {
    match standard {
        ProtectionStandard::Iec60947 => model.ultimate_breaking_ka,
        ProtectionStandard::Iec60898 => variant.service_breaking_ka,
    }
}

/// Returns `true` if the variant passes every hard filter.
///
/// A variant with no rating for the applicable breaking capacity cannot be
/// shown to withstand the fault and is rejected whenever a fault level is
/// given.
pub fn passes_filters(model: &CatalogModel, variant: &CatalogVariant, req: &SelectionRequest) -> bool {
    if let Some(required) = req.max_short_circuit_ka {
        match breaking_capacity(model, variant, req.standard) {
            Some(rating) if rating >= required => {}
            _ => return false,
        }
    }
    if variant.rated_current < req.load_current_a {
        return false;
    }
    if let Some(pole) = req.poles {
        if !variant.poles.contains(&pole) {
            return false;
        }
    }
    if req.category.has_trip_curve() {
        if let Some(curve) = req.curve {
            if variant.additions.curve != Some(curve_letter(curve)) {
                return false;
            }
        }
        if !variant.additions.has_all(req.accessories) {
            return false;
        }
    }
    if req.category.has_residual_current() {
        if let Some(ma) = req.residual_ma {
            if variant.residual_ma != Some(ma) {
                return false;
            }
        }
    }
    true
}

/// Slack on the margin comparison, so a load that is exactly at the margin in
/// decimal (8.70 A on 10 A against 0.87) escalates despite binary rounding.
const UTILIZATION_TOLERANCE: f64 = 1e-9;

/// Picks the rated-current tier for one model.
///
/// `tiers` must be sorted ascending and free of duplicates. Returns `None`
/// only for an empty list.
///
/// # Examples
///
/// ```
/// use shield_sizer::sizing::device::choose_tier;
/// use shield_sizer::sizing::types::SelectionThresholds;
///
/// let t = SelectionThresholds { breakpoint_a: 40.0, low_margin: 0.87, high_margin: 0.9 };
/// // 14 / 16 = 0.875 >= 0.87, so the next tier is taken
/// assert_eq!(choose_tier(&[16.0, 20.0], 14.0, &t), Some(20.0));
/// assert_eq!(choose_tier(&[16.0, 20.0], 13.0, &t), Some(16.0));
/// ```
pub fn choose_tier(tiers: &[f64], load_current_a: f64, thresholds: &SelectionThresholds) -> Option<f64> {
    let first = *tiers.first()?;
    let utilization = load_current_a / first;
    let margin = if load_current_a < thresholds.breakpoint_a {
        thresholds.low_margin
    } else {
        thresholds.high_margin
    };
    match tiers.get(1) {
        Some(&next) if utilization >= margin - UTILIZATION_TOLERANCE => Some(next),
        _ => Some(first),
    }
}

/// Runs the full selection against the catalog and returns the ranked list.
pub fn select(catalog: &impl CatalogStore, req: &SelectionRequest) -> Vec<Candidate> {
    let models = match req.series {
        Some(series) => catalog.series_models(req.category, series),
        None => catalog.models(req.category),
    };

    // Survivors grouped by model name, first-seen order.
    let mut groups: Vec<(&str, Vec<(&CatalogModel, &CatalogVariant)>)> = Vec::new();
    for model in models {
        for variant in &model.variants {
            if !passes_filters(model, variant, req) {
                continue;
            }
            match groups.iter_mut().find(|(name, _)| *name == model.name) {
                Some((_, members)) => members.push((model, variant)),
                None => groups.push((model.name.as_str(), vec![(model, variant)])),
            }
        }
    }

    let mut candidates = Vec::new();
    for (name, members) in groups {
        let mut tiers: Vec<f64> = members.iter().map(|(_, v)| v.rated_current).collect();
        tiers.sort_by(f64::total_cmp);
        tiers.dedup();

        let Some(tier) = choose_tier(&tiers, req.load_current_a, req.thresholds) else {
            continue;
        };
        debug!(
            model = name,
            load_a = req.load_current_a,
            first_a = tiers[0],
            chosen_a = tier,
            "rated-current tier chosen"
        );

        let mut seen: Vec<DedupKey> = Vec::new();
        for (model, variant) in members {
            if variant.rated_current != tier {
                continue;
            }
            let key = DedupKey::new(model, variant);
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            candidates.push(Candidate::new(model, variant, req.standard));
        }
    }

    candidates.sort_by(|a, b| {
        a.rated_current
            .total_cmp(&b.rated_current)
            .then_with(|| a.model.cmp(&b.model))
    });
    candidates
}

/// Looks up a candidate by catalog id.
pub fn find_by_id<'a>(candidates: &'a [Candidate], id: &str) -> Option<&'a Candidate> {
    candidates.iter().find(|c| c.id == id)
}

/// The fields a user sees for a variant; catalog ids are left out.
#[derive(Debug, PartialEq)]
struct DedupKey {
    ultimate_ka: Option<u64>,
    service_ka: Option<u64>,
    curve: Option<char>,
    poles: Vec<PoleConfig>,
    residual_ma: Option<u32>,
}

impl DedupKey {
    fn new(model: &CatalogModel, variant: &CatalogVariant) -> Self {
        Self {
            ultimate_ka: model.ultimate_breaking_ka.map(f64::to_bits),
            service_ka: variant.service_breaking_ka.map(f64::to_bits),
            curve: variant.additions.curve,
            poles: variant.poles.clone(),
            residual_ma: variant.residual_ma,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Additions, Catalog};

    fn variant(id: &str, rated: f64, poles: &[PoleConfig], additions: &str) -> CatalogVariant {
        CatalogVariant {
            id: id.to_string(),
            rated_current: rated,
            poles: poles.to_vec(),
            service_breaking_ka: Some(6.0),
            residual_ma: None,
            additions: Additions::parse(additions),
        }
    }

    fn breaker_model(name: &str, ultimate: f64, variants: Vec<CatalogVariant>) -> CatalogModel {
        CatalogModel {
            category: DeviceCategory::Breaker,
            manufacturer: "ABB".to_string(),
            series: "S200".to_string(),
            name: name.to_string(),
            ultimate_breaking_ka: Some(ultimate),
            variants,
        }
    }

    fn catalog() -> Catalog {
        use PoleConfig::*;
        Catalog::new(
            vec![
                breaker_model(
                    "S201",
                    10.0,
                    vec![
                        variant("a10", 10.0, &[OneP], "Кривая C"),
                        variant("a16", 16.0, &[OneP], "Кривая C"),
                        variant("a16b", 16.0, &[OneP], "Кривая B"),
                        variant("a20", 20.0, &[OneP], "Кривая C; НК"),
                    ],
                ),
                breaker_model(
                    "S203",
                    10.0,
                    vec![
                        variant("c16", 16.0, &[ThreeP], "Кривая C"),
                        variant("c25", 25.0, &[ThreeP], "Кривая C"),
                    ],
                ),
            ],
            vec![],
        )
    }

    fn request(load: f64, thresholds: &SelectionThresholds) -> SelectionRequest<'_> {
        SelectionRequest {
            category: DeviceCategory::Breaker,
            series: None,
            poles: None,
            curve: None,
            accessories: &[],
            residual_ma: None,
            load_current_a: load,
            max_short_circuit_ka: None,
            standard: ProtectionStandard::Iec60898,
            thresholds,
        }
    }

    #[test]
    fn margin_rule_escalates_near_rating() {
        let t = SelectionThresholds::default();
        assert_eq!(choose_tier(&[16.0, 20.0], 14.0, &t), Some(20.0));
        assert_eq!(choose_tier(&[16.0, 20.0], 13.9, &t), Some(16.0));
    }

    #[test]
    fn single_tier_never_escalates() {
        let t = SelectionThresholds::default();
        assert_eq!(choose_tier(&[16.0], 15.9, &t), Some(16.0));
        assert_eq!(choose_tier(&[], 1.0, &t), None);
    }

    #[test]
    fn load_exactly_at_margin_escalates() {
        let t = SelectionThresholds::default();
        // 13.92 / 16 and 8.7 / 10 are both 0.87 in decimal
        assert_eq!(choose_tier(&[16.0, 20.0], 13.92, &t), Some(20.0));
        assert_eq!(choose_tier(&[10.0, 16.0], 8.7, &t), Some(16.0));
        assert_eq!(choose_tier(&[10.0, 16.0], 8.69, &t), Some(10.0));
    }

    #[test]
    fn high_regime_uses_high_margin() {
        let t = SelectionThresholds {
            breakpoint_a: 40.0,
            low_margin: 0.5,
            high_margin: 0.95,
        };
        // 45 / 50 = 0.9 < 0.95
        assert_eq!(choose_tier(&[50.0, 63.0], 45.0, &t), Some(50.0));
        // 48 / 50 = 0.96 >= 0.95
        assert_eq!(choose_tier(&[50.0, 63.0], 48.0, &t), Some(63.0));
    }

    #[test]
    fn one_tier_per_model_sorted_by_current_then_name() {
        let t = SelectionThresholds::default();
        let result = select(&catalog(), &request(9.0, &t));
        // S201: 9/10 = 0.9 → 16 A tier (two visible variants: curve C and B)
        // S203: 9/16 < 0.87 → 16 A
        let ids: Vec<&str> = result.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a16", "a16b", "c16"]);
    }

    #[test]
    fn filters_poles_curve_and_accessories() {
        let t = SelectionThresholds::default();
        let accessories = vec!["НК".to_string()];
        let req = SelectionRequest {
            poles: Some(PoleConfig::OneP),
            curve: Some('c'),
            accessories: &accessories,
            ..request(1.0, &t)
        };
        let result = select(&catalog(), &req);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "a20");
    }

    #[test]
    fn rated_current_below_load_is_discarded() {
        let t = SelectionThresholds::default();
        let result = select(&catalog(), &request(21.0, &t));
        let ids: Vec<&str> = result.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c25"]);
    }

    #[test]
    fn breaking_capacity_follows_standard() {
        let t = SelectionThresholds::default();
        let mut req = request(1.0, &t);
        req.max_short_circuit_ka = Some(8.0);

        // variant service rating is 6 kA
        req.standard = ProtectionStandard::Iec60898;
        assert!(select(&catalog(), &req).is_empty());

        // model ultimate rating is 10 kA
        req.standard = ProtectionStandard::Iec60947;
        assert!(!select(&catalog(), &req).is_empty());
    }

    #[test]
    fn duplicates_differing_only_by_id_collapse() {
        use PoleConfig::*;
        let cat = Catalog::new(
            vec![breaker_model(
                "S201",
                6.0,
                vec![
                    variant("x1", 16.0, &[OneP], "Кривая C"),
                    variant("x2", 16.0, &[OneP], "Кривая C"),
                    variant("x3", 16.0, &[OneP], "Кривая C; НК"),
                ],
            )],
            vec![],
        );
        let t = SelectionThresholds::default();
        let result = select(&cat, &request(1.0, &t));
        // accessories are not part of the visible combination
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "x1");
    }

    #[test]
    fn impossible_constraint_yields_empty_list() {
        let t = SelectionThresholds::default();
        let req = SelectionRequest {
            category: DeviceCategory::Rcbo,
            residual_ma: Some(999),
            ..request(1.0, &t)
        };
        assert!(select(&catalog(), &req).is_empty());
    }

    fn rcbo_variant(id: &str, rated: f64, residual_ma: u32) -> CatalogVariant {
        CatalogVariant {
            residual_ma: Some(residual_ma),
            ..variant(id, rated, &[PoleConfig::OnePN], "Кривая C")
        }
    }

    fn rcbo_catalog() -> Catalog {
        let model = |name: &str, variants| CatalogModel {
            category: DeviceCategory::Rcbo,
            manufacturer: "ABB".to_string(),
            series: "DS201".to_string(),
            name: name.to_string(),
            ultimate_breaking_ka: Some(6.0),
            variants,
        };
        Catalog::new(
            vec![
                model(
                    "DS201 C",
                    vec![
                        rcbo_variant("d16-30", 16.0, 30),
                        rcbo_variant("d16-100", 16.0, 100),
                        rcbo_variant("d20-30", 20.0, 30),
                    ],
                ),
                model(
                    "DS201 C 100mA",
                    vec![rcbo_variant("e16-100", 16.0, 100), rcbo_variant("e25-100", 25.0, 100)],
                ),
            ],
            vec![],
        )
    }

    #[test]
    fn residual_current_must_match_exactly() {
        let t = SelectionThresholds::default();
        let rcbo = |residual_ma| SelectionRequest {
            category: DeviceCategory::Rcbo,
            residual_ma,
            ..request(5.0, &t)
        };

        let result = select(&rcbo_catalog(), &rcbo(Some(100)));
        let ids: Vec<&str> = result.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["d16-100", "e16-100"]);
        assert!(result.iter().all(|c| c.residual_ma == Some(100)));

        let result = select(&rcbo_catalog(), &rcbo(Some(30)));
        let ids: Vec<&str> = result.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["d16-30"]);

        assert!(select(&rcbo_catalog(), &rcbo(Some(300))).is_empty());

        // without a residual filter both ratings of the 16 A tier are offered
        assert_eq!(select(&rcbo_catalog(), &rcbo(None)).len(), 3);
    }

    #[test]
    fn description_skips_poles_already_in_model_name() {
        let t = SelectionThresholds::default();
        let cat = Catalog::new(
            vec![CatalogModel {
                category: DeviceCategory::Rcd,
                manufacturer: "IEK".to_string(),
                series: "ВД1-63".to_string(),
                name: "ВД1-63 2P".to_string(),
                ultimate_breaking_ka: None,
                variants: vec![CatalogVariant {
                    residual_ma: Some(30),
                    ..variant("v16", 16.0, &[PoleConfig::TwoP], "")
                }],
            }],
            vec![],
        );
        let req = SelectionRequest {
            category: DeviceCategory::Rcd,
            ..request(5.0, &t)
        };
        let result = select(&cat, &req);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].description(None), "IEK ВД1-63 2P 16A 30mA");
        assert_eq!(
            result[0].description(Some(PoleConfig::TwoP)),
            "IEK ВД1-63 2P 16A 30mA"
        );
    }

    #[test]
    fn description_and_lookup() {
        let t = SelectionThresholds::default();
        let result = select(&catalog(), &request(9.0, &t));
        let c = find_by_id(&result, "c16").expect("candidate present");
        assert_eq!(c.description(None), "ABB S203 C16 3P");
        let selected = SelectedDevice::from_candidate(c, None);
        assert_eq!(selected.pole_count(), Some(3));
        assert!(find_by_id(&result, "a10").is_none());
    }
}
