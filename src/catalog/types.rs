//! Catalog record types: protective-device models, their variants, and cable
//! ampacity ratings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::additions::Additions;

/// Protective-device family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceCategory {
    /// Miniature circuit breaker.
    Breaker,
    /// Residual-current device without overcurrent protection.
    Rcd,
    /// Combined breaker and residual-current device.
    Rcbo,
}

impl DeviceCategory {
    /// Whether trip-curve and accessory filters apply to this family.
    pub fn has_trip_curve(self) -> bool {
        matches!(self, Self::Breaker | Self::Rcbo)
    }

    /// Whether the residual-current filter applies to this family.
    pub fn has_residual_current(self) -> bool {
        matches!(self, Self::Rcd | Self::Rcbo)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breaker => "breaker",
            Self::Rcd => "rcd",
            Self::Rcbo => "rcbo",
        }
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pole configuration from the fixed catalog vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PoleConfig {
    #[serde(rename = "1P")]
    OneP,
    #[serde(rename = "1P+N")]
    OnePN,
    #[serde(rename = "2P")]
    TwoP,
    #[serde(rename = "3P")]
    ThreeP,
    #[serde(rename = "3P+N")]
    ThreePN,
    #[serde(rename = "4P")]
    FourP,
}

impl PoleConfig {
    pub const ALL: [PoleConfig; 6] = [
        Self::OneP,
        Self::OnePN,
        Self::TwoP,
        Self::ThreeP,
        Self::ThreePN,
        Self::FourP,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneP => "1P",
            Self::OnePN => "1P+N",
            Self::TwoP => "2P",
            Self::ThreeP => "3P",
            Self::ThreePN => "3P+N",
            Self::FourP => "4P",
        }
    }

    /// Number of conductors switched by the device.
    pub fn conductor_count(self) -> u8 {
        match self {
            Self::OneP => 1,
            Self::OnePN | Self::TwoP => 2,
            Self::ThreeP => 3,
            Self::ThreePN | Self::FourP => 4,
        }
    }

    /// Parses a list such as `"1P+N/2P"` or `"3P, 4P"`. Unknown entries are
    /// reported by returning `None`.
    pub fn parse_list(text: &str) -> Option<Vec<PoleConfig>> {
        let mut poles = Vec::new();
        for part in text.split(['/', ',', ';']) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let pole = part.parse().ok()?;
            if !poles.contains(&pole) {
                poles.push(pole);
            }
        }
        Some(poles)
    }
}

impl FromStr for PoleConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c {
                'Р' | 'р' | 'p' => 'P',
                'n' | 'N' | 'Н' | 'н' => 'N',
                other => other,
            })
            .collect();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| format!("unknown pole configuration \"{s}\""))
    }
}

impl fmt::Display for PoleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One orderable variant of a catalog model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogVariant {
    /// Manufacturer article number; distinguishes otherwise identical rows.
    pub id: String,
    /// Rated current (A).
    pub rated_current: f64,
    /// Pole configurations this variant is offered in.
    pub poles: Vec<PoleConfig>,
    /// Service breaking capacity (kA), when the catalog lists it per variant.
    pub service_breaking_ka: Option<f64>,
    /// Residual trip current (mA) for RCD/RCBO variants.
    pub residual_ma: Option<u32>,
    /// Parsed additions column.
    pub additions: Additions,
}

/// A catalog model grouping variants of one product line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogModel {
    pub category: DeviceCategory,
    pub manufacturer: String,
    pub series: String,
    /// Model name; selection groups variants by this.
    pub name: String,
    /// Ultimate breaking capacity (kA) declared for the whole model.
    pub ultimate_breaking_ka: Option<f64>,
    pub variants: Vec<CatalogVariant>,
}

/// Conductor material.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Material {
    #[default]
    Cu,
    Al,
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cu => "Cu",
            Self::Al => "Al",
        })
    }
}

/// Conductor insulation class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Insulation {
    #[default]
    #[serde(rename = "PVC")]
    Pvc,
    #[serde(rename = "XLPE")]
    Xlpe,
}

impl fmt::Display for Insulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pvc => "PVC",
            Self::Xlpe => "XLPE",
        })
    }
}

/// How the cable is run; selects the ampacity column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayingMethod {
    #[default]
    Air,
    Ground,
}

/// Ampacity of one cross-section for a material/insulation pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableAmpacityRating {
    pub material: Material,
    pub insulation: Insulation,
    /// Conductor cross-section (mm²).
    pub section_mm2: f64,
    /// Continuous current when run in free air (A).
    pub ampacity_air: f64,
    /// Continuous current when buried (A).
    pub ampacity_ground: f64,
}

impl CableAmpacityRating {
    /// Ampacity for the given laying method.
    pub fn ampacity(&self, laying: LayingMethod) -> f64 {
        match laying {
            LayingMethod::Air => self.ampacity_air,
            LayingMethod::Ground => self.ampacity_ground,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pole_config_parses_vocabulary() {
        for pole in PoleConfig::ALL {
            assert_eq!(pole.as_str().parse::<PoleConfig>(), Ok(pole));
        }
        assert_eq!("1p + n".parse::<PoleConfig>(), Ok(PoleConfig::OnePN));
        assert!("5P".parse::<PoleConfig>().is_err());
    }

    #[test]
    fn pole_list_parsing() {
        let poles = PoleConfig::parse_list("1P+N/2P, 2P");
        assert_eq!(poles, Some(vec![PoleConfig::OnePN, PoleConfig::TwoP]));
        assert_eq!(PoleConfig::parse_list("1P/7P"), None);
        assert_eq!(PoleConfig::parse_list(""), Some(vec![]));
    }

    #[test]
    fn category_filters() {
        assert!(DeviceCategory::Breaker.has_trip_curve());
        assert!(!DeviceCategory::Breaker.has_residual_current());
        assert!(!DeviceCategory::Rcd.has_trip_curve());
        assert!(DeviceCategory::Rcbo.has_trip_curve());
        assert!(DeviceCategory::Rcbo.has_residual_current());
    }

    #[test]
    fn ampacity_column_follows_laying() {
        let row = CableAmpacityRating {
            material: Material::Cu,
            insulation: Insulation::Pvc,
            section_mm2: 2.5,
            ampacity_air: 27.0,
            ampacity_ground: 38.0,
        };
        assert_eq!(row.ampacity(LayingMethod::Air), 27.0);
        assert_eq!(row.ampacity(LayingMethod::Ground), 38.0);
    }
}
