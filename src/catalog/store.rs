//! Catalog query trait and the in-memory catalog loaded from CSV.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::additions::Additions;
use super::types::{
    CableAmpacityRating, CatalogModel, CatalogVariant, DeviceCategory, Insulation, Material,
    PoleConfig,
};
use crate::error::CatalogError;

/// File name of the device table inside a catalog directory.
pub const DEVICES_FILE: &str = "devices.csv";
/// File name of the cable ampacity table inside a catalog directory.
pub const CABLES_FILE: &str = "cables.csv";

/// Read-only queries the sizing engine needs from the reference catalog.
///
/// Implementations must be safe to share between concurrent computations;
/// nothing in the engine mutates a catalog.
pub trait CatalogStore {
    /// All models of a device family, in catalog order.
    fn models(&self, category: DeviceCategory) -> Vec<&CatalogModel>;

    /// Ampacity rows for a material/insulation pair.
    fn ampacity_rows(&self, material: Material, insulation: Insulation)
    -> Vec<&CableAmpacityRating>;

    /// Models (with their variants) belonging to one series.
    fn series_models(&self, category: DeviceCategory, series: &str) -> Vec<&CatalogModel> {
        self.models(category)
            .into_iter()
            .filter(|m| m.series == series)
            .collect()
    }

    /// Distinct series names, optionally restricted to one manufacturer.
    fn series(&self, category: DeviceCategory, manufacturer: Option<&str>) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .models(category)
            .into_iter()
            .filter(|m| manufacturer.is_none_or(|name| m.manufacturer == name))
            .map(|m| m.series.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Distinct manufacturer names for a device family.
    fn manufacturers(&self, category: DeviceCategory) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .models(category)
            .into_iter()
            .map(|m| m.manufacturer.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// In-memory catalog. Built once, then only read.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    models: Vec<CatalogModel>,
    cables: Vec<CableAmpacityRating>,
}

impl CatalogStore for Catalog {
    fn models(&self, category: DeviceCategory) -> Vec<&CatalogModel> {
        self.models
            .iter()
            .filter(|m| m.category == category)
            .collect()
    }

    fn ampacity_rows(
        &self,
        material: Material,
        insulation: Insulation,
    ) -> Vec<&CableAmpacityRating> {
        self.cables
            .iter()
            .filter(|r| r.material == material && r.insulation == insulation)
            .collect()
    }
}

/// One row of `devices.csv`.
#[derive(Debug, Deserialize)]
struct DeviceRow {
    category: DeviceCategory,
    manufacturer: String,
    series: String,
    model: String,
    ultimate_ka: Option<f64>,
    id: String,
    rated_current: f64,
    poles: String,
    service_ka: Option<f64>,
    residual_ma: Option<u32>,
    #[serde(default)]
    additions: String,
}

impl Catalog {
    /// Builds a catalog from already-structured records.
    pub fn new(models: Vec<CatalogModel>, cables: Vec<CableAmpacityRating>) -> Self {
        Self { models, cables }
    }

    /// Every model, all families, in catalog order.
    pub fn all_models(&self) -> &[CatalogModel] {
        &self.models
    }

    /// Every cable ampacity row.
    pub fn cables(&self) -> &[CableAmpacityRating] {
        &self.cables
    }

    /// Looks up a variant by catalog id across all families.
    pub fn find_variant(&self, id: &str) -> Option<(&CatalogModel, &CatalogVariant)> {
        self.models.iter().find_map(|m| {
            m.variants
                .iter()
                .find(|v| v.id == id)
                .map(|v| (m, v))
        })
    }

    /// Loads `devices.csv` and `cables.csv` from a directory.
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` if either file is missing or malformed.
    pub fn from_dir(dir: &Path) -> Result<Self, CatalogError> {
        Self::from_paths(&dir.join(DEVICES_FILE), &dir.join(CABLES_FILE))
    }

    /// Loads the device and cable tables from explicit paths.
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` if either file is missing or malformed.
    pub fn from_paths(devices: &Path, cables: &Path) -> Result<Self, CatalogError> {
        let open = |path: &Path| {
            File::open(path).map_err(|source| CatalogError::Io {
                path: path.display().to_string(),
                source,
            })
        };
        let catalog = Self::from_readers(open(devices)?, open(cables)?)?;
        info!(
            models = catalog.models.len(),
            cable_rows = catalog.cables.len(),
            devices = %devices.display(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Parses the two CSV tables from arbitrary readers.
    ///
    /// Device rows sharing category, manufacturer, series, and model name are
    /// grouped into one [`CatalogModel`] in first-appearance order.
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` on undecodable rows, unknown pole
    /// configurations, non-positive ratings, or a model whose rows disagree on
    /// the model-level breaking capacity.
    pub fn from_readers(devices: impl Read, cables: impl Read) -> Result<Self, CatalogError> {
        Ok(Self {
            models: read_devices(devices)?,
            cables: read_cables(cables)?,
        })
    }
}

fn read_devices(reader: impl Read) -> Result<Vec<CatalogModel>, CatalogError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut models: Vec<CatalogModel> = Vec::new();
    let mut index: HashMap<(DeviceCategory, String, String, String), usize> = HashMap::new();

    for (i, row) in rdr.deserialize::<DeviceRow>().enumerate() {
        // header is line 1
        let line = i + 2;
        let row = row?;

        if !(row.rated_current.is_finite() && row.rated_current > 0.0) {
            return Err(CatalogError::Invalid {
                line,
                message: format!("rated_current must be > 0, got {}", row.rated_current),
            });
        }
        let poles = PoleConfig::parse_list(&row.poles).ok_or_else(|| CatalogError::Invalid {
            line,
            message: format!("unknown pole configuration in \"{}\"", row.poles),
        })?;

        let variant = CatalogVariant {
            id: row.id,
            rated_current: row.rated_current,
            poles,
            service_breaking_ka: row.service_ka,
            residual_ma: row.residual_ma,
            additions: Additions::parse(&row.additions),
        };

        let key = (
            row.category,
            row.manufacturer.clone(),
            row.series.clone(),
            row.model.clone(),
        );
        match index.get(&key) {
            Some(&pos) => {
                let model = &mut models[pos];
                if model.ultimate_breaking_ka != row.ultimate_ka {
                    return Err(CatalogError::Invalid {
                        line,
                        message: format!(
                            "model \"{}\" lists conflicting ultimate breaking capacities",
                            model.name
                        ),
                    });
                }
                model.variants.push(variant);
            }
            None => {
                index.insert(key, models.len());
                models.push(CatalogModel {
                    category: row.category,
                    manufacturer: row.manufacturer,
                    series: row.series,
                    name: row.model,
                    ultimate_breaking_ka: row.ultimate_ka,
                    variants: vec![variant],
                });
            }
        }
    }

    Ok(models)
}

fn read_cables(reader: impl Read) -> Result<Vec<CableAmpacityRating>, CatalogError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for (i, row) in rdr.deserialize::<CableAmpacityRating>().enumerate() {
        let row = row?;
        if !(row.section_mm2 > 0.0) {
            return Err(CatalogError::Invalid {
                line: i + 2,
                message: format!("section_mm2 must be > 0, got {}", row.section_mm2),
            });
        }
        rows.push(row);
    }
    Ok(rows)
}
