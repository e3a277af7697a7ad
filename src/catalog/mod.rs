//! Read-only reference data: protective-device catalog and cable ampacities.

/// Parser for the variant "additions" column.
pub mod additions;
pub mod store;
pub mod types;

pub use additions::Additions;
pub use store::{Catalog, CatalogStore};
pub use types::{
    CableAmpacityRating, CatalogModel, CatalogVariant, DeviceCategory, Insulation, LayingMethod,
    Material, PoleConfig,
};
