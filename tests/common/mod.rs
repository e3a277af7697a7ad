//! Shared test fixtures for integration tests.

use std::path::PathBuf;

use shield_sizer::catalog::Catalog;
use shield_sizer::config::ProjectConfig;
use shield_sizer::sizing::types::{Consumer, InputField, Panel, ProtectionRequest};
use shield_sizer::sizing::Engine;

/// Directory of the bundled catalog CSVs.
pub fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

/// Bundled device and cable catalog.
pub fn bundled_catalog() -> Catalog {
    Catalog::from_dir(&data_dir()).expect("bundled catalog loads")
}

/// Demo preset panel, recomputed against `catalog`.
pub fn demo_panel(catalog: &Catalog) -> Panel {
    let mut panel = ProjectConfig::demo().into_panel();
    Engine::new(catalog).recompute(&mut panel);
    panel
}

/// Consumer with a default breaker request and a 20 m copper cable.
pub fn breaker_consumer(name: &str, voltage: &str, power_w: &str) -> Consumer {
    let mut consumer = Consumer::new(name);
    consumer.voltage = InputField::from(voltage);
    consumer.calculated_power = InputField::from(power_w);
    consumer.installed_power = InputField::from(power_w);
    consumer.cable_type = "ВВГнг-LS".to_string();
    consumer.cable_length = InputField::from("20");
    consumer.protection = Some(ProtectionRequest::default());
    consumer
}
