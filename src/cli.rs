use std::path::PathBuf;

use clap::Parser;

/// Sizes protective devices and cables for a distribution panel.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Load the panel from a TOML project file
    #[arg(long, conflicts_with = "preset")]
    pub project: Option<PathBuf>,

    /// Use a built-in panel (demo)
    #[arg(long)]
    pub preset: Option<String>,

    /// Directory holding devices.csv and cables.csv; overrides the project's
    /// [catalog] section
    #[arg(long)]
    pub catalog_dir: Option<PathBuf>,

    /// Write consumer attributes to a CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    /// Start the REST API server after sizing
    #[cfg(feature = "api")]
    #[arg(long)]
    pub serve: bool,

    /// API server port
    #[cfg(feature = "api")]
    #[arg(long, default_value_t = 3000)]
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_arguments() {
        let cli = Cli::try_parse_from(["shield-sizer"]).expect("parses");
        assert!(cli.project.is_none());
        assert!(cli.preset.is_none());
        assert_eq!(cli.log_level, tracing::Level::INFO);
    }

    #[test]
    fn project_and_preset_conflict() {
        let result =
            Cli::try_parse_from(["shield-sizer", "--project", "a.toml", "--preset", "demo"]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_paths_and_level() {
        let cli = Cli::try_parse_from([
            "shield-sizer",
            "--preset",
            "demo",
            "--catalog-dir",
            "data",
            "--export",
            "out.csv",
            "--log-level",
            "debug",
        ])
        .expect("parses");
        assert_eq!(cli.preset.as_deref(), Some("demo"));
        assert_eq!(cli.catalog_dir, Some(PathBuf::from("data")));
        assert_eq!(cli.export, Some(PathBuf::from("out.csv")));
        assert_eq!(cli.log_level, tracing::Level::DEBUG);
    }
}
