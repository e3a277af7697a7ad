//! shield-sizer entry point: CLI wiring, catalog loading, and panel output.

mod cli;

use std::io;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use shield_sizer::catalog::Catalog;
use shield_sizer::config::ProjectConfig;
use shield_sizer::error::SizerResult;
use shield_sizer::io::export::export_csv;
use shield_sizer::sizing::{Engine, Panel, PanelSummary};

use cli::Cli;

/// Catalog directory used when neither the CLI nor the project names one.
const DEFAULT_CATALOG_DIR: &str = "data";

/// Loads the project: `--project` takes priority, then `--preset`, then the
/// demo preset.
fn load_project(cli: &Cli) -> SizerResult<ProjectConfig> {
    let cfg = match (&cli.project, &cli.preset) {
        (Some(path), _) => ProjectConfig::from_toml_file(path)?,
        (None, Some(name)) => ProjectConfig::from_preset(name)?,
        (None, None) => ProjectConfig::demo(),
    };
    Ok(cfg)
}

fn load_catalog(cli: &Cli, cfg: &ProjectConfig) -> SizerResult<Catalog> {
    if let Some(dir) = &cli.catalog_dir {
        return Ok(Catalog::from_dir(dir)?);
    }
    let base_dir = cli
        .project
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let (devices, cables) = cfg
        .catalog
        .resolve(&base_dir, &PathBuf::from(DEFAULT_CATALOG_DIR));
    Ok(Catalog::from_paths(&devices, &cables)?)
}

fn print_panel(panel: &Panel) {
    for consumer in &panel.consumers {
        println!("{consumer}");
    }
    println!("\n{}", PanelSummary::from_panel(panel));
}

fn run(cli: Cli) -> SizerResult<()> {
    let cfg = load_project(&cli)?;

    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let catalog = load_catalog(&cli, &cfg)?;
    let mut panel = cfg.into_panel();
    Engine::new(&catalog).recompute(&mut panel);

    print_panel(&panel);

    if let Some(path) = &cli.export {
        export_csv(&panel.consumers, path)?;
        info!(path = %path.display(), "consumer attributes written");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(shield_sizer::api::AppState { panel, catalog });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(shield_sizer::api::serve(state, addr))?;
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: logging disabled: {e}");
    }

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
