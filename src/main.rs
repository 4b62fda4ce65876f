mod cache;
mod cli;
mod coerce;
mod error;
mod export;
mod output;
mod pipeline;
mod readers;
mod types;

use clap::Parser;
use cli::{Cli, Commands, SourceArgs};
use error::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use types::{Result, ViewParams};

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Report {
            source,
            filters,
            metric,
            scale,
            out,
        }) => {
            let dataset = readers::load_table(&source.resolve()?)?;
            info!(
                source = %dataset.source_name,
                columns = dataset.columns().len(),
                encoding = dataset.encoding.label(),
                "dataset ready"
            );
            let params = ViewParams {
                filters: filters.to_selection(),
                metric,
                scale,
            };
            let dashboard = pipeline::build_dashboard(&dataset, &params);

            if let Some(out_path) = out {
                output::write_json_file(&dashboard, &out_path)?;
                info!(path = %out_path.display(), "report written");
            } else {
                output::write_json_stdout(&dashboard)?;
            }
        }
        Some(Commands::Export {
            source,
            filters,
            out,
        }) => {
            let mut session = cache::SessionCache::new();
            session.load(&source.resolve()?)?;
            let bytes = session.export(&filters.to_selection())?;
            std::fs::write(&out, bytes.as_slice())?;
            info!(path = %out.display(), bytes = bytes.len(), "filtered table written");
        }
        Some(Commands::Gui { source }) => run_gui(source)?,
        None => run_gui(SourceArgs::default())?,
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the default `info` level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_gui(source: SourceArgs) -> Result<()> {
    use crate::cli::GuiApp;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Beneficiary Dashboard",
        options,
        Box::new(move |_cc| Box::new(GuiApp::with_source(&source))),
    )
    .map_err(|e| Error::InvalidInput(format!("GUI error: {}", e)))?;

    Ok(())
}
