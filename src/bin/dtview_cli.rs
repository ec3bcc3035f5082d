//! CLI tool for dtview - lays out a saved data response and prints the grid
//!
//! Usage:
//!   dtview_cli <response.json>                          # columns + window as JSON
//!   dtview_cli <response.json> --background heatmap-col # with a background mode
//!   dtview_cli <response.json> -o out.json              # write to a file
//!
//! Set `RUST_LOG=dtview=debug` to trace state propagation.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use dtview::grid::{GridState, RequestKind};
use dtview::layout::Viewport;
use dtview::view::{render_window, RenderWindow};
use dtview::{BackgroundMode, ColumnDef, DataResponse, DtviewError, GridConfig, SettingsUpdate};

#[derive(Parser)]
#[command(name = "dtview_cli")]
#[command(about = "Lay out a dataframe response the way the browser grid would")]
#[command(version)]
struct Cli {
    /// Data response JSON (`{columns, results, total, final_query}`)
    input: PathBuf,

    /// Background mode (`dtypes`, `missing`, `heatmap-col`, `heatmap-col-<name>`, ...)
    #[arg(long, short = 'b')]
    background: Option<BackgroundMode>,

    /// Upper bound on auto-sized column widths
    #[arg(long)]
    max_column_width: Option<f32>,

    /// Rotate header labels
    #[arg(long)]
    vertical_headers: bool,

    /// Viewport width in pixels
    #[arg(long, default_value_t = 1200.0)]
    width: f32,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 800.0)]
    height: f32,

    /// Write output here instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Output<'a> {
    columns: &'a [ColumnDef],
    header_height: f32,
    fixed_column_count: usize,
    window: RenderWindow,
}

fn run(cli: &Cli) -> Result<String, DtviewError> {
    let json = fs::read_to_string(&cli.input)?;
    let response: DataResponse = serde_json::from_str(&json)?;

    let config = GridConfig {
        max_column_width: cli.max_column_width,
        ..GridConfig::default()
    };
    let mut grid = GridState::new(config);
    let token = grid.begin_request(RequestKind::Data);
    grid.apply_data_response(token, response)?;
    grid.apply_settings_update(SettingsUpdate {
        background_mode: cli.background.clone(),
        vertical_headers: cli.vertical_headers.then_some(true),
        ..SettingsUpdate::default()
    });
    info!(
        columns = grid.columns.len(),
        rows = grid.row_count,
        mode = %grid.settings.background_mode,
        "laid out response"
    );

    let mut viewport = Viewport::new(cli.width, cli.height);
    viewport.clamp_scroll(&grid.layout());
    let window = render_window(&grid, &viewport, &dtview::i18n::Untranslated);

    let output = Output {
        columns: &grid.columns,
        header_height: grid.header_height,
        fixed_column_count: grid.fixed_column_count,
        window,
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let json = match run(&cli) {
        Ok(json) => json,
        Err(e) => {
            error!(input = %cli.input.display(), "{e}");
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let written = match &cli.output {
        Some(path) => fs::write(path, &json).map(|()| eprintln!("Written: {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(json.as_bytes())
                .and_then(|()| writeln!(stdout))
        }
    };
    if let Err(e) = written {
        eprintln!("Error writing output: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
