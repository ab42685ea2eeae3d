// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk — command-line scanning front end.
//
// ```text
// scanwerk                          Scan from the platform's TWAIN source
// scanwerk --script session.json    Replay a recorded session
// scanwerk --output <dir>           Write pages somewhere other than the data dir
// scanwerk --gen-config             Print the default configuration
// scanwerk --save-config            Persist the effective configuration
// ```

mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use scanwerk_bridge::SessionScript;
use scanwerk_core::config::AcquireConfig;
use scanwerk_core::error::Result;
use scanwerk_core::human_errors::humanize_error;
use scanwerk_core::types::DeviceRef;
use scanwerk_core::ScanError;

use services::{config_store, data_dir, export, pump};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "scanwerk", about = "Acquire pages from a TWAIN scanner")]
struct Cli {
    /// Replay a recorded session instead of talking to a scanner.
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Directory the pages are written to.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to the configuration JSON file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Name of the TWAIN source to open.
    #[arg(long)]
    device: Option<String>,

    /// Scan resolution in DPI.
    #[arg(long)]
    dpi: Option<u32>,

    /// Store every page losslessly.
    #[arg(long)]
    max_quality: bool,

    /// JPEG quality for lossy pages (1-100).
    #[arg(long)]
    jpeg_quality: Option<u8>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// Write the effective configuration back to the config file.
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    /// Fold command-line overrides into `config`.
    fn apply(&self, config: &mut AcquireConfig) {
        let settings = &mut config.default_settings;
        if let Some(name) = &self.device {
            settings.device = Some(DeviceRef::new(name.clone(), name.clone()));
        }
        if let Some(dpi) = self.dpi {
            settings.resolution_dpi = dpi;
        }
        if self.max_quality {
            settings.max_quality = true;
        }
        if let Some(quality) = self.jpeg_quality {
            settings.jpeg_quality = quality;
        }
    }
}

// ── Main ─────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.gen_config {
        return match serde_json::to_string_pretty(&AcquireConfig::default()) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(err) => report(&ScanError::from(err)),
        };
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Scanwerk starting");

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| config_store::config_path(&data_dir::data_dir()));
    let mut config = config_store::load_or_default(&config_path);
    cli.apply(&mut config);
    config.validate()?;

    if cli.save_config {
        config_store::persist_config(&config_path, &config)?;
        info!(path = %config_path.display(), "config saved");
    }

    let settings = config.default_settings.clone();
    let outcome = match &cli.script {
        Some(path) => pump::run_script(SessionScript::load(path)?, settings, &config),
        None => {
            let source = scanwerk_bridge::platform_source(settings.device.as_ref());
            pump::run_session(source, Vec::new(), settings, &config)
        }
    };

    if let Some(err) = &outcome.failure {
        error!(session = %outcome.session, error = %err, "scan failed");
    }
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| data_dir::data_subdir(&config.output_dir_name));
    let written = export::export_pages(&outcome, &output)?;
    for path in &written {
        println!("{}", path.display());
    }

    match outcome.failure {
        Some(err) => Err(err),
        None if written.is_empty() => Err(ScanError::AcquisitionFailed(
            "the scanner closed without sending any pages".into(),
        )),
        None => Ok(()),
    }
}

fn report(err: &ScanError) -> ExitCode {
    let human = humanize_error(err);
    eprintln!("{}", human.message);
    eprintln!("  {}", human.suggestion);
    ExitCode::FAILURE
}
