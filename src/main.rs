// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::path::PathBuf;

use clap::{crate_version, Parser, Subcommand};
use songwalker_library::convert::{self, ConvertOptions};
use songwalker_library::indexer;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Builds and indexes the SongWalker preset library."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Converts webaudiofont descriptors into presets and audio files.
    Convert {
        /// The dataset root containing the name table and descriptor directories.
        #[arg(short, long, default_value = "../samples/webaudiofontdata/public")]
        source: PathBuf,
        /// The directory the library is written to.
        #[arg(short, long, default_value = "./library-output")]
        output: PathBuf,
        /// Computes everything and reports it without writing any files.
        #[arg(long)]
        dry_run: bool,
        /// Stops after this many instruments have been converted.
        #[arg(short, long)]
        limit: Option<usize>,
        /// The path to the converter settings file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Rebuilds every index under an existing library tree.
    Index {
        /// The root of the library tree.
        #[arg(default_value = "./library-output")]
        library_dir: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            source,
            output,
            dry_run,
            limit,
            config,
        } => {
            let mut options = ConvertOptions::new(&source, &output);
            options.dry_run = dry_run;
            options.limit = limit;
            options.settings = convert::load_settings(config.as_deref())?;

            let report = convert::convert(&options)?;
            if dry_run {
                println!("Dry run, nothing was written to {}.", output.display());
            }
            println!("Converted {} instruments:", report.converted);
            println!("- libraries: {}", report.libraries);
            println!("- zones: {}", report.zones);
            println!("- audio files written: {}", report.blobs_written);
            println!("- duplicate audio reused: {}", report.dedup_hits);
            println!("- empty instruments: {}", report.empty);
            println!("- skipped files: {}", report.skipped);
            println!("- errors: {}", report.errors);
        }
        Commands::Index { library_dir } => {
            let report = indexer::run(&library_dir)?;
            println!(
                "Indexed {} presets in {} libraries ({} errors).",
                report.presets, report.libraries, report.errors
            );
        }
    }

    Ok(())
}
