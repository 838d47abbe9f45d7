use std::path::PathBuf;

use clap::{Parser, Subcommand};
use env_logger::Env;
use multiome::{
    commands::run_pipeline,
    prelude::{ChromNaming, MultiomeError, PipelineConfig, UnassignedPolicy},
};

const INFO: &str = "\
multiome: integrate 10x single-cell expression and accessibility counts
usage: multiome [--help] <subcommand>

Subcommands:

  run: run the full integration pipeline on a 10x MEX directory.

";

#[derive(Parser)]
#[clap(name = "multiome")]
#[clap(about = INFO)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Run {
        /// a directory with the matrix.mtx, features.tsv, and barcodes.tsv
        /// files (each optionally gzip-compressed)
        #[arg(long, required = true)]
        counts: PathBuf,

        /// a GTF gene annotation, optionally gzip-compressed
        #[arg(long, required = true)]
        annotation: PathBuf,

        /// the directory all outputs are written to
        #[arg(long, required = true)]
        output: PathBuf,

        /// identifier prefix marking expression features
        #[arg(long, default_value = "ENSG")]
        gene_prefix: String,

        /// what to do with rows matching neither modality predicate
        #[arg(long, value_enum, default_value = "warn")]
        unassigned: UnassignedPolicy,

        /// force a chromosome naming convention instead of detecting it
        /// from the accessibility peaks
        #[arg(long, value_enum)]
        chrom_naming: Option<ChromNaming>,
    },
}

fn run() -> Result<(), MultiomeError> {
    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Run {
            counts,
            annotation,
            output,
            gene_prefix,
            unassigned,
            chrom_naming,
        }) => {
            let config = PipelineConfig {
                counts_dir: counts,
                annotation,
                output_dir: output,
                gene_prefix,
                unassigned,
                chrom_naming,
            };
            run_pipeline(&config)?;
            Ok(())
        }
        None => {
            println!("{}\n", INFO);
            std::process::exit(1);
        }
    }
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(error) = run() {
        eprintln!("Error: {}", error);
        std::process::exit(1);
    }
}
