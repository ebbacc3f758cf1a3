//! vault-dedup - clean up duplicate entries in a password-manager export.

use anyhow::Result;
use clap::Parser;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use vault_dedup::{run, DedupOptions, NormalizeOptions, TracingObserver, FORMAT_NAMES};

/// Deduplicate password data exported from a vault.
#[derive(Parser, Debug)]
#[command(name = "vault-dedup", version)]
#[command(about = "Normalize and deduplicate entries in a password-manager export")]
struct Args {
    /// The exported file to read
    input_file: PathBuf,

    /// Where to write the cleaned export
    output_file: PathBuf,

    /// The format of the input file
    #[arg(short, long, value_parser = clap::builder::PossibleValuesParser::new(FORMAT_NAMES.iter().copied()))]
    format: String,

    /// Vaults to include (repeatable; default is all)
    #[arg(short, long = "vault", value_name = "VAULT_NAME")]
    vaults: Vec<String>,

    /// Title-case entry names that are not URLs
    #[arg(long)]
    title_case_names: bool,

    /// Keep URLs as exported instead of reducing them to scheme://host/
    #[arg(long)]
    keep_urls: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("vault_dedup=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let options = DedupOptions {
        format: args.format,
        vault_names: if args.vaults.is_empty() {
            None
        } else {
            Some(args.vaults.into_iter().collect::<BTreeSet<_>>())
        },
        normalize: NormalizeOptions {
            canonicalize_urls: !args.keep_urls,
            title_case_names: args.title_case_names,
        },
    };

    let report = run(&args.input_file, &args.output_file, &options, &mut TracingObserver)?;

    for vault in &report.vaults {
        println!(
            "{}: {} entries, {} duplicate groups, {} entries merged away",
            vault.name, vault.stats.records_in, vault.stats.duplicate_groups, vault.stats.records_removed
        );
    }
    println!(
        "Wrote {} ({} -> {} entries)",
        args.output_file.display(),
        report.totals.records_in,
        report.totals.records_out
    );

    Ok(())
}
