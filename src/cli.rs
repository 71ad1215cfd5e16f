use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use csvsteward::analyser::logic::{self, IngestFormat, Table, cleaning};
use csvsteward::config;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "csvsteward", about = "CSV profiling and cleaning service")]
pub struct Cli {
    /// Path to a JSON settings file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service
    Serve {
        /// Listen address, overriding the settings file
        #[arg(long)]
        bind: Option<String>,
    },
    /// Profile a file and print the profile as JSON
    Profile {
        file: PathBuf,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Clean a file and save the result
    Clean {
        file: PathBuf,

        /// Drop rows that repeat an earlier row
        #[arg(long)]
        remove_duplicates: bool,

        /// Drop rows with any missing cell
        #[arg(long)]
        remove_missing: bool,

        /// Apply the suggested normalization to a column (repeatable)
        #[arg(long = "normalize", value_name = "COLUMN")]
        normalize: Vec<String>,

        /// Output path. Defaults to `<stem>_cleaned.csv` next to the input.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub async fn run_command(cli: Cli) -> Result<()> {
    let mut settings = config::load_settings(cli.config.as_deref())?;
    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                settings.bind = bind;
            }
            csvsteward::logging::init(settings.log_dir.as_deref())?;
            csvsteward::server::run_server(&settings).await
        }
        Commands::Profile { file, pretty } => {
            let table = load_table(&file, &settings.null_tokens)?;
            let profile = logic::profile(&table, &settings.profile)?;
            let json = if pretty {
                serde_json::to_string_pretty(&profile)?
            } else {
                serde_json::to_string(&profile)?
            };
            println!("{json}");
            Ok(())
        }
        Commands::Clean {
            file,
            remove_duplicates,
            remove_missing,
            normalize,
            output,
        } => {
            let mut table = load_table(&file, &settings.null_tokens)?;
            let rows_before = table.row_count();

            if remove_duplicates {
                table = cleaning::remove_duplicates(&table)?;
            }
            if remove_missing {
                table = cleaning::remove_missing(&table)?;
            }
            for column in &normalize {
                table = cleaning::normalize_column(&table, column)
                    .with_context(|| format!("Failed to normalize column '{column}'"))?;
            }

            let output = output.unwrap_or_else(|| default_output_path(&file));
            let bytes = logic::to_csv_bytes(&table)?;
            std::fs::write(&output, bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            println!(
                "Cleaned {} -> {} ({} -> {} rows)",
                file.display(),
                output.display(),
                rows_before,
                table.row_count()
            );
            Ok(())
        }
    }
}

fn load_table(path: &Path, null_tokens: &[String]) -> Result<Table> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let format = IngestFormat::from_file_name(name).with_null_tokens(null_tokens.to_vec());
    logic::ingest(&bytes, &format).with_context(|| format!("Failed to parse {}", path.display()))
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    input.with_file_name(format!("{stem}_cleaned.csv"))
}
