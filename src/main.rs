//! # csvsteward entry point
//!
//! ```text
//! main()
//!   │
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Load settings (file, then CSVSTEWARD_* env overrides)
//!   └─> Run the command on a Tokio runtime
//!         ├─ serve    HTTP service
//!         ├─ profile  print a profile as JSON
//!         └─ clean    apply cleaning steps to a file
//! ```

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // CLI output goes to stdout

mod cli;

use anyhow::Result;
use clap::Parser as _;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    tokio::runtime::Runtime::new()?.block_on(cli::run_command(cli))
}
