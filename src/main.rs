mod cli;
mod error;
mod hashing;
mod render;
mod status;
mod transfer;
mod utils;
mod window;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::Args;
use crate::error::STARTUP_EXIT_CODE;
use crate::transfer::TransferDriver;

async fn read_link() -> Result<String> {
    print!("Link: ");
    std::io::stdout().flush()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let line = lines
        .next_line()
        .await
        .context("Failed to read the link from standard input")?
        .unwrap_or_default();
    Ok(line.trim().to_string())
}

/// Returns the exit code of the transfer; `Err` only for failures before it starts.
fn run(args: Args) -> Result<i32> {
    let options = args.transfer_options();
    let rt = tokio::runtime::Runtime::new().context("Failed to start the async runtime")?;

    rt.block_on(async {
        let link = match args.url {
            Some(url) => url,
            None => read_link().await?,
        };

        let outcome = match TransferDriver::new(options, std::io::stdout()) {
            Ok(driver) => driver.run(&link).await,
            Err(e) => Err(e),
        };
        Ok::<i32, anyhow::Error>(match outcome {
            Ok(report) => {
                if report.renamed {
                    crate::utils::info(report.message());
                }
                0
            }
            Err(e) => {
                crate::utils::error(&e);
                e.exit_code()
            }
        })
    })
}

fn main() {
    let args = Args::parse();
    let code = match run(args) {
        Ok(code) => code,
        Err(e) => {
            crate::utils::error(format!("{:#}", e));
            STARTUP_EXIT_CODE
        }
    };
    std::process::exit(code)
}
