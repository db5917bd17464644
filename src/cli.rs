use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::transfer::TransferOptions;

#[derive(Parser, Debug)]
#[command(author, version, about = "Download one file over HTTP with a live progress table", long_about = None)]
pub struct Args {
    /// Link to download; read from standard input when omitted
    #[arg(index = 1)]
    pub url: Option<String>,

    /// Directory to save the downloaded file
    #[arg(short = 'd', long = "download-dir", default_value = ".")]
    pub download_dir: PathBuf,

    /// Progress refresh interval in milliseconds
    #[arg(short = 'i', long = "interval-ms", default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: u64,

    /// Rate limit in bytes per second (e.g., 1048576 for 1MB/s)
    #[arg(short = 'r', long)]
    pub rate_limit: Option<u32>,

    /// Expected SHA-256 of the file, checked before the final rename
    #[arg(long)]
    pub sha256: Option<String>,
}

impl Args {
    pub fn transfer_options(&self) -> TransferOptions {
        TransferOptions {
            download_dir: self.download_dir.clone(),
            interval: Duration::from_millis(self.interval_ms),
            rate_limit: self.rate_limit,
            sha256: self.sha256.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["tabdl"]).unwrap();
        assert!(args.url.is_none());
        let options = args.transfer_options();
        assert_eq!(options.download_dir, PathBuf::from("."));
        assert_eq!(options.interval, Duration::from_secs(1));
        assert!(options.rate_limit.is_none());
        assert!(options.sha256.is_none());
    }

    #[test]
    fn all_flags() {
        let args = Args::try_parse_from([
            "tabdl",
            "http://x.com/a.bin",
            "-d",
            "out",
            "-i",
            "250",
            "-r",
            "4096",
            "--sha256",
            "abc",
        ])
        .unwrap();
        assert_eq!(args.url.as_deref(), Some("http://x.com/a.bin"));
        let options = args.transfer_options();
        assert_eq!(options.download_dir, PathBuf::from("out"));
        assert_eq!(options.interval, Duration::from_millis(250));
        assert_eq!(options.rate_limit, Some(4096));
        assert_eq!(options.sha256.as_deref(), Some("abc"));
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(Args::try_parse_from(["tabdl", "-i", "0"]).is_err());
    }
}
