use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Exit code when the program fails before a transfer starts, e.g. reading the link.
pub const STARTUP_EXIT_CODE: i32 = 6;

/// Fatal outcomes of a transfer, each with its own process exit code.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("failed to create {}: {source}", .path.display())]
    CreateFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Copy(#[source] io::Error),

    #[error("failed to rename {} to {}: {source}", .from.display(), .to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to hash {}: {source}", .path.display())]
    Verify {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    Checksum { expected: String, actual: String },
}

impl TransferError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Request(_) => 1,
            Self::CreateFile { .. } => 2,
            Self::Copy(_) => 3,
            Self::Rename { .. } => 4,
            Self::Verify { .. } | Self::Checksum { .. } => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_per_stage() {
        let io_err = || io::Error::new(io::ErrorKind::Other, "boom");
        let errors = [
            TransferError::CreateFile { path: "a.tmp".into(), source: io_err() },
            TransferError::Copy(io_err()),
            TransferError::Rename { from: "a.tmp".into(), to: "a".into(), source: io_err() },
            TransferError::Checksum { expected: "00".into(), actual: "11".into() },
        ];
        let codes: Vec<i32> = errors.iter().map(TransferError::exit_code).collect();
        assert_eq!(codes, [2, 3, 4, 5]);
    }

    #[test]
    fn startup_code_differs_from_transfer_codes() {
        let io_err = || io::Error::new(io::ErrorKind::Other, "boom");
        let errors = [
            TransferError::CreateFile { path: "a.tmp".into(), source: io_err() },
            TransferError::Copy(io_err()),
            TransferError::Rename { from: "a.tmp".into(), to: "a".into(), source: io_err() },
            TransferError::Verify { path: "a.tmp".into(), source: io_err() },
            TransferError::Checksum { expected: "00".into(), actual: "11".into() },
        ];
        assert_ne!(STARTUP_EXIT_CODE, 0);
        // 1 belongs to request failures
        assert_ne!(STARTUP_EXIT_CODE, 1);
        for err in &errors {
            assert_ne!(err.exit_code(), STARTUP_EXIT_CODE);
        }
    }

    #[test]
    fn messages_are_single_line() {
        let err = TransferError::CreateFile {
            path: "out/file.bin.tmp".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        };
        let msg = err.to_string();
        assert!(msg.contains("file.bin.tmp"));
        assert!(!msg.contains('\n'));
    }
}
