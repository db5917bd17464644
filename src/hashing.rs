use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::Path;

/// Hex-encoded SHA-256 of a file. The file is streamed through the hasher on the blocking pool.
pub async fn calculate_hash(filepath: &Path) -> io::Result<String> {
    let path = filepath.to_path_buf();
    tokio::task::spawn_blocking(move || -> io::Result<String> {
        let mut hasher = Sha256::new();
        io::copy(&mut File::open(path)?, &mut hasher)?;
        Ok(hex::encode(hasher.finalize()))
    })
    .await
    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}

pub fn hashes_match(expected: &str, computed: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(computed)
}
