//! Streaming SHA-1 digests for files on disk.
//! The remote metadata mandates SHA-1 for every verifiable entry, and some of
//! the archives run to gigabytes, so the file is hashed in fixed-size chunks
//! rather than read whole.

use sha1::{Digest, Sha1};
use std::io;
use std::path::Path;
use tokio::io::AsyncReadExt;

const CHUNK_SIZE: usize = 1024 * 1024;

/// Compute the hex-encoded SHA-1 of a file, streaming in fixed-size chunks.
pub async fn sha1_file(path: &Path) -> io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Check a file against an expected hex digest, case-insensitively.
///
/// A missing file is `Ok(false)`, not an error; callers re-download in that
/// case. Any other I/O error propagates so callers can retry instead of
/// treating the file as corrupt.
pub async fn verify_file(path: &Path, expected: &str) -> io::Result<bool> {
    match sha1_file(path).await {
        Ok(computed) => Ok(computed.eq_ignore_ascii_case(expected)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
