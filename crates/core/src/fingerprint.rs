//! Content fingerprint of an input document.
//!
//! The digest identifies the book: converting the same bytes twice yields the
//! same identifier, and any change to the bytes yields a different one.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

const CHUNK_SIZE: usize = 64 * 1024;

/// SHA-256 of everything `reader` yields, as 64 lowercase hex characters.
pub fn fingerprint<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Fingerprint the file at `path`.
pub fn fingerprint_file(path: &Path) -> io::Result<String> {
    fingerprint(File::open(path)?)
}
