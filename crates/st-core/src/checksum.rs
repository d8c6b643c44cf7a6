//! SHA-256 checksums of migration sources.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 checksum of a migration's source text.
///
/// Line endings are normalised to `\n` first so that the same file checked
/// out on Windows and Unix hashes identically.
pub fn compute_checksum(source: &str) -> String {
    let mut hasher = Sha256::new();
    for (i, line) in source.split('\n').enumerate() {
        if i > 0 {
            hasher.update(b"\n");
        }
        hasher.update(line.strip_suffix('\r').unwrap_or(line).as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
