use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::AppcastError;

/// Block size for streaming the artifact through the hasher.
const HASH_BLOCK_SIZE: usize = 4096;

/// Computes the SHA-256 digest of the file at `path` as lowercase hex.
///
/// The file is streamed in fixed-size blocks so large disk images never
/// have to fit in memory. The handle is dropped as soon as the digest
/// completes.
///
/// # Errors
///
/// Returns [`AppcastError::Integrity`] if the file cannot be opened or a
/// read fails partway through.
pub fn sha256_file(path: &Path) -> Result<String, AppcastError> {
    let io_err = |source| AppcastError::Integrity {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(io_err)?;
    let digest = digest_reader(&mut file).map_err(io_err)?;
    tracing::debug!(path = %path.display(), digest = %digest, "hashed artifact");
    Ok(digest)
}

fn digest_reader<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut block = [0u8; HASH_BLOCK_SIZE];

    loop {
        match reader.read(&mut block) {
            Ok(0) => break,
            Ok(read) => hasher.update(&block[..read]),
            // A signal landing mid-read is not a failed artifact.
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(format!("{:x}", hasher.finalize()))
}
