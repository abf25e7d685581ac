//! Whole-file content digests.

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// SHA-256 of a file's full contents.
///
/// Equal digests are treated as equal content; no byte-by-byte comparison
/// follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Computes the digest of the file at `path`.
///
/// The file is streamed through the hasher in fixed-size chunks, so memory
/// use does not depend on file size.
pub fn digest(path: &Path) -> io::Result<ContentDigest> {
    let file = File::open(path)?;
    digest_reader(file)
}

/// Computes the digest of everything `reader` yields.
pub fn digest_reader<R: Read>(mut reader: R) -> io::Result<ContentDigest> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hasher.finalize());
    Ok(ContentDigest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_digest_known_value() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"test content").unwrap();

        let digest = digest(temp_file.path()).unwrap();
        // SHA-256 of "test content"
        assert_eq!(
            digest.to_string(),
            "6ae8a75555209fd6c44157c0aed8016e763ff435a19cf186f76863140143ff72"
        );
    }

    #[test]
    fn test_digest_empty_input() {
        let digest = digest_reader(io::empty()).unwrap();

        assert_eq!(
            digest.to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_digest_spans_multiple_chunks() {
        let data = vec![7u8; 8192 * 3 + 17];
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(&data).unwrap();

        let from_file = digest(temp_file.path()).unwrap();
        let expected = Sha256::digest(&data);

        assert_eq!(from_file.as_bytes().as_slice(), expected.as_slice());
    }

    #[test]
    fn test_digest_missing_file() {
        let err = digest(Path::new("/nonexistent/file.bin")).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
