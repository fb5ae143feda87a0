use sha2::{Digest, Sha256};
use std::io::{self, Read};

use crate::constants::DEFAULT_IO_BUFFER_SIZE;

pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

pub fn sha256_string(data: &str) -> String {
    sha256_bytes(data.as_bytes())
}

/// Stream a reader through SHA-256 without buffering it whole.
/// Returns the hex digest and the number of bytes consumed.
pub fn sha256_reader<R: Read>(reader: &mut R) -> io::Result<(String, u64)> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; DEFAULT_IO_BUFFER_SIZE];
    let mut total: u64 = 0;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    Ok((hex::encode(hasher.finalize()), total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        assert_eq!(
            sha256_string("hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_bytes_and_string_agree() {
        assert_eq!(sha256_bytes(b"aipack"), sha256_string("aipack"));
    }

    #[test]
    fn test_reader_matches_bytes() {
        let data = b"some layer content".to_vec();
        let mut cursor = std::io::Cursor::new(data.clone());
        let (digest, size) = sha256_reader(&mut cursor).unwrap();
        assert_eq!(digest, sha256_bytes(&data));
        assert_eq!(size, data.len() as u64);
    }

    #[test]
    fn test_empty_reader() {
        let mut cursor = std::io::Cursor::new(Vec::new());
        let (digest, size) = sha256_reader(&mut cursor).unwrap();
        assert_eq!(digest, sha256_bytes(b""));
        assert_eq!(size, 0);
    }
}
