//! POSIX `cksum` checksums identifying a source file's contents

use crate::CovError;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const POLY: u32 = 0x04C1_1DB7;

const TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut c = (i as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            c = if c & 0x8000_0000 != 0 {
                (c << 1) ^ POLY
            } else {
                c << 1
            };
            bit += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
}

/// Streaming `cksum` state.
#[derive(Debug, Clone, Default)]
pub struct Cksum {
    crc: u32,
    len: u64,
}

impl Cksum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.step(b);
        }
        self.len += bytes.len() as u64;
    }

    fn step(&mut self, b: u8) {
        let idx = ((self.crc >> 24) as u8 ^ b) as usize;
        self.crc = (self.crc << 8) ^ TABLE[idx];
    }

    /// Finish with the length appended, as `cksum` does
    pub fn finish(mut self) -> FileChecksum {
        let bytes = self.len;
        let mut n = self.len;
        while n != 0 {
            self.step((n & 0xff) as u8);
            n >>= 8;
        }
        FileChecksum {
            checksum: !self.crc,
            bytes,
        }
    }
}

/// Checksum and byte count of one file, as printed by `cksum`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileChecksum {
    pub checksum: u32,
    pub bytes: u64,
}

pub fn checksum_bytes(bytes: &[u8]) -> FileChecksum {
    let mut ck = Cksum::new();
    ck.update(bytes);
    ck.finish()
}

/// Checksum the file at `path`, reading it in buffered chunks
pub fn file_checksum(path: &Path) -> crate::Result<FileChecksum> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CovError::FileNotFound(path.to_path_buf()),
        _ => CovError::Io(e),
    })?;
    let mut reader = BufReader::new(file);
    let mut ck = Cksum::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        ck.update(&buf[..n]);
    }
    Ok(ck.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference values from coreutils `cksum`
    #[test]
    fn test_known_values() {
        assert_eq!(checksum_bytes(b"").checksum, 4294967295);
        assert_eq!(checksum_bytes(b"123456789").checksum, 930766865);
        assert_eq!(checksum_bytes(b"hello\n").checksum, 3015617425);
        assert_eq!(checksum_bytes(b"hello\n").bytes, 6);
    }

    #[test]
    fn test_streaming_matches_one_shot() {
        let data = b"int main(void) { return 0; }\n";
        let mut ck = Cksum::new();
        for chunk in data.chunks(5) {
            ck.update(chunk);
        }
        assert_eq!(ck.finish(), checksum_bytes(data));
        assert_eq!(checksum_bytes(data).checksum, 2929966808);
    }

    #[test]
    fn test_file_checksum() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.c");
        std::fs::write(&path, "int a;\n").unwrap();
        let sum = file_checksum(&path).unwrap();
        assert_eq!(sum.checksum, 2181003744);
        assert_eq!(sum.bytes, 7);
    }

    #[test]
    fn test_missing_file() {
        let err = file_checksum(Path::new("/nonexistent/x.c")).unwrap_err();
        assert!(matches!(err, CovError::FileNotFound(_)));
    }
}
