//! Resource checksums
//!
//! Manifest entries record the MD5 of each resource as lowercase hex.

use crate::error::Result;
use md5::{Digest, Md5};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// MD5 of a file's content, hex-encoded
pub fn md5_file(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Md5::new();
    io::copy(&mut reader, &mut hasher)?;

    Ok(hex::encode(hasher.finalize()))
}

/// MD5 of an in-memory buffer, hex-encoded
pub fn md5_bytes(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}
