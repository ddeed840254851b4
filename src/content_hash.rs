use sha2::{Digest, Sha256};

pub const HASH_HEX_LEN: usize = 64;

/// SHA-256 hex digest of `text`'s UTF-8 bytes. The sole hashing primitive
/// shared by whole-file and range hashing so callers never need to agree on
/// an algorithm out of band.
pub fn hash(text: &str) -> String {
    hash_bytes(text.as_bytes())
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}

/// Hash of the empty string; marks "file does not exist yet" in requests.
pub fn new_file_sentinel() -> String {
    hash("")
}
