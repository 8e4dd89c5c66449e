//! Deterministic id minting and content hashing.
//!
//! Every id here is a pure function of its inputs: same path/name/signature
//! bytes in, same id out, regardless of platform or run order. Path
//! separators are normalized to `/` before hashing so a repo checked out on
//! Windows and one checked out on Linux mint identical ids.

use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Repo-relative entity id, e.g. `file:src/lib.rs` or `sym:src/lib.rs#foo@a1b2c3d4`.
pub type EntityId = String;

/// Relationship id, e.g. `rel_9f86d081...`.
pub type RelationshipId = String;

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

/// Hex-encoded sha256 of the given bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Hex-encoded sha1 of the given bytes.
pub fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// First `n` hex characters of a hex digest.
pub fn short(hex_digest: &str, n: usize) -> String {
    hex_digest.chars().take(n).collect()
}

/// Id for a File entity.
pub fn file_id(repo_relative_path: &str) -> EntityId {
    format!("file:{}", normalize(repo_relative_path))
}

/// Id for a Directory entity.
pub fn dir_id(repo_relative_path: &str) -> EntityId {
    format!("dir:{}", normalize(repo_relative_path))
}

/// Id for a Symbol entity: `sym:<filePath>#<name>@<first-8-hex-of-sha1(signature)>`.
pub fn symbol_id(file_path: &str, name: &str, signature: &str) -> EntityId {
    let digest = sha1_hex(signature.as_bytes());
    format!("sym:{}#{}@{}", normalize(file_path), name, short(&digest, 8))
}

/// Id for a Test entity: treated as a Symbol-shaped id rooted at the test file.
pub fn test_id(file_path: &str, name: &str, signature: &str) -> EntityId {
    let digest = sha1_hex(signature.as_bytes());
    format!("test:{}#{}@{}", normalize(file_path), name, short(&digest, 8))
}

/// Id for a relationship: `rel_<sha1(fromId|toId|type)>`. Idempotent:
/// upserting with identical `(from, to, type)` always yields the same id,
/// which is how duplicate emissions fold into one edge.
pub fn rel_id(from_id: &str, to_id: &str, kind: &str) -> RelationshipId {
    let payload = format!("{}|{}|{}", from_id, to_id, kind);
    format!("rel_{}", sha1_hex(payload.as_bytes()))
}
