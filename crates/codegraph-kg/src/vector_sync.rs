//! Mapping between graph entity ids and vector-store point ids.

use std::collections::HashMap;

use codegraph_core::Entity;
use codegraph_storage::QueryValue;

/// A stable numeric id for `entity_id`, used as the vector store's point
/// id. Derived from the first 8 bytes of the entity id's sha256 digest —
/// deterministic, so re-upserting the same entity always targets the same
/// vector record instead of accumulating duplicates.
pub fn entity_vector_id(entity_id: &str) -> u64 {
    let digest = codegraph_core::sha256_hex(entity_id.as_bytes());
    let bytes = hex::decode(&digest[..16]).expect("sha256 hex prefix is valid hex");
    u64::from_be_bytes(bytes.try_into().expect("16 hex chars decode to 8 bytes"))
}

/// The payload every entity's vector record carries, per §4.5.
pub fn entity_payload(entity: &Entity) -> HashMap<String, QueryValue> {
    let mut payload = HashMap::new();
    payload.insert("entityId".to_string(), QueryValue::Text(entity.id.clone()));
    payload.insert("kind".to_string(), QueryValue::Text(format!("{:?}", entity.kind)));
    payload.insert("path".to_string(), QueryValue::Text(entity.path.clone()));
    if let Some(lang) = entity.language {
        payload.insert("language".to_string(), QueryValue::Text(format!("{:?}", lang)));
    }
    payload.insert("lastModified".to_string(), QueryValue::Text(entity.last_modified.to_rfc3339()));
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_id_is_deterministic() {
        assert_eq!(entity_vector_id("file:a.ts"), entity_vector_id("file:a.ts"));
        assert_ne!(entity_vector_id("file:a.ts"), entity_vector_id("file:b.ts"));
    }
}
