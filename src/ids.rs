//! Identifier and secret format validation
//!
//! API keys are `sk_<uuid-v4>_<64 lowercase hex>`; locally minted
//! snapshot ids are `local-<uuid-v4>`. The `local-` prefix keeps the two
//! id spaces distinguishable by inspection alone, with no side table.

use uuid::Uuid;

use crate::error::SchemaError;
use crate::validate::Issue;

/// Fixed literal prefix of every API key.
pub const API_KEY_PREFIX: &str = "sk";

/// Prefix of the locally generated snapshot id space.
pub const LOCAL_ID_PREFIX: &str = "local-";

const SECRET_LEN: usize = 64;

/// Whether the string parses as a version-4 UUID.
pub fn is_uuid_v4(s: &str) -> bool {
    Uuid::parse_str(s)
        .map(|u| u.get_version_num() == 4)
        .unwrap_or(false)
}

/// Validate an API key of the form `sk_<uuid-v4>_<64 lowercase hex>`.
///
/// After the three-section structural check, the prefix, UUID, and secret
/// checks run independently so a caller sees every broken section at once.
pub fn validate_api_key(key: &str) -> Result<(), Vec<Issue>> {
    let sections: Vec<&str> = key.split('_').collect();
    if sections.len() != 3 {
        return Err(vec![Issue::new(
            "api-key-structure",
            format!(
                "API key must have exactly 3 '_'-separated sections, found {}",
                sections.len()
            ),
            "apiKey",
        )]);
    }

    let mut issues = Vec::new();
    if sections[0] != API_KEY_PREFIX {
        issues.push(Issue::new(
            "api-key-prefix",
            format!("API key prefix must be \"{}\", got \"{}\"", API_KEY_PREFIX, sections[0]),
            "prefix",
        ));
    }
    if !is_uuid_v4(sections[1]) {
        issues.push(Issue::new(
            "api-key-uuid",
            "API key id section must be a valid v4 UUID",
            "uuid",
        ));
    }
    let secret = sections[2];
    if secret.len() != SECRET_LEN
        || !secret
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    {
        issues.push(Issue::new(
            "api-key-secret",
            format!("API key secret must be exactly {} lowercase hex characters", SECRET_LEN),
            "secret",
        ));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Mint the UUID backing a new local id.
pub fn new_local_uuid() -> Uuid {
    Uuid::new_v4()
}

/// Mint a new `local-<uuid-v4>` id string.
pub fn new_local_id() -> String {
    format!("{}{}", LOCAL_ID_PREFIX, new_local_uuid())
}

/// Parse a `local-<uuid-v4>` id back to its UUID.
pub fn parse_local_id(s: &str) -> Result<Uuid, SchemaError> {
    let rest = s.strip_prefix(LOCAL_ID_PREFIX).ok_or_else(|| {
        SchemaError::InvalidFormat(format!(
            "local id must start with \"{}\": {}",
            LOCAL_ID_PREFIX, s
        ))
    })?;
    let id = Uuid::parse_str(rest)
        .map_err(|_| SchemaError::InvalidFormat(format!("invalid local id: {}", s)))?;
    if id.get_version_num() != 4 {
        return Err(SchemaError::InvalidFormat(format!(
            "local id must embed a v4 UUID: {}",
            s
        )));
    }
    Ok(id)
}
