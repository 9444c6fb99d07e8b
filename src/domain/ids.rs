//! Identifier and timestamp generation.
//!
//! Ids look like `<prefix>-<epoch millis>-<9 base36 chars>`. Uniqueness is
//! probabilistic; the repository additionally rejects ids already present in
//! the collection it is about to write.

use chrono::{DateTime, Utc};
use rand::Rng;

/// Used when the caller has no entity kind to offer.
pub const FALLBACK_PREFIX: &str = "entity";

const SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub fn generate_id(prefix: &str, at: DateTime<Utc>) -> String {
    let prefix = if prefix.trim().is_empty() {
        FALLBACK_PREFIX
    } else {
        prefix
    };
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}-{}-{}", prefix, at.timestamp_millis(), suffix)
}

/// Creation stamp: both instants are the same moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamps {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Timestamps {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_id_format() {
        let at = DateTime::from_timestamp_millis(1_704_067_200_123).unwrap();
        let id = generate_id("startup", at);
        let parts: Vec<&str> = id.splitn(3, '-').collect();
        assert_eq!(parts[0], "startup");
        assert_eq!(parts[1], "1704067200123");
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2].bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn test_generate_id_falls_back_to_generic_prefix() {
        let id = generate_id("", Utc::now());
        assert!(id.starts_with("entity-"));
    }

    #[test]
    fn test_generate_id_same_instant_distinct() {
        let at = Utc::now();
        let ids: HashSet<String> = (0..1000).map(|_| generate_id("internship", at)).collect();
        assert_eq!(ids.len(), 1000);
    }
}
