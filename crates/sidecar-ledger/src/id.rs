//! Id generation capability, injectable for tests.

use sidecar_ledger_core::EntityId;

/// Generator of fresh ids of the form `prefix-<8 hex chars>`.
///
/// Generated ids must be statistically unique within a run; a collision
/// surfaces as an append-only violation, which is caller error rather than
/// corruption.
pub trait IdGen: Send + Sync {
    fn gen_id(&self, prefix: &str) -> EntityId;
}

/// Random generator: the first 8 hex digits of a 128-bit random value.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGen;

impl IdGen for RandomIdGen {
    fn gen_id(&self, prefix: &str) -> EntityId {
        let bytes: [u8; 16] = rand::random();
        let hex = hex::encode(bytes);
        EntityId::new(format!("{}-{}", prefix, &hex[..8]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_id_shape() {
        let id = RandomIdGen.gen_id("evt");
        let (prefix, tail) = id.as_str().split_at(4);
        assert_eq!(prefix, "evt-");
        assert_eq!(tail.len(), 8);
        assert!(tail.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_ids_do_not_repeat_in_a_run() {
        let ids: HashSet<EntityId> = (0..1000).map(|_| RandomIdGen.gen_id("x")).collect();
        assert_eq!(ids.len(), 1000);
    }
}
