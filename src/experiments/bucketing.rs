//! Deterministic traffic bucketing.
//!
//! Buckets are derived from a 32-bit rolling hash of `"{scope}:{identity}"`,
//! where the scope is an experiment or flag id and the identity is the user
//! id when known, otherwise the session id. The hash matches the storefront's
//! client-side implementation so server and browser agree on every bucket.

use crate::domain::aggregates::ExperimentVariant;
use crate::domain::value_objects::Bucket;

/// Rolling hash over UTF-16 code units: `h = h * 31 + c` in wrapping 32-bit
/// arithmetic, returned as the absolute value.
pub fn hash_string(input: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in input.encode_utf16() {
        hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(i32::from(unit));
    }
    hash.unsigned_abs()
}

pub fn bucket_key(scope: &str, identity: &str) -> String {
    format!("{scope}:{identity}")
}

pub fn bucket_for(scope: &str, identity: &str) -> Bucket {
    Bucket::from_hash(hash_string(&bucket_key(scope, identity)))
}

/// Picks the first variant whose cumulative weight exceeds the bucket. When
/// the weights leave part of the range uncovered the first variant is used.
pub fn choose_variant(variants: &[ExperimentVariant], bucket: Bucket) -> Option<&ExperimentVariant> {
    let point = f64::from(bucket.value());
    let mut cumulative = 0.0;
    for variant in variants {
        cumulative += variant.traffic_weight;
        if point < cumulative {
            return Some(variant);
        }
    }
    variants.first()
}
