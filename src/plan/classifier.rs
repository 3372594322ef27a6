//! Buckets resource changes by the kind of change applied to them

use super::types::{ActionKind, ChangeBucket, ResourceChange};

/// Classify resource changes into buckets, preserving input order
pub fn classify(changes: &[ResourceChange]) -> ChangeBucket {
    let mut bucket = ChangeBucket::default();

    for resource in changes {
        let address = resource.address.clone();

        match resource.kind() {
            ActionKind::NoOp => bucket.unchanged.push(address),
            ActionKind::Create => bucket.created.push(address),
            ActionKind::Update => bucket.updated.push(address),
            ActionKind::Delete => bucket.deleted.push(address),
            ActionKind::Replace => bucket.replaced.push(address),
            ActionKind::Other(action) => bucket.other.push((address, action)),
        }
    }

    bucket
}
