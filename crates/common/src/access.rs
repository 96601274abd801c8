//! Client-side visibility filtering.
//!
//! The backends deliver a globally-scoped record set; what a given identity
//! is allowed to see is derived here. Recomputed on every directory update
//! and on every identity change.

use crate::document::{DocumentRecord, UserId};

/// Records visible to `identity`: owned by it, or granting it read access.
///
/// Output order follows input order; for a fixed input the result is stable.
pub fn visible(records: &[DocumentRecord], identity: &UserId) -> Vec<DocumentRecord> {
    records
        .iter()
        .filter(|r| r.visible_to(identity))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit;

    #[test]
    fn owner_sees_own_records_only() {
        let a = testkit::user("alice");
        let b = testkit::user("bob");
        let records = vec![
            testkit::record("d1", &a, &[]),
            testkit::record("d2", &b, &[]),
        ];

        let seen = visible(&records, &a);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id.as_str(), "d1");
    }

    #[test]
    fn fresh_record_is_invisible_to_others() {
        let a = testkit::user("alice");
        let b = testkit::user("bob");
        let records = vec![testkit::record("d1", &a, &[])];

        assert!(visible(&records, &b).is_empty());
    }

    #[test]
    fn grantee_sees_record_third_party_does_not() {
        let a = testkit::user("alice");
        let b = testkit::user("bob");
        let c = testkit::user("carol");
        let records = vec![testkit::record("d1", &a, &[&b])];

        assert_eq!(visible(&records, &b).len(), 1);
        assert!(visible(&records, &c).is_empty());
    }

    #[test]
    fn no_extra_records_leak() {
        let a = testkit::user("alice");
        let b = testkit::user("bob");
        let c = testkit::user("carol");
        let records = vec![
            testkit::record("d1", &a, &[&b]),
            testkit::record("d2", &b, &[]),
            testkit::record("d3", &c, &[&a]),
        ];

        let seen = visible(&records, &a);
        let ids: Vec<&str> = seen.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["d1", "d3"]);
    }

    #[test]
    fn stable_for_fixed_input() {
        let a = testkit::user("alice");
        let records = vec![
            testkit::record("d2", &a, &[]),
            testkit::record("d1", &a, &[]),
        ];

        assert_eq!(visible(&records, &a), visible(&records, &a));
    }

    #[test]
    fn empty_input_empty_output() {
        let a = testkit::user("alice");
        assert!(visible(&[], &a).is_empty());
    }
}
