//! Create / update / skip decision for a single hostname

use std::net::IpAddr;

use crate::traits::DnsRecord;

/// What the reconciler should do with one hostname
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision<'a> {
    /// No record exists: create one
    Create,
    /// The record already points at the current IP
    Unchanged(&'a DnsRecord),
    /// The record is ours and stale: overwrite its content
    Update(&'a DnsRecord),
    /// The record is stale but carries no managed marker: leave it alone
    NotManaged(&'a DnsRecord),
}

/// Decide what to do given the first record found (if any) and the current IP
///
/// Content is compared before ownership, so a foreign record that already
/// points at the current IP is a silent no-op rather than a refusal.
pub fn decide(existing: Option<&DnsRecord>, ip: IpAddr) -> Decision<'_> {
    match existing {
        None => Decision::Create,
        Some(record) if record.points_to(ip) => Decision::Unchanged(record),
        Some(record) if record.is_managed() => Decision::Update(record),
        Some(record) => Decision::NotManaged(record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MANAGED_MARKER;

    fn record(content: &str, comment: &str) -> DnsRecord {
        DnsRecord {
            id: "rec-1".to_string(),
            name: "app.example.com".to_string(),
            record_type: "A".to_string(),
            content: content.to_string(),
            ttl: 1,
            proxied: true,
            comment: Some(comment.to_string()),
        }
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_missing_record_is_created() {
        assert_eq!(decide(None, ip("203.0.113.5")), Decision::Create);
    }

    #[test]
    fn test_matching_content_is_unchanged() {
        let r = record("203.0.113.5", MANAGED_MARKER);
        assert_eq!(decide(Some(&r), ip("203.0.113.5")), Decision::Unchanged(&r));
    }

    #[test]
    fn test_stale_managed_record_is_updated() {
        let r = record("203.0.113.5", MANAGED_MARKER);
        assert_eq!(decide(Some(&r), ip("203.0.113.9")), Decision::Update(&r));
    }

    #[test]
    fn test_stale_foreign_record_is_refused() {
        let r = record("198.51.100.1", "manual entry");
        assert_eq!(decide(Some(&r), ip("203.0.113.9")), Decision::NotManaged(&r));
    }

    #[test]
    fn test_foreign_record_with_matching_content_is_unchanged() {
        let r = record("203.0.113.9", "manual entry");
        assert_eq!(decide(Some(&r), ip("203.0.113.9")), Decision::Unchanged(&r));
    }

    #[test]
    fn test_ipv6_content_compared_canonically() {
        let r = record("2001:db8::1", MANAGED_MARKER);
        assert_eq!(decide(Some(&r), ip("2001:db8:0::1")), Decision::Unchanged(&r));
    }
}
