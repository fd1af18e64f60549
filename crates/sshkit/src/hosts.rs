//! Operations over sets of desired hosts: validation, dedup, ordering.

use crate::error::{Error, Result};
use crate::types::Host;
use std::collections::HashMap;

/// Validate every host and reject repeated names.
///
/// Hosts are scanned in order; the first repeated name fails with both
/// conflicting sources.
pub fn validate_hosts(hosts: &[Host]) -> Result<()> {
    let mut seen: HashMap<&str, &str> = HashMap::new();

    for host in hosts {
        host.validate()?;

        if let Some(first) = seen.insert(&host.name, &host.source) {
            return Err(Error::DuplicateHost {
                name: host.name.clone(),
                first: first.to_string(),
                second: host.source.clone(),
            });
        }
    }

    Ok(())
}

/// Keep one host per name, preferring higher priority.
///
/// On equal priority the host whose source name sorts first wins, so the
/// result does not depend on input order. Survivors keep the position of
/// their name's first occurrence.
pub fn deduplicate_hosts(hosts: Vec<Host>) -> Vec<Host> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut result: Vec<Host> = Vec::with_capacity(hosts.len());

    for host in hosts {
        match index.get(&host.name) {
            Some(&slot) => {
                if outranks(&host, &result[slot]) {
                    log::debug!(
                        "host {} from {} overrides {}",
                        host.name,
                        host.source,
                        result[slot].source
                    );
                    result[slot] = host;
                }
            }
            None => {
                index.insert(host.name.clone(), result.len());
                result.push(host);
            }
        }
    }

    result
}

fn outranks(candidate: &Host, current: &Host) -> bool {
    candidate.priority > current.priority
        || (candidate.priority == current.priority && candidate.source < current.source)
}

/// Sort by descending priority, then ascending source name.
pub fn sort_by_priority(hosts: &mut [Host]) {
    hosts.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.source.cmp(&b.source))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(name: &str, source: &str, priority: i64) -> Host {
        Host::new(name, format!("{name}.example.com")).with_source(source, priority)
    }

    #[test]
    fn test_validate_unique_names() {
        let hosts = vec![host("a", "s1", 0), host("b", "s1", 0), host("c", "s2", 0)];
        assert!(validate_hosts(&hosts).is_ok());
    }

    #[test]
    fn test_validate_reports_both_sources() {
        let hosts = vec![host("a", "personal", 0), host("b", "x", 0), host("a", "work", 0)];
        let err = validate_hosts(&hosts).unwrap_err();
        assert_eq!(
            err.to_string(),
            "duplicate host name 'a' found in personal and work"
        );
    }

    #[test]
    fn test_validate_rejects_invalid_host() {
        let hosts = vec![host("a", "s", 0), Host::new("b", "").with_source("s", 0)];
        let err = validate_hosts(&hosts).unwrap_err();
        assert_eq!(err.to_string(), "hostname cannot be empty for host b");
    }

    #[test]
    fn test_validate_empty_set() {
        assert!(validate_hosts(&[]).is_ok());
    }

    #[test]
    fn test_dedup_keeps_higher_priority() {
        let hosts = vec![host("A", "personal", 10), host("A", "work", 20)];
        let result = deduplicate_hosts(hosts);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].source, "work");
    }

    #[test]
    fn test_dedup_tie_prefers_first_source_name() {
        let forward = deduplicate_hosts(vec![host("A", "beta", 5), host("A", "alpha", 5)]);
        let backward = deduplicate_hosts(vec![host("A", "alpha", 5), host("A", "beta", 5)]);
        assert_eq!(forward[0].source, "alpha");
        assert_eq!(backward[0].source, "alpha");
    }

    #[test]
    fn test_dedup_preserves_first_position() {
        let hosts = vec![
            host("a", "low", 1),
            host("b", "low", 1),
            host("a", "high", 9),
            host("c", "low", 1),
        ];
        let names: Vec<_> = deduplicate_hosts(hosts)
            .into_iter()
            .map(|h| (h.name, h.source))
            .collect();
        assert_eq!(
            names,
            vec![
                ("a".to_string(), "high".to_string()),
                ("b".to_string(), "low".to_string()),
                ("c".to_string(), "low".to_string()),
            ]
        );
    }

    #[test]
    fn test_sort_by_priority() {
        let mut hosts = vec![
            host("a", "zeta", 1),
            host("b", "beta", 5),
            host("c", "alpha", 5),
            host("d", "alpha", 1),
        ];
        sort_by_priority(&mut hosts);
        let order: Vec<_> = hosts.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "d", "a"]);
    }

    #[test]
    fn test_sort_is_stable_within_source() {
        let mut hosts = vec![host("x", "s", 1), host("y", "s", 1), host("z", "s", 1)];
        sort_by_priority(&mut hosts);
        let order: Vec<_> = hosts.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(order, vec!["x", "y", "z"]);
    }
}
