//! Endpoint extraction
//!
//! Turns relay records into CSV rows, one per valid OR address.

use tracing::warn;

use crate::{parse_endpoint, AddressError, EndpointTuple, NodeRecord};

/// Rows produced from a single record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Valid endpoints, in `or_addresses` order
    pub tuples: Vec<EndpointTuple>,
    /// Endpoints that failed to parse
    pub rejected: Vec<AddressError>,
}

/// Extract every valid endpoint of a record
pub fn extract_endpoints(record: &NodeRecord) -> Extraction {
    let mut extraction = Extraction::default();

    for raw in record.addresses() {
        match parse_endpoint(raw) {
            Ok(endpoint) => extraction.tuples.push(EndpointTuple {
                fingerprint: record.fingerprint().map(str::to_string),
                ip: endpoint.ip_literal(),
                port: endpoint.port,
            }),
            Err(e) => {
                warn!("Error parsing address {}: {}", raw, e);
                extraction.rejected.push(e);
            }
        }
    }

    extraction
}

/// Row sets for the three tabular files
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    pub all: Vec<EndpointTuple>,
    /// Rows of guard-capable relays, payload order
    pub guard: Vec<EndpointTuple>,
    /// Rows of exit-capable relays, payload order
    pub exit: Vec<EndpointTuple>,
    pub rejected: Vec<AddressError>,
}

/// Flatten the extraction of every relay into the tabular row sets
pub fn tabulate(relays: &[NodeRecord]) -> Tables {
    let mut tables = Tables::default();

    for relay in relays {
        let Extraction { tuples, rejected } = extract_endpoints(relay);
        let (guard, exit) = (relay.is_guard(), relay.is_exit());

        for tuple in tuples {
            if guard {
                tables.guard.push(tuple.clone());
            }
            if exit {
                tables.exit.push(tuple.clone());
            }
            tables.all.push(tuple);
        }
        tables.rejected.extend(rejected);
    }

    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn relay(fp: Option<&str>, addrs: &[&str], flags: &[&str]) -> NodeRecord {
        serde_json::from_value(json!({
            "fingerprint": fp,
            "or_addresses": addrs,
            "flags": flags,
        }))
        .unwrap()
    }

    #[test]
    fn test_one_good_one_bad_endpoint() {
        let record = relay(Some("BBB"), &["[2a0b:f4c2:2::33]:10033", "bad-endpoint"], &["Exit"]);
        let extraction = extract_endpoints(&record);

        assert_eq!(
            extraction.tuples,
            vec![EndpointTuple {
                fingerprint: Some("BBB".into()),
                ip: "2a0b:f4c2:2::33".into(),
                port: 10033,
            }]
        );
        assert_eq!(extraction.rejected.len(), 1);
        assert_eq!(extraction.rejected[0].input(), "bad-endpoint");
    }

    #[test]
    fn test_preserves_endpoint_order() {
        let record = relay(Some("CCC"), &["[::1]:2", "10.0.0.1:1", "10.0.0.2:3"], &[]);
        let ports: Vec<u16> = extract_endpoints(&record).tuples.iter().map(|t| t.port).collect();
        assert_eq!(ports, vec![2, 1, 3]);
    }

    #[test]
    fn test_no_endpoints_is_not_an_error() {
        let record = NodeRecord::default();
        let extraction = extract_endpoints(&record);
        assert!(extraction.tuples.is_empty());
        assert!(extraction.rejected.is_empty());

        let record = relay(None, &["nope", "1.2.3.4"], &[]);
        let extraction = extract_endpoints(&record);
        assert!(extraction.tuples.is_empty());
        assert_eq!(extraction.rejected.len(), 2);
    }

    #[test]
    fn test_missing_fingerprint_passes_through() {
        let record = relay(None, &["10.0.0.1:9001"], &[]);
        let extraction = extract_endpoints(&record);
        assert_eq!(extraction.tuples[0].fingerprint, None);
    }

    #[test]
    fn test_tabulate_splits_by_role() {
        let relays = vec![
            relay(Some("AAA"), &["185.220.101.33:10033"], &["Guard"]),
            relay(Some("BBB"), &["[2a0b:f4c2:2::33]:10033", "bad-endpoint"], &["Exit"]),
            relay(Some("CCC"), &["10.0.0.1:443", "10.0.0.2:443"], &["guard", "EXIT"]),
            relay(Some("DDD"), &["10.0.0.3:443"], &["Fast"]),
        ];

        let tables = tabulate(&relays);
        let fps = |rows: &[EndpointTuple]| -> Vec<String> {
            rows.iter().map(|r| r.fingerprint.clone().unwrap_or_default()).collect()
        };

        assert_eq!(fps(&tables.all), vec!["AAA", "BBB", "CCC", "CCC", "DDD"]);
        assert_eq!(fps(&tables.guard), vec!["AAA", "CCC", "CCC"]);
        assert_eq!(fps(&tables.exit), vec!["BBB", "CCC", "CCC"]);
        assert_eq!(tables.rejected.len(), 1);
    }
}
