//! Lease + device merge
//!
//! Both sources are folded into one entry per normalized hardware address.
//! Leases are applied first so their names take priority over the
//! per-address names reported on device records.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::models::{DeviceRecord, LeaseRecord};

/// Name Pi-hole reports for hosts that did not declare one
pub const PLACEHOLDER_NAME: &str = "*";

/// Merged view of all devices, keyed by normalized MAC
pub type Snapshot = BTreeMap<String, DeviceEntry>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceEntry {
    /// Sorted, de-duplicated, joined with ", "
    pub ips: String,
    pub name: Option<String>,
    pub dhcp_expires: Option<i64>,
    pub interface: Option<String>,
    pub first_seen: Option<i64>,
    pub last_query: Option<i64>,
    pub num_queries: Option<i64>,
    pub mac_vendor: Option<String>,
}

#[derive(Default)]
struct PendingEntry {
    ips: BTreeSet<String>,
    name: Option<String>,
    dhcp_expires: Option<i64>,
    interface: Option<String>,
    first_seen: Option<i64>,
    last_query: Option<i64>,
    num_queries: Option<i64>,
    mac_vendor: Option<String>,
}

impl PendingEntry {
    fn add_ip(&mut self, ip: Option<&str>) {
        if let Some(ip) = ip.map(str::trim).filter(|ip| !ip.is_empty()) {
            self.ips.insert(ip.to_string());
        }
    }

    fn offer_name(&mut self, name: Option<&str>) {
        if self.name.is_some() {
            return;
        }
        if let Some(name) = name.filter(|n| is_meaningful_name(n)) {
            self.name = Some(name.trim().to_string());
        }
    }

    fn finish(self) -> DeviceEntry {
        DeviceEntry {
            ips: self.ips.into_iter().collect::<Vec<_>>().join(", "),
            name: self.name,
            dhcp_expires: self.dhcp_expires,
            interface: self.interface,
            first_seen: self.first_seen,
            last_query: self.last_query,
            num_queries: self.num_queries,
            mac_vendor: self.mac_vendor,
        }
    }
}

/// False for empty, whitespace-only and placeholder names
pub fn is_meaningful_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && trimmed != PLACEHOLDER_NAME
}

/// Canonical MAC form: lowercase, colon-separated octets (e.g. "AA-BB-CC-DD-EE-FF" → "aa:bb:cc:dd:ee:ff")
///
/// Identifiers that are not a 48-bit hardware address are kept as trimmed
/// lowercase text. Returns `None` for empty input.
pub fn normalize_mac(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    let hex: String = lowered
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | '.'))
        .collect();
    let separators_only = lowered
        .chars()
        .all(|c| c.is_ascii_hexdigit() || matches!(c, ':' | '-' | '.'));

    if separators_only && hex.len() == 12 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        let octets: Vec<&str> = (0..12).step_by(2).map(|i| &hex[i..i + 2]).collect();
        return Some(octets.join(":"));
    }

    Some(lowered)
}

/// Build a fresh snapshot from one cycle's lease and device payloads
pub fn merge(leases: &[LeaseRecord], devices: &[DeviceRecord]) -> Snapshot {
    let mut pending: BTreeMap<String, PendingEntry> = BTreeMap::new();

    for lease in leases {
        let Some(mac) = lease.hwaddr.as_deref().and_then(normalize_mac) else {
            tracing::trace!("[Merge] Skipping lease without hwaddr (ip={:?})", lease.ip);
            continue;
        };
        let entry = pending.entry(mac).or_default();
        entry.add_ip(lease.ip.as_deref());
        entry.offer_name(lease.name.as_deref());
        // Multiple leases for one MAC: keep the one that runs longest
        entry.dhcp_expires = match (entry.dhcp_expires, lease.expires) {
            (Some(current), Some(new)) => Some(current.max(new)),
            (current, new) => new.or(current),
        };
    }

    for device in devices {
        let Some(mac) = device.hwaddr.as_deref().and_then(normalize_mac) else {
            tracing::trace!("[Merge] Skipping device record without hwaddr");
            continue;
        };
        let entry = pending.entry(mac).or_default();
        entry.interface = device.interface.clone();
        entry.first_seen = device.first_seen;
        entry.last_query = device.last_query;
        entry.num_queries = device.num_queries;
        entry.mac_vendor = device.mac_vendor.clone();

        for addr in &device.ips {
            entry.add_ip(addr.ip.as_deref());
            entry.offer_name(addr.name.as_deref());
        }
    }

    pending
        .into_iter()
        .map(|(mac, entry)| (mac, entry.finish()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pihole::models::{DeviceAddress, DevicesResponse, LeasesResponse};

    fn lease(mac: &str, ip: &str, name: &str, expires: Option<i64>) -> LeaseRecord {
        LeaseRecord {
            hwaddr: Some(mac.to_string()),
            ip: Some(ip.to_string()),
            name: Some(name.to_string()),
            expires,
        }
    }

    fn device(mac: &str, addrs: &[(&str, Option<&str>)]) -> DeviceRecord {
        DeviceRecord {
            hwaddr: Some(mac.to_string()),
            interface: Some("eth0".to_string()),
            first_seen: Some(1_000),
            last_query: Some(2_000),
            num_queries: Some(7),
            mac_vendor: Some("Acme".to_string()),
            ips: addrs
                .iter()
                .map(|(ip, name)| DeviceAddress {
                    ip: Some(ip.to_string()),
                    name: name.map(|n| n.to_string()),
                })
                .collect(),
        }
    }

    #[test]
    fn test_normalize_mac() {
        assert_eq!(
            normalize_mac("AA:BB:CC:DD:EE:FF").as_deref(),
            Some("aa:bb:cc:dd:ee:ff")
        );
        assert_eq!(
            normalize_mac("aa-bb-cc-dd-ee-ff").as_deref(),
            Some("aa:bb:cc:dd:ee:ff")
        );
        assert_eq!(
            normalize_mac(" AABBCCDDEEFF ").as_deref(),
            Some("aa:bb:cc:dd:ee:ff")
        );
        assert_eq!(
            normalize_mac("aabb.ccdd.eeff").as_deref(),
            Some("aa:bb:cc:dd:ee:ff")
        );
        assert_eq!(normalize_mac("ip-10.0.0.7").as_deref(), Some("ip-10.0.0.7"));
        assert_eq!(normalize_mac(""), None);
        assert_eq!(normalize_mac("   "), None);
    }

    #[test]
    fn test_end_to_end_payloads() {
        let t = 1_700_000_000_i64;
        let leases: LeasesResponse = serde_json::from_str(&format!(
            r#"{{"leases":[{{"hwaddr":"AA:BB:CC:DD:EE:FF","ip":"192.168.1.5","name":"Laptop","expires":{}}}]}}"#,
            t + 3600
        ))
        .unwrap();
        let devices: DevicesResponse = serde_json::from_str(&format!(
            r#"{{"devices":[{{"hwaddr":"aa:bb:cc:dd:ee:ff","interface":"eth0","lastQuery":{},"numQueries":12,"macVendor":"Acme","ips":[{{"ip":"192.168.1.5"}}]}}]}}"#,
            t - 50
        ))
        .unwrap();

        let snapshot = merge(&leases.leases, &devices.devices);
        assert_eq!(snapshot.len(), 1);

        let entry = &snapshot["aa:bb:cc:dd:ee:ff"];
        assert_eq!(entry.name.as_deref(), Some("Laptop"));
        assert_eq!(entry.ips, "192.168.1.5");
        assert_eq!(entry.interface.as_deref(), Some("eth0"));
        assert_eq!(entry.num_queries, Some(12));
        assert_eq!(entry.dhcp_expires, Some(t + 3600));
        assert_eq!(entry.last_query, Some(t - 50));
        assert_eq!(entry.first_seen, None);
        assert_eq!(entry.mac_vendor.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_ips_union_sorted_and_deduplicated() {
        let leases = vec![
            lease("aa:bb:cc:dd:ee:01", "192.168.1.20", "nas", None),
            lease("AA:BB:CC:DD:EE:01", "192.168.1.3", "nas", None),
        ];
        let devices = vec![device(
            "aa:bb:cc:dd:ee:01",
            &[("192.168.1.20", None), ("fe80::1", None), ("", None)],
        )];

        let snapshot = merge(&leases, &devices);
        assert_eq!(
            snapshot["aa:bb:cc:dd:ee:01"].ips,
            "192.168.1.20, 192.168.1.3, fe80::1"
        );
    }

    #[test]
    fn test_lease_name_beats_device_name() {
        let leases = vec![lease("aa:bb:cc:dd:ee:02", "10.0.0.2", "Printer", None)];
        let devices = vec![device("aa:bb:cc:dd:ee:02", &[("10.0.0.2", Some("Unnamed"))])];

        let snapshot = merge(&leases, &devices);
        assert_eq!(snapshot["aa:bb:cc:dd:ee:02"].name.as_deref(), Some("Printer"));
    }

    #[test]
    fn test_placeholder_lease_name_falls_through_to_device() {
        let leases = vec![lease("aa:bb:cc:dd:ee:03", "10.0.0.3", "*", None)];
        let devices = vec![device(
            "aa:bb:cc:dd:ee:03",
            &[("10.0.0.3", Some("*")), ("10.0.0.4", Some("tv.lan"))],
        )];

        let snapshot = merge(&leases, &devices);
        assert_eq!(snapshot["aa:bb:cc:dd:ee:03"].name.as_deref(), Some("tv.lan"));

        let only_placeholder = merge(&leases, &[]);
        assert_eq!(only_placeholder["aa:bb:cc:dd:ee:03"].name, None);
    }

    #[test]
    fn test_empty_hwaddr_dropped() {
        let leases = vec![
            lease("", "10.0.0.9", "ghost", None),
            LeaseRecord {
                hwaddr: None,
                ..LeaseRecord::default()
            },
        ];
        let devices = vec![
            device("  ", &[("10.0.0.10", None)]),
            DeviceRecord {
                hwaddr: None,
                ..DeviceRecord::default()
            },
        ];

        let snapshot = merge(&leases, &devices);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_one_sided_records_kept() {
        let leases = vec![lease("aa:bb:cc:dd:ee:04", "10.0.0.4", "phone", Some(5_000))];
        let devices = vec![device("aa:bb:cc:dd:ee:05", &[("10.0.0.5", None)])];

        let snapshot = merge(&leases, &devices);
        assert_eq!(snapshot.len(), 2);

        let lease_only = &snapshot["aa:bb:cc:dd:ee:04"];
        assert_eq!(lease_only.dhcp_expires, Some(5_000));
        assert_eq!(lease_only.interface, None);
        assert_eq!(lease_only.last_query, None);
        assert_eq!(lease_only.num_queries, None);
        assert_eq!(lease_only.mac_vendor, None);

        let device_only = &snapshot["aa:bb:cc:dd:ee:05"];
        assert_eq!(device_only.dhcp_expires, None);
        assert_eq!(device_only.name, None);
        assert_eq!(device_only.last_query, Some(2_000));
    }

    #[test]
    fn test_latest_lease_expiry_wins() {
        let leases = vec![
            lease("aa:bb:cc:dd:ee:06", "10.0.0.6", "a", Some(9_000)),
            lease("aa:bb:cc:dd:ee:06", "10.0.0.7", "b", Some(4_000)),
            lease("aa:bb:cc:dd:ee:06", "10.0.0.8", "c", None),
        ];
        let snapshot = merge(&leases, &[]);
        assert_eq!(snapshot["aa:bb:cc:dd:ee:06"].dhcp_expires, Some(9_000));
        assert_eq!(snapshot["aa:bb:cc:dd:ee:06"].name.as_deref(), Some("a"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let leases = vec![
            lease("AA:BB:CC:DD:EE:07", "10.0.0.7", "desk", Some(1)),
            lease("aa:bb:cc:dd:ee:08", "10.0.0.8", "*", None),
        ];
        let devices = vec![
            device("aa:bb:cc:dd:ee:07", &[("10.0.0.70", Some("desk.lan"))]),
            device("aa-bb-cc-dd-ee-09", &[]),
        ];

        let first = merge(&leases, &devices);
        let second = merge(&leases, &devices);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
