//! Read-time projections over a merged device entry
//!
//! Every exposed attribute is described once in [`FIELDS`]; views are built
//! from that table by [`FieldSensor::new`] rather than per-field types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::pihole::merge::is_meaningful_name;
use crate::pihole::DeviceEntry;

const UNIQUE_ID_PREFIX: &str = "pihole_presence";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityCategory {
    Primary,
    Diagnostic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Count,
    /// Epoch seconds; rendered as ISO-8601 on request
    Timestamp,
    Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampStyle {
    #[default]
    Epoch,
    Iso,
}

/// Inputs shared by every projection built in one read
#[derive(Debug, Clone, Copy)]
pub struct ProjectionContext {
    pub now: DateTime<Utc>,
    pub away_timeout: u64,
    pub available: bool,
    pub timestamps: TimestampStyle,
}

pub struct FieldDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    pub unit: Option<&'static str>,
    pub category: EntityCategory,
    pub kind: FieldKind,
    pub value: fn(&DeviceEntry, DateTime<Utc>) -> Value,
}

fn opt<T: Into<Value>>(v: Option<T>) -> Value {
    v.map(Into::into).unwrap_or(Value::Null)
}

pub const FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        key: "num_queries",
        label: "Queries",
        unit: None,
        category: EntityCategory::Diagnostic,
        kind: FieldKind::Count,
        value: |e, _| opt(e.num_queries),
    },
    FieldDescriptor {
        key: "interface",
        label: "Interface",
        unit: None,
        category: EntityCategory::Diagnostic,
        kind: FieldKind::Text,
        value: |e, _| opt(e.interface.clone()),
    },
    FieldDescriptor {
        key: "first_seen",
        label: "First Seen",
        unit: None,
        category: EntityCategory::Diagnostic,
        kind: FieldKind::Timestamp,
        value: |e, _| opt(e.first_seen),
    },
    FieldDescriptor {
        key: "last_query",
        label: "Last Query",
        unit: None,
        category: EntityCategory::Diagnostic,
        kind: FieldKind::Timestamp,
        value: |e, _| opt(e.last_query),
    },
    FieldDescriptor {
        key: "seconds_since_last_query",
        label: "Seconds Since Last Query",
        unit: Some("s"),
        category: EntityCategory::Primary,
        kind: FieldKind::Duration,
        value: |e, now| opt(seconds_since_last_query(e, now)),
    },
    FieldDescriptor {
        key: "mac_vendor",
        label: "Vendor",
        unit: None,
        category: EntityCategory::Diagnostic,
        kind: FieldKind::Text,
        value: |e, _| opt(e.mac_vendor.clone()),
    },
    FieldDescriptor {
        key: "ips",
        label: "IP Addresses",
        unit: None,
        category: EntityCategory::Diagnostic,
        kind: FieldKind::Text,
        value: |e, _| Value::from(e.ips.clone()),
    },
    FieldDescriptor {
        key: "name",
        label: "Name",
        unit: None,
        category: EntityCategory::Diagnostic,
        kind: FieldKind::Text,
        value: |e, _| opt(e.name.clone()),
    },
    FieldDescriptor {
        key: "dhcp_expires",
        label: "DHCP Lease Expires",
        unit: None,
        category: EntityCategory::Diagnostic,
        kind: FieldKind::Timestamp,
        value: |e, _| opt(e.dhcp_expires),
    },
    FieldDescriptor {
        key: "dhcp_hours_remaining",
        label: "DHCP Lease Remaining",
        unit: Some("h"),
        category: EntityCategory::Primary,
        kind: FieldKind::Duration,
        value: |e, now| opt(lease_hours_remaining(e, now)),
    },
];

/// `Some(true)` when the last query is within `away_timeout` seconds, `None` when there is no last query
pub fn presence(entry: &DeviceEntry, now: DateTime<Utc>, away_timeout: u64) -> Option<bool> {
    let elapsed = seconds_since_last_query(entry, now)?;
    Some(elapsed <= i64::try_from(away_timeout).unwrap_or(i64::MAX))
}

/// `None` also when the stored time is too far out to subtract
pub fn seconds_since_last_query(entry: &DeviceEntry, now: DateTime<Utc>) -> Option<i64> {
    entry
        .last_query
        .and_then(|last| now.timestamp().checked_sub(last))
}

/// Hours until the DHCP lease expires, one decimal place. Negative once expired.
pub fn lease_hours_remaining(entry: &DeviceEntry, now: DateTime<Utc>) -> Option<f64> {
    let remaining = entry
        .dhcp_expires
        .and_then(|expires| expires.checked_sub(now.timestamp()))?;
    let hours = remaining as f64 / 3600.0;
    Some((hours * 10.0).round() / 10.0)
}

/// ISO-8601 UTC rendering of an epoch-seconds value
pub fn iso_timestamp(epoch: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(epoch, 0).map(|dt| dt.to_rfc3339())
}

/// Stored name, or the MAC when the name is missing, blank or a placeholder
pub fn display_name(mac: &str, entry: &DeviceEntry) -> String {
    entry
        .name
        .as_deref()
        .filter(|n| is_meaningful_name(n))
        .map(|n| n.trim().to_string())
        .unwrap_or_else(|| mac.to_string())
}

pub fn unique_id(mac: &str, suffix: &str) -> String {
    format!("{}_{}_{}", UNIQUE_ID_PREFIX, mac.replace(':', ""), suffix)
}

fn render(descriptor: &FieldDescriptor, entry: &DeviceEntry, ctx: &ProjectionContext) -> Value {
    let raw = (descriptor.value)(entry, ctx.now);
    if descriptor.kind != FieldKind::Timestamp || ctx.timestamps != TimestampStyle::Iso {
        return raw;
    }
    raw.as_i64()
        .and_then(iso_timestamp)
        .map(Value::from)
        .unwrap_or(Value::Null)
}

/// All table fields as an attribute map
pub fn attributes(entry: &DeviceEntry, ctx: &ProjectionContext) -> Map<String, Value> {
    FIELDS
        .iter()
        .map(|d| (d.key.to_string(), render(d, entry, ctx)))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    pub connection: String,
    pub name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresenceSensor {
    pub unique_id: String,
    pub name: String,
    pub device_class: &'static str,
    /// `null` when presence is unknown
    pub state: Option<bool>,
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceTracker {
    pub unique_id: String,
    pub name: &'static str,
    /// Unknown presence counts as not connected
    pub is_connected: bool,
    pub last_query: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldSensor {
    pub unique_id: String,
    pub name: String,
    pub key: &'static str,
    pub unit: Option<&'static str>,
    pub category: EntityCategory,
    pub state: Value,
}

impl FieldSensor {
    pub fn new(
        descriptor: &FieldDescriptor,
        mac: &str,
        entry: &DeviceEntry,
        ctx: &ProjectionContext,
    ) -> Self {
        Self {
            unique_id: unique_id(mac, descriptor.key),
            name: format!("{} {}", display_name(mac, entry), descriptor.label),
            key: descriptor.key,
            unit: descriptor.unit,
            category: descriptor.category,
            state: render(descriptor, entry, ctx),
        }
    }
}

/// Everything a consumer needs to present one device
#[derive(Debug, Clone, Serialize)]
pub struct DeviceView {
    pub mac: String,
    pub available: bool,
    pub device: DeviceInfo,
    pub presence: PresenceSensor,
    pub tracker: DeviceTracker,
    pub sensors: Vec<FieldSensor>,
    pub attributes: Map<String, Value>,
}

impl DeviceView {
    pub fn new(mac: &str, entry: &DeviceEntry, ctx: &ProjectionContext) -> Self {
        let state = presence(entry, ctx.now, ctx.away_timeout);
        let last_query_iso = entry.last_query.and_then(iso_timestamp);

        let mut presence_attrs = Map::new();
        presence_attrs.insert("away_timeout".to_string(), Value::from(ctx.away_timeout));
        presence_attrs.insert("last_query".to_string(), opt(entry.last_query));

        Self {
            mac: mac.to_string(),
            available: ctx.available,
            device: DeviceInfo {
                connection: mac.to_string(),
                name: display_name(mac, entry),
                manufacturer: entry.mac_vendor.clone(),
                model: entry.interface.clone(),
            },
            presence: PresenceSensor {
                unique_id: unique_id(mac, "presence"),
                name: format!("{} present", display_name(mac, entry)),
                device_class: "presence",
                state,
                attributes: presence_attrs,
            },
            tracker: DeviceTracker {
                unique_id: unique_id(mac, "tracker"),
                name: "Presence via Pi-hole",
                is_connected: state.unwrap_or(false),
                last_query: last_query_iso,
            },
            sensors: FIELDS
                .iter()
                .map(|d| FieldSensor::new(d, mac, entry, ctx))
                .collect(),
            attributes: attributes(entry, ctx),
        }
    }
}
