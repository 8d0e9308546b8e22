//! Pi-hole API payloads
//!
//! Only the fields the merge needs are modeled. Unknown fields are ignored and
//! every per-record field is optional, so sparse records still deserialize.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `GET /api/dhcp/leases`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeasesResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub leases: Vec<LeaseRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaseRecord {
    #[serde(default)]
    pub hwaddr: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Epoch seconds
    #[serde(default, deserialize_with = "numeric_or_none")]
    pub expires: Option<i64>,
}

/// `GET /api/network/devices`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DevicesResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub devices: Vec<DeviceRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    #[serde(default)]
    pub hwaddr: Option<String>,
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default, deserialize_with = "numeric_or_none")]
    pub first_seen: Option<i64>,
    #[serde(default, deserialize_with = "numeric_or_none")]
    pub last_query: Option<i64>,
    #[serde(default, deserialize_with = "numeric_or_none")]
    pub num_queries: Option<i64>,
    #[serde(default)]
    pub mac_vendor: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ips: Vec<DeviceAddress>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceAddress {
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Integers pass through, floats truncate to whole seconds, anything else is absent.
fn numeric_or_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        _ => None,
    })
}
