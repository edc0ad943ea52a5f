use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// AIS heading value meaning "not available".
pub const HEADING_NOT_AVAILABLE: u16 = 511;

/// Canonical vessel position/identity report.
///
/// Only `mmsi` and `msg_time` are required: position reports carry no
/// identity fields and static reports carry no position, so everything
/// else is optional. Unknown fields are ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct VesselReport {
    /// Unique message identifier, generated when the source has none
    #[serde(default = "Uuid::new_v4", with = "uuid_string")]
    #[garde(skip)]
    pub msg_uuid: Uuid,

    /// Maritime Mobile Service Identity
    #[garde(range(min = 1, max = 999_999_999))]
    pub mmsi: u32,

    /// Time the report was received by the upstream network
    #[garde(skip)]
    pub msg_time: DateTime<Utc>,

    #[garde(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,

    #[garde(range(min = -180.0, max = 180.0))]
    pub lon: Option<f64>,

    /// Speed over ground in knots
    #[garde(range(min = 0.0))]
    pub speed: Option<f64>,

    /// Course over ground in degrees
    #[garde(range(min = 0.0, max = 360.0))]
    pub course: Option<f64>,

    /// True heading in degrees, 511 when not available
    #[garde(custom(validate_heading))]
    pub heading: Option<u16>,

    /// Rate of turn
    #[garde(skip)]
    pub rot: Option<f64>,

    /// Navigational status code
    #[garde(skip)]
    pub status: Option<i32>,

    #[garde(skip)]
    pub shipname: Option<String>,

    #[garde(skip)]
    pub shiptype: Option<i32>,

    #[garde(skip)]
    pub callsign: Option<String>,

    #[garde(skip)]
    pub imo: Option<u32>,

    /// Distance from reference point to bow
    #[garde(range(min = 0))]
    pub a: Option<i32>,

    /// Distance from reference point to stern
    #[garde(range(min = 0))]
    pub b: Option<i32>,

    /// Distance from reference point to port side
    #[garde(range(min = 0))]
    pub c: Option<i32>,

    /// Distance from reference point to starboard side
    #[garde(range(min = 0))]
    pub d: Option<i32>,
}

fn validate_heading(value: &Option<u16>, _ctx: &()) -> garde::Result {
    match value {
        Some(heading) if *heading >= 360 && *heading != HEADING_NOT_AVAILABLE => Err(
            garde::Error::new(format!("heading {} is outside 0..360", heading)),
        ),
        _ => Ok(()),
    }
}

/// Hyphenated string form on every wire format; msgpack would otherwise
/// carry the UUID as 16 raw bytes.
mod uuid_string {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use uuid::Uuid;

    pub fn serialize<S: Serializer>(uuid: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&uuid.hyphenated())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
        let value = String::deserialize(deserializer)?;
        Uuid::parse_str(&value).map_err(D::Error::custom)
    }
}
