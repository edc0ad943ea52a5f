use serde_json::{Map, Value};

/// A record as received from the upstream API, before any key rewriting.
pub type RawRecord = Map<String, Value>;

/// Upstream API field names and the canonical names they map to.
pub const FIELD_RENAMES: &[(&str, &str)] = &[
    ("msgtime", "msg_time"),
    ("latitude", "lat"),
    ("longitude", "lon"),
    ("speedOverGround", "speed"),
    ("courseOverGround", "course"),
    ("trueHeading", "heading"),
    ("rateOfTurn", "rot"),
    ("navigationalStatus", "status"),
    ("name", "shipname"),
    ("shipType", "shiptype"),
    ("callSign", "callsign"),
    ("imoNumber", "imo"),
    ("dimensionA", "a"),
    ("dimensionB", "b"),
    ("dimensionC", "c"),
    ("dimensionD", "d"),
];

fn renamed(field: &str) -> Option<&'static str> {
    FIELD_RENAMES
        .iter()
        .find(|(upstream, _)| *upstream == field)
        .map(|(_, canonical)| *canonical)
}

/// Returns the canonical name for an upstream field, or the field itself
/// when it has no entry in [`FIELD_RENAMES`].
pub fn canonical_field_name(field: &str) -> &str {
    renamed(field).unwrap_or(field)
}

/// Rewrites every key of `raw` to its canonical name. Values are moved
/// across untouched and keys outside the rename table pass through.
pub fn normalize_fields(raw: RawRecord) -> RawRecord {
    raw.into_iter()
        .map(|(key, value)| match renamed(&key) {
            Some(canonical) => (canonical.to_string(), value),
            None => (key, value),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_renames_known_fields() {
        let raw = record(json!({
            "msgtime": "2024-05-01T12:00:00+00:00",
            "latitude": 69.65,
            "longitude": 18.96,
            "speedOverGround": 11.2,
            "callSign": "LCFV",
        }));

        let normalized = normalize_fields(raw);

        assert_eq!(normalized["msg_time"], json!("2024-05-01T12:00:00+00:00"));
        assert_eq!(normalized["lat"], json!(69.65));
        assert_eq!(normalized["lon"], json!(18.96));
        assert_eq!(normalized["speed"], json!(11.2));
        assert_eq!(normalized["callsign"], json!("LCFV"));
        assert!(!normalized.contains_key("latitude"));
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let raw = record(json!({
            "mmsi": 257654600,
            "destination": "TROMSO",
            "eta": "2024-05-02T06:00:00",
        }));

        let normalized = normalize_fields(raw.clone());

        assert_eq!(normalized, raw);
    }

    #[test]
    fn test_preserves_key_count_and_values() {
        let raw = record(json!({
            "mmsi": 257654600,
            "trueHeading": 511,
            "rateOfTurn": -2.5,
            "name": "NORDLYS",
            "dimensionA": 10,
            "extra": {"nested": [1, 2, 3]},
        }));

        let normalized = normalize_fields(raw.clone());

        assert_eq!(normalized.len(), raw.len());
        for (key, value) in &raw {
            assert_eq!(&normalized[canonical_field_name(key)], value);
        }
    }

    #[test]
    fn test_is_deterministic() {
        let raw = record(json!({"msgtime": "x", "shipType": 70, "imoNumber": 9247455}));

        assert_eq!(normalize_fields(raw.clone()), normalize_fields(raw));
    }

    #[test]
    fn test_rename_table_has_unique_targets() {
        let mut targets: Vec<_> = FIELD_RENAMES.iter().map(|(_, to)| *to).collect();
        targets.sort_unstable();
        targets.dedup();
        assert_eq!(targets.len(), FIELD_RENAMES.len());
    }
}
