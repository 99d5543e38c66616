//! Geospatial/metadata file selection.
//!
//! Given a kind's blob listing and the request's query parameters, one
//! of three mutually exclusive selection modes applies:
//!
//! 1. by-distance — valid `center` coordinate AND nonzero `distance`
//! 2. by-metadata — any of `county`/`state`/`zip_code` supplied
//! 3. by-all — no filters, the full listing
//!
//! Blobs without metadata are silently skipped in every mode.
//!
//! A malformed `center` (or non-numeric `distance`) does not reject the
//! request: the distance filter is simply not applied and selection
//! falls through to the next mode, matching the source system. The
//! fall-through is logged and counted so the degradation is visible.

use crate::metrics::MALFORMED_CENTER_TOTAL;
use flagger_core::geo::{self, Coordinate};
use flagger_core::FileKind;
use flagger_storage::BlobEntry;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Query parameters accepted by the listing endpoint.
///
/// `distance` arrives as a raw string so a non-numeric value can fail
/// open instead of rejecting the whole request.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Center of the query location, `"lat,long"`.
    pub center: Option<String>,
    /// Maximum distance from the center, in km.
    pub distance: Option<String>,
    /// County name filter.
    pub county: Option<String>,
    /// State name filter.
    pub state: Option<String>,
    /// Zip code filter.
    pub zip_code: Option<String>,
}

/// One metadata constraint: the blob's named field (a comma-separated
/// list) must contain the value, case-insensitively.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    /// Blob metadata field name.
    pub name: &'static str,
    /// Required value from the query.
    pub value: String,
}

/// The selection mode resolved from a listing request.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectionMode {
    /// Full listing, no filters.
    All,
    /// Blobs whose work-zone midpoint is within `max_km` of `center`.
    ByDistance { center: Coordinate, max_km: f64 },
    /// Blobs matching every metadata constraint.
    ByMetadata(Vec<Constraint>),
}

impl SelectionMode {
    /// Resolve the mode for a query, with by-distance taking priority
    /// over by-metadata over by-all.
    pub fn from_query(query: &ListQuery) -> Self {
        let max_km = query
            .distance
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| match raw.parse::<f64>() {
                Ok(km) => Some(km),
                Err(_) => {
                    tracing::warn!(distance = raw, "non-numeric distance, filter not applied");
                    None
                }
            })
            .unwrap_or(0.0);

        if max_km != 0.0 {
            if let Some(raw) = query.center.as_deref().filter(|raw| !raw.is_empty()) {
                match geo::parse_center(raw) {
                    Some(center) => return SelectionMode::ByDistance { center, max_km },
                    None => {
                        // Preserved source behavior: degrade to the
                        // unfiltered path instead of rejecting.
                        MALFORMED_CENTER_TOTAL.inc();
                        tracing::warn!(center = raw, "malformed center, distance filter not applied");
                    }
                }
            }
        }

        let mut constraints = Vec::new();
        for (name, value) in [
            ("county_names", &query.county),
            ("state_names", &query.state),
            ("zip_code", &query.zip_code),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                constraints.push(Constraint {
                    name,
                    value: value.to_string(),
                });
            }
        }

        if constraints.is_empty() {
            SelectionMode::All
        } else {
            SelectionMode::ByMetadata(constraints)
        }
    }
}

/// One entry of a listing response.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileEntry {
    /// Caller-facing work-zone id.
    pub name: String,
    /// Group id shared by all parts of the record, or "unknown".
    pub id: String,
}

/// Listing response: the applied filters (if any) and matching entries.
#[derive(Debug, Serialize)]
pub struct SelectionResult {
    /// Echo of the applied constraints; null for an unfiltered listing.
    pub query_parameters: Option<Value>,
    /// Matching entries, in listing order.
    pub data: Vec<FileEntry>,
}

/// Run the selection over a kind's listing.
pub fn select(kind: FileKind, entries: &[BlobEntry], mode: &SelectionMode) -> SelectionResult {
    match mode {
        SelectionMode::All => SelectionResult {
            query_parameters: None,
            data: entries
                .iter()
                .filter(|entry| !entry.metadata.is_empty())
                .map(|entry| file_entry(kind, entry))
                .collect(),
        },
        SelectionMode::ByDistance { center, max_km } => {
            let mut data: Vec<FileEntry> = Vec::new();
            for entry in entries.iter().filter(|entry| !entry.metadata.is_empty()) {
                if let Some(candidate) = entry_within(kind, entry, *center, *max_km) {
                    // Linear dedup by full value equality: split parts
                    // of one work zone normalize to the same entry.
                    if !data.contains(&candidate) {
                        data.push(candidate);
                    }
                }
            }
            SelectionResult {
                query_parameters: Some(json!({
                    "distance": format!("{max_km:.0} km"),
                    "center": [center.lat, center.lon],
                })),
                data,
            }
        }
        SelectionMode::ByMetadata(constraints) => {
            let data = entries
                .iter()
                .filter(|entry| !entry.metadata.is_empty())
                .filter(|entry| constraints.iter().all(|c| matches_constraint(entry, c)))
                .map(|entry| file_entry(kind, entry))
                .collect();

            // Each constraint is echoed as its own one-entry mapping,
            // not merged into a single object.
            let echo: Vec<Value> = constraints
                .iter()
                .map(|c| json!({ c.name: c.value }))
                .collect();

            SelectionResult {
                query_parameters: Some(Value::Array(echo)),
                data,
            }
        }
    }
}

fn file_entry(kind: FileKind, entry: &BlobEntry) -> FileEntry {
    FileEntry {
        name: kind.public_id(&entry.key),
        id: entry.group_id().to_string(),
    }
}

/// Evaluate one blob against the distance filter.
///
/// Needs all four boundary coordinates in metadata; the work zone's
/// position is the midpoint between its beginning and ending points.
/// A missing or non-numeric coordinate skips the blob.
fn entry_within(
    kind: FileKind,
    entry: &BlobEntry,
    center: Coordinate,
    max_km: f64,
) -> Option<FileEntry> {
    let begin_lat = geo::valid_number(entry.meta("beginning_lat")?)?;
    let begin_lon = geo::valid_number(entry.meta("beginning_lon")?)?;
    let end_lat = geo::valid_number(entry.meta("ending_lat")?)?;
    let end_lon = geo::valid_number(entry.meta("ending_lon")?)?;

    let midpoint = Coordinate {
        lat: (begin_lat + end_lat) / 2.0,
        lon: (begin_lon + end_lon) / 2.0,
    };

    let km = geo::distance_m(center, midpoint) / 1000.0;
    (km <= max_km).then(|| file_entry(kind, entry))
}

/// The blob's metadata field is a comma-separated list; the constraint
/// holds when the query value appears in it, case-insensitively. An
/// absent field is an empty list, so the constraint fails.
fn matches_constraint(entry: &BlobEntry, constraint: &Constraint) -> bool {
    let wanted = constraint.value.to_lowercase();
    entry
        .meta(constraint.name)
        .unwrap_or("")
        .split(',')
        .any(|item| item.trim().to_lowercase() == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn blob(key: &str, pairs: &[(&str, &str)]) -> BlobEntry {
        BlobEntry {
            key: key.to_string(),
            size: 100,
            metadata: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn bare_blob(key: &str) -> BlobEntry {
        BlobEntry {
            key: key.to_string(),
            size: 100,
            metadata: HashMap::new(),
        }
    }

    fn query(
        center: Option<&str>,
        distance: Option<&str>,
        county: Option<&str>,
        state: Option<&str>,
        zip_code: Option<&str>,
    ) -> ListQuery {
        ListQuery {
            center: center.map(String::from),
            distance: distance.map(String::from),
            county: county.map(String::from),
            state: state.map(String::from),
            zip_code: zip_code.map(String::from),
        }
    }

    // Boulder-ish work zone used by the distance tests.
    fn boulder_blob(key: &str, group: &str) -> BlobEntry {
        blob(
            key,
            &[
                ("group_id", group),
                ("beginning_lat", "40.01"),
                ("beginning_lon", "-105.27"),
                ("ending_lat", "40.02"),
                ("ending_lon", "-105.28"),
            ],
        )
    }

    #[test]
    fn mode_precedence_distance_over_metadata() {
        let q = query(Some("40.0,-105.0"), Some("10"), Some("Boulder"), None, None);
        match SelectionMode::from_query(&q) {
            SelectionMode::ByDistance { center, max_km } => {
                assert_eq!(center, Coordinate { lat: 40.0, lon: -105.0 });
                assert_eq!(max_km, 10.0);
            }
            other => panic!("unexpected mode: {other:?}"),
        }
    }

    #[test]
    fn mode_requires_nonzero_distance() {
        let q = query(Some("40.0,-105.0"), Some("0"), None, None, None);
        assert_eq!(SelectionMode::from_query(&q), SelectionMode::All);

        let q = query(Some("40.0,-105.0"), None, None, None, None);
        assert_eq!(SelectionMode::from_query(&q), SelectionMode::All);
    }

    #[test]
    fn malformed_center_falls_back_to_metadata_mode() {
        let q = query(Some("not-a-coord"), Some("10"), Some("Boulder"), None, None);
        match SelectionMode::from_query(&q) {
            SelectionMode::ByMetadata(constraints) => {
                assert_eq!(constraints.len(), 1);
                assert_eq!(constraints[0].name, "county_names");
            }
            other => panic!("unexpected mode: {other:?}"),
        }
    }

    #[test]
    fn non_numeric_distance_falls_back_to_all() {
        let q = query(Some("40.0,-105.0"), Some("ten"), None, None, None);
        assert_eq!(SelectionMode::from_query(&q), SelectionMode::All);
    }

    #[test]
    fn empty_string_params_count_as_absent() {
        let q = query(Some(""), Some(""), Some(""), None, None);
        assert_eq!(SelectionMode::from_query(&q), SelectionMode::All);
    }

    #[test]
    fn metadata_mode_collects_all_supplied_constraints() {
        let q = query(None, None, Some("Boulder"), Some("Colorado"), Some("80301"));
        match SelectionMode::from_query(&q) {
            SelectionMode::ByMetadata(constraints) => {
                let names: Vec<_> = constraints.iter().map(|c| c.name).collect();
                assert_eq!(names, vec!["county_names", "state_names", "zip_code"]);
            }
            other => panic!("unexpected mode: {other:?}"),
        }
    }

    #[test]
    fn by_all_skips_blobs_without_metadata() {
        let entries = vec![
            blob("wzdx/wzdx--a.geojson", &[("group_id", "g1")]),
            blob("wzdx/wzdx--b.geojson", &[("group_id", "g2")]),
            bare_blob("wzdx/wzdx--c.geojson"),
        ];

        let result = select(FileKind::Wzdx, &entries, &SelectionMode::All);
        assert!(result.query_parameters.is_none());
        assert_eq!(result.data.len(), 2);
        assert_eq!(result.data[0], FileEntry { name: "a".into(), id: "g1".into() });
    }

    #[test]
    fn by_all_defaults_missing_group_id_to_unknown() {
        let entries = vec![blob("wzdx/wzdx--a.geojson", &[("county_names", "Boulder")])];
        let result = select(FileKind::Wzdx, &entries, &SelectionMode::All);
        assert_eq!(result.data[0].id, "unknown");
    }

    #[test]
    fn by_distance_includes_nearby_and_excludes_far() {
        let entries = vec![
            boulder_blob("wzdx/wzdx--near.geojson", "g1"),
            blob(
                "wzdx/wzdx--far.geojson",
                &[
                    ("group_id", "g2"),
                    ("beginning_lat", "39.0"),
                    ("beginning_lon", "-95.0"),
                    ("ending_lat", "39.1"),
                    ("ending_lon", "-95.1"),
                ],
            ),
        ];
        let mode = SelectionMode::ByDistance {
            center: Coordinate { lat: 40.0150, lon: -105.2705 },
            max_km: 10.0,
        };

        let result = select(FileKind::Wzdx, &entries, &mode);
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0].name, "near");
    }

    #[test]
    fn by_distance_skips_blobs_missing_boundary_coordinates() {
        let mut incomplete = boulder_blob("wzdx/wzdx--partial.geojson", "g1");
        incomplete.metadata.remove("ending_lon");
        let entries = vec![incomplete];

        let mode = SelectionMode::ByDistance {
            center: Coordinate { lat: 40.0150, lon: -105.2705 },
            // No distance is large enough to pull in a blob with an
            // incomplete boundary.
            max_km: 1.0e9,
        };

        let result = select(FileKind::Wzdx, &entries, &mode);
        assert!(result.data.is_empty());
    }

    #[test]
    fn by_distance_skips_non_numeric_boundary_coordinates() {
        let mut bad = boulder_blob("wzdx/wzdx--bad.geojson", "g1");
        bad.metadata
            .insert("beginning_lat".to_string(), "forty".to_string());
        let mode = SelectionMode::ByDistance {
            center: Coordinate { lat: 40.0150, lon: -105.2705 },
            max_km: 1.0e9,
        };

        let result = select(FileKind::Wzdx, &[bad], &mode);
        assert!(result.data.is_empty());
    }

    #[test]
    fn by_distance_dedups_identical_entries() {
        // Both keys normalize to {name: "wz1", id: "g1"}.
        let entries = vec![
            boulder_blob("rsm-xml/rsm-xml--wz1--1-of-1.xml", "g1"),
            boulder_blob("rsm-xml/rsm-xml--wz1.xml", "g1"),
        ];
        let mode = SelectionMode::ByDistance {
            center: Coordinate { lat: 40.0150, lon: -105.2705 },
            max_km: 10.0,
        };

        let result = select(FileKind::RsmXml, &entries, &mode);
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0], FileEntry { name: "wz1".into(), id: "g1".into() });
    }

    #[test]
    fn by_distance_echoes_query_parameters() {
        let mode = SelectionMode::ByDistance {
            center: Coordinate { lat: 40.5, lon: -105.25 },
            max_km: 25.0,
        };
        let result = select(FileKind::Wzdx, &[], &mode);

        let echo = result.query_parameters.unwrap();
        assert_eq!(echo["distance"], "25 km");
        assert_eq!(echo["center"][0], 40.5);
        assert_eq!(echo["center"][1], -105.25);
    }

    #[test]
    fn by_metadata_matches_case_insensitively() {
        let entries = vec![blob(
            "wzdx/wzdx--a.geojson",
            &[("group_id", "g1"), ("county_names", "Boulder,Larimer")],
        )];

        let matches = |county: &str| {
            let mode = SelectionMode::ByMetadata(vec![Constraint {
                name: "county_names",
                value: county.to_string(),
            }]);
            select(FileKind::Wzdx, &entries, &mode).data.len()
        };

        assert_eq!(matches("boulder"), 1);
        assert_eq!(matches("LARIMER"), 1);
        assert_eq!(matches("denver"), 0);
    }

    #[test]
    fn by_metadata_requires_every_constraint() {
        let entries = vec![blob(
            "wzdx/wzdx--a.geojson",
            &[
                ("group_id", "g1"),
                ("county_names", "Boulder"),
                ("state_names", "Colorado"),
            ],
        )];
        let mode = SelectionMode::ByMetadata(vec![
            Constraint { name: "county_names", value: "boulder".to_string() },
            Constraint { name: "zip_code", value: "80301".to_string() },
        ]);

        // zip_code metadata is absent, so the constraint fails.
        let result = select(FileKind::Wzdx, &entries, &mode);
        assert!(result.data.is_empty());
    }

    #[test]
    fn by_metadata_echoes_one_mapping_per_constraint() {
        let mode = SelectionMode::ByMetadata(vec![
            Constraint { name: "county_names", value: "boulder".to_string() },
            Constraint { name: "state_names", value: "colorado".to_string() },
        ]);
        let result = select(FileKind::Wzdx, &[], &mode);

        let echo = result.query_parameters.unwrap();
        assert_eq!(
            echo,
            serde_json::json!([
                {"county_names": "boulder"},
                {"state_names": "colorado"}
            ])
        );
    }
}
