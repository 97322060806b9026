use foundation::math::LatLng;
use registry::{Feature, Properties};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// GeoJSON feature as delivered by the data layer or an import, not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFeature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub geometry: Option<RawGeometry>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Value,
}

impl RawFeature {
    pub fn point(id: impl Into<String>, lat: f64, lng: f64, properties: Map<String, Value>) -> Self {
        Self {
            id: Some(Value::String(id.into())),
            geometry: Some(RawGeometry {
                kind: "Point".to_string(),
                coordinates: Value::from(vec![lng, lat]),
            }),
            properties: Some(properties),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MalformedKind {
    NotAFeature(String),
    MissingId,
    MissingGeometry,
    UnsupportedGeometry(String),
    BadCoordinates,
    OutOfRange { lat: f64, lng: f64 },
}

/// A feature rejected at the boundary. Rejections are always reported, never
/// dropped silently.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureError {
    /// Position in the input batch.
    pub index: usize,
    pub id: Option<String>,
    pub kind: MalformedKind,
}

impl std::fmt::Display for FeatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "feature #{}", self.index)?;
        if let Some(id) = &self.id {
            write!(f, " ({id})")?;
        }
        match &self.kind {
            MalformedKind::NotAFeature(msg) => write!(f, ": not a feature: {msg}"),
            MalformedKind::MissingId => write!(f, ": missing id"),
            MalformedKind::MissingGeometry => write!(f, ": missing geometry"),
            MalformedKind::UnsupportedGeometry(kind) => {
                write!(f, ": unsupported geometry {kind:?}, expected Point")
            }
            MalformedKind::BadCoordinates => write!(f, ": coordinates must be [lng, lat]"),
            MalformedKind::OutOfRange { lat, lng } => {
                write!(f, ": coordinate out of range (lat={lat}, lng={lng})")
            }
        }
    }
}

impl std::error::Error for FeatureError {}

#[derive(Debug, Clone, PartialEq)]
pub enum IngestError {
    Json(String),
    NotAFeatureCollection,
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::Json(msg) => write!(f, "invalid json: {msg}"),
            IngestError::NotAFeatureCollection => write!(f, "expected a GeoJSON FeatureCollection"),
        }
    }
}

impl std::error::Error for IngestError {}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub features: Vec<Feature>,
    pub rejected: Vec<FeatureError>,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Splits a FeatureCollection into raw features. A feature whose JSON shape
/// is wrong is kept as an error instead of failing the whole collection.
pub fn parse_feature_collection(
    json: &str,
) -> Result<Vec<Result<RawFeature, FeatureError>>, IngestError> {
    let doc: Value = serde_json::from_str(json).map_err(|e| IngestError::Json(e.to_string()))?;
    if doc.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(IngestError::NotAFeatureCollection);
    }
    let Some(Value::Array(items)) = doc.get("features") else {
        return Err(IngestError::NotAFeatureCollection);
    };

    Ok(items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<RawFeature>(item.clone()).map_err(|e| FeatureError {
                index,
                id: item.get("id").and_then(id_string),
                kind: MalformedKind::NotAFeature(e.to_string()),
            })
        })
        .collect())
}

/// Parses and validates a FeatureCollection.
pub fn ingest(json: &str) -> Result<IngestReport, IngestError> {
    let mut report = IngestReport::default();
    for (index, parsed) in parse_feature_collection(json)?.into_iter().enumerate() {
        match parsed.and_then(|raw| validate(&raw, index)) {
            Ok(feature) => report.features.push(feature),
            Err(e) => report.rejected.push(e),
        }
    }
    Ok(report)
}

pub fn validate_all(raw: &[RawFeature]) -> IngestReport {
    let mut report = IngestReport::default();
    for (index, r) in raw.iter().enumerate() {
        match validate(r, index) {
            Ok(feature) => report.features.push(feature),
            Err(e) => report.rejected.push(e),
        }
    }
    report
}

/// Checks id, geometry and coordinate range, and flattens properties into
/// display strings.
pub fn validate(raw: &RawFeature, index: usize) -> Result<Feature, FeatureError> {
    let id = raw
        .id
        .as_ref()
        .and_then(id_string)
        .or_else(|| {
            raw.properties
                .as_ref()
                .and_then(|p| p.get("id"))
                .and_then(id_string)
        });
    let fail = |kind| FeatureError {
        index,
        id: id.clone(),
        kind,
    };

    let Some(feature_id) = id.clone() else {
        return Err(fail(MalformedKind::MissingId));
    };
    let Some(geometry) = &raw.geometry else {
        return Err(fail(MalformedKind::MissingGeometry));
    };
    if geometry.kind != "Point" {
        return Err(fail(MalformedKind::UnsupportedGeometry(geometry.kind.clone())));
    }

    let coords = geometry
        .coordinates
        .as_array()
        .filter(|c| c.len() >= 2)
        .and_then(|c| Some((c[0].as_f64()?, c[1].as_f64()?)));
    let Some((lng, lat)) = coords else {
        return Err(fail(MalformedKind::BadCoordinates));
    };
    let coordinate = LatLng::new(lat, lng);
    if !coordinate.is_valid() {
        return Err(fail(MalformedKind::OutOfRange { lat, lng }));
    }

    let properties = raw
        .properties
        .as_ref()
        .map(flatten_properties)
        .unwrap_or_default();

    Ok(Feature::new(feature_id, coordinate, properties))
}

fn id_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn flatten_properties(map: &Map<String, Value>) -> Properties {
    map.iter()
        .filter_map(|(k, v)| {
            let text = match v {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                other => other.to_string(),
            };
            Some((k.clone(), text))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "id": "a",
             "geometry": {"type": "Point", "coordinates": [8.5, 47.3]},
             "properties": {"name": "Alpha", "condition": "good", "rating": 4, "wet": false, "note": null}},
            {"type": "Feature", "id": 7,
             "geometry": {"type": "Point", "coordinates": [8.6, 47.4]},
             "properties": {"name": "Seven"}},
            {"type": "Feature",
             "geometry": {"type": "Point", "coordinates": [8.7, 47.5]},
             "properties": {"id": "from-props"}},
            {"type": "Feature", "id": "no-geom", "geometry": null, "properties": {}},
            {"type": "Feature", "id": "line",
             "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}},
            {"type": "Feature", "id": "far",
             "geometry": {"type": "Point", "coordinates": [8.0, 123.0]}},
            {"type": "Feature", "id": "short",
             "geometry": {"type": "Point", "coordinates": [8.0]}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1, 1]}},
            {"type": "Feature", "id": "weird", "geometry": "not-an-object"}
        ]
    }"#;

    #[test]
    fn ingest_accepts_valid_and_reports_the_rest() {
        let report = ingest(COLLECTION).unwrap();

        let ids: Vec<&str> = report.features.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "7", "from-props"]);

        let kinds: Vec<(usize, MalformedKind)> = report
            .rejected
            .iter()
            .map(|e| (e.index, e.kind.clone()))
            .collect();
        assert_eq!(kinds.len(), 6);
        assert_eq!(kinds[0], (3, MalformedKind::MissingGeometry));
        assert_eq!(
            kinds[1],
            (4, MalformedKind::UnsupportedGeometry("LineString".to_string()))
        );
        assert_eq!(
            kinds[2],
            (
                5,
                MalformedKind::OutOfRange {
                    lat: 123.0,
                    lng: 8.0
                }
            )
        );
        assert_eq!(kinds[3], (6, MalformedKind::BadCoordinates));
        assert_eq!(kinds[4], (7, MalformedKind::MissingId));
        assert_eq!(report.rejected[5].index, 8);
        assert_eq!(report.rejected[5].id.as_deref(), Some("weird"));
        assert!(matches!(report.rejected[5].kind, MalformedKind::NotAFeature(_)));
        assert!(!report.is_clean());
    }

    #[test]
    fn properties_are_flattened_to_strings() {
        let report = ingest(COLLECTION).unwrap();
        let a = &report.features[0];
        assert_eq!(a.coordinate, LatLng::new(47.3, 8.5));
        assert_eq!(a.properties.get("name"), Some("Alpha"));
        assert_eq!(a.properties.get("rating"), Some("4"));
        assert_eq!(a.properties.get("wet"), Some("false"));
        assert_eq!(a.properties.get("note"), None);
    }

    #[test]
    fn flattened_properties_are_sorted_by_key() {
        let report = ingest(COLLECTION).unwrap();
        let keys: Vec<&str> = report.features[0]
            .properties
            .pairs
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, vec!["condition", "name", "rating", "wet"]);
    }

    #[test]
    fn rejects_non_collections() {
        assert_eq!(
            ingest(r#"{"type": "Feature"}"#).unwrap_err(),
            IngestError::NotAFeatureCollection
        );
        assert!(matches!(ingest("{not json").unwrap_err(), IngestError::Json(_)));
    }

    #[test]
    fn point_constructor_round_trips_through_validate() {
        let mut props = Map::new();
        props.insert("condition".into(), Value::from("poor"));
        let raw = RawFeature::point("p1", 10.0, 20.0, props);
        let f = validate(&raw, 0).unwrap();
        assert_eq!(f.id, "p1");
        assert_eq!(f.coordinate, LatLng::new(10.0, 20.0));
        assert_eq!(f.properties.get("condition"), Some("poor"));
    }

    #[test]
    fn error_messages_name_the_feature() {
        let e = FeatureError {
            index: 3,
            id: Some("x".into()),
            kind: MalformedKind::MissingGeometry,
        };
        assert_eq!(e.to_string(), "feature #3 (x): missing geometry");
    }
}
