use foundation::math::LatLng;

/// Opaque display data attached to a feature.
///
/// Pairs keep the order they were built in; GeoJSON ingest builds them sorted
/// by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    pub pairs: Vec<(String, String)>,
}

impl Properties {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Validated point of interest. Never mutated once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: String,
    pub coordinate: LatLng,
    pub properties: Properties,
}

impl Feature {
    pub fn new(id: impl Into<String>, coordinate: LatLng, properties: Properties) -> Self {
        Self {
            id: id.into(),
            coordinate,
            properties,
        }
    }
}
