use std::collections::BTreeSet;
use std::rc::Rc;

use registry::Properties;

pub const CONDITION_KEY: &str = "condition";
/// Condition assumed for features without a `condition` property.
pub const UNKNOWN_CONDITION: &str = "unknown";
/// Properties scanned by free-text search.
pub const SEARCH_KEYS: [&str; 2] = ["name", "description"];

/// Visibility predicate over feature properties.
pub type Predicate = Rc<dyn Fn(&Properties) -> bool>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyOp {
    Eq,
    Contains,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyFilter {
    pub key: String,
    pub op: PropertyOp,
    pub value: String,
}

impl PropertyFilter {
    pub fn eq(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            op: PropertyOp::Eq,
            value: value.into(),
        }
    }

    pub fn contains(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            op: PropertyOp::Contains,
            value: value.into(),
        }
    }

    fn matches(&self, props: &Properties) -> bool {
        props.pairs.iter().any(|(k, v)| {
            k == &self.key
                && match self.op {
                    PropertyOp::Eq => v == &self.value,
                    PropertyOp::Contains => v.contains(&self.value),
                }
        })
    }
}

/// Filter state driven by the condition checkboxes, the search box and any
/// extra property constraints. The default shows everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureFilter {
    /// Allowed `condition` values; `None` allows all.
    pub conditions: Option<BTreeSet<String>>,
    pub search: Option<String>,
    pub properties: Vec<PropertyFilter>,
}

impl FeatureFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_conditions<I, S>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions = Some(conditions.into_iter().map(Into::into).collect());
        self
    }

    /// Blank terms clear the search.
    pub fn with_search(mut self, term: &str) -> Self {
        let term = term.trim();
        self.search = (!term.is_empty()).then(|| term.to_lowercase());
        self
    }

    pub fn with_property(mut self, filter: PropertyFilter) -> Self {
        self.properties.push(filter);
        self
    }

    pub fn matches(&self, props: &Properties) -> bool {
        if let Some(allowed) = &self.conditions {
            let condition = props.get(CONDITION_KEY).unwrap_or(UNKNOWN_CONDITION);
            if !allowed.contains(condition) {
                return false;
            }
        }

        if let Some(term) = &self.search {
            let hit = SEARCH_KEYS
                .iter()
                .filter_map(|k| props.get(k))
                .any(|v| v.to_lowercase().contains(term.as_str()));
            if !hit {
                return false;
            }
        }

        self.properties.iter().all(|f| f.matches(props))
    }

    pub fn into_predicate(self) -> Predicate {
        Rc::new(move |props: &Properties| self.matches(props))
    }
}
