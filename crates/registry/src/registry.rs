use std::collections::HashMap;

use crate::feature::{Feature, Properties};
use crate::marker::{ActivationInput, LayerTag, Marker, MarkerId, OnActivate};
use crate::set::MarkerSet;

/// Outcome of inserting a batch of features.
///
/// Duplicate ids are skipped, never overwritten; the first occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddReport {
    pub added: Vec<MarkerId>,
    pub duplicates: Vec<String>,
}

impl AddReport {
    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }
}

/// Durable identity store: feature id -> marker.
///
/// Growth-only. A new dataset replaces the whole registry instead of deleting
/// entries, so `MarkerId`s stay valid for the registry's lifetime.
#[derive(Debug, Default)]
pub struct Registry {
    markers: Vec<Marker>,
    by_id: HashMap<String, MarkerId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn add(
        &mut self,
        features: impl IntoIterator<Item = Feature>,
        on_activate: &OnActivate,
    ) -> AddReport {
        let mut report = AddReport::default();
        for feature in features {
            self.insert(Marker::new(feature, on_activate.clone()), &mut report);
        }
        report
    }

    /// Moves every marker of `partial` into `self`, keeping each marker's
    /// activation handler. Markers get fresh ids in `self`.
    pub fn merge(&mut self, partial: Registry) -> AddReport {
        let mut report = AddReport::default();
        for marker in partial.markers {
            let (feature, handler) = marker.into_parts();
            self.insert(Marker::new(feature, handler), &mut report);
        }
        report
    }

    /// True if `id` is already registered.
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn lookup(&self, id: &str) -> Option<MarkerId> {
        self.by_id.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&Marker> {
        self.lookup(id).and_then(|m| self.marker(m))
    }

    pub fn marker(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.get(id.index() as usize)
    }

    /// Iterates markers in insertion order.
    pub fn all(&self) -> impl Iterator<Item = (MarkerId, &Marker)> + '_ {
        self.markers
            .iter()
            .enumerate()
            .map(|(idx, m)| (MarkerId::from_index(idx as u32), m))
    }

    pub fn all_set(&self) -> MarkerSet {
        self.select(|_| true)
    }

    /// Markers whose properties satisfy `predicate`. Linear in registry size.
    pub fn select(&self, mut predicate: impl FnMut(&Properties) -> bool) -> MarkerSet {
        let mut out = MarkerSet::with_capacity(self.len());
        for (id, marker) in self.all() {
            if predicate(marker.properties()) {
                out.insert(id);
            }
        }
        out
    }

    /// Rewrites every marker's layer tag: `solo` -> Solo, `cluster` -> Clustered,
    /// everything else -> Unrouted.
    pub fn retag(&mut self, solo: &MarkerSet, cluster: &MarkerSet) {
        for (idx, marker) in self.markers.iter_mut().enumerate() {
            let id = MarkerId::from_index(idx as u32);
            let tag = if solo.contains(id) {
                LayerTag::Solo
            } else if cluster.contains(id) {
                LayerTag::Clustered
            } else {
                LayerTag::Unrouted
            };
            marker.set_tag(tag);
        }
    }

    /// Delivers `input` to the marker. Returns `true` if its handler fired.
    pub fn activate(&self, id: MarkerId, input: ActivationInput) -> bool {
        self.marker(id).is_some_and(|m| m.activate(input))
    }

    fn insert(&mut self, marker: Marker, report: &mut AddReport) {
        if self.by_id.contains_key(marker.id()) {
            report.duplicates.push(marker.id().to_string());
            return;
        }
        let id = MarkerId::from_index(self.markers.len() as u32);
        self.by_id.insert(marker.id().to_string(), id);
        self.markers.push(marker);
        report.added.push(id);
    }
}
