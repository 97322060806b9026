use std::rc::Rc;

use foundation::handles::Handle;
use foundation::math::{LatLng, ProjectionError, Projector, Vec2};

use crate::feature::{Feature, Properties};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(pub Handle);

impl MarkerId {
    /// Registry entries are never deleted, so generation is always 0.
    pub fn from_index(index: u32) -> Self {
        MarkerId(Handle::new(index, 0))
    }

    pub fn index(&self) -> u32 {
        self.0.index()
    }
}

/// Which destination layer currently holds a marker.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum LayerTag {
    /// Not routed yet, or outside the current visible set.
    #[default]
    Unrouted,
    Solo,
    Clustered,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ActivationKey {
    Enter,
    Space,
    Escape,
    Tab,
    Other,
}

/// User input delivered to a focused or clicked marker.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ActivationInput {
    Click,
    Key(ActivationKey),
}

impl ActivationInput {
    pub fn activates(self) -> bool {
        matches!(
            self,
            ActivationInput::Click
                | ActivationInput::Key(ActivationKey::Enter)
                | ActivationInput::Key(ActivationKey::Space)
        )
    }
}

/// Payload of a marker activation; identical for solo and cluster-expanded markers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Activation<'a> {
    pub id: &'a str,
    pub properties: &'a Properties,
    pub coordinate: LatLng,
}

pub type OnActivate = Rc<dyn Fn(&Activation<'_>)>;

/// Registry-owned wrapper around one feature.
pub struct Marker {
    feature: Feature,
    tag: LayerTag,
    on_activate: OnActivate,
}

impl Marker {
    pub fn new(feature: Feature, on_activate: OnActivate) -> Self {
        Self {
            feature,
            tag: LayerTag::Unrouted,
            on_activate,
        }
    }

    pub fn feature(&self) -> &Feature {
        &self.feature
    }

    pub fn id(&self) -> &str {
        &self.feature.id
    }

    pub fn coordinate(&self) -> LatLng {
        self.feature.coordinate
    }

    /// Pixel position at `zoom` under `projector`.
    pub fn position<P: Projector + ?Sized>(
        &self,
        projector: &P,
        zoom: u8,
    ) -> Result<Vec2, ProjectionError> {
        let p = projector.project(self.feature.coordinate, zoom)?;
        if !p.is_finite() {
            return Err(ProjectionError::NonFinite);
        }
        Ok(p)
    }

    pub fn properties(&self) -> &Properties {
        &self.feature.properties
    }

    pub fn tag(&self) -> LayerTag {
        self.tag
    }

    pub(crate) fn set_tag(&mut self, tag: LayerTag) {
        self.tag = tag;
    }

    pub(crate) fn into_parts(self) -> (Feature, OnActivate) {
        (self.feature, self.on_activate)
    }

    /// Fires the activation handler if `input` is an activating input.
    ///
    /// Returns `true` if the handler ran.
    pub fn activate(&self, input: ActivationInput) -> bool {
        if !input.activates() {
            return false;
        }
        (self.on_activate)(&Activation {
            id: &self.feature.id,
            properties: &self.feature.properties,
            coordinate: self.feature.coordinate,
        });
        true
    }
}

impl std::fmt::Debug for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marker")
            .field("feature", &self.feature)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}
