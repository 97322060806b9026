use registry::MarkerSet;

use crate::adapter::{Badge, ClusterAdapter, ClusterPoint, RadiusFn};
use crate::layer::{Layer, LayerId};

/// Destination for cluster-eligible markers, drawn as badges by the adapter.
#[derive(Debug)]
pub struct ClusterLayer<A: ClusterAdapter> {
    id: LayerId,
    adapter: A,
    members: MarkerSet,
    zoom: Option<u8>,
}

impl<A: ClusterAdapter> ClusterLayer<A> {
    pub fn new(id: u64, mut adapter: A, radius: RadiusFn) -> Self {
        adapter.set_radius_fn(radius);
        adapter.clear();
        Self {
            id: LayerId(id),
            adapter,
            members: MarkerSet::new(),
            zoom: None,
        }
    }

    pub fn clear(&mut self) {
        self.adapter.clear();
        self.members.clear();
        self.zoom = None;
    }

    /// Hands `points` (pixel positions at `zoom`) to the adapter.
    pub fn load(&mut self, points: &[ClusterPoint], zoom: u8) {
        self.adapter.add_points(points);
        for p in points {
            self.members.insert(p.id);
        }
        self.zoom = Some(zoom);
    }

    /// Badges at the zoom the layer was last loaded for.
    pub fn badges(&self) -> Vec<Badge> {
        match self.zoom {
            Some(zoom) if !self.members.is_empty() => self.adapter.render(zoom),
            _ => Vec::new(),
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }
}

impl<A: ClusterAdapter> Layer for ClusterLayer<A> {
    fn id(&self) -> LayerId {
        self.id
    }

    fn members(&self) -> &MarkerSet {
        &self.members
    }
}
