use std::rc::Rc;

use density::{ClusterConfig, Partition, PartitionError, partition};
use foundation::math::Projector;
use registry::{MarkerSet, Registry};
use tracing::{debug, warn};

use crate::adapter::{Badge, ClusterAdapter, ClusterPoint, RadiusFn};
use crate::cluster::ClusterLayer;
use crate::individual::IndividualLayer;
use crate::layer::Layer;

pub const INDIVIDUAL_LAYER_ID: u64 = 1;
pub const CLUSTER_LAYER_ID: u64 = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum RouteError {
    Partition(PartitionError),
}

impl std::fmt::Display for RouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteError::Partition(e) => write!(f, "routing aborted, layers unchanged: {e}"),
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::Partition(e) => Some(e),
        }
    }
}

impl From<PartitionError> for RouteError {
    fn from(e: PartitionError) -> Self {
        RouteError::Partition(e)
    }
}

impl RouteError {
    pub fn is_retryable(&self) -> bool {
        match self {
            RouteError::Partition(e) => e.is_retryable(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteSummary {
    pub zoom: u8,
    pub radius_px: f64,
    pub cell_size: f64,
    pub solo: usize,
    pub clustered: usize,
    pub badges: usize,
}

/// Drives the individual layer and the cluster layer to match the current
/// partition of the visible markers.
#[derive(Debug)]
pub struct Router<A: ClusterAdapter> {
    config: ClusterConfig,
    individual: IndividualLayer,
    cluster: ClusterLayer<A>,
}

impl<A: ClusterAdapter> Router<A> {
    pub fn new(config: ClusterConfig, adapter: A) -> Self {
        let radius = radius_fn(&config);
        Self {
            config,
            individual: IndividualLayer::new(INDIVIDUAL_LAYER_ID),
            cluster: ClusterLayer::new(CLUSTER_LAYER_ID, adapter, radius),
        }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn individual(&self) -> &IndividualLayer {
        &self.individual
    }

    pub fn cluster(&self) -> &ClusterLayer<A> {
        &self.cluster
    }

    pub fn badges(&self) -> Vec<Badge> {
        self.cluster.badges()
    }

    /// Empties both layers and the adapter and marks every registry marker
    /// unrouted.
    pub fn clear(&mut self, registry: &mut Registry) {
        self.individual.clear();
        self.cluster.clear();
        registry.retag(&MarkerSet::new(), &MarkerSet::new());
    }

    /// Replaces both layers' membership with the partition of `visible` at
    /// `zoom` and retags every registry marker.
    ///
    /// The partition is computed before anything is cleared: on error the
    /// layers keep their previous contents.
    pub fn route<P: Projector + ?Sized>(
        &mut self,
        registry: &mut Registry,
        visible: &MarkerSet,
        zoom: u8,
        projector: &P,
    ) -> Result<RouteSummary, RouteError> {
        let partition = match partition(registry, visible, zoom, projector, &self.config) {
            Ok(p) => p,
            Err(e) => {
                warn!(zoom, visible = visible.len(), "routing skipped: {e}");
                return Err(e.into());
            }
        };

        self.apply(&partition);
        registry.retag(&partition.solo, &partition.cluster);

        let summary = RouteSummary {
            zoom,
            radius_px: partition.radius_px,
            cell_size: partition.cell_size,
            solo: self.individual.members().len(),
            clustered: self.cluster.members().len(),
            badges: self.cluster.badges().len(),
        };
        debug!(
            zoom,
            solo = summary.solo,
            clustered = summary.clustered,
            badges = summary.badges,
            "routed markers"
        );
        Ok(summary)
    }

    fn apply(&mut self, partition: &Partition) {
        self.individual.clear();
        self.cluster.clear();

        self.individual.add(&partition.solo);
        let points: Vec<ClusterPoint> = partition
            .cluster_points()
            .map(|(id, position)| ClusterPoint { id, position })
            .collect();
        self.cluster.load(&points, partition.zoom);
    }
}

/// The adapter reads the same schedule the partitioner does.
fn radius_fn(config: &ClusterConfig) -> RadiusFn {
    let schedule = config.radius.clone();
    Rc::new(move |zoom| schedule.radius(zoom))
}
