use std::collections::BTreeMap;

use foundation::math::{ProjectionError, Projector, Vec2};
use registry::{MarkerId, MarkerSet, Registry};

use crate::config::ClusterConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum PartitionError {
    /// A visible marker could not be projected; partitioning is deferred.
    Projection {
        marker: MarkerId,
        source: ProjectionError,
    },
    UnknownMarker(MarkerId),
    InvalidConfig(String),
}

impl std::fmt::Display for PartitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartitionError::Projection { marker, source } => {
                write!(f, "cannot project marker #{}: {source}", marker.index())
            }
            PartitionError::UnknownMarker(marker) => {
                write!(f, "marker #{} is not in the registry", marker.index())
            }
            PartitionError::InvalidConfig(msg) => write!(f, "invalid cluster config: {msg}"),
        }
    }
}

impl std::error::Error for PartitionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PartitionError::Projection { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl PartitionError {
    /// Projection failures clear up once the widget is ready; the rest do not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PartitionError::Projection { .. })
    }
}

/// Grid key `(floor(x / cell), floor(y / cell))`. Only lives for one call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub x: i64,
    pub y: i64,
}

impl Cell {
    pub fn of(position: Vec2, cell_size: f64) -> Self {
        Self {
            x: (position.x / cell_size).floor() as i64,
            y: (position.y / cell_size).floor() as i64,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CellSummary {
    pub cell: Cell,
    pub count: usize,
    pub clustered: bool,
}

/// Disjoint, exhaustive split of the visible markers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub zoom: u8,
    pub radius_px: f64,
    pub cell_size: f64,
    pub solo: MarkerSet,
    pub cluster: MarkerSet,
    /// Pixel position of every partitioned marker, ascending by marker index.
    pub positions: Vec<(MarkerId, Vec2)>,
    /// Ascending by cell.
    pub cells: Vec<CellSummary>,
}

impl Partition {
    pub fn is_disjoint(&self) -> bool {
        self.solo.is_disjoint(&self.cluster)
    }

    pub fn is_exhaustive_for(&self, input: &MarkerSet) -> bool {
        self.solo.union(&self.cluster) == *input
    }

    /// Positions of the cluster-eligible markers only.
    pub fn cluster_points(&self) -> impl Iterator<Item = (MarkerId, Vec2)> + '_ {
        self.positions
            .iter()
            .copied()
            .filter(move |(id, _)| self.cluster.contains(*id))
    }
}

/// Projects every visible marker at `zoom` and splits them into solo and
/// cluster sets.
///
/// Nothing is partitioned unless every marker projects, so a failure never
/// yields a partial result.
pub fn partition<P: Projector + ?Sized>(
    registry: &Registry,
    visible: &MarkerSet,
    zoom: u8,
    projector: &P,
    config: &ClusterConfig,
) -> Result<Partition, PartitionError> {
    config.validate().map_err(PartitionError::InvalidConfig)?;

    let mut points = Vec::with_capacity(visible.len());
    for id in visible.iter() {
        let marker = registry
            .marker(id)
            .ok_or(PartitionError::UnknownMarker(id))?;
        let position = marker
            .position(projector, zoom)
            .map_err(|source| PartitionError::Projection { marker: id, source })?;
        points.push((id, position));
    }

    Ok(partition_points(points, zoom, config))
}

/// Pure grid bucketing over already-projected positions.
///
/// Cell side is `radius(zoom) / sqrt(2)`, so the cell diagonal (the largest
/// distance between two members) equals the adapter's merge radius.
pub fn partition_points(
    points: Vec<(MarkerId, Vec2)>,
    zoom: u8,
    config: &ClusterConfig,
) -> Partition {
    let radius_px = config.radius.radius(zoom);
    let cell_size = config.radius.cell_size(zoom);

    let mut buckets: BTreeMap<Cell, Vec<MarkerId>> = BTreeMap::new();
    for (id, position) in &points {
        buckets
            .entry(Cell::of(*position, cell_size))
            .or_default()
            .push(*id);
    }

    let mut solo = MarkerSet::new();
    let mut cluster = MarkerSet::new();
    let mut cells = Vec::with_capacity(buckets.len());
    for (cell, members) in buckets {
        let clustered = members.len() >= config.min_cluster;
        let dest = if clustered { &mut cluster } else { &mut solo };
        for id in &members {
            dest.insert(*id);
        }
        cells.push(CellSummary {
            cell,
            count: members.len(),
            clustered,
        });
    }

    let mut positions = points;
    positions.sort_by_key(|(id, _)| *id);

    Partition {
        zoom,
        radius_px,
        cell_size,
        solo,
        cluster,
        positions,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation::math::LatLng;
    use pretty_assertions::assert_eq;
    use registry::{Activation, Feature, OnActivate};
    use std::rc::Rc;

    /// Treats `lng` as pixel x and `lat` as pixel y at every zoom.
    struct FlatProjector;

    impl Projector for FlatProjector {
        fn zoom_range(&self) -> (u8, u8) {
            (0, 18)
        }

        fn project(&self, coord: LatLng, zoom: u8) -> Result<Vec2, ProjectionError> {
            self.check_zoom(zoom)?;
            Ok(Vec2::new(coord.lng, coord.lat))
        }
    }

    fn noop() -> OnActivate {
        Rc::new(|_: &Activation<'_>| {})
    }

    fn registry_at(pixels: &[(f64, f64)]) -> Registry {
        let mut reg = Registry::new();
        reg.add(
            pixels.iter().enumerate().map(|(i, (x, y))| {
                Feature::new(format!("f{i}"), LatLng::new(*y, *x), Default::default())
            }),
            &noop(),
        );
        reg
    }

    fn run(reg: &Registry, zoom: u8) -> Partition {
        partition(reg, &reg.all_set(), zoom, &FlatProjector, &ClusterConfig::default()).unwrap()
    }

    #[test]
    fn empty_input_yields_empty_sets() {
        let reg = Registry::new();
        let p = run(&reg, 10);
        assert!(p.solo.is_empty());
        assert!(p.cluster.is_empty());
        assert!(p.cells.is_empty());
    }

    #[test]
    fn single_marker_is_solo() {
        let reg = registry_at(&[(5.0, 5.0)]);
        let p = run(&reg, 10);
        assert_eq!(p.solo.len(), 1);
        assert!(p.cluster.is_empty());
    }

    #[test]
    fn coincident_markers_route_by_count() {
        let reg = registry_at(&[(7.0, 7.0); 12]);
        let p = run(&reg, 10);
        assert_eq!(p.cells.len(), 1);
        assert_eq!(p.cluster.len(), 12);
        assert!(p.solo.is_empty());
    }

    #[test]
    fn threshold_is_exact() {
        let nine = registry_at(&[(3.0, 3.0); 9]);
        let p = run(&nine, 10);
        assert_eq!(p.solo.len(), 9);
        assert!(p.cluster.is_empty());

        let ten = registry_at(&[(3.0, 3.0); 10]);
        let p = run(&ten, 10);
        assert!(p.solo.is_empty());
        assert_eq!(p.cluster.len(), 10);
        assert_eq!(
            p.cells,
            vec![CellSummary {
                cell: Cell { x: 0, y: 0 },
                count: 10,
                clustered: true
            }]
        );
    }

    #[test]
    fn partition_is_disjoint_and_exhaustive() {
        let mut pixels = Vec::new();
        for i in 0..40 {
            let f = f64::from(i);
            pixels.push(((f * 37.0) % 300.0, (f * 53.0) % 200.0));
        }
        pixels.extend([(500.0, 500.0); 11]);
        let reg = registry_at(&pixels);
        let all = reg.all_set();
        for zoom in [0, 10, 12, 13, 14, 18] {
            let p = run(&reg, zoom);
            assert!(p.is_disjoint(), "zoom {zoom}");
            assert!(p.is_exhaustive_for(&all), "zoom {zoom}");
        }
    }

    #[test]
    fn cell_members_are_within_merge_radius() {
        let mut pixels = Vec::new();
        for i in 0..200 {
            let f = f64::from(i);
            pixels.push(((f * 7.3) % 120.0, (f * 11.9) % 90.0));
        }
        let reg = registry_at(&pixels);
        for zoom in [10, 13, 15] {
            let p = run(&reg, zoom);
            let mut by_cell: BTreeMap<Cell, Vec<Vec2>> = BTreeMap::new();
            for (_, pos) in &p.positions {
                by_cell.entry(Cell::of(*pos, p.cell_size)).or_default().push(*pos);
            }
            for members in by_cell.values() {
                for a in members {
                    for b in members {
                        assert!(a.distance(*b) <= p.radius_px + 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    fn zoom_changes_cell_membership() {
        // 50px apart along the diagonal.
        let d = 50.0 / std::f64::consts::SQRT_2;
        let reg = registry_at(&[(5.0, 5.0), (5.0 + d, 5.0 + d)]);

        let p13 = run(&reg, 13);
        assert_eq!(p13.cells.len(), 2);

        let p12 = run(&reg, 12);
        assert_eq!(p12.cells.len(), 1);
        assert_eq!(p12.cells[0].count, 2);
    }

    #[test]
    fn projection_failure_aborts_without_output() {
        let reg = registry_at(&[(1.0, 1.0), (2.0, 2.0)]);
        let err = partition(
            &reg,
            &reg.all_set(),
            19,
            &FlatProjector,
            &ClusterConfig::default(),
        )
        .unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(
            err,
            PartitionError::Projection {
                source: ProjectionError::ZoomOutOfRange { zoom: 19, .. },
                ..
            }
        ));
    }

    #[test]
    fn unknown_marker_is_rejected() {
        let reg = registry_at(&[(1.0, 1.0)]);
        let visible: MarkerSet = [MarkerId::from_index(5)].into_iter().collect();
        let err = partition(&reg, &visible, 10, &FlatProjector, &ClusterConfig::default())
            .unwrap_err();
        assert_eq!(err, PartitionError::UnknownMarker(MarkerId::from_index(5)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn filtered_visible_set_is_covered_exactly() {
        // 80 markers; only the first passes the filter, so the visible set is
        // sized for the whole registry while the partition halves are not.
        let mut pixels = vec![(1.0, 1.0)];
        pixels.extend((1..80).map(|i| (f64::from(i) * 100.0, 0.0)));
        let reg = registry_at(&pixels);

        let mut visible = MarkerSet::with_capacity(reg.len());
        visible.insert(MarkerId::from_index(0));
        let p = partition(&reg, &visible, 10, &FlatProjector, &ClusterConfig::default()).unwrap();
        assert_eq!(p.solo.len(), 1);
        assert!(p.cluster.is_empty());
        assert!(p.is_exhaustive_for(&visible));
    }

    #[test]
    fn identical_inputs_give_identical_partitions() {
        let reg = registry_at(&[(1.0, 1.0), (300.0, 10.0), (2.0, 2.0)]);
        assert_eq!(run(&reg, 11), run(&reg, 11));
    }
}
