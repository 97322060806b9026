use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use foundation::bounds::Aabb2;
use foundation::math::Vec2;
use registry::{MarkerId, MarkerSet};

use crate::adapter::{Badge, ClusterAdapter, ClusterPoint, RadiusFn};

/// Radius used until `set_radius_fn` is called.
pub const DEFAULT_RADIUS_PX: f64 = 80.0;

/// Single-linkage aggregator: points within `radius(zoom)` of each other are
/// joined with union-find, so no pair inside the radius can be split across
/// badges.
///
/// Neighbor search buckets points on a `radius`-sized grid and only compares
/// the 3x3 block around each point.
pub struct RadiusAggregator {
    points: Vec<ClusterPoint>,
    radius: RadiusFn,
}

impl Default for RadiusAggregator {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            radius: Rc::new(|_| DEFAULT_RADIUS_PX),
        }
    }
}

impl std::fmt::Debug for RadiusAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadiusAggregator")
            .field("points", &self.points.len())
            .finish_non_exhaustive()
    }
}

impl RadiusAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl ClusterAdapter for RadiusAggregator {
    fn add_points(&mut self, points: &[ClusterPoint]) {
        self.points.extend_from_slice(points);
    }

    fn clear(&mut self) {
        self.points.clear();
    }

    fn set_radius_fn(&mut self, radius: RadiusFn) {
        self.radius = radius;
    }

    fn render(&self, zoom: u8) -> Vec<Badge> {
        let radius = (self.radius)(zoom);
        if self.points.is_empty() || !(radius.is_finite() && radius > 0.0) {
            return Vec::new();
        }
        let r2 = radius * radius;

        let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (i, p) in self.points.iter().enumerate() {
            grid.entry(grid_key(p.position, radius)).or_default().push(i);
        }

        let mut sets = DisjointSets::new(self.points.len());
        for (i, p) in self.points.iter().enumerate() {
            let (cx, cy) = grid_key(p.position, radius);
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let Some(bucket) = grid.get(&(cx + dx, cy + dy)) else {
                        continue;
                    };
                    for &j in bucket {
                        if j <= i {
                            continue;
                        }
                        let d = p.position - self.points[j].position;
                        if d.x * d.x + d.y * d.y <= r2 {
                            sets.union(i, j);
                        }
                    }
                }
            }
        }

        // Group by root; order badges by their lowest marker id.
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..self.points.len() {
            groups.entry(sets.find(i)).or_default().push(i);
        }
        let mut badges: Vec<(MarkerId, Badge)> = groups
            .into_values()
            .filter_map(|members| self.badge(&members))
            .collect();
        badges.sort_by_key(|(first, _)| *first);
        badges.into_iter().map(|(_, b)| b).collect()
    }
}

impl RadiusAggregator {
    fn badge(&self, indices: &[usize]) -> Option<(MarkerId, Badge)> {
        let positions: Vec<Vec2> = indices.iter().map(|&i| self.points[i].position).collect();
        let bounds_px = Aabb2::from_points(&positions)?;
        let sum = positions
            .iter()
            .fold(Vec2::new(0.0, 0.0), |acc, p| acc + *p);
        let members: MarkerSet = indices.iter().map(|&i| self.points[i].id).collect();
        let first = members.iter().next()?;
        let count = members.len();
        Some((
            first,
            Badge {
                count,
                members,
                center_px: sum * (1.0 / positions.len() as f64),
                bounds_px,
                icon: self.icon_for(count),
            },
        ))
    }
}

fn grid_key(p: Vec2, cell: f64) -> (i64, i64) {
    ((p.x / cell).floor() as i64, (p.y / cell).floor() as i64)
}

struct DisjointSets {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}
