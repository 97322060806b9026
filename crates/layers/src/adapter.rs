use std::rc::Rc;

use foundation::bounds::Aabb2;
use foundation::math::Vec2;
use registry::{MarkerId, MarkerSet};

use crate::symbology::BadgeIcon;

/// `maxClusterRadius(zoom)` in pixels.
pub type RadiusFn = Rc<dyn Fn(u8) -> f64>;

/// A marker handed to the aggregator, in pixel space at the zoom it will be
/// rendered at.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClusterPoint {
    pub id: MarkerId,
    pub position: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Badge {
    pub count: usize,
    pub members: MarkerSet,
    pub center_px: Vec2,
    pub bounds_px: Aabb2,
    pub icon: BadgeIcon,
}

/// Point aggregator that turns cluster-eligible markers into count badges.
///
/// Implementations are opaque to the router. The only requirement is that two
/// points no further apart than `radius(zoom)` never end up in different badges.
pub trait ClusterAdapter {
    fn add_points(&mut self, points: &[ClusterPoint]);

    fn clear(&mut self);

    fn set_radius_fn(&mut self, radius: RadiusFn);

    fn render(&self, zoom: u8) -> Vec<Badge>;

    fn icon_for(&self, count: usize) -> BadgeIcon {
        BadgeIcon::for_count(count)
    }
}
