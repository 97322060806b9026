pub mod context;
pub mod event_bus;
pub mod filter;
pub mod import;
pub mod metrics;

pub use context::*;
pub use event_bus::*;
pub use filter::*;
pub use import::*;
pub use metrics::*;

use std::rc::Rc;

use density::ClusterConfig;
use formats::RawFeature;
use layers::{ClusterAdapter, RouteError};
use registry::{OnActivate, Properties};

/// Builds the registry from `features`, attaches both layers and runs the
/// first routing cycle.
///
/// A map that cannot project yet is not an error: the cycle is deferred and
/// `MapContext::is_pending` reports it.
pub fn render<M: MapView, A: ClusterAdapter>(
    map: M,
    features: &[RawFeature],
    on_activate: &OnActivate,
    config: ClusterConfig,
    adapter: A,
) -> Result<(MapContext<M, A>, LoadReport), RenderError> {
    let mut ctx = MapContext::new(map, config, adapter)?;
    let report = ctx.load(features, on_activate);
    ctx.route(Trigger::Initial).map_err(RenderError::Route)?;
    Ok((ctx, report))
}

/// Validates `features` into a partial registry. Ids already in `ctx` are
/// reported as duplicates. Nothing is routed until the partial is merged.
pub fn add_features<M: MapView, A: ClusterAdapter>(
    ctx: &MapContext<M, A>,
    features: &[RawFeature],
    on_activate: &OnActivate,
) -> PartialLoad {
    ctx.stage(features, on_activate)
}

pub fn apply_filter<M, A, F>(ctx: &mut MapContext<M, A>, predicate: F) -> Result<RouteOutcome, RouteError>
where
    M: MapView,
    A: ClusterAdapter,
    F: Fn(&Properties) -> bool + 'static,
{
    ctx.apply_filter(Rc::new(predicate))
}
