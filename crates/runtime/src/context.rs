use std::rc::Rc;

use density::ClusterConfig;
use formats::{FeatureError, RawFeature, validate_all};
use foundation::math::Projector;
use layers::{
    Badge, ClusterAdapter, ClusterLayer, IndividualLayer, RouteError, RouteSummary, Router,
};
use registry::{ActivationInput, AddReport, MarkerSet, OnActivate, Properties, Registry};
use tracing::{info, warn};

use crate::event_bus::{Event, EventBus, EventKind};
use crate::filter::Predicate;
use crate::import::{ImportError, ImportReport};
use crate::metrics::Metrics;

/// Host map widget as seen by the clustering core.
pub trait MapView: Projector {
    /// `None` until the widget has a view to project against.
    fn current_zoom(&self) -> Option<u8>;
}

/// What caused a routing cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Trigger {
    Initial,
    ZoomEnd,
    FilterChanged,
    ImportCompleted,
    Reset,
}

impl Trigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Trigger::Initial => "initial",
            Trigger::ZoomEnd => "zoom_end",
            Trigger::FilterChanged => "filter_changed",
            Trigger::ImportCompleted => "import_completed",
            Trigger::Reset => "reset",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RouteOutcome {
    Routed(RouteSummary),
    /// The map could not project yet; layers kept their previous contents and
    /// the next trigger retries.
    Deferred,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    InvalidConfig(String),
    Route(RouteError),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::InvalidConfig(msg) => write!(f, "invalid cluster config: {msg}"),
            RenderError::Route(e) => write!(f, "initial routing failed: {e}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Route(e) => Some(e),
            RenderError::InvalidConfig(_) => None,
        }
    }
}

/// Features accepted into a registry, plus everything that was not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub accepted: usize,
    pub duplicates: Vec<String>,
    pub rejected: Vec<FeatureError>,
}

/// Validated features not yet merged into the main registry.
#[derive(Debug)]
pub struct PartialLoad {
    pub registry: Registry,
    pub report: LoadReport,
}

/// Everything a routing cycle needs, built once at startup and passed around
/// explicitly.
pub struct MapContext<M: MapView, A: ClusterAdapter> {
    map: M,
    registry: Registry,
    router: Router<A>,
    predicate: Predicate,
    visible: MarkerSet,
    events: EventBus,
    metrics: Metrics,
    cycle: u64,
    pending: bool,
}

impl<M: MapView, A: ClusterAdapter> MapContext<M, A> {
    pub fn new(map: M, config: ClusterConfig, adapter: A) -> Result<Self, RenderError> {
        config.validate().map_err(RenderError::InvalidConfig)?;
        Ok(Self {
            map,
            registry: Registry::new(),
            router: Router::new(config, adapter),
            predicate: Rc::new(|_: &Properties| true),
            visible: MarkerSet::new(),
            events: EventBus::new(),
            metrics: Metrics::new(),
            cycle: 0,
            pending: false,
        })
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn individual(&self) -> &IndividualLayer {
        self.router.individual()
    }

    pub fn cluster(&self) -> &ClusterLayer<A> {
        self.router.cluster()
    }

    pub fn badges(&self) -> Vec<Badge> {
        self.router.badges()
    }

    /// Visible set of the last successful routing cycle.
    pub fn visible(&self) -> &MarkerSet {
        &self.visible
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// True while a deferred routing cycle is waiting for the map.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Validates `raw` and adds the accepted features to the registry without
    /// routing.
    pub fn load(&mut self, raw: &[RawFeature], on_activate: &OnActivate) -> LoadReport {
        let ingest = validate_all(raw);
        let added = self.registry.add(ingest.features, on_activate);
        let report = LoadReport {
            accepted: added.added.len(),
            duplicates: added.duplicates,
            rejected: ingest.rejected,
        };
        self.report_load(&report);
        report
    }

    /// Discards the registry and rebuilds it from a new dataset.
    ///
    /// Both layers are emptied first: their ids belong to the old registry, so
    /// a deferred cycle leaves nothing drawn rather than stale markers.
    pub fn reset(
        &mut self,
        raw: &[RawFeature],
        on_activate: &OnActivate,
    ) -> Result<(LoadReport, RouteOutcome), RouteError> {
        self.router.clear(&mut self.registry);
        self.registry = Registry::new();
        self.visible.clear();
        let report = self.load(raw, on_activate);
        info!(accepted = report.accepted, "dataset replaced");
        let outcome = self.route(Trigger::Reset)?;
        Ok((report, outcome))
    }

    /// Builds a partial registry from `raw`. Ids already registered here are
    /// skipped and reported; nothing is merged.
    pub fn stage(&self, raw: &[RawFeature], on_activate: &OnActivate) -> PartialLoad {
        let ingest = validate_all(raw);
        let mut duplicates = Vec::new();
        let mut fresh = Vec::with_capacity(ingest.features.len());
        for feature in ingest.features {
            if self.registry.contains(&feature.id) {
                duplicates.push(feature.id);
            } else {
                fresh.push(feature);
            }
        }

        let mut registry = Registry::new();
        let added = registry.add(fresh, on_activate);
        duplicates.extend(added.duplicates);

        PartialLoad {
            registry,
            report: LoadReport {
                accepted: added.added.len(),
                duplicates,
                rejected: ingest.rejected,
            },
        }
    }

    /// Merges a partial registry. The caller follows up with `apply_filter`.
    pub fn merge(&mut self, partial: Registry) -> AddReport {
        let report = self.registry.merge(partial);
        for id in &report.duplicates {
            warn!(id = id.as_str(), "duplicate feature skipped");
            self.events.emit(self.cycle, EventKind::Duplicate, id.clone());
        }
        report
    }

    /// Replaces the visibility predicate and re-routes.
    pub fn apply_filter(&mut self, predicate: Predicate) -> Result<RouteOutcome, RouteError> {
        self.predicate = predicate;
        self.route(Trigger::FilterChanged)
    }

    /// Re-routes with the current predicate; cell size depends on zoom.
    pub fn on_zoom_end(&mut self) -> Result<RouteOutcome, RouteError> {
        self.route(Trigger::ZoomEnd)
    }

    /// Applies the result of a remote import.
    ///
    /// A failed import leaves the registry and both layers untouched. A
    /// successful one is validated and deduplicated in full before anything is
    /// merged.
    pub fn complete_import(
        &mut self,
        result: Result<Vec<RawFeature>, ImportError>,
        on_activate: &OnActivate,
    ) -> Result<ImportReport, ImportError> {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("import failed: {e}");
                self.metrics.inc_counter("import.failed", 1);
                self.events.emit(self.cycle, EventKind::ImportFailed, e.to_string());
                return Err(e);
            }
        };

        let partial = self.stage(&raw, on_activate);
        self.report_load(&partial.report);
        let mut duplicates = partial.report.duplicates;
        let merged = self.merge(partial.registry);
        duplicates.extend(merged.duplicates);

        self.metrics
            .inc_counter("import.accepted", merged.added.len() as u64);
        self.metrics
            .inc_counter("import.duplicates", duplicates.len() as u64);
        info!(
            accepted = merged.added.len(),
            duplicates = duplicates.len(),
            rejected = partial.report.rejected.len(),
            "import merged"
        );

        Ok(ImportReport {
            accepted: merged.added.len(),
            duplicates,
            rejected: partial.report.rejected,
            route: self.route(Trigger::ImportCompleted),
        })
    }

    /// Delivers a click or key press to the marker with feature id `id`.
    pub fn activate(&self, id: &str, input: ActivationInput) -> bool {
        self.registry
            .lookup(id)
            .is_some_and(|m| self.registry.activate(m, input))
    }

    pub(crate) fn route(&mut self, trigger: Trigger) -> Result<RouteOutcome, RouteError> {
        self.cycle += 1;
        self.metrics
            .inc_counter(format!("trigger.{}", trigger.as_str()), 1);

        let predicate = &self.predicate;
        let visible = self.registry.select(|p| predicate(p));

        let Some(zoom) = self.map.current_zoom() else {
            return Ok(self.defer(trigger, "map not ready"));
        };

        match self
            .router
            .route(&mut self.registry, &visible, zoom, &self.map)
        {
            Ok(summary) => {
                self.pending = false;
                self.metrics.record_route(&summary);
                self.metrics.set_gauge("route.visible", visible.len() as i64);
                self.events.emit(
                    self.cycle,
                    EventKind::Routed,
                    format!(
                        "{}: zoom={} solo={} clustered={} badges={}",
                        trigger.as_str(),
                        zoom,
                        summary.solo,
                        summary.clustered,
                        summary.badges
                    ),
                );
                self.visible = visible;
                Ok(RouteOutcome::Routed(summary))
            }
            Err(e) if e.is_retryable() => Ok(self.defer(trigger, &e.to_string())),
            Err(e) => Err(e),
        }
    }

    fn defer(&mut self, trigger: Trigger, reason: &str) -> RouteOutcome {
        warn!(trigger = trigger.as_str(), "routing deferred: {reason}");
        self.pending = true;
        self.metrics.inc_counter("route.deferred", 1);
        self.events.emit(
            self.cycle,
            EventKind::Deferred,
            format!("{}: {reason}", trigger.as_str()),
        );
        RouteOutcome::Deferred
    }

    fn report_load(&mut self, report: &LoadReport) {
        for e in &report.rejected {
            warn!("feature rejected: {e}");
            self.events.emit(self.cycle, EventKind::Rejected, e.to_string());
        }
        for id in &report.duplicates {
            warn!(id = id.as_str(), "duplicate feature skipped");
            self.events.emit(self.cycle, EventKind::Duplicate, id.clone());
        }
    }
}
