use std::env;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use density::ClusterConfig;
use foundation::math::{LatLng, ProjectionError, Projector, Vec2, WebMercator};
use layers::{BadgeIcon, Layer, RadiusAggregator};
use registry::{Activation, MarkerSet, OnActivate, Registry};
use runtime::{FeatureFilter, MapView, PropertyFilter, RouteOutcome};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let mut args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(usage());
    }

    let cmd = args[1].clone();
    args.drain(0..2);

    match cmd.as_str() {
        "partition" => cmd_partition(args),
        _ => Err(usage()),
    }
}

/// Web mercator frozen at one zoom level.
struct FixedView {
    projection: WebMercator,
    zoom: u8,
}

impl Projector for FixedView {
    fn zoom_range(&self) -> (u8, u8) {
        self.projection.zoom_range()
    }

    fn project(&self, coord: LatLng, zoom: u8) -> Result<Vec2, ProjectionError> {
        self.projection.project(coord, zoom)
    }
}

impl MapView for FixedView {
    fn current_zoom(&self) -> Option<u8> {
        Some(self.zoom)
    }
}

#[derive(Debug, Default, PartialEq)]
struct PartitionArgs {
    input: PathBuf,
    zoom: u8,
    config: Option<PathBuf>,
    filter: FeatureFilter,
}

fn parse_partition_args(args: &[String]) -> Result<PartitionArgs, String> {
    let Some(input) = args.first() else {
        return Err(usage());
    };
    let mut parsed = PartitionArgs {
        input: PathBuf::from(input),
        ..Default::default()
    };
    let mut zoom: Option<u8> = None;

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let mut value = || {
            i += 1;
            args.get(i)
                .cloned()
                .ok_or_else(|| format!("{flag} requires a value"))
        };
        match flag {
            "--zoom" => {
                let v = value()?;
                zoom = Some(v.parse().map_err(|_| format!("invalid --zoom: {v}"))?);
            }
            "--config" => parsed.config = Some(PathBuf::from(value()?)),
            "--where" => {
                let v = value()?;
                let (key, val) = v
                    .split_once('=')
                    .ok_or_else(|| format!("--where expects key=value, got {v}"))?;
                parsed.filter = parsed.filter.with_property(PropertyFilter::eq(key, val));
            }
            "--search" => parsed.filter = parsed.filter.with_search(&value()?),
            s => return Err(format!("unknown arg: {s}\n\n{}", usage())),
        }
        i += 1;
    }

    parsed.zoom = zoom.ok_or_else(|| "partition requires --zoom".to_string())?;
    Ok(parsed)
}

#[derive(Debug, Serialize)]
struct BadgeOut {
    count: usize,
    icon: BadgeIcon,
    center_px: [f64; 2],
    ids: Vec<String>,
}

#[derive(Debug, Serialize)]
struct PartitionOut {
    zoom: u8,
    radius_px: f64,
    cell_px: f64,
    solo: Vec<String>,
    badges: Vec<BadgeOut>,
    duplicates: Vec<String>,
    rejected: Vec<String>,
    counters: Vec<(String, u64)>,
    gauges: Vec<(String, i64)>,
}

fn cmd_partition(args: Vec<String>) -> Result<(), String> {
    // cluster partition <features.geojson> --zoom N [--config cfg.json] [--where k=v]... [--search text]
    let args = parse_partition_args(&args)?;

    let config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
            formats::load_config(&text).map_err(|e| format!("{path:?}: {e}"))?
        }
        None => ClusterConfig::default(),
    };
    debug!(?config, "cluster config");

    let text =
        fs::read_to_string(&args.input).map_err(|e| format!("read {:?}: {e}", args.input))?;
    let mut raw = Vec::new();
    let mut rejected = Vec::new();
    for parsed in formats::parse_feature_collection(&text).map_err(|e| e.to_string())? {
        match parsed {
            Ok(feature) => raw.push(feature),
            Err(e) => rejected.push(e.to_string()),
        }
    }

    let view = FixedView {
        projection: WebMercator::default(),
        zoom: args.zoom,
    };
    let on_activate: OnActivate = Rc::new(|_: &Activation<'_>| {});
    let (mut ctx, report) =
        runtime::render(view, &raw, &on_activate, config, RadiusAggregator::new())
            .map_err(|e| e.to_string())?;
    rejected.extend(report.rejected.iter().map(ToString::to_string));

    let summary = match ctx
        .apply_filter(args.filter.into_predicate())
        .map_err(|e| e.to_string())?
    {
        RouteOutcome::Routed(summary) => summary,
        RouteOutcome::Deferred => {
            return Err(format!("zoom {} cannot be projected", args.zoom));
        }
    };
    info!(
        solo = summary.solo,
        clustered = summary.clustered,
        badges = summary.badges,
        "partitioned {}",
        args.input.display()
    );

    let metrics = ctx.metrics().snapshot();
    let out = PartitionOut {
        zoom: summary.zoom,
        radius_px: summary.radius_px,
        cell_px: summary.cell_size,
        solo: feature_ids(ctx.registry(), ctx.individual().members()),
        badges: ctx
            .badges()
            .into_iter()
            .map(|b| BadgeOut {
                count: b.count,
                ids: feature_ids(ctx.registry(), &b.members),
                icon: b.icon,
                center_px: [b.center_px.x, b.center_px.y],
            })
            .collect(),
        duplicates: report.duplicates,
        rejected,
        counters: metrics.counters,
        gauges: metrics.gauges,
    };

    let payload = serde_json::to_string_pretty(&out).map_err(|e| format!("json: {e}"))?;
    println!("{payload}");
    Ok(())
}

fn feature_ids(registry: &Registry, set: &MarkerSet) -> Vec<String> {
    set.iter()
        .filter_map(|id| registry.marker(id))
        .map(|m| m.id().to_string())
        .collect()
}

fn usage() -> String {
    let exe = env::args().next().unwrap_or_else(|| "cluster".to_string());
    format!(
        "Usage:\n  {exe} partition <features.geojson> --zoom N [--config cfg.json] [--where key=value]... [--search text]\n\nNotes:\n- Projects with web mercator (256px tiles).\n- Prints solo marker ids, cluster badges and routing metrics as JSON.\n- RUST_LOG controls log output on stderr.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry::Properties;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_partition_flags() {
        let parsed = parse_partition_args(&args(&[
            "crags.geojson",
            "--zoom",
            "12",
            "--where",
            "condition=poor",
            "--search",
            "Wall",
        ]))
        .unwrap();
        assert_eq!(parsed.input, PathBuf::from("crags.geojson"));
        assert_eq!(parsed.zoom, 12);
        assert_eq!(parsed.config, None);

        let props: Properties = [("condition", "poor"), ("name", "North Wall")]
            .into_iter()
            .collect();
        assert!(parsed.filter.matches(&props));
    }

    #[test]
    fn zoom_is_required() {
        let err = parse_partition_args(&args(&["crags.geojson"])).unwrap_err();
        assert!(err.contains("--zoom"));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse_partition_args(&args(&["f", "--zoom", "high"])).is_err());
        assert!(parse_partition_args(&args(&["f", "--zoom", "3", "--where", "novalue"])).is_err());
        assert!(parse_partition_args(&args(&["f", "--zoom"])).is_err());
        assert!(parse_partition_args(&args(&["f", "--zoom", "3", "--bogus"])).is_err());
    }
}
