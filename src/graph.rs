use crate::compiler::build_marks;
use crate::config::GraphConfig;
use crate::data::DataPoint;
use crate::error::Result;
use crate::guide::{build_axes, build_legends, build_title};
use crate::ir::SpecGraph;
use crate::palette::ColorCache;
use crate::resolve::resolve_graph;
use crate::scale::build_scales;
use crate::signal::build_signals;
use crate::sizing::ResolvedSizing;
use crate::tooltip::TooltipBuilder;
use crate::transform::build_data_source;
use crate::validate::validate;
use serde_json::Value;

/// Final pixel size of the plot area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Build and validate the full specification graph.
///
/// Deterministic for identical arguments and cache state. The cache is the
/// only state touched: categories first seen here get fallback colors.
pub fn synthesize(
    data: &[DataPoint],
    config: &GraphConfig,
    size: Size,
    sizing: &ResolvedSizing,
    cache: &mut ColorCache,
) -> Result<SpecGraph> {
    let resolved = resolve_graph(config);

    let source = build_data_source(data, &resolved, config.period_as_date, cache)?;
    let scales = build_scales(&source.name, &resolved.fields, &config.color_scheme);
    let tooltips = TooltipBuilder::with_defaults(&config.tooltip_label, &config.tooltip_value, resolved.tooltip);
    let marks = build_marks(&source.name, &config.font, &tooltips)?;

    let graph = SpecGraph {
        title: config.title.as_deref().map(|text| build_title(text, &config.font)),
        autosize: "fit",
        width: size.width,
        height: size.height,
        signals: build_signals(config.interpolation, sizing),
        scales,
        axes: build_axes(config, sizing),
        marks,
        legends: build_legends(&config.font, &config.lang, &resolved.fields),
        data: vec![source],
    };
    validate(&graph)?;

    tracing::debug!(
        rows = data.len(),
        width = size.width,
        height = size.height,
        "synthesized specification"
    );
    Ok(graph)
}

/// Synthesize and serialize to the engine's JSON format.
pub fn render_spec(
    data: &[DataPoint],
    config: &GraphConfig,
    size: Size,
    sizing: &ResolvedSizing,
    cache: &mut ColorCache,
) -> Result<Value> {
    synthesize(data, config, size, sizing, cache)?.to_value()
}
