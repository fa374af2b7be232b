// Layered graph configuration: defaults, optional patch, merge

use crate::ir::SortOrder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_FONT: &str = "\"Roboto Condensed\",Roboto,-apple-system,BlinkMacSystemFont,\"Segoe UI\",\"Helvetica Neue\",Arial,\"Noto Sans\",sans-serif,\"Apple Color Emoji\",\"Segoe UI Emoji\",\"Segoe UI Symbol\",\"Noto Color Emoji\"";
pub const DEFAULT_BAR_SCHEME: &str = "default";
pub const DEFAULT_LINE_SCHEME: &str = "paletteOrange";

/// Curve used to interpolate the line series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Interpolation {
    Basis,
    Cardinal,
    CatmullRom,
    Linear,
    #[default]
    Monotone,
    Natural,
    Step,
    StepAfter,
    StepBefore,
}

impl Interpolation {
    pub fn as_str(self) -> &'static str {
        match self {
            Interpolation::Basis => "basis",
            Interpolation::Cardinal => "cardinal",
            Interpolation::CatmullRom => "catmull-rom",
            Interpolation::Linear => "linear",
            Interpolation::Monotone => "monotone",
            Interpolation::Natural => "natural",
            Interpolation::Step => "step",
            Interpolation::StepAfter => "step-after",
            Interpolation::StepBefore => "step-before",
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis and legend titles.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Lang {
    pub legend: Option<String>,
    pub x_axis_name: Option<String>,
    pub y_axis_name: Option<String>,
    pub y2_axis_name: Option<String>,
}

/// Partial axis property maps applied over the synthesized axes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AxesOverride {
    pub x_axis: Map<String, Value>,
    pub y_axis: Map<String, Value>,
    pub y2_axis: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorScheme {
    pub bar: String,
    pub line: String,
}

impl Default for ColorScheme {
    fn default() -> Self {
        ColorScheme {
            bar: DEFAULT_BAR_SCHEME.to_string(),
            line: DEFAULT_LINE_SCHEME.to_string(),
        }
    }
}

/// Redirects lookups to alternate fields on the data row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataScaleMap {
    pub type_color: Option<String>,
    pub legend_label: Option<String>,
    pub secondary_legend_label: Option<String>,
    pub order: Option<String>,
}

/// Fully populated configuration for one graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphConfig {
    pub title: Option<String>,
    pub lang: Lang,
    pub axes: AxesOverride,
    pub tooltip_label: BTreeMap<String, Option<String>>,
    pub tooltip_value: BTreeMap<String, Option<String>>,
    pub color_scheme: ColorScheme,
    pub graph_sort: [SortOrder; 3],
    pub interpolation: Interpolation,
    pub font: String,
    pub truncate: bool,
    pub period_as_date: bool,
    pub fast_render: bool,
    pub data_scale_map: DataScaleMap,
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            title: None,
            lang: Lang::default(),
            axes: AxesOverride::default(),
            tooltip_label: BTreeMap::new(),
            tooltip_value: BTreeMap::new(),
            color_scheme: ColorScheme::default(),
            graph_sort: [SortOrder::Ascending; 3],
            interpolation: Interpolation::default(),
            font: DEFAULT_FONT.to_string(),
            truncate: true,
            period_as_date: true,
            fast_render: false,
            data_scale_map: DataScaleMap::default(),
        }
    }
}

// =============================================================================
// Patch (every field optional; null and absent never override)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LangPatch {
    pub legend: Option<String>,
    pub x_axis_name: Option<String>,
    pub y_axis_name: Option<String>,
    pub y2_axis_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxesPatch {
    pub x_axis: Option<Map<String, Value>>,
    pub y_axis: Option<Map<String, Value>>,
    pub y2_axis: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ColorSchemePatch {
    pub bar: Option<String>,
    pub line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphConfigPatch {
    pub title: Option<String>,
    pub lang: Option<LangPatch>,
    pub axes: Option<AxesPatch>,
    pub tooltip_label: Option<BTreeMap<String, Option<String>>>,
    pub tooltip_value: Option<BTreeMap<String, Option<String>>>,
    pub color_scheme: Option<ColorSchemePatch>,
    pub graph_sort: Option<[Option<SortOrder>; 3]>,
    pub interpolation: Option<Interpolation>,
    pub font: Option<String>,
    pub truncate: Option<bool>,
    pub period_as_date: Option<bool>,
    pub fast_render: Option<bool>,
    pub data_scale_map: Option<DataScaleMap>,
}

fn pick<T>(base: T, over: Option<T>) -> T {
    over.unwrap_or(base)
}

fn pick_opt<T>(base: Option<T>, over: Option<T>) -> Option<T> {
    over.or(base)
}

/// Deep merge of JSON maps: non-null override values win, nested objects merge.
pub fn merge_maps(base: &Map<String, Value>, over: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();
    for (key, value) in over {
        if value.is_null() {
            continue;
        }
        if let (Some(Value::Object(existing)), Value::Object(incoming)) = (merged.get_mut(key), value) {
            *existing = merge_maps(existing, incoming);
            continue;
        }
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Field-union of template maps; `Some` override values replace, `None` never does.
pub fn merge_template_maps(
    base: &BTreeMap<String, Option<String>>,
    over: &BTreeMap<String, Option<String>>,
) -> BTreeMap<String, Option<String>> {
    let mut merged = base.clone();
    for (key, value) in over {
        match value {
            Some(v) => {
                merged.insert(key.clone(), Some(v.clone()));
            }
            None => {
                merged.entry(key.clone()).or_insert(None);
            }
        }
    }
    merged
}

impl GraphConfig {
    /// Layer a patch over this configuration.
    pub fn merge(&self, patch: &GraphConfigPatch) -> GraphConfig {
        let patch = patch.clone();
        let lang = patch.lang.unwrap_or_default();
        let axes = patch.axes.unwrap_or_default();
        let scheme = patch.color_scheme.unwrap_or_default();
        let scale_map = patch.data_scale_map.unwrap_or_default();
        let sort = patch.graph_sort.unwrap_or([None; 3]);

        GraphConfig {
            title: pick_opt(self.title.clone(), patch.title),
            lang: Lang {
                legend: pick_opt(self.lang.legend.clone(), lang.legend),
                x_axis_name: pick_opt(self.lang.x_axis_name.clone(), lang.x_axis_name),
                y_axis_name: pick_opt(self.lang.y_axis_name.clone(), lang.y_axis_name),
                y2_axis_name: pick_opt(self.lang.y2_axis_name.clone(), lang.y2_axis_name),
            },
            axes: AxesOverride {
                x_axis: merge_maps(&self.axes.x_axis, &axes.x_axis.unwrap_or_default()),
                y_axis: merge_maps(&self.axes.y_axis, &axes.y_axis.unwrap_or_default()),
                y2_axis: merge_maps(&self.axes.y2_axis, &axes.y2_axis.unwrap_or_default()),
            },
            tooltip_label: merge_template_maps(&self.tooltip_label, &patch.tooltip_label.unwrap_or_default()),
            tooltip_value: merge_template_maps(&self.tooltip_value, &patch.tooltip_value.unwrap_or_default()),
            color_scheme: ColorScheme {
                bar: pick(self.color_scheme.bar.clone(), scheme.bar),
                line: pick(self.color_scheme.line.clone(), scheme.line),
            },
            graph_sort: [
                pick(self.graph_sort[0], sort[0]),
                pick(self.graph_sort[1], sort[1]),
                pick(self.graph_sort[2], sort[2]),
            ],
            interpolation: pick(self.interpolation, patch.interpolation),
            font: pick(self.font.clone(), patch.font),
            truncate: pick(self.truncate, patch.truncate),
            period_as_date: pick(self.period_as_date, patch.period_as_date),
            fast_render: pick(self.fast_render, patch.fast_render),
            data_scale_map: DataScaleMap {
                type_color: pick_opt(self.data_scale_map.type_color.clone(), scale_map.type_color),
                legend_label: pick_opt(self.data_scale_map.legend_label.clone(), scale_map.legend_label),
                secondary_legend_label: pick_opt(
                    self.data_scale_map.secondary_legend_label.clone(),
                    scale_map.secondary_legend_label,
                ),
                order: pick_opt(self.data_scale_map.order.clone(), scale_map.order),
            },
        }
    }

    /// Parse a JSON patch and merge it over the defaults.
    pub fn from_json(text: &str) -> serde_json::Result<GraphConfig> {
        let patch: GraphConfigPatch = serde_json::from_str(text)?;
        Ok(GraphConfig::default().merge(&patch))
    }
}
