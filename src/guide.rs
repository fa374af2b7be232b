// Axes, legends and the title block

use crate::config::{GraphConfig, Lang};
use crate::expr::Expr;
use crate::ir::{
    Axis, Encode, GuideElement, LabelOverlap, Legend, LegendEncode, MarkRef, NumberOrSignal, Orient, ScaleRef,
    Title, ValueRef,
};
use crate::resolve::ResolvedFields;
use crate::scale;
use crate::signal;
use crate::sizing::ResolvedSizing;
use serde_json::Map;

pub const LEGEND_SYMBOL: &str = "legendSymbol";
pub const LEGEND_LABEL: &str = "legendLabel";

const DEFAULT_LEGEND_TITLE: &str = "Legend";
/// Bottom-axis label limit when truncation is off.
const UNTRUNCATED_LABEL_LIMIT: f64 = 200.0;
const BAR_LEGEND_LABEL_LIMIT: f64 = 250.0;
const PERIOD_AXIS_FORMAT: &str = "%b %d %Y";

/// Properties every axis starts from.
fn base_axis(orient: Orient, scale: ScaleRef, font: &str) -> Axis {
    Axis {
        orient,
        scale,
        title_font_size: 16.0,
        title_font_weight: 500,
        title_padding: 15.0,
        title_font: font.to_string(),
        grid: true,
        grid_color: "#efefef",
        offset: 5.0,
        label_font: font.to_string(),
        label_font_size: NumberOrSignal::Signal { signal: signal::height().div(Expr::num(18.0)).clamp(10.0, 14.0) },
        label_separation: 5.0,
        label_align: None,
        label_angle: None,
        label_padding: None,
        label_limit: None,
        label_overlap: None,
        min_extent: None,
        max_extent: None,
        tick_min_step: None,
        format: None,
        format_type: None,
        overrides: Map::new(),
        title: None,
    }
}

/// Left (bars), right (line) and bottom (period) axes.
pub fn build_axes(config: &GraphConfig, sizing: &ResolvedSizing) -> Vec<Axis> {
    let font = config.font.as_str();

    let left = Axis {
        min_extent: Some(55.0),
        max_extent: Some(55.0),
        tick_min_step: Some(1.0),
        overrides: config.axes.y_axis.clone(),
        title: config.lang.y_axis_name.clone(),
        ..base_axis(Orient::Left, scale::amount_for_bar(), font)
    };

    let right = Axis {
        grid: false,
        min_extent: Some(65.0),
        max_extent: Some(65.0),
        tick_min_step: Some(1.0),
        overrides: config.axes.y2_axis.clone(),
        title: config.lang.y2_axis_name.clone(),
        ..base_axis(Orient::Right, scale::amount_for_point(), font)
    };

    let (label_limit, label_overlap) = if config.truncate {
        let slot = signal::width().div(Expr::Domain(scale::period_for_bar()).length().add(Expr::num(0.01)));
        (NumberOrSignal::Signal { signal: slot.mul(Expr::num(0.9)) }, LabelOverlap::Off)
    } else {
        (NumberOrSignal::Value(UNTRUNCATED_LABEL_LIMIT), LabelOverlap::Parity)
    };
    let (format, format_type) = if config.period_as_date {
        (Some(PERIOD_AXIS_FORMAT), Some("time"))
    } else {
        (None, None)
    };

    let bottom = Axis {
        grid: false,
        label_align: Some("center"),
        label_font_size: NumberOrSignal::Value(sizing.font_size),
        label_angle: Some(sizing.label_angle),
        label_padding: Some(15.0),
        label_limit: Some(label_limit),
        label_overlap: Some(label_overlap),
        format,
        format_type,
        overrides: config.axes.x_axis.clone(),
        title: config.lang.x_axis_name.clone(),
        ..base_axis(Orient::Bottom, scale::period_for_bar(), font)
    };

    vec![left, right, bottom]
}

/// `scale(lookup, datum["value"])` when labels are redirected, else the raw value.
fn legend_text(lookup: Option<ScaleRef>) -> Expr {
    let value = Expr::field("value");
    match lookup {
        Some(scale) => Expr::scale_lookup(&scale, value),
        None => value,
    }
}

fn legend_encode(symbol_enter: bool, lookup: Option<ScaleRef>) -> LegendEncode {
    let text = legend_text(lookup);
    let mut symbols = GuideElement {
        name: MarkRef::new(LEGEND_SYMBOL),
        interactive: true,
        enter: Default::default(),
        update: Default::default(),
    };
    if symbol_enter {
        symbols.enter.insert("fillOpacity", ValueRef::value(1));
    }
    let mut labels = GuideElement {
        name: MarkRef::new(LEGEND_LABEL),
        interactive: true,
        enter: Default::default(),
        update: Default::default(),
    };
    labels.update.insert("text", ValueRef::signal(text.clone()));
    labels.update.insert("tooltip", ValueRef::signal(text));
    LegendEncode { symbols, labels }
}

fn base_legend(font: &str, title: Option<String>, symbol_type: &'static str, encode: LegendEncode) -> Legend {
    Legend {
        fill: None,
        stroke: None,
        orient: Orient::Bottom,
        direction: "horizontal",
        symbol_type,
        symbol_size: 100.0,
        title,
        title_orient: Orient::Left,
        title_font: font.to_string(),
        title_font_size: ValueRef::value(14),
        label_font: font.to_string(),
        label_font_size: ValueRef::value(14),
        label_limit: None,
        offset: 20.0,
        encode,
    }
}

/// Bar (fill) and line (stroke) legends.
pub fn build_legends(font: &str, lang: &Lang, fields: &ResolvedFields) -> Vec<Legend> {
    let bar_lookup = fields.customize_legend_label().then(scale::legend_for_bar);
    let bar = Legend {
        fill: Some(scale::color_for_bar()),
        label_limit: Some(BAR_LEGEND_LABEL_LIMIT),
        ..base_legend(
            font,
            Some(lang.legend.clone().unwrap_or_else(|| DEFAULT_LEGEND_TITLE.to_string())),
            "square",
            legend_encode(true, bar_lookup),
        )
    };

    let line_lookup = fields.customize_secondary_legend_label().then(scale::legend_for_point);
    let line = Legend {
        stroke: Some(scale::color_for_point()),
        ..base_legend(font, lang.legend.clone(), "stroke", legend_encode(false, line_lookup))
    };

    vec![bar, line]
}

/// Title block anchored to the start of the group frame.
pub fn build_title(text: &str, font: &str) -> Title {
    let mut encode = Encode::default();
    encode.enter.insert("fontSize", ValueRef::value(45));
    encode.enter.insert("fill", ValueRef::value("transparent"));
    encode.enter.insert("fontWeight", ValueRef::value("normal"));
    encode.enter.insert("font", ValueRef::value(font));
    encode
        .update
        .insert("y", ValueRef::signal(Expr::num(15.0)).with_offset(NumberOrSignal::Value(-15.0)));
    Title {
        text: text.to_string(),
        anchor: "start",
        frame: "group",
        encode,
    }
}
