use crate::data::{FIELD_AMOUNT, FIELD_PERIOD, FIELD_SECONDARY_AMOUNT, FIELD_SECONDARY_TYPE, FIELD_TYPE};
use crate::error::Result;
use crate::expr::Expr;
use crate::ir::{
    Channels, DataRef, Encode, Facet, Mark, MarkFrom, MarkType, NumberOrSignal, ScaleRef, Signal, SignalRef,
    ValueRef,
};
use crate::scale::{self, bar_group_scale};
use crate::signal::{self, hover_test, FONT_SIZE, HOVER_RECT, HOVER_SYMBOL, INTERPOLATE};
use crate::tooltip::{TooltipBuilder, BAR_FIELDS, POINT_FIELDS};
use serde_json::json;

pub const BAR_GROUP: &str = "markGroupBar";
pub const BAR_FACET: &str = "markGroupDataBar";
pub const BAR_GROUP_SCALE: &str = "barGroupScale";
pub const BAR_TOP_TEXT: &str = "markGroupBar_topText";
pub const BAR_MARK: &str = "markGroupBar_bar";
pub const LINE_GROUP: &str = "markLine";
pub const LINE_FACET: &str = "dataProcessedAsLine";
pub const LINE_MARK: &str = "lineMark";
pub const POINT_GROUP: &str = "markGroupPoint";
pub const POINT_FACET: &str = "markGroupDataPoint";
pub const POINT_MARK: &str = "pointMark";
pub const POINT_RULE: &str = "pointHorRule";
pub const BAR_RULE: &str = "barHorRule";

const INNER_TEXT_COLOR: &str = "#787885";

/// Compile the four mark layers over `data`
pub fn build_marks(data: &DataRef, font: &str, tooltips: &TooltipBuilder) -> Result<Vec<Mark>> {
    Ok(vec![
        bar_group(data, font, tooltips)?,
        line_group(data),
        point_group(data, tooltips)?,
        bar_rule(data),
    ])
}

fn channels<const N: usize>(entries: [(&'static str, ValueRef); N]) -> Channels {
    entries.into_iter().collect()
}

fn half_band(scale: &ScaleRef) -> NumberOrSignal {
    NumberOrSignal::Signal {
        signal: Expr::Bandwidth(scale.clone()).div(Expr::num(2.0)),
    }
}

/// `test ? on : off` as a signal channel.
fn toggle(test: Expr, on: f64, off: f64) -> ValueRef {
    ValueRef::signal(Expr::cond(test, Expr::num(on), Expr::num(off)))
}

fn faceted(kind: MarkType, name: &str, facet: &str, data: &DataRef, groupby: &str) -> Mark {
    Mark::new(
        kind,
        name,
        MarkFrom::Facet {
            facet: Facet {
                name: DataRef::new(facet),
                data: data.clone(),
                groupby: groupby.to_string(),
            },
        },
    )
}

fn from_data(kind: MarkType, name: &str, data: &str) -> Mark {
    Mark::new(kind, name, MarkFrom::Data { data: DataRef::new(data) })
}

// =============================================================================
// Bars
// =============================================================================

fn bar_group(data: &DataRef, font: &str, tooltips: &TooltipBuilder) -> Result<Mark> {
    let period_scale = scale::period_for_bar();
    let group_scale = ScaleRef::new(BAR_GROUP_SCALE);
    let facet = DataRef::new(BAR_FACET);

    let mut group = faceted(MarkType::Group, BAR_GROUP, BAR_FACET, data, FIELD_PERIOD);
    group.encode.enter = channels([("x", ValueRef::scaled(&period_scale, FIELD_PERIOD))]);
    // each period slot is its own coordinate space
    group.signals = vec![Signal::derived(SignalRef::new("width"), Expr::Bandwidth(period_scale))];
    group.scales = vec![bar_group_scale(group_scale.clone(), &facet)];
    group.marks = vec![bar_top_text(&group_scale, font), bar_rect(&group_scale, tooltips)?];
    Ok(group)
}

fn bar_top_text(group_scale: &ScaleRef, font: &str) -> Mark {
    let amount_scale = scale::amount_for_bar();
    let mut text = from_data(MarkType::Text, BAR_TOP_TEXT, BAR_FACET);
    text.encode = Encode {
        enter: channels([
            ("fill", ValueRef::value(INNER_TEXT_COLOR)),
            ("font", ValueRef::value(font)),
            ("fontSize", ValueRef::signal(Expr::signal(&SignalRef::new(FONT_SIZE)))),
            ("fontWeight", ValueRef::value("bold")),
            ("fillOpacity", ValueRef::value(1)),
            ("zindex", ValueRef::value(101)),
        ]),
        update: channels([
            ("x", ValueRef::scaled(group_scale, FIELD_TYPE).with_offset(half_band(group_scale))),
            (
                "y",
                ValueRef::scaled(&amount_scale, FIELD_AMOUNT).with_offset(NumberOrSignal::Value(-5.0)),
            ),
            ("text", ValueRef::field(FIELD_AMOUNT)),
            ("align", ValueRef::value("center")),
            ("fillOpacity", toggle(Expr::field(FIELD_AMOUNT).gt(Expr::num(0.0)), 1.0, 0.0)),
        ]),
    };
    text
}

fn bar_rect(group_scale: &ScaleRef, tooltips: &TooltipBuilder) -> Result<Mark> {
    let amount_scale = scale::amount_for_bar();
    let hover = hover_test(&SignalRef::new(HOVER_RECT), &[FIELD_PERIOD, FIELD_TYPE]);

    let mut rect = from_data(MarkType::Rect, BAR_MARK, BAR_FACET);
    rect.encode = Encode {
        enter: channels([
            ("x", ValueRef::scaled(group_scale, FIELD_TYPE)),
            ("width", ValueRef::band(group_scale, 1.0)),
            ("y", ValueRef::scaled(&amount_scale, FIELD_AMOUNT)),
            ("y2", ValueRef::scaled_value(&amount_scale, 0)),
            ("fill", ValueRef::scaled(&scale::color_for_bar(), FIELD_TYPE)),
            ("tooltip", ValueRef::signal(tooltips.build(&BAR_FIELDS)?)),
        ]),
        update: channels([("fillOpacity", toggle(hover, 0.75, 1.0))]),
    };
    Ok(rect)
}

/// One dashed rule per datum spanning the plot at the bar's height.
fn bar_rule(data: &DataRef) -> Mark {
    let amount_scale = scale::amount_for_bar();
    let hover = hover_test(&SignalRef::new(HOVER_RECT), &[FIELD_PERIOD, FIELD_TYPE]);

    let mut rule = Mark::new(MarkType::Rule, BAR_RULE, MarkFrom::Data { data: data.clone() });
    rule.encode = Encode {
        enter: channels([
            ("stroke", ValueRef::scaled(&scale::color_for_bar(), FIELD_TYPE)),
            ("strokeWidth", ValueRef::value(1)),
            ("strokeDash", ValueRef::value(json!([6, 2]))),
            ("zindex", ValueRef::value(100)),
        ]),
        update: channels([
            ("x", ValueRef::signal(signal::width())),
            ("x2", ValueRef::signal(Expr::num(0.0))),
            ("y", ValueRef::scaled(&amount_scale, FIELD_AMOUNT)),
            ("y2", ValueRef::scaled(&amount_scale, FIELD_AMOUNT)),
            ("strokeOpacity", toggle(hover, 0.75, 0.0)),
        ]),
    };
    rule
}

// =============================================================================
// Line and points
// =============================================================================

fn line_group(data: &DataRef) -> Mark {
    let period_scale = scale::period_for_bar();

    let mut line = from_data(MarkType::Line, LINE_MARK, LINE_FACET);
    line.encode = Encode {
        enter: channels([
            ("x", ValueRef::scaled(&period_scale, FIELD_PERIOD).with_offset(half_band(&period_scale))),
            ("y", ValueRef::scaled(&scale::amount_for_point(), FIELD_SECONDARY_AMOUNT)),
            ("stroke", ValueRef::scaled(&scale::color_for_point(), FIELD_SECONDARY_TYPE)),
            ("strokeWidth", ValueRef::value(2)),
        ]),
        update: channels([
            ("interpolate", ValueRef::signal(Expr::signal(&SignalRef::new(INTERPOLATE)))),
            ("strokeOpacity", ValueRef::value(0.9)),
        ]),
    };

    let mut group = faceted(MarkType::Group, LINE_GROUP, LINE_FACET, data, FIELD_TYPE);
    group.marks = vec![line];
    group
}

fn point_group(data: &DataRef, tooltips: &TooltipBuilder) -> Result<Mark> {
    let period_scale = scale::period_for_bar();
    let amount_scale = scale::amount_for_point();
    let color_scale = scale::color_for_point();
    let hover = hover_test(&SignalRef::new(HOVER_SYMBOL), &[FIELD_PERIOD, FIELD_SECONDARY_TYPE]);

    let mut point = from_data(MarkType::Symbol, POINT_MARK, POINT_FACET);
    point.encode = Encode {
        enter: channels([
            ("fill", ValueRef::scaled(&color_scale, FIELD_SECONDARY_TYPE)),
            ("tooltip", ValueRef::signal(tooltips.build(&POINT_FIELDS)?)),
        ]),
        update: channels([
            ("shape", ValueRef::value("circle")),
            ("x", ValueRef::scaled(&period_scale, FIELD_PERIOD).with_offset(half_band(&period_scale))),
            ("y", ValueRef::scaled(&amount_scale, FIELD_SECONDARY_AMOUNT)),
            ("fillOpacity", toggle(hover.clone(), 0.75, 1.0)),
            ("size", toggle(hover.clone(), 81.0, 49.0)),
        ]),
    };

    let mut rule = from_data(MarkType::Rule, POINT_RULE, POINT_FACET);
    rule.encode = Encode {
        enter: channels([
            ("stroke", ValueRef::scaled(&color_scale, FIELD_SECONDARY_TYPE)),
            ("strokeWidth", ValueRef::value(1)),
            ("strokeDash", ValueRef::value(json!([6, 4]))),
        ]),
        update: channels([
            ("x", ValueRef::signal(Expr::Range(scale::period_for_point()).index(1))),
            ("x2", ValueRef::value(0)),
            ("y", ValueRef::scaled(&amount_scale, FIELD_SECONDARY_AMOUNT)),
            ("y2", ValueRef::scaled(&amount_scale, FIELD_SECONDARY_AMOUNT)),
            ("strokeOpacity", toggle(hover, 0.75, 0.0)),
        ]),
    };

    let mut group = faceted(MarkType::Group, POINT_GROUP, POINT_FACET, data, FIELD_SECONDARY_TYPE);
    group.marks = vec![point, rule];
    Ok(group)
}
