// Interaction and layout signals

use crate::compiler::{BAR_MARK, POINT_MARK};
use crate::config::Interpolation;
use crate::expr::Expr;
use crate::guide::{LEGEND_LABEL, LEGEND_SYMBOL};
use crate::ir::{EventSelector, MarkRef, MarkType, Signal, SignalHandler, SignalRef};
use crate::scale;
use crate::sizing::ResolvedSizing;
use serde_json::{json, Value};

pub const HOVER_RECT: &str = "signal_currentHoverRect";
pub const HOVER_SYMBOL: &str = "signal_currentHoverSymbol";
pub const INTERPOLATE: &str = "interpolateTypeSignal";
pub const FONT_SIZE: &str = "signalVar_fontSize";
pub const BAR_CLICK: &str = "barClick";
pub const LINE_CLICK: &str = "lineClick";
pub const LEGEND_CLICK: &str = "legendClick";

/// Signals every graph gets from the engine without declaring them.
pub const BUILTIN_SIGNALS: [&str; 2] = ["width", "height"];

pub fn width() -> Expr {
    Expr::signal(&SignalRef::new("width"))
}

pub fn height() -> Expr {
    Expr::signal(&SignalRef::new("height"))
}

/// `datum.f === signal.f && ...` over the given fields.
pub fn hover_test(signal: &SignalRef, fields: &[&str]) -> Expr {
    let mut tests = fields
        .iter()
        .map(|field| Expr::Datum.member(*field).strict_eq(Expr::signal(signal).member(*field)));
    let first = tests.next().unwrap_or(Expr::raw("false"));
    tests.fold(first, Expr::and)
}

/// Top-level signals in declaration order.
pub fn build_signals(interpolation: Interpolation, sizing: &ResolvedSizing) -> Vec<Signal> {
    vec![
        hover_signal(HOVER_RECT, MarkType::Rect),
        hover_signal(HOVER_SYMBOL, MarkType::Symbol),
        Signal::constant(SignalRef::new(INTERPOLATE), Value::from(interpolation.as_str())),
        font_size_signal(sizing),
        click_signal(BAR_CLICK, &[BAR_MARK]),
        click_signal(LINE_CLICK, &[POINT_MARK]),
        click_signal(LEGEND_CLICK, &[LEGEND_SYMBOL, LEGEND_LABEL]),
    ]
}

fn hover_signal(name: &str, target: MarkType) -> Signal {
    Signal {
        name: SignalRef::new(name),
        value: Some(json!({})),
        update: None,
        on: vec![
            SignalHandler {
                events: vec![EventSelector::MarkType(target, "mouseover")],
                update: Expr::Datum,
                force: false,
            },
            SignalHandler {
                events: vec![EventSelector::MarkType(target, "mouseout")],
                update: Expr::empty_object(),
                force: false,
            },
        ],
    }
}

/// Value-label font size that shrinks with bars per group and digits per value.
fn font_size_signal(sizing: &ResolvedSizing) -> Signal {
    let plus_epsilon = |e: Expr| e.add(Expr::num(0.01));
    let periods = plus_epsilon(Expr::Domain(scale::period_for_bar()).length());
    let types = plus_epsilon(Expr::Domain(scale::color_for_bar()).length());
    let digits = plus_epsilon(
        Expr::call("toString", vec![Expr::Domain(scale::amount_for_bar()).index(1)]).length(),
    );
    let update = width()
        .div(periods)
        .div(types)
        .div(digits)
        .div(Expr::num(0.6))
        .mul(Expr::num(0.85))
        .clamp(10.0, 16.0);

    Signal {
        name: SignalRef::new(FONT_SIZE),
        value: Some(Value::from(sizing.mark_font_size)),
        update: Some(update),
        on: Vec::new(),
    }
}

fn click_signal(name: &str, marks: &[&str]) -> Signal {
    Signal {
        name: SignalRef::new(name),
        value: Some(Value::Null),
        update: None,
        on: vec![SignalHandler {
            events: marks
                .iter()
                .map(|mark| EventSelector::Named(MarkRef::new(*mark), "click"))
                .collect(),
            update: Expr::Object(vec![("value".to_string(), Expr::Datum)]),
            force: true,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizing() -> ResolvedSizing {
        ResolvedSizing { font_size: 13.0, label_angle: 0.0, label_limit: 85.0, mark_font_size: 13.0 }
    }

    #[test]
    fn test_signal_order_and_names() {
        let signals = build_signals(Interpolation::Monotone, &sizing());
        let names: Vec<&str> = signals.iter().map(|s| s.name.name()).collect();
        assert_eq!(
            names,
            vec![HOVER_RECT, HOVER_SYMBOL, INTERPOLATE, FONT_SIZE, BAR_CLICK, LINE_CLICK, LEGEND_CLICK]
        );
        assert_eq!(signals[2].value, Some(json!("monotone")));
    }

    #[test]
    fn test_hover_signal_json() {
        let value = serde_json::to_value(hover_signal(HOVER_RECT, MarkType::Rect)).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "signal_currentHoverRect",
                "value": {},
                "on": [
                    {"events": "rect:mouseover", "update": "datum"},
                    {"events": "rect:mouseout", "update": "{}"}
                ]
            })
        );
    }

    #[test]
    fn test_font_size_signal() {
        let signal = font_size_signal(&sizing());
        assert_eq!(signal.value, Some(json!(13.0)));
        assert_eq!(
            signal.update.unwrap().to_string(),
            "clamp((((((width / (length(domain(\"scale_periodForBar\")) + 0.01)) / \
             (length(domain(\"scale_colorForBar\")) + 0.01)) / \
             (length(toString(domain(\"scale_amountForBar\")[1])) + 0.01)) / 0.6) * 0.85), 10, 16)"
        );
    }

    #[test]
    fn test_legend_click_events() {
        let value = serde_json::to_value(click_signal(LEGEND_CLICK, &[LEGEND_SYMBOL, LEGEND_LABEL])).unwrap();
        assert_eq!(value.get("value"), Some(&Value::Null));
        assert_eq!(value["on"][0]["events"], json!("@legendSymbol:click, @legendLabel:click"));
        assert_eq!(value["on"][0]["update"], json!("{ value: datum }"));
        assert_eq!(value["on"][0]["force"], json!(true));
    }

    #[test]
    fn test_hover_test_expr() {
        let expr = hover_test(&SignalRef::new(HOVER_RECT), &["period", "type"]);
        assert_eq!(
            expr.to_string(),
            "((datum.period === signal_currentHoverRect.period) && (datum.type === signal_currentHoverRect.type))"
        );
    }
}
