use crate::config::ColorScheme;
use crate::data::{FIELD_AMOUNT, FIELD_PERIOD, FIELD_SECONDARY_AMOUNT, FIELD_SECONDARY_TYPE, FIELD_TYPE};
use crate::ir::{DataField, DataRef, Scale, ScaleRange, ScaleRef, ScaleType};
use crate::resolve::ResolvedFields;

pub const PERIOD_FOR_BAR: &str = "scale_periodForBar";
pub const PERIOD_FOR_POINT: &str = "scale_periodForPoint";
pub const AMOUNT_FOR_BAR: &str = "scale_amountForBar";
pub const AMOUNT_FOR_POINT: &str = "scale_amountForPoint";
pub const COLOR_FOR_BAR: &str = "scale_colorForBar";
pub const COLOR_FOR_POINT: &str = "scale_colorForPoint";
pub const LEGEND_FOR_BAR: &str = "scale_legendForBar";
pub const LEGEND_FOR_POINT: &str = "scale_legendForPoint";

const BAR_PADDING: f64 = 0.2;

pub fn period_for_bar() -> ScaleRef {
    ScaleRef::new(PERIOD_FOR_BAR)
}

pub fn period_for_point() -> ScaleRef {
    ScaleRef::new(PERIOD_FOR_POINT)
}

pub fn amount_for_bar() -> ScaleRef {
    ScaleRef::new(AMOUNT_FOR_BAR)
}

pub fn amount_for_point() -> ScaleRef {
    ScaleRef::new(AMOUNT_FOR_POINT)
}

pub fn color_for_bar() -> ScaleRef {
    ScaleRef::new(COLOR_FOR_BAR)
}

pub fn color_for_point() -> ScaleRef {
    ScaleRef::new(COLOR_FOR_POINT)
}

pub fn legend_for_bar() -> ScaleRef {
    ScaleRef::new(LEGEND_FOR_BAR)
}

pub fn legend_for_point() -> ScaleRef {
    ScaleRef::new(LEGEND_FOR_POINT)
}

/// Build the eight top-level scales over `data`
pub fn build_scales(data: &DataRef, fields: &ResolvedFields, scheme: &ColorScheme) -> Vec<Scale> {
    // 1. Positional scales
    let period_bar = Scale {
        padding: Some(BAR_PADDING),
        ..categorical(period_for_bar(), ScaleType::Band, ScaleRange::Extent("width"), data, FIELD_PERIOD)
    };
    let period_point = categorical(period_for_point(), ScaleType::Point, ScaleRange::Extent("width"), data, FIELD_PERIOD);
    let amount_bar = linear(amount_for_bar(), data, FIELD_AMOUNT);
    let amount_point = linear(amount_for_point(), data, FIELD_SECONDARY_AMOUNT);

    // 2. Colors: explicit per-row colors win over the named scheme
    let bar_range = match &fields.type_color {
        Some(field) => ScaleRange::Data(DataField::new(data, field.clone())),
        None => ScaleRange::Scheme { scheme: scheme.bar.clone() },
    };
    let color_bar = categorical(color_for_bar(), ScaleType::Ordinal, bar_range, data, FIELD_TYPE);
    let color_point = categorical(
        color_for_point(),
        ScaleType::Ordinal,
        ScaleRange::Scheme { scheme: scheme.line.clone() },
        data,
        FIELD_SECONDARY_TYPE,
    );

    // 3. Category → display label
    let legend_bar = categorical(
        legend_for_bar(),
        ScaleType::Ordinal,
        ScaleRange::Data(DataField::new(data, fields.legend_label_range())),
        data,
        FIELD_TYPE,
    );
    let legend_point = categorical(
        legend_for_point(),
        ScaleType::Ordinal,
        ScaleRange::Data(DataField::new(data, fields.secondary_legend_label_range())),
        data,
        FIELD_SECONDARY_TYPE,
    );

    vec![
        period_bar,
        period_point,
        amount_bar,
        amount_point,
        color_bar,
        color_point,
        legend_bar,
        legend_point,
    ]
}

/// Band scale splitting each period slot between the bars of one group.
pub fn bar_group_scale(name: ScaleRef, facet: &DataRef) -> Scale {
    categorical(name, ScaleType::Band, ScaleRange::Extent("width"), facet, FIELD_TYPE)
}

fn categorical(name: ScaleRef, kind: ScaleType, range: ScaleRange, data: &DataRef, field: &str) -> Scale {
    Scale {
        name,
        kind,
        range,
        domain: DataField::new(data, field),
        padding: None,
        nice: None,
        zero: None,
    }
}

fn linear(name: ScaleRef, data: &DataRef, field: &str) -> Scale {
    Scale {
        name,
        kind: ScaleType::Linear,
        range: ScaleRange::Extent("height"),
        domain: DataField::new(data, field),
        padding: None,
        nice: Some(true),
        zero: Some(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;
    use crate::config::DataScaleMap;
    use crate::resolve::resolve_graph;
    use serde_json::json;

    fn scales_for(config: &GraphConfig) -> Vec<Scale> {
        let resolved = resolve_graph(config);
        build_scales(&DataRef::new("dataProcessed"), &resolved.fields, &config.color_scheme)
    }

    #[test]
    fn test_default_scales() {
        let scales = scales_for(&GraphConfig::default());
        let names: Vec<&str> = scales.iter().map(|s| s.name.name()).collect();
        assert_eq!(
            names,
            vec![
                PERIOD_FOR_BAR,
                PERIOD_FOR_POINT,
                AMOUNT_FOR_BAR,
                AMOUNT_FOR_POINT,
                COLOR_FOR_BAR,
                COLOR_FOR_POINT,
                LEGEND_FOR_BAR,
                LEGEND_FOR_POINT
            ]
        );

        assert_eq!(
            serde_json::to_value(&scales[0]).unwrap(),
            json!({
                "name": "scale_periodForBar",
                "type": "band",
                "range": "width",
                "domain": {"data": "dataProcessed", "field": "period"},
                "padding": 0.2
            })
        );
        assert_eq!(
            serde_json::to_value(&scales[3]).unwrap(),
            json!({
                "name": "scale_amountForPoint",
                "type": "linear",
                "range": "height",
                "domain": {"data": "dataProcessed", "field": "secondaryAmount"},
                "nice": true,
                "zero": true
            })
        );
        assert_eq!(scales[4].range, ScaleRange::Scheme { scheme: "default".to_string() });
        assert_eq!(scales[5].range, ScaleRange::Scheme { scheme: "paletteOrange".to_string() });
        assert_eq!(
            scales[6].range,
            ScaleRange::Data(DataField::new(&DataRef::new("dataProcessed"), "type"))
        );
    }

    #[test]
    fn test_redirected_fields() {
        let config = GraphConfig {
            data_scale_map: DataScaleMap {
                type_color: Some("colorOverride".to_string()),
                legend_label: Some("typeLabel".to_string()),
                secondary_legend_label: Some("lineLabel".to_string()),
                order: None,
            },
            ..Default::default()
        };
        let scales = scales_for(&config);
        let data = DataRef::new("dataProcessed");
        assert_eq!(scales[4].range, ScaleRange::Data(DataField::new(&data, "colorOverride")));
        assert_eq!(scales[6].range, ScaleRange::Data(DataField::new(&data, "typeLabel")));
        assert_eq!(scales[7].range, ScaleRange::Data(DataField::new(&data, "lineLabel")));
        assert_eq!(scales[7].domain.field, "secondaryType");
    }

    #[test]
    fn test_bar_group_scale() {
        let scale = bar_group_scale(ScaleRef::new("barGroupScale"), &DataRef::new("markGroupDataBar"));
        assert_eq!(
            serde_json::to_value(&scale).unwrap(),
            json!({
                "name": "barGroupScale",
                "type": "band",
                "range": "width",
                "domain": {"data": "markGroupDataBar", "field": "type"}
            })
        );
    }
}
