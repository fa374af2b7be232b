use crate::config::GraphConfig;
use crate::data::{FIELD_PERIOD, FIELD_SECONDARY_TYPE, FIELD_TYPE};
use crate::ir::SortOrder;
use crate::tooltip::TooltipContext;

/// Field names after applying the data-scale-map redirects.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFields {
    /// First sort key: the custom order field, or `period`.
    pub order: String,
    /// Explicit per-row color field; enables fallback colors when set.
    pub type_color: Option<String>,
    pub legend_label: Option<String>,
    pub secondary_legend_label: Option<String>,
}

impl ResolvedFields {
    pub fn customize_legend_label(&self) -> bool {
        self.legend_label.is_some()
    }

    pub fn customize_secondary_legend_label(&self) -> bool {
        self.secondary_legend_label.is_some()
    }

    /// Range field of the bar legend-label scale.
    pub fn legend_label_range(&self) -> &str {
        self.legend_label.as_deref().unwrap_or(FIELD_TYPE)
    }

    /// Range field of the point legend-label scale.
    pub fn secondary_legend_label_range(&self) -> &str {
        self.secondary_legend_label.as_deref().unwrap_or(FIELD_SECONDARY_TYPE)
    }
}

/// Everything the synthesizer derives from configuration alone.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGraph {
    pub fields: ResolvedFields,
    /// Sort keys paired with their directions, in priority order.
    pub sort: Vec<(String, SortOrder)>,
    pub tooltip: TooltipContext,
}

/// Resolve field redirects, sort keys and tooltip context for a configuration.
pub fn resolve_graph(config: &GraphConfig) -> ResolvedGraph {
    let scale_map = &config.data_scale_map;
    let fields = ResolvedFields {
        order: scale_map.order.clone().unwrap_or_else(|| FIELD_PERIOD.to_string()),
        type_color: scale_map.type_color.clone(),
        legend_label: scale_map.legend_label.clone(),
        secondary_legend_label: scale_map.secondary_legend_label.clone(),
    };

    let sort = [fields.order.as_str(), FIELD_TYPE, FIELD_SECONDARY_TYPE]
        .iter()
        .zip(config.graph_sort.iter())
        .map(|(field, order)| (field.to_string(), *order))
        .collect();

    let tooltip = TooltipContext {
        period_as_date: config.period_as_date,
        customize_legend_label: fields.customize_legend_label(),
        customize_secondary_legend_label: fields.customize_secondary_legend_label(),
    };

    ResolvedGraph { fields, sort, tooltip }
}
