// Tooltip text: default templates, caller overrides, object-literal serialization

use crate::data::{FIELD_AMOUNT, FIELD_PERIOD, FIELD_SECONDARY_AMOUNT, FIELD_SECONDARY_TYPE, FIELD_TYPE};
use crate::error::{Result, SpecError};
use crate::expr::Expr;
use crate::scale;
use std::collections::BTreeMap;
use std::fmt;

/// Flags templates may consult when resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TooltipContext {
    pub period_as_date: bool,
    pub customize_legend_label: bool,
    pub customize_secondary_legend_label: bool,
}

/// A label or value template.
#[derive(Clone)]
pub enum Template {
    /// Literal text. As a label it is shown as-is; as a value it is raw expression text.
    Text(String),
    Expr(Expr),
    /// Resolved against the context at build time.
    Contextual(fn(&TooltipContext) -> Expr),
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Template::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Template::Expr(expr) => f.debug_tuple("Expr").field(expr).finish(),
            Template::Contextual(_) => f.write_str("Contextual(..)"),
        }
    }
}

impl Template {
    fn resolve_label(&self, context: &TooltipContext) -> String {
        match self {
            Template::Text(text) => text.clone(),
            Template::Expr(expr) => expr.to_string(),
            Template::Contextual(build) => build(context).to_string(),
        }
    }

    fn resolve_value(&self, context: &TooltipContext) -> Expr {
        match self {
            Template::Text(text) => Expr::raw(text.clone()),
            Template::Expr(expr) => expr.clone(),
            Template::Contextual(build) => build(context),
        }
    }
}

impl From<&str> for Template {
    fn from(text: &str) -> Self {
        Template::Text(text.to_string())
    }
}

pub type TemplateMap = BTreeMap<String, Template>;

/// Field-union of defaults and overrides. Present override values win; `None` is ignored.
pub fn merge_templates(defaults: &TemplateMap, overrides: &BTreeMap<String, Option<String>>) -> TemplateMap {
    let mut merged = defaults.clone();
    for (field, value) in overrides {
        if let Some(text) = value {
            merged.insert(field.clone(), Template::Text(text.clone()));
        }
    }
    merged
}

/// Fields shown when hovering a bar.
pub const BAR_FIELDS: [&str; 3] = [FIELD_TYPE, FIELD_AMOUNT, FIELD_PERIOD];
/// Fields shown when hovering a point.
pub const POINT_FIELDS: [&str; 3] = [FIELD_SECONDARY_TYPE, FIELD_SECONDARY_AMOUNT, FIELD_PERIOD];

pub fn default_labels() -> TemplateMap {
    [
        (FIELD_AMOUNT, "Amount"),
        (FIELD_SECONDARY_AMOUNT, "Secondary Amount"),
        (FIELD_TYPE, "Type"),
        (FIELD_SECONDARY_TYPE, "Secondary Type"),
        (FIELD_PERIOD, "On"),
    ]
    .into_iter()
    .map(|(field, label)| (field.to_string(), Template::from(label)))
    .collect()
}

pub fn default_values() -> TemplateMap {
    let mut values = TemplateMap::new();
    values.insert(
        FIELD_AMOUNT.to_string(),
        Template::Expr(Expr::number_format(Expr::field(FIELD_AMOUNT), ",")),
    );
    values.insert(
        FIELD_SECONDARY_AMOUNT.to_string(),
        Template::Expr(Expr::number_format(Expr::field(FIELD_SECONDARY_AMOUNT), ",")),
    );
    values.insert(
        FIELD_PERIOD.to_string(),
        Template::Contextual(|ctx| {
            if ctx.period_as_date {
                Expr::time_format(Expr::field(FIELD_PERIOD), "%b %d, %Y")
            } else {
                Expr::field(FIELD_PERIOD)
            }
        }),
    );
    values.insert(
        FIELD_TYPE.to_string(),
        Template::Contextual(|ctx| {
            if ctx.customize_legend_label {
                Expr::scale_lookup(&scale::legend_for_bar(), Expr::field(FIELD_TYPE))
            } else {
                Expr::field(FIELD_TYPE)
            }
        }),
    );
    values.insert(
        FIELD_SECONDARY_TYPE.to_string(),
        Template::Contextual(|ctx| {
            if ctx.customize_secondary_legend_label {
                Expr::scale_lookup(&scale::legend_for_point(), Expr::field(FIELD_SECONDARY_TYPE))
            } else {
                Expr::field(FIELD_SECONDARY_TYPE)
            }
        }),
    );
    values
}

/// Builds tooltip expressions for arbitrary field subsets.
#[derive(Debug, Clone)]
pub struct TooltipBuilder {
    labels: TemplateMap,
    values: TemplateMap,
    context: TooltipContext,
}

impl TooltipBuilder {
    /// Builder over the stock templates.
    pub fn with_defaults(
        label_overrides: &BTreeMap<String, Option<String>>,
        value_overrides: &BTreeMap<String, Option<String>>,
        context: TooltipContext,
    ) -> Self {
        TooltipBuilder::new(&default_labels(), &default_values(), label_overrides, value_overrides, context)
    }

    pub fn new(
        default_labels: &TemplateMap,
        default_values: &TemplateMap,
        label_overrides: &BTreeMap<String, Option<String>>,
        value_overrides: &BTreeMap<String, Option<String>>,
        context: TooltipContext,
    ) -> Self {
        TooltipBuilder {
            labels: merge_templates(default_labels, label_overrides),
            values: merge_templates(default_values, value_overrides),
            context,
        }
    }

    /// Resolved label text for one field, if any template exists.
    pub fn label(&self, field: &str) -> Option<String> {
        self.labels.get(field).map(|t| t.resolve_label(&self.context))
    }

    /// Object-literal expression pairing each field's label with its value, in input order.
    pub fn build(&self, fields: &[&str]) -> Result<Expr> {
        let mut entries = Vec::with_capacity(fields.len());
        for field in fields {
            let label = self
                .labels
                .get(*field)
                .ok_or_else(|| SpecError::missing_template("label", *field))?
                .resolve_label(&self.context);
            let value = self
                .values
                .get(*field)
                .ok_or_else(|| SpecError::missing_template("value", *field))?
                .resolve_value(&self.context);
            entries.push((label, value));
        }
        Ok(Expr::QuotedObject(entries))
    }
}
