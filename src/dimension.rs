// Pixel dimensions from container constraints and the measured container box

use crate::sizing::{clamp, round_half_up};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

const DEFAULT_MAX_WIDTH: f64 = 2000.0;
const DEFAULT_MAX_HEIGHT: f64 = 400.0;
const RELAXED_MAX: f64 = 10000.0;
const DEFAULT_LEGEND_COLUMN_WIDTH: f64 = 150.0;
const LEGEND_ROW_HEIGHT: f64 = 20.0;

/// What the host container reports.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Measured {
    pub data_len: usize,
    pub width: f64,
    pub height: f64,
}

/// A width or height rule. `Computed` returning `None` means auto.
#[derive(Clone, Default, Deserialize)]
#[serde(try_from = "SizeRuleRepr")]
pub enum SizeRule {
    #[default]
    Auto,
    Fixed(f64),
    Computed(Arc<dyn Fn(&Measured) -> Option<f64> + Send + Sync>),
}

impl SizeRule {
    pub fn computed(f: impl Fn(&Measured) -> Option<f64> + Send + Sync + 'static) -> Self {
        SizeRule::Computed(Arc::new(f))
    }

    fn resolve(&self, measured: &Measured) -> Option<f64> {
        match self {
            SizeRule::Auto => None,
            SizeRule::Fixed(value) => Some(*value),
            SizeRule::Computed(f) => f(measured),
        }
    }

    fn is_auto(&self) -> bool {
        matches!(self, SizeRule::Auto)
    }
}

impl fmt::Debug for SizeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeRule::Auto => f.write_str("Auto"),
            SizeRule::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            SizeRule::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeRuleRepr {
    Number(f64),
    Keyword(String),
}

impl TryFrom<SizeRuleRepr> for SizeRule {
    type Error = String;

    fn try_from(repr: SizeRuleRepr) -> Result<Self, Self::Error> {
        match repr {
            SizeRuleRepr::Number(value) => Ok(SizeRule::Fixed(value)),
            SizeRuleRepr::Keyword(word) if word == "auto" => Ok(SizeRule::Auto),
            SizeRuleRepr::Keyword(word) => Err(format!("expected \"auto\" or a number, found \"{}\"", word)),
        }
    }
}

/// A min/max bound: a constant or a function of the measurement.
#[derive(Clone, Deserialize)]
#[serde(from = "f64")]
pub enum BoundRule {
    Fixed(f64),
    Computed(Arc<dyn Fn(&Measured) -> f64 + Send + Sync>),
}

impl BoundRule {
    pub fn computed(f: impl Fn(&Measured) -> f64 + Send + Sync + 'static) -> Self {
        BoundRule::Computed(Arc::new(f))
    }

    fn resolve(&self, measured: &Measured) -> f64 {
        match self {
            BoundRule::Fixed(value) => *value,
            BoundRule::Computed(f) => f(measured),
        }
    }
}

impl From<f64> for BoundRule {
    fn from(value: f64) -> Self {
        BoundRule::Fixed(value)
    }
}

impl fmt::Debug for BoundRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundRule::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            BoundRule::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Reserve room for a legend wrapping below the plot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendOption {
    pub column_width: Option<f64>,
}

/// Sizing constraints supplied by the embedding container.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerConstraints {
    pub width: SizeRule,
    pub height: SizeRule,
    pub min_width: Option<BoundRule>,
    pub max_width: Option<BoundRule>,
    pub min_height: Option<BoundRule>,
    pub max_height: Option<BoundRule>,
    pub width_by_data_ratio: Option<f64>,
    pub height_by_data_ratio: Option<f64>,
    /// width / height
    pub aspect_ratio: Option<f64>,
    /// Reported as the container's max height in place of `max_height`.
    pub max_confined_height: Option<BoundRule>,
    pub legend_option: Option<LegendOption>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedDimensions {
    pub width: f64,
    pub height: f64,
    pub min_width: f64,
    pub max_width: f64,
    pub min_height: f64,
    /// Container ceiling to report; the confined height when one is set.
    pub max_height: f64,
}

/// Resolve final pixel width and height.
///
/// Each axis takes the first available of: fixed rule, ratio from the other
/// axis, ratio from data length, measured size. The result is clamped to the
/// axis bounds and rounded half up.
pub fn resolve_dimensions(constraints: &ContainerConstraints, measured: &Measured) -> ResolvedDimensions {
    let data_len = measured.data_len as f64;
    let aspect = constraints.aspect_ratio.filter(|ratio| *ratio > 0.0);
    let bound = |rule: &Option<BoundRule>, default: f64| {
        rule.as_ref().map_or(default, |rule| rule.resolve(measured))
    };

    let relax_height =
        !constraints.height.is_auto() || constraints.height_by_data_ratio.is_some() || aspect.is_some();
    let max_height = bound(
        &constraints.max_height,
        if relax_height { RELAXED_MAX } else { DEFAULT_MAX_HEIGHT },
    );

    // 1. Width. The height anchor is clamped first so width and height keep the ratio.
    let fixed_width = constraints.width.resolve(measured);
    let fixed_height = constraints.height.resolve(measured);
    let height_anchor = fixed_height
        .or_else(|| constraints.height_by_data_ratio.map(|ratio| data_len * ratio))
        .map(|height| clamp(bound(&constraints.min_height, 0.0), height, max_height));

    let raw_width = fixed_width
        .or_else(|| aspect.zip(height_anchor).map(|(ratio, height)| height * ratio))
        .or_else(|| constraints.width_by_data_ratio.map(|ratio| data_len * ratio))
        .unwrap_or(measured.width);

    let relax_width =
        !constraints.width.is_auto() || constraints.width_by_data_ratio.is_some() || aspect.is_some();
    let min_width = bound(&constraints.min_width, 0.0);
    let max_width = bound(
        &constraints.max_width,
        if relax_width { RELAXED_MAX } else { DEFAULT_MAX_WIDTH },
    );
    let width = round_half_up(clamp(min_width, raw_width, max_width));

    // 2. Height, with room for a wrapping legend
    let mut min_height = bound(&constraints.min_height, 0.0);
    if let Some(legend) = &constraints.legend_option {
        let column_width = legend.column_width.unwrap_or(DEFAULT_LEGEND_COLUMN_WIDTH);
        let columns = (width / column_width).floor().max(1.0);
        min_height += (data_len / columns).ceil() * LEGEND_ROW_HEIGHT;
    }

    let raw_height = fixed_height
        .or_else(|| aspect.map(|ratio| width / ratio))
        .or_else(|| constraints.height_by_data_ratio.map(|ratio| data_len * ratio))
        .unwrap_or(measured.height);

    let height = round_half_up(clamp(min_height, raw_height, max_height));

    let reported_max_height = constraints
        .max_confined_height
        .as_ref()
        .map_or(max_height, |rule| round_half_up(rule.resolve(measured)));

    let resolved = ResolvedDimensions {
        width,
        height,
        min_width,
        max_width,
        min_height,
        max_height: reported_max_height,
    };
    tracing::debug!(?resolved, ?measured, "resolved dimensions");
    resolved
}
