// Responsive sizing: label angle, font sizes and label limits from data cardinality

use crate::data::{value_to_key, DataPoint};
use std::collections::HashSet;
use std::f64::consts::PI;

/// Sentinel cardinality used when the grouping pass is skipped.
pub const FAST_RENDER_DOMAIN: i64 = -1;

const MAX_LABEL_ANGLE: f64 = -35.0;
const FAST_RENDER_FONT_SIZE: f64 = 10.0;
const MIN_FONT_SIZE: f64 = 11.0;
const MAX_FONT_SIZE: f64 = 15.0;
const FONT_SIZE_RATIO: f64 = 0.125;
const LABEL_LIMIT_RATIO: f64 = 0.85;
const DEFAULT_LABEL_LIMIT: f64 = 100.0;

/// Derived sizes for one (data, width) pair. Never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedSizing {
    pub font_size: f64,
    pub label_angle: f64,
    pub label_limit: f64,
    pub mark_font_size: f64,
}

/// Compute sizing for `data` laid out across `width` pixels.
pub fn compute_sizing(data: &[DataPoint], width: f64, fast_render: bool, group_field: &str) -> ResolvedSizing {
    let domain_length = if fast_render {
        FAST_RENDER_DOMAIN
    } else {
        count_distinct(data, group_field) as i64
    };

    let sizing = ResolvedSizing {
        font_size: font_size(domain_length, width),
        label_angle: label_angle(domain_length, width),
        label_limit: label_limit(domain_length, width),
        mark_font_size: font_size(domain_length, width),
    };
    tracing::debug!(domain_length, width, ?sizing, "computed sizing");
    sizing
}

/// Number of distinct values of `field`. Rows missing the field share one bucket.
pub fn count_distinct(data: &[DataPoint], field: &str) -> usize {
    data.iter()
        .map(|row| row.field(field).map(|v| value_to_key(&v)))
        .collect::<HashSet<_>>()
        .len()
}

/// `clamp(min, cur, max)` with the argument order used by the sizing formulas.
pub fn clamp(min: f64, cur: f64, max: f64) -> f64 {
    if cur <= min {
        min
    } else if cur >= max {
        max
    } else {
        cur
    }
}

/// Round half up, the way the engine's expression language rounds.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn per_category_width(domain_length: i64, width: f64) -> f64 {
    if domain_length == 0 {
        f64::INFINITY
    } else {
        width / domain_length as f64
    }
}

fn label_angle(domain_length: i64, width: f64) -> f64 {
    if domain_length == FAST_RENDER_DOMAIN {
        return MAX_LABEL_ANGLE;
    }
    let tick_size = per_category_width(domain_length, width);
    let angle = -(clamp(1.0, tick_size, 90.0) / 90.0).acos() * 180.0 / PI;
    // + 0.0 folds a negative zero into zero
    round_half_up(clamp(MAX_LABEL_ANGLE, angle, 0.0)) + 0.0
}

fn font_size(domain_length: i64, width: f64) -> f64 {
    if domain_length == FAST_RENDER_DOMAIN {
        return FAST_RENDER_FONT_SIZE;
    }
    let raw = round_half_up(per_category_width(domain_length, width) * FONT_SIZE_RATIO);
    clamp(MIN_FONT_SIZE, raw, MAX_FONT_SIZE)
}

fn label_limit(domain_length: i64, width: f64) -> f64 {
    if domain_length > 0 {
        LABEL_LIMIT_RATIO * width / domain_length as f64
    } else {
        DEFAULT_LABEL_LIMIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn periods(n: usize) -> Vec<DataPoint> {
        (0..n)
            .map(|i| DataPoint::new(format!("2023112{}", i), 1.0, 1.0, "A", "B"))
            .collect()
    }

    #[test]
    fn test_fast_render_ignores_data_and_width() {
        for width in [0.0, 120.0, 4000.0] {
            let sizing = compute_sizing(&periods(7), width, true, "period");
            assert_eq!(sizing.label_angle, -35.0);
            assert_eq!(sizing.font_size, 10.0);
            assert_eq!(sizing.mark_font_size, 10.0);
            assert_eq!(sizing.label_limit, 100.0);
        }
    }

    #[test]
    fn test_empty_data_has_default_label_limit() {
        let sizing = compute_sizing(&[], 400.0, false, "period");
        assert_eq!(sizing.label_limit, 100.0);
        assert_eq!(sizing.label_angle, 0.0);
        assert_eq!(sizing.font_size, 15.0);
    }

    #[test]
    fn test_four_periods_at_400() {
        let sizing = compute_sizing(&periods(4), 400.0, false, "period");
        // 400 / 4 * 0.125 = 12.5 rounds half up to 13
        assert_eq!(sizing.font_size, 13.0);
        assert_eq!(sizing.mark_font_size, 13.0);
        assert_eq!(sizing.label_angle, 0.0);
        assert!((sizing.label_limit - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_label_angle_tilts_as_space_shrinks() {
        // 45px per category: -acos(0.5) = -60deg, clamped to -35
        let sizing = compute_sizing(&periods(4), 180.0, false, "period");
        assert_eq!(sizing.label_angle, -35.0);
        assert_eq!(sizing.font_size, 11.0);

        // 80px per category: -acos(80/90) ~ -27.27deg
        let sizing = compute_sizing(&periods(4), 320.0, false, "period");
        assert_eq!(sizing.label_angle, -27.0);
    }

    #[test]
    fn test_font_size_upper_bound() {
        let sizing = compute_sizing(&periods(2), 2000.0, false, "period");
        assert_eq!(sizing.font_size, 15.0);
    }

    #[test]
    fn test_count_distinct_custom_field() {
        let data = vec![
            DataPoint::new("p1", 1.0, 1.0, "A", "X"),
            DataPoint::new("p1", 1.0, 1.0, "B", "X"),
            DataPoint::new("p2", 1.0, 1.0, "A", "X"),
        ];
        assert_eq!(count_distinct(&data, "period"), 2);
        assert_eq!(count_distinct(&data, "type"), 2);
        assert_eq!(count_distinct(&data, "secondaryType"), 1);
        assert_eq!(count_distinct(&data, "missing"), 1);
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(12.5), 13.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-27.3), -27.0);
    }
}
