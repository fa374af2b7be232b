// Fallback colors for categories without an explicit color field

use crate::data::DataPoint;
use serde_json::Value;
use std::collections::HashMap;

/// Color given to rows whose grouping value is not a string.
pub const NEUTRAL_COLOR: &str = "#000000";

/// Round-robin palette for fallback colors
pub struct ColorPalette {
    colors: Vec<&'static str>,
}

impl ColorPalette {
    /// Eight dark grays, darkest first
    pub fn fallback() -> Self {
        ColorPalette {
            colors: vec![
                "#222222", "#282828", "#333333", "#383838", "#444444", "#484848", "#555555", "#585858",
            ],
        }
    }

    /// Get color for a specific index (wraps around if index > palette size)
    pub fn get_color(&self, index: usize) -> &'static str {
        self.colors[index % self.colors.len()]
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Category → color assignments for one rendering session.
///
/// Grows monotonically: a category keeps its color for the cache's lifetime,
/// so independently rendered charts sharing a cache color shared categories
/// the same way.
pub struct ColorCache {
    palette: ColorPalette,
    assigned: HashMap<String, &'static str>,
    cursor: usize,
}

impl Default for ColorCache {
    fn default() -> Self {
        ColorCache::new(ColorPalette::fallback())
    }
}

impl ColorCache {
    pub fn new(palette: ColorPalette) -> Self {
        ColorCache {
            palette,
            assigned: HashMap::new(),
            cursor: 0,
        }
    }

    /// Color for `key`, assigning the next palette entry on first sight.
    pub fn color_for(&mut self, key: &str) -> &'static str {
        if let Some(color) = self.assigned.get(key) {
            return color;
        }
        let color = self.palette.get_color(self.cursor);
        self.cursor = (self.cursor + 1) % self.palette.len();
        self.assigned.insert(key.to_string(), color);
        tracing::trace!(key, color, "assigned fallback color");
        color
    }

    pub fn get(&self, key: &str) -> Option<&'static str> {
        self.assigned.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

/// Fill `color_field` on rows that lack it, keyed by the row's `grouping_field` value.
/// Rows pass through unchanged when no color field is configured.
pub fn assign_fallback_colors(
    rows: Vec<DataPoint>,
    grouping_field: &str,
    color_field: Option<&str>,
    cache: &mut ColorCache,
) -> Vec<DataPoint> {
    let Some(color_field) = color_field else {
        return rows;
    };

    rows.into_iter()
        .map(|mut row| {
            if row.field(color_field).is_some() {
                return row;
            }
            let color = match row.field(grouping_field) {
                Some(Value::String(key)) => cache.color_for(&key),
                _ => NEUTRAL_COLOR,
            };
            row.set_field(color_field, Value::from(color));
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(kind: &str) -> DataPoint {
        DataPoint::new("p", 1.0, 1.0, kind, "line")
    }

    #[test]
    fn test_palette_wraps() {
        let palette = ColorPalette::fallback();
        assert_eq!(palette.len(), 8);
        assert_eq!(palette.get_color(0), "#222222");
        assert_eq!(palette.get_color(7), "#585858");
        assert_eq!(palette.get_color(8), "#222222");
    }

    #[test]
    fn test_no_color_field_is_noop() {
        let mut cache = ColorCache::default();
        let rows = vec![row("A"), row("B")];
        let out = assign_fallback_colors(rows.clone(), "type", None, &mut cache);
        assert_eq!(out, rows);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_same_key_same_color() {
        let mut cache = ColorCache::default();
        let first = assign_fallback_colors(vec![row("A")], "type", Some("color"), &mut cache);
        let second = assign_fallback_colors(vec![row("A")], "type", Some("color"), &mut cache);
        assert_eq!(first[0].field("color"), second[0].field("color"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_keys_distinct_colors_across_calls() {
        let mut cache = ColorCache::default();
        let first = assign_fallback_colors(vec![row("A")], "type", Some("color"), &mut cache);
        let second = assign_fallback_colors(vec![row("B")], "type", Some("color"), &mut cache);
        assert_eq!(first[0].field("color"), Some(Value::from("#222222")));
        assert_eq!(second[0].field("color"), Some(Value::from("#282828")));
    }

    #[test]
    fn test_explicit_color_passes_through() {
        let mut cache = ColorCache::default();
        let rows = vec![row("A").with("color", "#ff0000"), row("A")];
        let out = assign_fallback_colors(rows, "type", Some("color"), &mut cache);
        assert_eq!(out[0].field("color"), Some(Value::from("#ff0000")));
        assert_eq!(out[1].field("color"), Some(Value::from("#222222")));
    }

    #[test]
    fn test_non_string_key_gets_neutral_color() {
        let mut cache = ColorCache::default();
        let rows = vec![row("A").with("bucket", 3), row("B")];
        let out = assign_fallback_colors(rows, "bucket", Some("color"), &mut cache);
        assert_eq!(out[0].field("color"), Some(Value::from(NEUTRAL_COLOR)));
        // row without a bucket value is not a string either
        assert_eq!(out[1].field("color"), Some(Value::from(NEUTRAL_COLOR)));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_ninth_key_reuses_first_color() {
        let mut cache = ColorCache::default();
        let colors: Vec<&str> = (0..9).map(|i| cache.color_for(&format!("k{}", i))).collect();
        assert_eq!(colors[8], colors[0]);
        assert_ne!(colors[1], colors[0]);
    }
}
