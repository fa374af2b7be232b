use crate::data::{compare_values, DataPoint, FIELD_PERIOD, FIELD_TYPE};
use crate::error::Result;
use crate::ir::{CompareSpec, DataFormat, DataRef, DataSource, ParseType, SortOrder, Transform};
use crate::palette::{assign_fallback_colors, ColorCache};
use crate::resolve::ResolvedGraph;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

pub const DATA_PROCESSED: &str = "dataProcessed";

/// Main entry point: turn raw rows into the single processed data source
pub fn build_data_source(
    data: &[DataPoint],
    resolved: &ResolvedGraph,
    period_as_date: bool,
    cache: &mut ColorCache,
) -> Result<DataSource> {
    // 1. Fallback colors keyed by the primary category
    let rows = assign_fallback_colors(
        data.to_vec(),
        FIELD_TYPE,
        resolved.fields.type_color.as_deref(),
        cache,
    );

    // 2. Stable sort on the configured keys
    let rows = sort_rows(rows, &resolved.sort);
    warn_on_duplicates(&rows);

    // 3. Emit rows plus the parse format and the engine-side collect
    let values = rows
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut parse = BTreeMap::new();
    parse.insert(
        FIELD_PERIOD.to_string(),
        if period_as_date { ParseType::Date } else { ParseType::String },
    );

    let (field, order): (Vec<String>, Vec<SortOrder>) = resolved.sort.iter().cloned().unzip();

    tracing::debug!(rows = values.len(), "built data source");

    Ok(DataSource {
        name: DataRef::new(DATA_PROCESSED),
        values,
        format: DataFormat { parse },
        transform: vec![Transform::Collect { sort: CompareSpec { field, order } }],
    })
}

/// Stable multi-key sort. Earlier keys take priority.
pub fn sort_rows(mut rows: Vec<DataPoint>, keys: &[(String, SortOrder)]) -> Vec<DataPoint> {
    rows.sort_by(|a, b| {
        keys.iter()
            .map(|(field, order)| {
                let ordering = compare_values(a.field(field).as_ref(), b.field(field).as_ref());
                match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
    rows
}

/// Rows sharing a (period, type) pair render as overlapping bars.
fn warn_on_duplicates(rows: &[DataPoint]) {
    let mut seen = HashSet::new();
    for row in rows {
        let key = (row.period.clone(), row.kind.clone());
        if !seen.insert(key) {
            tracing::warn!(period = %row.period, kind = %row.kind, "duplicate (period, type) row");
        }
    }
}
