use crate::error::Result;
use crate::expr::Expr;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Typed names
// =============================================================================

/// Name of a data source (top-level or facet).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DataRef(String);

/// Name of a scale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ScaleRef(String);

/// Name of a signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SignalRef(String);

/// Name of a mark or of an interactive guide element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MarkRef(String);

impl DataRef {
    pub fn new(name: impl Into<String>) -> Self {
        DataRef(name.into())
    }
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl ScaleRef {
    pub fn new(name: impl Into<String>) -> Self {
        ScaleRef(name.into())
    }
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl SignalRef {
    pub fn new(name: impl Into<String>) -> Self {
        SignalRef(name.into())
    }
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl MarkRef {
    pub fn new(name: impl Into<String>) -> Self {
        MarkRef(name.into())
    }
    pub fn name(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Data sources
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSource {
    pub name: DataRef,
    pub values: Vec<Value>,
    pub format: DataFormat,
    pub transform: Vec<Transform>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataFormat {
    pub parse: BTreeMap<String, ParseType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseType {
    Date,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Transform {
    Collect { sort: CompareSpec },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompareSpec {
    pub field: Vec<String>,
    pub order: Vec<SortOrder>,
}

// =============================================================================
// Signals
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub name: SignalRef,
    /// `Some(Value::Null)` emits an explicit null; `None` omits the key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<Expr>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub on: Vec<SignalHandler>,
}

impl Signal {
    pub fn constant(name: SignalRef, value: Value) -> Self {
        Signal { name, value: Some(value), update: None, on: Vec::new() }
    }

    /// Signal recomputed from an expression, with no initial value.
    pub fn derived(name: SignalRef, update: Expr) -> Self {
        Signal { name, value: None, update: Some(update), on: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalHandler {
    #[serde(serialize_with = "serialize_events")]
    pub events: Vec<EventSelector>,
    pub update: Expr,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub force: bool,
}

/// Pointer event source: either every mark of a type or one named mark.
#[derive(Debug, Clone, PartialEq)]
pub enum EventSelector {
    MarkType(MarkType, &'static str),
    Named(MarkRef, &'static str),
}

impl fmt::Display for EventSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventSelector::MarkType(kind, event) => write!(f, "{}:{}", kind.as_str(), event),
            EventSelector::Named(mark, event) => write!(f, "@{}:{}", mark.name(), event),
        }
    }
}

fn serialize_events<S: Serializer>(events: &[EventSelector], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let joined: Vec<String> = events.iter().map(|e| e.to_string()).collect();
    serializer.serialize_str(&joined.join(", "))
}

// =============================================================================
// Scales
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scale {
    pub name: ScaleRef,
    #[serde(rename = "type")]
    pub kind: ScaleType,
    pub range: ScaleRange,
    pub domain: DataField,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nice: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zero: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleType {
    Band,
    Point,
    Linear,
    Ordinal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScaleRange {
    /// `"width"` / `"height"`
    Extent(&'static str),
    Scheme { scheme: String },
    Data(DataField),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataField {
    pub data: DataRef,
    pub field: String,
}

impl DataField {
    pub fn new(data: &DataRef, field: impl Into<String>) -> Self {
        DataField { data: data.clone(), field: field.into() }
    }
}

// =============================================================================
// Encodings
// =============================================================================

/// Offset is either a pixel constant or a signal expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NumberOrSignal {
    Value(f64),
    Signal { signal: Expr },
}

/// A single encoding channel value.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ValueRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<Expr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<NumberOrSignal>,
}

impl ValueRef {
    pub fn value(value: impl Into<Value>) -> Self {
        ValueRef { value: Some(value.into()), ..Default::default() }
    }

    pub fn field(field: impl Into<String>) -> Self {
        ValueRef { field: Some(field.into()), ..Default::default() }
    }

    pub fn signal(signal: Expr) -> Self {
        ValueRef { signal: Some(signal), ..Default::default() }
    }

    pub fn scaled(scale: &ScaleRef, field: impl Into<String>) -> Self {
        ValueRef { scale: Some(scale.clone()), field: Some(field.into()), ..Default::default() }
    }

    pub fn scaled_value(scale: &ScaleRef, value: impl Into<Value>) -> Self {
        ValueRef { scale: Some(scale.clone()), value: Some(value.into()), ..Default::default() }
    }

    pub fn band(scale: &ScaleRef, band: f64) -> Self {
        ValueRef { scale: Some(scale.clone()), band: Some(band), ..Default::default() }
    }

    pub fn with_offset(mut self, offset: NumberOrSignal) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Channel name → value. Sorted so output is stable.
pub type Channels = BTreeMap<&'static str, ValueRef>;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Encode {
    #[serde(skip_serializing_if = "Channels::is_empty")]
    pub enter: Channels,
    #[serde(skip_serializing_if = "Channels::is_empty")]
    pub update: Channels,
}

// =============================================================================
// Marks
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkType {
    Group,
    Rect,
    Text,
    Line,
    Symbol,
    Rule,
}

impl MarkType {
    pub fn as_str(self) -> &'static str {
        match self {
            MarkType::Group => "group",
            MarkType::Rect => "rect",
            MarkType::Text => "text",
            MarkType::Line => "line",
            MarkType::Symbol => "symbol",
            MarkType::Rule => "rule",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facet {
    pub name: DataRef,
    pub data: DataRef,
    pub groupby: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MarkFrom {
    Data { data: DataRef },
    Facet { facet: Facet },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: MarkType,
    pub name: MarkRef,
    pub from: MarkFrom,
    #[serde(skip_serializing_if = "is_empty_encode")]
    pub encode: Encode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub signals: Vec<Signal>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scales: Vec<Scale>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
}

fn is_empty_encode(encode: &Encode) -> bool {
    encode.enter.is_empty() && encode.update.is_empty()
}

impl Mark {
    pub fn new(kind: MarkType, name: impl Into<String>, from: MarkFrom) -> Self {
        Mark {
            kind,
            name: MarkRef::new(name),
            from,
            encode: Encode::default(),
            signals: Vec::new(),
            scales: Vec::new(),
            marks: Vec::new(),
        }
    }
}

// =============================================================================
// Guides
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orient {
    Left,
    Right,
    Bottom,
}

/// Overlap removal strategy for axis labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelOverlap {
    Off,
    Parity,
}

impl Serialize for LabelOverlap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            LabelOverlap::Off => serializer.serialize_bool(false),
            LabelOverlap::Parity => serializer.serialize_str("parity"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Axis {
    pub orient: Orient,
    pub scale: ScaleRef,
    pub title_font_size: f64,
    pub title_font_weight: u32,
    pub title_padding: f64,
    pub title_font: String,
    pub grid: bool,
    pub grid_color: &'static str,
    pub offset: f64,
    pub label_font: String,
    pub label_font_size: NumberOrSignal,
    pub label_separation: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_align: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_padding: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_limit: Option<NumberOrSignal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_overlap: Option<LabelOverlap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_extent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_extent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick_min_step: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_type: Option<&'static str>,
    /// Caller-supplied properties applied over the synthesized ones.
    #[serde(skip)]
    pub overrides: Map<String, Value>,
    /// Applied last, after overrides.
    #[serde(skip)]
    pub title: Option<String>,
}

impl Axis {
    /// Serialize, then layer overrides and the title on top.
    pub fn to_value(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            for (key, override_value) in &self.overrides {
                if !override_value.is_null() {
                    map.insert(key.clone(), override_value.clone());
                }
            }
            if let Some(title) = &self.title {
                map.insert("title".to_string(), Value::String(title.clone()));
            }
        }
        Ok(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideElement {
    pub name: MarkRef,
    pub interactive: bool,
    #[serde(skip_serializing_if = "Channels::is_empty")]
    pub enter: Channels,
    #[serde(skip_serializing_if = "Channels::is_empty")]
    pub update: Channels,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEncode {
    pub symbols: GuideElement,
    pub labels: GuideElement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Legend {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<ScaleRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<ScaleRef>,
    pub orient: Orient,
    pub direction: &'static str,
    pub symbol_type: &'static str,
    pub symbol_size: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub title_orient: Orient,
    pub title_font: String,
    pub title_font_size: ValueRef,
    pub label_font: String,
    pub label_font_size: ValueRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_limit: Option<f64>,
    pub offset: f64,
    pub encode: LegendEncode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
    pub anchor: &'static str,
    pub frame: &'static str,
    pub encode: Encode,
}

// =============================================================================
// Specification graph
// =============================================================================

/// The complete declarative graph handed to the rendering engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecGraph {
    pub title: Option<Title>,
    pub autosize: &'static str,
    pub width: f64,
    pub height: f64,
    pub data: Vec<DataSource>,
    pub signals: Vec<Signal>,
    pub scales: Vec<Scale>,
    pub axes: Vec<Axis>,
    pub marks: Vec<Mark>,
    pub legends: Vec<Legend>,
}

impl SpecGraph {
    /// Serialize into the engine's string-keyed JSON format.
    pub fn to_value(&self) -> Result<Value> {
        let mut root = Map::new();
        if let Some(title) = &self.title {
            root.insert("title".to_string(), serde_json::to_value(title)?);
        }
        root.insert("autosize".to_string(), Value::from(self.autosize));
        root.insert("width".to_string(), Value::from(self.width));
        root.insert("height".to_string(), Value::from(self.height));
        root.insert("data".to_string(), serde_json::to_value(&self.data)?);
        root.insert("signals".to_string(), serde_json::to_value(&self.signals)?);
        root.insert("scales".to_string(), serde_json::to_value(&self.scales)?);
        let axes = self.axes.iter().map(Axis::to_value).collect::<Result<Vec<_>>>()?;
        root.insert("axes".to_string(), Value::Array(axes));
        root.insert("marks".to_string(), serde_json::to_value(&self.marks)?);
        root.insert("legends".to_string(), serde_json::to_value(&self.legends)?);
        Ok(Value::Object(root))
    }

    /// Find a top-level or nested mark by name.
    pub fn find_mark(&self, name: &str) -> Option<&Mark> {
        fn search<'a>(marks: &'a [Mark], name: &str) -> Option<&'a Mark> {
            marks.iter().find_map(|mark| {
                if mark.name.name() == name {
                    Some(mark)
                } else {
                    search(&mark.marks, name)
                }
            })
        }
        search(&self.marks, name)
    }

    pub fn find_signal(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.name.name() == name)
    }

    pub fn find_scale(&self, name: &str) -> Option<&Scale> {
        self.scales.iter().find(|s| s.name.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_ref_serialization() {
        let scale = ScaleRef::new("s");
        let v = ValueRef::scaled(&scale, "period")
            .with_offset(NumberOrSignal::Signal { signal: Expr::Bandwidth(scale.clone()).div(Expr::num(2.0)) });
        assert_eq!(
            serde_json::to_value(&v).unwrap(),
            json!({"scale": "s", "field": "period", "offset": {"signal": "(bandwidth(\"s\") / 2)"}})
        );
        assert_eq!(serde_json::to_value(ValueRef::value(1)).unwrap(), json!({"value": 1}));
        assert_eq!(serde_json::to_value(ValueRef::band(&scale, 1.0)).unwrap(), json!({"scale": "s", "band": 1.0}));
    }

    #[test]
    fn test_signal_handler_events() {
        let handler = SignalHandler {
            events: vec![
                EventSelector::Named(MarkRef::new("legendSymbol"), "click"),
                EventSelector::Named(MarkRef::new("legendLabel"), "click"),
            ],
            update: Expr::Object(vec![("value".to_string(), Expr::Datum)]),
            force: true,
        };
        assert_eq!(
            serde_json::to_value(&handler).unwrap(),
            json!({"events": "@legendSymbol:click, @legendLabel:click", "update": "{ value: datum }", "force": true})
        );

        let hover = SignalHandler {
            events: vec![EventSelector::MarkType(MarkType::Rect, "mouseover")],
            update: Expr::Datum,
            force: false,
        };
        assert_eq!(serde_json::to_value(&hover).unwrap(), json!({"events": "rect:mouseover", "update": "datum"}));
    }

    #[test]
    fn test_collect_transform() {
        let t = Transform::Collect {
            sort: CompareSpec {
                field: vec!["period".to_string()],
                order: vec![SortOrder::Descending],
            },
        };
        assert_eq!(
            serde_json::to_value(&t).unwrap(),
            json!({"type": "collect", "sort": {"field": ["period"], "order": ["descending"]}})
        );
    }

    #[test]
    fn test_scale_ranges() {
        let data = DataRef::new("d");
        assert_eq!(serde_json::to_value(ScaleRange::Extent("width")).unwrap(), json!("width"));
        assert_eq!(
            serde_json::to_value(ScaleRange::Scheme { scheme: "default".to_string() }).unwrap(),
            json!({"scheme": "default"})
        );
        assert_eq!(
            serde_json::to_value(ScaleRange::Data(DataField::new(&data, "type"))).unwrap(),
            json!({"data": "d", "field": "type"})
        );
    }

    #[test]
    fn test_label_overlap_serialization() {
        assert_eq!(serde_json::to_value(LabelOverlap::Off).unwrap(), json!(false));
        assert_eq!(serde_json::to_value(LabelOverlap::Parity).unwrap(), json!("parity"));
    }
}
