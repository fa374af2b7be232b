// Referential integrity: every typed name resolves within its scope

use crate::error::{Result, SpecError};
use crate::expr::{Expr, ExprRef};
use crate::ir::{
    Channels, EventSelector, Mark, MarkFrom, NumberOrSignal, Scale, ScaleRange, Signal, SpecGraph, ValueRef,
};
use crate::signal::BUILTIN_SIGNALS;
use std::collections::HashSet;

/// Names visible at one nesting level. Group marks open a child scope.
#[derive(Default)]
struct Scope<'p> {
    parent: Option<&'p Scope<'p>>,
    data: HashSet<String>,
    scales: HashSet<String>,
    signals: HashSet<String>,
}

impl<'p> Scope<'p> {
    fn child(parent: &'p Scope<'p>) -> Self {
        Scope { parent: Some(parent), ..Default::default() }
    }

    fn has_data(&self, name: &str) -> bool {
        self.data.contains(name) || self.parent.is_some_and(|p| p.has_data(name))
    }

    fn has_scale(&self, name: &str) -> bool {
        self.scales.contains(name) || self.parent.is_some_and(|p| p.has_scale(name))
    }

    fn has_signal(&self, name: &str) -> bool {
        self.signals.contains(name)
            || match self.parent {
                Some(parent) => parent.has_signal(name),
                None => BUILTIN_SIGNALS.contains(&name),
            }
    }

    fn declare_scales(&mut self, scales: &[Scale]) -> Result<()> {
        for scale in scales {
            if !self.scales.insert(scale.name.name().to_string()) {
                return Err(SpecError::duplicate("scale", scale.name.name()));
            }
        }
        Ok(())
    }

    fn declare_signals(&mut self, signals: &[Signal]) -> Result<()> {
        for signal in signals {
            if !self.signals.insert(signal.name.name().to_string()) {
                return Err(SpecError::duplicate("signal", signal.name.name()));
            }
        }
        Ok(())
    }
}

/// Event targets: mark names plus interactive guide element names.
struct Targets {
    names: HashSet<String>,
}

/// Check that names are unique per scope and every reference resolves.
pub fn validate(graph: &SpecGraph) -> Result<()> {
    // 1. Root scope
    let mut root = Scope::default();
    for source in &graph.data {
        if !root.data.insert(source.name.name().to_string()) {
            return Err(SpecError::duplicate("data", source.name.name()));
        }
    }
    root.declare_scales(&graph.scales)?;
    root.declare_signals(&graph.signals)?;

    // 2. Event targets
    let mut targets = Targets { names: HashSet::new() };
    collect_mark_names(&graph.marks, &mut targets)?;
    for legend in &graph.legends {
        targets.names.insert(legend.encode.symbols.name.name().to_string());
        targets.names.insert(legend.encode.labels.name.name().to_string());
    }

    // 3. References
    for signal in &graph.signals {
        check_signal(signal, &root, &targets)?;
    }
    for scale in &graph.scales {
        check_scale(scale, &root)?;
    }
    for axis in &graph.axes {
        let context = format!("axis '{:?}'", axis.orient).to_lowercase();
        if !root.has_scale(axis.scale.name()) {
            return Err(SpecError::unresolved("scale", axis.scale.name(), context));
        }
        check_number_or_signal(&axis.label_font_size, &root, &context)?;
        if let Some(limit) = &axis.label_limit {
            check_number_or_signal(limit, &root, &context)?;
        }
    }
    for legend in &graph.legends {
        for scale in legend.fill.iter().chain(legend.stroke.iter()) {
            if !root.has_scale(scale.name()) {
                return Err(SpecError::unresolved("scale", scale.name(), "legend"));
            }
        }
        for element in [&legend.encode.symbols, &legend.encode.labels] {
            check_channels(&element.enter, &root, "legend")?;
            check_channels(&element.update, &root, "legend")?;
        }
    }
    if let Some(title) = &graph.title {
        check_channels(&title.encode.enter, &root, "title")?;
        check_channels(&title.encode.update, &root, "title")?;
    }
    for mark in &graph.marks {
        check_mark(mark, &root, &targets)?;
    }
    Ok(())
}

fn collect_mark_names(marks: &[Mark], targets: &mut Targets) -> Result<()> {
    for mark in marks {
        if !targets.names.insert(mark.name.name().to_string()) {
            return Err(SpecError::duplicate("mark", mark.name.name()));
        }
        collect_mark_names(&mark.marks, targets)?;
    }
    Ok(())
}

fn check_mark(mark: &Mark, scope: &Scope<'_>, targets: &Targets) -> Result<()> {
    let context = format!("mark '{}'", mark.name.name());

    let source = match &mark.from {
        MarkFrom::Data { data } => data,
        MarkFrom::Facet { facet } => &facet.data,
    };
    if !scope.has_data(source.name()) {
        return Err(SpecError::unresolved("data", source.name(), context));
    }

    // A group's own encoding is evaluated in the enclosing scope
    check_channels(&mark.encode.enter, scope, &context)?;
    check_channels(&mark.encode.update, scope, &context)?;

    let mut inner = Scope::child(scope);
    if let MarkFrom::Facet { facet } = &mark.from {
        inner.data.insert(facet.name.name().to_string());
    }
    inner.declare_scales(&mark.scales)?;
    inner.declare_signals(&mark.signals)?;

    for signal in &mark.signals {
        check_signal(signal, &inner, targets)?;
    }
    for scale in &mark.scales {
        check_scale(scale, &inner)?;
    }
    for child in &mark.marks {
        check_mark(child, &inner, targets)?;
    }
    Ok(())
}

fn check_signal(signal: &Signal, scope: &Scope<'_>, targets: &Targets) -> Result<()> {
    let context = format!("signal '{}'", signal.name.name());
    if let Some(update) = &signal.update {
        check_expr(update, scope, &context)?;
    }
    for handler in &signal.on {
        check_expr(&handler.update, scope, &context)?;
        for event in &handler.events {
            if let EventSelector::Named(mark, _) = event {
                if !targets.names.contains(mark.name()) {
                    return Err(SpecError::unresolved("mark", mark.name(), context));
                }
            }
        }
    }
    Ok(())
}

fn check_scale(scale: &Scale, scope: &Scope<'_>) -> Result<()> {
    let context = format!("scale '{}'", scale.name.name());
    let mut sources = vec![&scale.domain.data];
    if let ScaleRange::Data(field) = &scale.range {
        sources.push(&field.data);
    }
    for data in sources {
        if !scope.has_data(data.name()) {
            return Err(SpecError::unresolved("data", data.name(), context));
        }
    }
    Ok(())
}

fn check_channels(channels: &Channels, scope: &Scope<'_>, context: &str) -> Result<()> {
    channels.values().try_for_each(|value| check_value_ref(value, scope, context))
}

fn check_value_ref(value: &ValueRef, scope: &Scope<'_>, context: &str) -> Result<()> {
    if let Some(scale) = &value.scale {
        if !scope.has_scale(scale.name()) {
            return Err(SpecError::unresolved("scale", scale.name(), context));
        }
    }
    if let Some(signal) = &value.signal {
        check_expr(signal, scope, context)?;
    }
    if let Some(offset) = &value.offset {
        check_number_or_signal(offset, scope, context)?;
    }
    Ok(())
}

fn check_number_or_signal(value: &NumberOrSignal, scope: &Scope<'_>, context: &str) -> Result<()> {
    match value {
        NumberOrSignal::Value(_) => Ok(()),
        NumberOrSignal::Signal { signal } => check_expr(signal, scope, context),
    }
}

fn check_expr(expr: &Expr, scope: &Scope<'_>, context: &str) -> Result<()> {
    let mut missing = None;
    expr.visit_refs(&mut |reference| {
        if missing.is_some() {
            return;
        }
        missing = match reference {
            ExprRef::Scale(scale) if !scope.has_scale(scale.name()) => Some(("scale", scale.name().to_string())),
            ExprRef::Signal(signal) if !scope.has_signal(signal.name()) => {
                Some(("signal", signal.name().to_string()))
            }
            _ => None,
        };
    });
    match missing {
        Some((kind, name)) => Err(SpecError::unresolved(kind, name, context)),
        None => Ok(()),
    }
}
