use std::collections::{BTreeSet, HashMap, HashSet};

use parser::types::{Field, FragmentDefinition, FragmentSpread, OperationDefinition};
use parser::{Pos, Positioned};
use serde::{Deserialize, Serialize};
use value::Name;

use crate::visitor::{Visitor, VisitorCons, VisitorContext};
use crate::ValidationPass;

/// Deprecated members referenced by a document, as `Type.member` keys.
pub type DeprecationSet = BTreeSet<String>;

/// How the set handed to the handler relates to the operations of a document.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accumulation {
    /// Every call receives everything recorded since the start of the document.
    #[default]
    Document,

    /// Every call receives only the members referenced by the operation being left,
    /// including those in the fragments it spreads.
    Operation,
}

#[derive(Default)]
struct FragmentUsage<'a> {
    deprecations: DeprecationSet,
    spreads: Vec<&'a str>,
}

/// Records references to deprecated fields and enum values, and hands the recorded set to
/// `handler` each time an operation definition is left.
pub struct DeprecatedUsageCollector<'a, F> {
    handler: F,
    accumulation: Accumulation,
    deprecations: DeprecationSet,
    current_fragment: Option<&'a str>,
    spreads: Vec<&'a str>,
    fragments: HashMap<&'a str, FragmentUsage<'a>>,
}

impl<'a, F> DeprecatedUsageCollector<'a, F>
where
    F: FnMut(&DeprecationSet),
{
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            accumulation: Accumulation::Document,
            deprecations: Default::default(),
            current_fragment: None,
            spreads: Default::default(),
            fragments: Default::default(),
        }
    }

    pub fn with_accumulation(self, accumulation: Accumulation) -> Self {
        Self {
            accumulation,
            ..self
        }
    }

    /// Adds a fresh collector to `pass`.
    pub fn install<V: Visitor<'a>>(
        pass: ValidationPass<'a, V>,
        handler: F,
    ) -> ValidationPass<'a, VisitorCons<V, Self>> {
        pass.rule(Self::new(handler))
    }

    fn record(&mut self, key: String) {
        match (self.accumulation, self.current_fragment) {
            (Accumulation::Operation, Some(fragment)) => {
                self.fragments
                    .entry(fragment)
                    .or_default()
                    .deprecations
                    .insert(key);
            }
            _ => {
                self.deprecations.insert(key);
            }
        }
    }

    fn merge_spread_fragments(&mut self) {
        let mut visited = HashSet::new();
        let mut pending = std::mem::take(&mut self.spreads);

        while let Some(name) = pending.pop() {
            if !visited.insert(name) {
                continue;
            }
            if let Some(usage) = self.fragments.get(name) {
                self.deprecations
                    .extend(usage.deprecations.iter().cloned());
                pending.extend(usage.spreads.iter().copied());
            }
        }
    }
}

impl<'a, F> Visitor<'a> for DeprecatedUsageCollector<'a, F>
where
    F: FnMut(&DeprecationSet),
{
    fn enter_fragment_definition(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        name: &'a Name,
        _fragment_definition: &'a Positioned<FragmentDefinition>,
    ) {
        self.current_fragment = Some(name.as_str());
    }

    fn exit_fragment_definition(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _name: &'a Name,
        _fragment_definition: &'a Positioned<FragmentDefinition>,
    ) {
        self.current_fragment = None;
    }

    fn enter_fragment_spread(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        fragment_spread: &'a Positioned<FragmentSpread>,
    ) {
        if self.accumulation != Accumulation::Operation {
            return;
        }

        let name = fragment_spread.node.fragment_name.node.as_str();
        match self.current_fragment {
            Some(fragment) => self.fragments.entry(fragment).or_default().spreads.push(name),
            None => self.spreads.push(name),
        }
    }

    fn enter_field(&mut self, ctx: &mut VisitorContext<'a>, _field: &'a Positioned<Field>) {
        let field_def = match ctx.field_def() {
            Some(field_def) => field_def,
            None => return,
        };

        if field_def.deprecation.is_deprecated() {
            if let Some(parent_type) = ctx.parent_type() {
                self.record(format!("{}.{}", parent_type.name, field_def.name));
            }
        }
    }

    fn enter_enum_value(&mut self, ctx: &mut VisitorContext<'a>, _pos: Pos, value: &'a Name) {
        let enum_type = match ctx.input_meta_type().filter(|ty| ty.is_enum()) {
            Some(enum_type) => enum_type,
            None => return,
        };

        if let Some(enum_value) = enum_type.enum_value(value) {
            if enum_value.deprecation.is_deprecated() {
                self.record(format!("{}.{}", enum_type.name, enum_value.value));
            }
        }
    }

    fn exit_operation_definition(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        name: Option<&'a Name>,
        _operation_definition: &'a Positioned<OperationDefinition>,
    ) {
        if self.accumulation == Accumulation::Operation {
            self.merge_spread_fragments();
        }

        tracing::debug!(
            operation = name.map(|name| name.as_str()).unwrap_or_default(),
            deprecations = self.deprecations.len(),
            "Deprecated usage collected."
        );
        (self.handler)(&self.deprecations);

        if self.accumulation == Accumulation::Operation {
            self.deprecations.clear();
        }
    }
}
