#![forbid(unsafe_code)]

#[cfg(test)]
#[macro_use]
mod test_harness;

mod error;
mod rules;
mod visitor;

pub use error::RuleError;
pub use rules::{
    Accumulation, DeprecatedUsageCollector, DeprecationSet, FieldsOnCorrectType, KnownEnumValues,
};
pub use visitor::{visit, Visitor, VisitorCons, VisitorContext, VisitorNil};

use depgate_schema::Schema;
use parser::types::ExecutableDocument;
use value::Variables;

macro_rules! rules {
    ($($rule:ident),*) => {
        VisitorNil$(.with(rules::$rule::default()))*
    };
}

/// A single validation run over one document with an explicit list of rules.
pub struct ValidationPass<'a, V> {
    ctx: VisitorContext<'a>,
    document: &'a ExecutableDocument,
    visitor: V,
}

impl<'a> ValidationPass<'a, VisitorNil> {
    pub fn new(
        schema: &'a Schema,
        document: &'a ExecutableDocument,
        variables: &'a Variables,
    ) -> Self {
        Self {
            ctx: VisitorContext::new(schema, document, variables),
            document,
            visitor: VisitorNil,
        }
    }
}

impl<'a, V: Visitor<'a>> ValidationPass<'a, V> {
    pub fn rule<R: Visitor<'a>>(self, rule: R) -> ValidationPass<'a, VisitorCons<V, R>> {
        ValidationPass {
            ctx: self.ctx,
            document: self.document,
            visitor: VisitorCons(self.visitor, rule),
        }
    }

    /// Adds the rules reporting unknown fields and enum values.
    pub fn default_rules(
        self,
    ) -> ValidationPass<'a, VisitorCons<VisitorCons<V, FieldsOnCorrectType>, KnownEnumValues>>
    {
        self.rule(FieldsOnCorrectType).rule(KnownEnumValues)
    }

    pub fn run(mut self) -> Vec<RuleError> {
        visit(&mut self.visitor, &mut self.ctx, self.document);
        self.ctx.errors
    }
}

pub fn check_rules(
    schema: &Schema,
    document: &ExecutableDocument,
    variables: &Variables,
) -> Vec<RuleError> {
    let mut ctx = VisitorContext::new(schema, document, variables);
    let mut visitor = rules!(FieldsOnCorrectType, KnownEnumValues);
    visit(&mut visitor, &mut ctx, document);
    ctx.errors
}

/// Runs the default rules together with a deprecated usage collector.
///
/// `handler` is called once per operation in `document`.
pub fn check_deprecations<F>(
    schema: &Schema,
    document: &ExecutableDocument,
    variables: &Variables,
    accumulation: Accumulation,
    handler: F,
) -> Vec<RuleError>
where
    F: FnMut(&DeprecationSet),
{
    ValidationPass::new(schema, document, variables)
        .default_rules()
        .rule(DeprecatedUsageCollector::new(handler).with_accumulation(accumulation))
        .run()
}
