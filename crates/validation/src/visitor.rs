use depgate_schema::{MetaField, MetaType, Schema, TypeExt};
use parser::types::{
    Directive, ExecutableDocument, Field, FragmentDefinition, FragmentSpread, InlineFragment,
    OperationDefinition, OperationType, Selection, SelectionSet, Type, VariableDefinition,
};
use parser::{Pos, Positioned};
use value::{ConstValue, Name, Value, Variables};

use crate::RuleError;

pub struct VisitorContext<'a> {
    pub schema: &'a Schema,
    pub document: &'a ExecutableDocument,
    pub variables: &'a Variables,
    pub errors: Vec<RuleError>,
    type_stack: Vec<Option<&'a MetaType>>,
    parent_type_stack: Vec<Option<&'a MetaType>>,
    field_stack: Vec<Option<&'a MetaField>>,
    input_type_stack: Vec<Option<&'a Type>>,
}

impl<'a> VisitorContext<'a> {
    pub fn new(
        schema: &'a Schema,
        document: &'a ExecutableDocument,
        variables: &'a Variables,
    ) -> Self {
        Self {
            schema,
            document,
            variables,
            errors: Default::default(),
            type_stack: Default::default(),
            parent_type_stack: Default::default(),
            field_stack: Default::default(),
            input_type_stack: Default::default(),
        }
    }

    pub fn report_error<T: Into<String>>(&mut self, locations: Vec<Pos>, msg: T) {
        self.errors.push(RuleError {
            message: msg.into(),
            locations,
        })
    }

    pub fn with_type<F: FnMut(&mut VisitorContext<'a>)>(
        &mut self,
        ty: Option<&'a MetaType>,
        mut f: F,
    ) {
        self.type_stack.push(ty);
        f(self);
        self.type_stack.pop();
    }

    fn with_parent_type<F: FnMut(&mut VisitorContext<'a>)>(
        &mut self,
        ty: Option<&'a MetaType>,
        mut f: F,
    ) {
        self.parent_type_stack.push(ty);
        f(self);
        self.parent_type_stack.pop();
    }

    fn with_field<F: FnMut(&mut VisitorContext<'a>)>(
        &mut self,
        field: Option<&'a MetaField>,
        mut f: F,
    ) {
        self.field_stack.push(field);
        f(self);
        self.field_stack.pop();
    }

    pub fn with_input_type<F: FnMut(&mut VisitorContext<'a>)>(
        &mut self,
        ty: Option<&'a Type>,
        mut f: F,
    ) {
        self.input_type_stack.push(ty);
        f(self);
        self.input_type_stack.pop();
    }

    /// Output type of the node being visited: the operation root type, a fragment's
    /// type condition or the return type of the current field.
    pub fn current_type(&self) -> Option<&'a MetaType> {
        self.type_stack.last().copied().flatten()
    }

    /// Composite type owning the selection set being visited.
    pub fn parent_type(&self) -> Option<&'a MetaType> {
        self.parent_type_stack.last().copied().flatten()
    }

    /// Definition of the field being visited, `None` when it does not resolve.
    pub fn field_def(&self) -> Option<&'a MetaField> {
        self.field_stack.last().copied().flatten()
    }

    /// Type expected at the input value being visited.
    pub fn input_type(&self) -> Option<&'a Type> {
        self.input_type_stack.last().copied().flatten()
    }

    /// Named schema type expected at the input value being visited.
    ///
    /// `None` when the expected type is a list or is not known to the schema.
    pub fn input_meta_type(&self) -> Option<&'a MetaType> {
        self.input_type()
            .and_then(|ty| ty.named_typename())
            .and_then(|name| self.schema.type_by_name(name))
    }
}

pub trait Visitor<'a> {
    fn enter_document(&mut self, _ctx: &mut VisitorContext<'a>, _doc: &'a ExecutableDocument) {}
    fn exit_document(&mut self, _ctx: &mut VisitorContext<'a>, _doc: &'a ExecutableDocument) {}

    fn enter_operation_definition(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _name: Option<&'a Name>,
        _operation_definition: &'a Positioned<OperationDefinition>,
    ) {
    }
    fn exit_operation_definition(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _name: Option<&'a Name>,
        _operation_definition: &'a Positioned<OperationDefinition>,
    ) {
    }

    fn enter_fragment_definition(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _name: &'a Name,
        _fragment_definition: &'a Positioned<FragmentDefinition>,
    ) {
    }
    fn exit_fragment_definition(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _name: &'a Name,
        _fragment_definition: &'a Positioned<FragmentDefinition>,
    ) {
    }

    fn enter_variable_definition(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _variable_definition: &'a Positioned<VariableDefinition>,
    ) {
    }
    fn exit_variable_definition(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _variable_definition: &'a Positioned<VariableDefinition>,
    ) {
    }

    fn enter_directive(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _directive: &'a Positioned<Directive>,
    ) {
    }
    fn exit_directive(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _directive: &'a Positioned<Directive>,
    ) {
    }

    fn enter_argument(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _name: &'a Positioned<Name>,
        _value: &'a Positioned<Value>,
    ) {
    }
    fn exit_argument(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _name: &'a Positioned<Name>,
        _value: &'a Positioned<Value>,
    ) {
    }

    fn enter_selection_set(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _selection_set: &'a Positioned<SelectionSet>,
    ) {
    }
    fn exit_selection_set(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _selection_set: &'a Positioned<SelectionSet>,
    ) {
    }

    fn enter_selection(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _selection: &'a Positioned<Selection>,
    ) {
    }
    fn exit_selection(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _selection: &'a Positioned<Selection>,
    ) {
    }

    fn enter_field(&mut self, _ctx: &mut VisitorContext<'a>, _field: &'a Positioned<Field>) {}
    fn exit_field(&mut self, _ctx: &mut VisitorContext<'a>, _field: &'a Positioned<Field>) {}

    fn enter_fragment_spread(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _fragment_spread: &'a Positioned<FragmentSpread>,
    ) {
    }
    fn exit_fragment_spread(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _fragment_spread: &'a Positioned<FragmentSpread>,
    ) {
    }

    fn enter_inline_fragment(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _inline_fragment: &'a Positioned<InlineFragment>,
    ) {
    }
    fn exit_inline_fragment(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _inline_fragment: &'a Positioned<InlineFragment>,
    ) {
    }

    fn enter_input_value(&mut self, _ctx: &mut VisitorContext<'a>, _pos: Pos, _value: &'a Value) {
    }
    fn exit_input_value(&mut self, _ctx: &mut VisitorContext<'a>, _pos: Pos, _value: &'a Value) {}

    /// Called for every enum literal, including those inside variable default values.
    ///
    /// [`VisitorContext::input_type`] holds the type expected at the literal.
    fn enter_enum_value(&mut self, _ctx: &mut VisitorContext<'a>, _pos: Pos, _value: &'a Name) {}
}

pub struct VisitorNil;

impl VisitorNil {
    pub fn with<V>(self, visitor: V) -> VisitorCons<Self, V> {
        VisitorCons(self, visitor)
    }
}

pub struct VisitorCons<A, B>(pub(crate) A, pub(crate) B);

impl<A, B> VisitorCons<A, B> {
    pub fn with<V>(self, visitor: V) -> VisitorCons<Self, V> {
        VisitorCons(self, visitor)
    }
}

impl<'a> Visitor<'a> for VisitorNil {}

impl<'a, A, B> Visitor<'a> for VisitorCons<A, B>
where
    A: Visitor<'a>,
    B: Visitor<'a>,
{
    fn enter_document(&mut self, ctx: &mut VisitorContext<'a>, doc: &'a ExecutableDocument) {
        self.0.enter_document(ctx, doc);
        self.1.enter_document(ctx, doc);
    }

    fn exit_document(&mut self, ctx: &mut VisitorContext<'a>, doc: &'a ExecutableDocument) {
        self.0.exit_document(ctx, doc);
        self.1.exit_document(ctx, doc);
    }

    fn enter_operation_definition(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        name: Option<&'a Name>,
        operation_definition: &'a Positioned<OperationDefinition>,
    ) {
        self.0
            .enter_operation_definition(ctx, name, operation_definition);
        self.1
            .enter_operation_definition(ctx, name, operation_definition);
    }

    fn exit_operation_definition(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        name: Option<&'a Name>,
        operation_definition: &'a Positioned<OperationDefinition>,
    ) {
        self.0
            .exit_operation_definition(ctx, name, operation_definition);
        self.1
            .exit_operation_definition(ctx, name, operation_definition);
    }

    fn enter_fragment_definition(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        name: &'a Name,
        fragment_definition: &'a Positioned<FragmentDefinition>,
    ) {
        self.0
            .enter_fragment_definition(ctx, name, fragment_definition);
        self.1
            .enter_fragment_definition(ctx, name, fragment_definition);
    }

    fn exit_fragment_definition(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        name: &'a Name,
        fragment_definition: &'a Positioned<FragmentDefinition>,
    ) {
        self.0
            .exit_fragment_definition(ctx, name, fragment_definition);
        self.1
            .exit_fragment_definition(ctx, name, fragment_definition);
    }

    fn enter_variable_definition(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        variable_definition: &'a Positioned<VariableDefinition>,
    ) {
        self.0.enter_variable_definition(ctx, variable_definition);
        self.1.enter_variable_definition(ctx, variable_definition);
    }

    fn exit_variable_definition(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        variable_definition: &'a Positioned<VariableDefinition>,
    ) {
        self.0.exit_variable_definition(ctx, variable_definition);
        self.1.exit_variable_definition(ctx, variable_definition);
    }

    fn enter_directive(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        directive: &'a Positioned<Directive>,
    ) {
        self.0.enter_directive(ctx, directive);
        self.1.enter_directive(ctx, directive);
    }

    fn exit_directive(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        directive: &'a Positioned<Directive>,
    ) {
        self.0.exit_directive(ctx, directive);
        self.1.exit_directive(ctx, directive);
    }

    fn enter_argument(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        name: &'a Positioned<Name>,
        value: &'a Positioned<Value>,
    ) {
        self.0.enter_argument(ctx, name, value);
        self.1.enter_argument(ctx, name, value);
    }

    fn exit_argument(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        name: &'a Positioned<Name>,
        value: &'a Positioned<Value>,
    ) {
        self.0.exit_argument(ctx, name, value);
        self.1.exit_argument(ctx, name, value);
    }

    fn enter_selection_set(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        selection_set: &'a Positioned<SelectionSet>,
    ) {
        self.0.enter_selection_set(ctx, selection_set);
        self.1.enter_selection_set(ctx, selection_set);
    }

    fn exit_selection_set(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        selection_set: &'a Positioned<SelectionSet>,
    ) {
        self.0.exit_selection_set(ctx, selection_set);
        self.1.exit_selection_set(ctx, selection_set);
    }

    fn enter_selection(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        selection: &'a Positioned<Selection>,
    ) {
        self.0.enter_selection(ctx, selection);
        self.1.enter_selection(ctx, selection);
    }

    fn exit_selection(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        selection: &'a Positioned<Selection>,
    ) {
        self.0.exit_selection(ctx, selection);
        self.1.exit_selection(ctx, selection);
    }

    fn enter_field(&mut self, ctx: &mut VisitorContext<'a>, field: &'a Positioned<Field>) {
        self.0.enter_field(ctx, field);
        self.1.enter_field(ctx, field);
    }

    fn exit_field(&mut self, ctx: &mut VisitorContext<'a>, field: &'a Positioned<Field>) {
        self.0.exit_field(ctx, field);
        self.1.exit_field(ctx, field);
    }

    fn enter_fragment_spread(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        fragment_spread: &'a Positioned<FragmentSpread>,
    ) {
        self.0.enter_fragment_spread(ctx, fragment_spread);
        self.1.enter_fragment_spread(ctx, fragment_spread);
    }

    fn exit_fragment_spread(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        fragment_spread: &'a Positioned<FragmentSpread>,
    ) {
        self.0.exit_fragment_spread(ctx, fragment_spread);
        self.1.exit_fragment_spread(ctx, fragment_spread);
    }

    fn enter_inline_fragment(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        inline_fragment: &'a Positioned<InlineFragment>,
    ) {
        self.0.enter_inline_fragment(ctx, inline_fragment);
        self.1.enter_inline_fragment(ctx, inline_fragment);
    }

    fn exit_inline_fragment(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        inline_fragment: &'a Positioned<InlineFragment>,
    ) {
        self.0.exit_inline_fragment(ctx, inline_fragment);
        self.1.exit_inline_fragment(ctx, inline_fragment);
    }

    fn enter_input_value(&mut self, ctx: &mut VisitorContext<'a>, pos: Pos, value: &'a Value) {
        self.0.enter_input_value(ctx, pos, value);
        self.1.enter_input_value(ctx, pos, value);
    }

    fn exit_input_value(&mut self, ctx: &mut VisitorContext<'a>, pos: Pos, value: &'a Value) {
        self.0.exit_input_value(ctx, pos, value);
        self.1.exit_input_value(ctx, pos, value);
    }

    fn enter_enum_value(&mut self, ctx: &mut VisitorContext<'a>, pos: Pos, value: &'a Name) {
        self.0.enter_enum_value(ctx, pos, value);
        self.1.enter_enum_value(ctx, pos, value);
    }
}

/// Walks `doc`: fragment definitions first, then operations, each in source order.
pub fn visit<'a, V: Visitor<'a>>(
    v: &mut V,
    ctx: &mut VisitorContext<'a>,
    doc: &'a ExecutableDocument,
) {
    v.enter_document(ctx, doc);

    let mut fragments = doc.fragments.iter().collect::<Vec<_>>();
    fragments.sort_by_key(|(_, fragment)| (fragment.pos.line, fragment.pos.column));
    for (name, fragment) in fragments {
        let ty = ctx
            .schema
            .type_by_name(&fragment.node.type_condition.node.on.node);
        ctx.with_type(ty, |ctx| visit_fragment_definition(v, ctx, name, fragment));
    }

    let mut operations = doc.operations.iter().collect::<Vec<_>>();
    operations.sort_by_key(|(_, operation)| (operation.pos.line, operation.pos.column));
    for (name, operation) in operations {
        visit_operation_definition(v, ctx, name, operation);
    }

    v.exit_document(ctx, doc);
}

fn visit_operation_definition<'a, V: Visitor<'a>>(
    v: &mut V,
    ctx: &mut VisitorContext<'a>,
    name: Option<&'a Name>,
    operation: &'a Positioned<OperationDefinition>,
) {
    let root_name = match &operation.node.ty {
        OperationType::Query => Some(ctx.schema.query_type()),
        OperationType::Mutation => ctx.schema.mutation_type(),
        OperationType::Subscription => ctx.schema.subscription_type(),
    };
    let root_type = root_name.and_then(|name| ctx.schema.type_by_name(name));

    ctx.with_type(root_type, |ctx| {
        v.enter_operation_definition(ctx, name, operation);
        visit_variable_definitions(v, ctx, &operation.node.variable_definitions);
        visit_directives(v, ctx, &operation.node.directives);
        visit_selection_set(v, ctx, &operation.node.selection_set);
        v.exit_operation_definition(ctx, name, operation);
    });
}

fn visit_selection_set<'a, V: Visitor<'a>>(
    v: &mut V,
    ctx: &mut VisitorContext<'a>,
    selection_set: &'a Positioned<SelectionSet>,
) {
    if selection_set.node.items.is_empty() {
        return;
    }

    let parent_type = ctx.current_type().filter(|ty| ty.is_composite());
    ctx.with_parent_type(parent_type, |ctx| {
        v.enter_selection_set(ctx, selection_set);
        for selection in &selection_set.node.items {
            visit_selection(v, ctx, selection);
        }
        v.exit_selection_set(ctx, selection_set);
    });
}

fn visit_selection<'a, V: Visitor<'a>>(
    v: &mut V,
    ctx: &mut VisitorContext<'a>,
    selection: &'a Positioned<Selection>,
) {
    v.enter_selection(ctx, selection);
    match &selection.node {
        Selection::Field(field) => visit_field(v, ctx, field),
        Selection::FragmentSpread(fragment_spread) => {
            visit_fragment_spread(v, ctx, fragment_spread)
        }
        Selection::InlineFragment(inline_fragment) => {
            visit_inline_fragment(v, ctx, inline_fragment)
        }
    }
    v.exit_selection(ctx, selection);
}

fn visit_field<'a, V: Visitor<'a>>(
    v: &mut V,
    ctx: &mut VisitorContext<'a>,
    field: &'a Positioned<Field>,
) {
    let field_def = ctx
        .parent_type()
        .and_then(|parent_type| parent_type.field_by_name(&field.node.name.node));

    ctx.with_field(field_def, |ctx| {
        v.enter_field(ctx, field);

        for (name, value) in &field.node.arguments {
            let expected_type = field_def
                .and_then(|field_def| field_def.arguments.get(name.node.as_str()))
                .map(|argument| &argument.ty);
            ctx.with_input_type(expected_type, |ctx| {
                v.enter_argument(ctx, name, value);
                visit_input_value(v, ctx, value.pos, &value.node);
                v.exit_argument(ctx, name, value);
            });
        }

        visit_directives(v, ctx, &field.node.directives);

        let ty = field_def.and_then(|field_def| ctx.schema.get_type(&field_def.ty));
        ctx.with_type(ty, |ctx| {
            visit_selection_set(v, ctx, &field.node.selection_set);
        });

        v.exit_field(ctx, field);
    });
}

fn visit_input_value<'a, V: Visitor<'a>>(
    v: &mut V,
    ctx: &mut VisitorContext<'a>,
    pos: Pos,
    value: &'a Value,
) {
    v.enter_input_value(ctx, pos, value);

    match value {
        Value::List(values) => {
            let element_type = ctx
                .input_type()
                .map(|ty| ty.list_element().unwrap_or(ty));
            ctx.with_input_type(element_type, |ctx| {
                for value in values {
                    visit_input_value(v, ctx, pos, value);
                }
            });
        }
        Value::Object(values) => {
            let input_object = ctx.input_meta_type();
            for (name, value) in values {
                let field_type = input_object
                    .and_then(|input_object| input_object.input_fields.get(name.as_str()))
                    .map(|field| &field.ty);
                ctx.with_input_type(field_type, |ctx| visit_input_value(v, ctx, pos, value));
            }
        }
        Value::Enum(name) => v.enter_enum_value(ctx, pos, name),
        _ => {}
    }

    v.exit_input_value(ctx, pos, value);
}

fn visit_const_input_value<'a, V: Visitor<'a>>(
    v: &mut V,
    ctx: &mut VisitorContext<'a>,
    pos: Pos,
    value: &'a ConstValue,
) {
    match value {
        ConstValue::List(values) => {
            let element_type = ctx
                .input_type()
                .map(|ty| ty.list_element().unwrap_or(ty));
            ctx.with_input_type(element_type, |ctx| {
                for value in values {
                    visit_const_input_value(v, ctx, pos, value);
                }
            });
        }
        ConstValue::Object(values) => {
            let input_object = ctx.input_meta_type();
            for (name, value) in values {
                let field_type = input_object
                    .and_then(|input_object| input_object.input_fields.get(name.as_str()))
                    .map(|field| &field.ty);
                ctx.with_input_type(field_type, |ctx| {
                    visit_const_input_value(v, ctx, pos, value)
                });
            }
        }
        ConstValue::Enum(name) => v.enter_enum_value(ctx, pos, name),
        _ => {}
    }
}

fn visit_variable_definitions<'a, V: Visitor<'a>>(
    v: &mut V,
    ctx: &mut VisitorContext<'a>,
    variable_definitions: &'a [Positioned<VariableDefinition>],
) {
    for variable_definition in variable_definitions {
        v.enter_variable_definition(ctx, variable_definition);
        if let Some(default_value) = &variable_definition.node.default_value {
            ctx.with_input_type(Some(&variable_definition.node.var_type.node), |ctx| {
                visit_const_input_value(v, ctx, default_value.pos, &default_value.node)
            });
        }
        v.exit_variable_definition(ctx, variable_definition);
    }
}

fn visit_directives<'a, V: Visitor<'a>>(
    v: &mut V,
    ctx: &mut VisitorContext<'a>,
    directives: &'a [Positioned<Directive>],
) {
    for directive in directives {
        v.enter_directive(ctx, directive);

        let schema_directive = ctx.schema.directive(&directive.node.name.node);
        for (name, value) in &directive.node.arguments {
            let expected_type = schema_directive
                .and_then(|schema_directive| schema_directive.arguments.get(name.node.as_str()))
                .map(|argument| &argument.ty);
            ctx.with_input_type(expected_type, |ctx| {
                v.enter_argument(ctx, name, value);
                visit_input_value(v, ctx, value.pos, &value.node);
                v.exit_argument(ctx, name, value);
            });
        }

        v.exit_directive(ctx, directive);
    }
}

fn visit_fragment_definition<'a, V: Visitor<'a>>(
    v: &mut V,
    ctx: &mut VisitorContext<'a>,
    name: &'a Name,
    fragment: &'a Positioned<FragmentDefinition>,
) {
    v.enter_fragment_definition(ctx, name, fragment);
    visit_directives(v, ctx, &fragment.node.directives);
    visit_selection_set(v, ctx, &fragment.node.selection_set);
    v.exit_fragment_definition(ctx, name, fragment);
}

fn visit_fragment_spread<'a, V: Visitor<'a>>(
    v: &mut V,
    ctx: &mut VisitorContext<'a>,
    fragment_spread: &'a Positioned<FragmentSpread>,
) {
    v.enter_fragment_spread(ctx, fragment_spread);
    visit_directives(v, ctx, &fragment_spread.node.directives);
    v.exit_fragment_spread(ctx, fragment_spread);
}

fn visit_inline_fragment<'a, V: Visitor<'a>>(
    v: &mut V,
    ctx: &mut VisitorContext<'a>,
    inline_fragment: &'a Positioned<InlineFragment>,
) {
    let ty = match &inline_fragment.node.type_condition {
        Some(condition) => ctx.schema.type_by_name(&condition.node.on.node),
        None => ctx.current_type(),
    };
    ctx.with_type(ty, |ctx| {
        v.enter_inline_fragment(ctx, inline_fragment);
        visit_directives(v, ctx, &inline_fragment.node.directives);
        visit_selection_set(v, ctx, &inline_fragment.node.selection_set);
        v.exit_inline_fragment(ctx, inline_fragment);
    });
}
