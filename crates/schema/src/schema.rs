use std::collections::HashMap;

use indexmap::IndexMap;
use parser::types::{
    self, BaseType, ConstDirective, DirectiveDefinition, EnumType, InputObjectType,
    InterfaceType, ObjectType, SchemaDefinition, ServiceDocument, Type, TypeDefinition,
    TypeSystemDefinition,
};
use parser::Positioned;
use value::{ConstValue, Name};

use crate::type_ext::TypeExt;
use crate::SchemaError;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Deprecation {
    NoDeprecated,
    Deprecated { reason: Option<String> },
}

impl Deprecation {
    #[inline]
    pub fn is_deprecated(&self) -> bool {
        matches!(self, Deprecation::Deprecated { .. })
    }

    #[inline]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Deprecation::NoDeprecated => None,
            Deprecation::Deprecated { reason } => reason.as_deref(),
        }
    }
}

#[derive(Debug, Eq, PartialEq)]
pub struct MetaField {
    pub name: Name,
    pub arguments: IndexMap<Name, MetaInputValue>,
    pub ty: Type,
    pub deprecation: Deprecation,
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

#[derive(Debug, Eq, PartialEq)]
pub struct MetaEnumValue {
    pub value: Name,
    pub deprecation: Deprecation,
}

#[derive(Debug, Eq, PartialEq)]
pub struct MetaInputValue {
    pub name: Name,
    pub ty: Type,
}

#[derive(Debug, Eq, PartialEq)]
pub struct MetaType {
    pub name: Name,
    pub kind: TypeKind,
    pub fields: IndexMap<Name, MetaField>,
    pub enum_values: IndexMap<Name, MetaEnumValue>,
    pub input_fields: IndexMap<Name, MetaInputValue>,
}

impl MetaType {
    fn new(name: Name, kind: TypeKind) -> Self {
        Self {
            name,
            kind,
            fields: Default::default(),
            enum_values: Default::default(),
            input_fields: Default::default(),
        }
    }

    #[inline]
    pub fn field_by_name(&self, name: &str) -> Option<&MetaField> {
        self.fields.get(name)
    }

    #[inline]
    pub fn enum_value(&self, value: &str) -> Option<&MetaEnumValue> {
        self.enum_values.get(value)
    }

    #[inline]
    pub fn is_composite(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Object | TypeKind::Interface | TypeKind::Union
        )
    }

    #[inline]
    pub fn is_enum(&self) -> bool {
        self.kind == TypeKind::Enum
    }
}

#[derive(Debug)]
pub struct MetaDirective {
    pub name: Name,
    pub arguments: IndexMap<Name, MetaInputValue>,
}

/// Type information needed to resolve the members referenced by executable documents.
#[derive(Debug, Default)]
pub struct Schema {
    query_type: Option<Name>,
    mutation_type: Option<Name>,
    subscription_type: Option<Name>,
    pub types: HashMap<Name, MetaType>,
    pub directives: HashMap<Name, MetaDirective>,
}

impl Schema {
    pub fn parse(document: &str) -> Result<Schema, SchemaError> {
        Self::new(parser::parse_schema(document)?)
    }

    pub fn new(document: ServiceDocument) -> Result<Schema, SchemaError> {
        let mut schema = Schema::default();
        let mut extensions = Vec::new();

        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Schema(schema_definition) => {
                    convert_schema_definition(&mut schema, schema_definition.node);
                }
                TypeSystemDefinition::Type(type_definition) if type_definition.node.extend => {
                    extensions.push(type_definition.node);
                }
                TypeSystemDefinition::Type(type_definition) => {
                    let meta_type = convert_type_definition(type_definition.node);
                    if schema.types.contains_key(&meta_type.name) {
                        return Err(SchemaError::DefinitionConflicted {
                            type_name: meta_type.name.to_string(),
                        });
                    }
                    schema.types.insert(meta_type.name.clone(), meta_type);
                }
                TypeSystemDefinition::Directive(directive_definition) => {
                    schema.directives.insert(
                        directive_definition.node.name.node.clone(),
                        convert_directive_definition(directive_definition.node),
                    );
                }
            }
        }

        // Extensions may precede the definition they extend.
        for extension in extensions {
            extend_type(&mut schema, extension)?;
        }

        finish_schema(&mut schema)?;
        tracing::debug!(
            types = schema.types.len(),
            directives = schema.directives.len(),
            "Schema loaded."
        );
        Ok(schema)
    }

    #[inline]
    pub fn query_type(&self) -> &str {
        self.query_type
            .as_ref()
            .map(|name| name.as_str())
            .unwrap_or("Query")
    }

    #[inline]
    pub fn mutation_type(&self) -> Option<&str> {
        self.mutation_type.as_ref().map(|name| name.as_str())
    }

    #[inline]
    pub fn subscription_type(&self) -> Option<&str> {
        self.subscription_type.as_ref().map(|name| name.as_str())
    }

    #[inline]
    pub fn type_by_name(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }

    #[inline]
    pub fn get_type(&self, ty: &Type) -> Option<&MetaType> {
        self.types.get(ty.concrete_typename())
    }

    #[inline]
    pub fn directive(&self, name: &str) -> Option<&MetaDirective> {
        self.directives.get(name)
    }

    /// Deprecation reason of the member named by a `Type.member` key.
    ///
    /// Returns `None` when the key does not name a deprecated field or enum value.
    pub fn deprecation_reason(&self, key: &str) -> Option<Option<&str>> {
        let (type_name, member) = key.split_once('.')?;
        let ty = self.types.get(type_name)?;
        let deprecation = match ty.kind {
            TypeKind::Enum => &ty.enum_value(member)?.deprecation,
            _ => &ty.field_by_name(member)?.deprecation,
        };
        deprecation
            .is_deprecated()
            .then(|| deprecation.reason())
    }
}

fn get_argument<'a>(
    arguments: &'a [(Positioned<Name>, Positioned<ConstValue>)],
    name: &str,
) -> Option<&'a Positioned<ConstValue>> {
    arguments.iter().find_map(|d| {
        if d.0.node.as_str() == name {
            Some(&d.1)
        } else {
            None
        }
    })
}

fn get_argument_str<'a>(
    arguments: &'a [(Positioned<Name>, Positioned<ConstValue>)],
    name: &str,
) -> Option<Positioned<&'a str>> {
    get_argument(arguments, name).and_then(|value| match &value.node {
        ConstValue::String(s) => Some(Positioned::new(s.as_str(), value.pos)),
        _ => None,
    })
}

fn convert_schema_definition(schema: &mut Schema, schema_definition: SchemaDefinition) {
    if let Some(query) = schema_definition.query {
        schema.query_type = Some(query.node);
    }
    if let Some(mutation) = schema_definition.mutation {
        schema.mutation_type = Some(mutation.node);
    }
    if let Some(subscription) = schema_definition.subscription {
        schema.subscription_type = Some(subscription.node);
    }
}

fn convert_type_definition(definition: TypeDefinition) -> MetaType {
    let mut type_definition = MetaType::new(definition.name.node, TypeKind::Scalar);

    match definition.kind {
        types::TypeKind::Scalar => type_definition.kind = TypeKind::Scalar,
        types::TypeKind::Object(ObjectType { fields, .. }) => {
            type_definition.kind = TypeKind::Object;
            type_definition
                .fields
                .extend(fields.into_iter().map(|field| {
                    (
                        field.node.name.node.clone(),
                        convert_field_definition(field.node),
                    )
                }));
        }
        types::TypeKind::Interface(InterfaceType { fields, .. }) => {
            type_definition.kind = TypeKind::Interface;
            type_definition.fields = fields
                .into_iter()
                .map(|field| {
                    (
                        field.node.name.node.clone(),
                        convert_field_definition(field.node),
                    )
                })
                .collect();
        }
        types::TypeKind::Union(_) => type_definition.kind = TypeKind::Union,
        types::TypeKind::Enum(EnumType { values }) => {
            type_definition.kind = TypeKind::Enum;
            type_definition
                .enum_values
                .extend(values.into_iter().map(|value| {
                    (
                        value.node.value.node.clone(),
                        convert_enum_value_definition(value.node),
                    )
                }));
        }
        types::TypeKind::InputObject(InputObjectType { fields }) => {
            type_definition.kind = TypeKind::InputObject;
            type_definition
                .input_fields
                .extend(fields.into_iter().map(|field| {
                    (
                        field.node.name.node.clone(),
                        convert_input_value_definition(field.node),
                    )
                }));
        }
    }

    type_definition
}

fn extend_type(schema: &mut Schema, extension: TypeDefinition) -> Result<(), SchemaError> {
    let type_name = extension.name.node.clone();
    let meta_type = match schema.types.get_mut(&type_name) {
        Some(meta_type) => meta_type,
        None => {
            return Err(SchemaError::ExtendUnknownType {
                type_name: type_name.to_string(),
            })
        }
    };

    let conflicted = |field_name: &Name| SchemaError::FieldConflicted {
        type_name: type_name.to_string(),
        field_name: field_name.to_string(),
    };

    match extension.kind {
        types::TypeKind::Object(ObjectType { fields, .. })
        | types::TypeKind::Interface(InterfaceType { fields, .. }) => {
            for field in fields {
                let meta_field = convert_field_definition(field.node);
                if meta_type.fields.contains_key(&meta_field.name) {
                    return Err(conflicted(&meta_field.name));
                }
                meta_type.fields.insert(meta_field.name.clone(), meta_field);
            }
        }
        types::TypeKind::Enum(EnumType { values }) => {
            for value in values {
                let meta_value = convert_enum_value_definition(value.node);
                if meta_type.enum_values.contains_key(&meta_value.value) {
                    return Err(conflicted(&meta_value.value));
                }
                meta_type
                    .enum_values
                    .insert(meta_value.value.clone(), meta_value);
            }
        }
        types::TypeKind::InputObject(InputObjectType { fields }) => {
            for field in fields {
                let meta_field = convert_input_value_definition(field.node);
                if meta_type.input_fields.contains_key(&meta_field.name) {
                    return Err(conflicted(&meta_field.name));
                }
                meta_type
                    .input_fields
                    .insert(meta_field.name.clone(), meta_field);
            }
        }
        types::TypeKind::Scalar | types::TypeKind::Union(_) => {}
    }

    Ok(())
}

fn convert_field_definition(definition: types::FieldDefinition) -> MetaField {
    MetaField {
        name: definition.name.node,
        arguments: definition
            .arguments
            .into_iter()
            .map(|arg| {
                (
                    arg.node.name.node.clone(),
                    convert_input_value_definition(arg.node),
                )
            })
            .collect(),
        ty: definition.ty.node,
        deprecation: get_deprecated(&definition.directives),
    }
}

fn convert_enum_value_definition(definition: types::EnumValueDefinition) -> MetaEnumValue {
    MetaEnumValue {
        deprecation: get_deprecated(&definition.directives),
        value: definition.value.node,
    }
}

fn convert_input_value_definition(arg: types::InputValueDefinition) -> MetaInputValue {
    MetaInputValue {
        name: arg.name.node,
        ty: arg.ty.node,
    }
}

fn convert_directive_definition(directive_definition: DirectiveDefinition) -> MetaDirective {
    MetaDirective {
        name: directive_definition.name.node,
        arguments: directive_definition
            .arguments
            .into_iter()
            .map(|arg| {
                (
                    arg.node.name.node.clone(),
                    convert_input_value_definition(arg.node),
                )
            })
            .collect(),
    }
}

fn get_deprecated(directives: &[Positioned<ConstDirective>]) -> Deprecation {
    directives
        .iter()
        .find(|directive| directive.node.name.node.as_str() == "deprecated")
        .map(|directive| Deprecation::Deprecated {
            reason: get_argument_str(&directive.node.arguments, "reason")
                .map(|reason| reason.node.to_string()),
        })
        .unwrap_or(Deprecation::NoDeprecated)
}

fn named_type(name: &str, nullable: bool) -> Type {
    Type {
        base: BaseType::Named(Name::new(name)),
        nullable,
    }
}

fn finish_schema(schema: &mut Schema) -> Result<(), SchemaError> {
    for definition in parser::parse_schema(include_str!("builtin.graphql"))?.definitions {
        match definition {
            TypeSystemDefinition::Type(type_definition) => {
                let type_definition = convert_type_definition(type_definition.node);
                schema
                    .types
                    .entry(type_definition.name.clone())
                    .or_insert(type_definition);
            }
            TypeSystemDefinition::Directive(directive_definition) => {
                schema
                    .directives
                    .entry(directive_definition.node.name.node.clone())
                    .or_insert_with(|| convert_directive_definition(directive_definition.node));
            }
            TypeSystemDefinition::Schema(_) => {}
        }
    }

    if schema.mutation_type.is_none() && schema.types.contains_key("Mutation") {
        schema.mutation_type = Some(Name::new("Mutation"));
    }
    if schema.subscription_type.is_none() && schema.types.contains_key("Subscription") {
        schema.subscription_type = Some(Name::new("Subscription"));
    }

    let query_type = Name::new(schema.query_type());
    if let Some(query_type) = schema.types.get_mut(&query_type) {
        let name = Name::new("__type");
        query_type.fields.insert(
            name.clone(),
            MetaField {
                name,
                arguments: {
                    let mut arguments = IndexMap::new();
                    let name = Name::new("name");
                    arguments.insert(
                        name.clone(),
                        MetaInputValue {
                            name,
                            ty: named_type("String", false),
                        },
                    );
                    arguments
                },
                ty: named_type("__Type", true),
                deprecation: Deprecation::NoDeprecated,
            },
        );

        let name = Name::new("__schema");
        query_type.fields.insert(
            name.clone(),
            MetaField {
                name,
                arguments: Default::default(),
                ty: named_type("__Schema", false),
                deprecation: Deprecation::NoDeprecated,
            },
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SDL: &str = r#"
        type Query {
            old: String @deprecated
            legacy(color: Color): String @deprecated(reason: "Use `new`.")
            new: String
        }

        enum Color {
            RED @deprecated(reason: "No longer produced.")
            BLUE
        }

        extend type Query {
            extra: Int
        }

        extend enum Color {
            GREEN @deprecated
        }
    "#;

    #[test]
    fn parses_deprecations() {
        let schema = Schema::parse(SDL).unwrap();
        let query = schema.type_by_name("Query").unwrap();

        assert_eq!(
            query.field_by_name("old").unwrap().deprecation,
            Deprecation::Deprecated { reason: None }
        );
        assert_eq!(
            query.field_by_name("legacy").unwrap().deprecation.reason(),
            Some("Use `new`.")
        );
        assert!(!query.field_by_name("new").unwrap().deprecation.is_deprecated());

        let color = schema.type_by_name("Color").unwrap();
        assert!(color.is_enum());
        assert!(color.enum_value("RED").unwrap().deprecation.is_deprecated());
        assert!(!color.enum_value("BLUE").unwrap().deprecation.is_deprecated());
    }

    #[test]
    fn merges_extensions() {
        let schema = Schema::parse(SDL).unwrap();
        assert!(schema
            .type_by_name("Query")
            .unwrap()
            .field_by_name("extra")
            .is_some());
        assert!(schema
            .type_by_name("Color")
            .unwrap()
            .enum_value("GREEN")
            .unwrap()
            .deprecation
            .is_deprecated());
    }

    #[test]
    fn adds_builtins() {
        let schema = Schema::parse(SDL).unwrap();
        assert!(schema.type_by_name("Boolean").is_some());
        assert_eq!(
            schema.type_by_name("__Type").unwrap().kind,
            TypeKind::Object
        );
        assert!(schema.directive("deprecated").is_some());
        assert!(schema.directive("include").is_some());

        let query = schema.type_by_name(schema.query_type()).unwrap();
        assert!(query.field_by_name("__schema").is_some());
        assert!(query.field_by_name("__type").is_some());
    }

    #[test]
    fn looks_up_deprecation_reason() {
        let schema = Schema::parse(SDL).unwrap();
        assert_eq!(schema.deprecation_reason("Query.old"), Some(None));
        assert_eq!(
            schema.deprecation_reason("Color.RED"),
            Some(Some("No longer produced."))
        );
        assert_eq!(schema.deprecation_reason("Query.new"), None);
        assert_eq!(schema.deprecation_reason("Query"), None);
        assert_eq!(schema.deprecation_reason("Missing.field"), None);
    }

    #[test]
    fn root_types_from_schema_definition() {
        let schema = Schema::parse(
            r#"
            schema { query: Root mutation: Change }
            type Root { a: Int }
            type Change { b: Int }
            "#,
        )
        .unwrap();
        assert_eq!(schema.query_type(), "Root");
        assert_eq!(schema.mutation_type(), Some("Change"));
        assert_eq!(schema.subscription_type(), None);
        assert!(schema
            .type_by_name("Root")
            .unwrap()
            .field_by_name("__typename")
            .is_none());
    }

    #[test]
    fn abstract_types_keep_their_fields() {
        let schema = Schema::parse(
            r#"
            type Query { pet: Pet }
            interface Pet { name: String @deprecated }
            type Dog implements Pet { name: String }
            union CatOrDog = Dog
            extend union CatOrDog = Query
            "#,
        )
        .unwrap();
        assert_eq!(schema.type_by_name("Pet").unwrap().kind, TypeKind::Interface);
        assert_eq!(schema.type_by_name("CatOrDog").unwrap().kind, TypeKind::Union);
        assert_eq!(schema.deprecation_reason("Pet.name"), Some(None));
        assert_eq!(schema.deprecation_reason("Dog.name"), None);
    }

    #[test]
    fn rejects_conflicts() {
        assert!(matches!(
            Schema::parse("type A { a: Int } type A { b: Int }"),
            Err(SchemaError::DefinitionConflicted { type_name }) if type_name == "A"
        ));
        assert!(matches!(
            Schema::parse("type A { a: Int } extend type A { a: Int }"),
            Err(SchemaError::FieldConflicted { field_name, .. }) if field_name == "a"
        ));
        assert!(matches!(
            Schema::parse("extend type Missing { a: Int }"),
            Err(SchemaError::ExtendUnknownType { .. })
        ));
        assert!(matches!(
            Schema::parse("type {"),
            Err(SchemaError::Parse(_))
        ));
    }
}
