use parser::types::Field;
use parser::Positioned;

use crate::visitor::{Visitor, VisitorContext};

#[derive(Default)]
pub struct FieldsOnCorrectType;

impl<'a> Visitor<'a> for FieldsOnCorrectType {
    fn enter_field(&mut self, ctx: &mut VisitorContext<'a>, field: &'a Positioned<Field>) {
        let parent_type = match ctx.parent_type() {
            Some(parent_type) => parent_type,
            None => return,
        };

        if field.node.name.node.as_str() == "__typename" || ctx.field_def().is_some() {
            return;
        }

        ctx.report_error(
            vec![field.pos],
            format!(
                "Unknown field \"{}\" on type \"{}\".",
                field.node.name.node, parent_type.name
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub fn factory() -> FieldsOnCorrectType {
        FieldsOnCorrectType
    }

    #[test]
    fn selection_on_object() {
        expect_passes_rule!(
            factory,
            r#"
            fragment objectFieldSelection on Dog {
                __typename
                name
            }
            { dog { ...objectFieldSelection } }
            "#,
        );
    }

    #[test]
    fn selection_on_interface() {
        expect_passes_rule!(
            factory,
            r#"
            { pet { __typename name ... on Dog { barkVolume } } }
            "#,
        );
    }

    #[test]
    fn introspection_fields() {
        expect_passes_rule!(
            factory,
            r#"
            { __schema { queryType { name } } __type(name: "Dog") { name } }
            "#,
        );
    }

    #[test]
    fn unknown_field_on_root() {
        expect_fails_rule!(
            factory,
            r#"
            { unknownField }
            "#,
        );
    }

    #[test]
    fn unknown_field_on_interface() {
        expect_fails_rule!(
            factory,
            r#"
            { pet { barkVolume } }
            "#,
        );
    }

    #[test]
    fn unknown_field_in_fragment() {
        expect_fails_rule!(
            factory,
            r#"
            fragment f on Dog { meowVolume }
            { dog { ...f } }
            "#,
        );
    }

    #[test]
    fn children_of_unknown_fields_are_not_reported() {
        let doc = parser::parse_query("{ unknownField { alsoUnknown } }").expect("Parse error");
        let variables = value::Variables::default();
        let errors = crate::test_harness::validate(&doc, &variables, factory).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            "Unknown field \"unknownField\" on type \"Query\"."
        );
    }
}
