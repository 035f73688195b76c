use parser::Pos;
use value::Name;

use crate::visitor::{Visitor, VisitorContext};

#[derive(Default)]
pub struct KnownEnumValues;

impl<'a> Visitor<'a> for KnownEnumValues {
    fn enter_enum_value(&mut self, ctx: &mut VisitorContext<'a>, pos: Pos, value: &'a Name) {
        if let Some(enum_type) = ctx.input_meta_type().filter(|ty| ty.is_enum()) {
            if enum_type.enum_value(value).is_none() {
                ctx.report_error(
                    vec![pos],
                    format!(
                        "Enumeration type \"{}\" does not contain the value \"{}\".",
                        enum_type.name, value
                    ),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub fn factory() -> KnownEnumValues {
        KnownEnumValues
    }

    #[test]
    fn declared_values() {
        expect_passes_rule!(
            factory,
            r#"
            query ($color: Color = BLUE) {
                paint(color: RED)
                mix(colors: [BLUE, GREEN])
                brush(style: { color: RED })
                new @tint(color: BLUE)
            }
            "#,
        );
    }

    #[test]
    fn unknown_argument_value() {
        expect_fails_rule!(
            factory,
            r#"
            { paint(color: PURPLE) }
            "#,
        );
    }

    #[test]
    fn unknown_list_item() {
        expect_fails_rule!(
            factory,
            r#"
            { mix(colors: [BLUE, PURPLE]) }
            "#,
        );
    }

    #[test]
    fn unknown_variable_default() {
        expect_fails_rule!(
            factory,
            r#"
            query ($color: Color = PURPLE) { paint(color: $color) }
            "#,
        );
    }

    #[test]
    fn non_enum_positions_are_ignored() {
        expect_passes_rule!(
            factory,
            r#"
            { label(text: PURPLE) unknown(arg: PURPLE) }
            "#,
        );
    }
}
