use parser::types::{BaseType, Type};

pub trait TypeExt {
    fn concrete_typename(&self) -> &str;
    fn named_typename(&self) -> Option<&str>;
    fn list_element(&self) -> Option<&Type>;
}

impl TypeExt for Type {
    fn concrete_typename(&self) -> &str {
        match &self.base {
            BaseType::Named(name) => name.as_str(),
            BaseType::List(ty) => ty.concrete_typename(),
        }
    }

    /// The type name when this type is not a list, ignoring nullability.
    fn named_typename(&self) -> Option<&str> {
        match &self.base {
            BaseType::Named(name) => Some(name.as_str()),
            BaseType::List(_) => None,
        }
    }

    fn list_element(&self) -> Option<&Type> {
        match &self.base {
            BaseType::List(ty) => Some(ty),
            BaseType::Named(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_list_and_non_null() {
        let ty = Type::new("[Color!]!").unwrap();
        assert_eq!(ty.concrete_typename(), "Color");
        assert_eq!(ty.named_typename(), None);

        let element = ty.list_element().unwrap();
        assert_eq!(element.named_typename(), Some("Color"));
        assert!(!element.nullable);
        assert!(element.list_element().is_none());
    }
}
