use depgate_schema::Schema;
use depgate_validation::{check_deprecations, Accumulation, DeprecationSet, RuleError};
use serde::Serialize;

use crate::Request;

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct DeprecatedMember {
    pub member: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Outcome of validating one request.
#[derive(Debug, Default, Serialize)]
pub struct CheckResponse {
    /// Every deprecated member reported by any handler call, with its reason.
    pub deprecations: Vec<DeprecatedMember>,

    /// The set handed to the handler, one entry per operation.
    pub operations: Vec<DeprecationSet>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RuleError>,
}

impl CheckResponse {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.deprecations
            .iter()
            .map(|deprecation| deprecation.member.as_str())
    }
}

/// Parses and validates `request`, collecting the deprecated members it references.
///
/// Fails only when the query cannot be parsed.
pub fn check(
    schema: &Schema,
    request: &Request,
    accumulation: Accumulation,
) -> Result<CheckResponse, RuleError> {
    let document = parser::parse_query(&request.query).map_err(|err| RuleError {
        message: err.to_string(),
        locations: Vec::new(),
    })?;

    let mut operations = Vec::new();
    let errors = check_deprecations(
        schema,
        &document,
        &request.variables,
        accumulation,
        |deprecations: &DeprecationSet| operations.push(deprecations.clone()),
    );

    let members = operations.iter().flatten().cloned().collect::<DeprecationSet>();
    let deprecations = members
        .into_iter()
        .map(|member| {
            let reason = schema
                .deprecation_reason(&member)
                .flatten()
                .map(ToString::to_string);
            DeprecatedMember { member, reason }
        })
        .collect();

    Ok(CheckResponse {
        deprecations,
        operations,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SDL: &str = r#"
        type Query {
            old: String @deprecated(reason: "Use `new`.")
            new: String
            paint(color: Color): String
        }

        enum Color {
            RED @deprecated
            BLUE
        }
    "#;

    #[test]
    fn reports_members_with_reasons() {
        let schema = Schema::parse(SDL).unwrap();
        let resp = check(
            &schema,
            &Request::new("{ old new paint(color: RED) }"),
            Accumulation::Document,
        )
        .unwrap();

        assert!(resp.is_valid());
        assert_eq!(
            resp.deprecations,
            vec![
                DeprecatedMember {
                    member: "Color.RED".to_string(),
                    reason: None,
                },
                DeprecatedMember {
                    member: "Query.old".to_string(),
                    reason: Some("Use `new`.".to_string()),
                },
            ]
        );
        assert_eq!(resp.operations.len(), 1);
    }

    #[test]
    fn one_entry_per_operation() {
        let schema = Schema::parse(SDL).unwrap();
        let request = Request::new("query A { old } query B { paint(color: RED) }");

        let resp = check(&schema, &request, Accumulation::Document).unwrap();
        assert_eq!(resp.operations.len(), 2);
        assert_eq!(resp.operations[1].len(), 2);

        let resp = check(&schema, &request, Accumulation::Operation).unwrap();
        assert_eq!(resp.operations.len(), 2);
        assert_eq!(resp.operations[1].len(), 1);
        assert_eq!(resp.members().collect::<Vec<_>>(), vec!["Color.RED", "Query.old"]);
    }

    #[test]
    fn keeps_validation_errors() {
        let schema = Schema::parse(SDL).unwrap();
        let resp = check(
            &schema,
            &Request::new("{ old missing }"),
            Accumulation::Document,
        )
        .unwrap();
        assert!(!resp.is_valid());
        assert_eq!(resp.members().collect::<Vec<_>>(), vec!["Query.old"]);
    }

    #[test]
    fn parse_error() {
        let schema = Schema::parse(SDL).unwrap();
        assert!(check(&schema, &Request::new("{ old"), Accumulation::Document).is_err());
    }
}
