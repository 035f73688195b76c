use serde::{Deserialize, Serialize};
use value::Variables;

#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub query: String,
    #[serde(skip_serializing_if = "variables_is_empty", default)]
    pub variables: Variables,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: Default::default(),
        }
    }
}

#[inline]
fn variables_is_empty(variables: &Variables) -> bool {
    variables.is_empty()
}
