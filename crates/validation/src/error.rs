use std::fmt::{self, Display, Formatter};

use parser::Pos;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct RuleError {
    pub message: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Pos>,
}

impl Display for RuleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(pos) = self.locations.first() {
            write!(f, "[{}:{}] ", pos.line, pos.column)?;
        }
        f.write_str(&self.message)
    }
}
