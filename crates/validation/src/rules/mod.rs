mod deprecated_usage;
mod fields_on_correct_type;
mod known_enum_values;

pub use deprecated_usage::{Accumulation, DeprecatedUsageCollector, DeprecationSet};
pub use fields_on_correct_type::FieldsOnCorrectType;
pub use known_enum_values::KnownEnumValues;
