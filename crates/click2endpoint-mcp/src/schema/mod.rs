//! Declarative parameter schemas, their overrides and answer-driven filtering.

pub mod catalog;
pub mod field;
pub mod filter;
pub mod load;

pub use catalog::SchemaCatalog;
pub use field::{
    FieldKind, GroupSpec, ItemShape, OneOfOption, OneOfSpec, ParameterField, ScalarSpec,
    SelectOption, SelectSpec, Validation, is_blank,
};
pub use filter::filter_for_answers;
