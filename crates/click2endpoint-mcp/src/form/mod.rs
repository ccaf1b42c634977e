//! Parameter form editing: value tree, variant selections, validation and payload projection.

pub mod normalize;
pub mod path;
pub mod state;
pub mod validate;

pub use normalize::normalize;
pub use path::{FieldPath, PathSegment};
pub use state::{FormState, PayloadReport};
pub use validate::{FieldError, SelectionLookup, ValidationMode, validate_field, validate_tree};
