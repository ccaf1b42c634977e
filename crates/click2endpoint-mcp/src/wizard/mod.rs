//! Question wizard that walks answers to an endpoint.

pub mod answers;
pub mod graph;
pub mod questions;
pub mod session;

pub use answers::AnswerSet;
pub use graph::{Progress, next_question, planned_path, progress, resolve_endpoint};
pub use questions::{Question, QuestionId, QuestionOption, question};
pub use session::{SessionView, WizardSession};
