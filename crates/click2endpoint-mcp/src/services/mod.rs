//! Collaborators that reach outside the process. Each sits behind a trait so
//! the handler can be exercised with fakes.

pub mod auth;
pub mod mock_servers;
pub mod nlp;
pub mod runner;

pub use auth::{
    CachedTokenProvider, ConnectionCheck, Credentials, HttpTokenProvider, Token, TokenProvider,
};
pub use mock_servers::{MockServer, MockServerDirectory, PostmanDirectory, Workspace};
pub use nlp::{AccuracyStats, AuditLog, OpenAiParser, ParseOutcome, UseCaseParser};
pub use runner::{ProcessScriptRunner, RunOutput, ScriptRunner};
