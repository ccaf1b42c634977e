//! Guided endpoint selection, request building and client code generation for
//! the Click2Mail job API, served over MCP.

pub mod codegen;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod form;
pub mod handler;
pub mod schema;
pub mod services;
pub mod wizard;
