//! Retrieval-fusion pipeline: schema digest, SQL generation and safety,
//! execution, passage retrieval, and answer composition.

pub mod agent;
pub mod composer;
pub mod demo;
pub mod executor;
pub mod ingest;
pub mod schema_digest;
pub mod sql_generator;
pub mod validator;
pub mod value;
pub mod vector;
