//! st-sql - SQL layer for Stratum
//!
//! This crate turns migration source text into typed [`DdlOperation`]s using
//! the sqlparser-rs tokenizer and a small recursive-descent grammar for the
//! supported DDL subset, renders operations back out as DuckDB SQL, and parses
//! the type and default strings DuckDB reports during schema inspection.
//!
//! [`DdlOperation`]: st_core::DdlOperation

pub mod dialect;
pub mod error;
mod grammar;
pub mod parser;
pub mod render;
mod tokens;
pub mod types;

pub use dialect::{DuckDbDialect, MySqlDialect, SqlDialect};
pub use error::{SqlError, SqlResult};
pub use parser::DdlParser;
pub use render::{render_type, DuckDbRenderer};
pub use types::{parse_default_expr, parse_type_name, DefaultExpr};
