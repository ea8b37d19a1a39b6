//! The statement catalog.
//!
//! Every piece of SQL the pipeline issues lives here as a named
//! [`Statement`] descriptor, kept as declarative data so each statement and
//! the driver sequencing can be tested independently of a live cluster.

pub mod copy;
pub mod ddl;
pub mod insert;

use std::borrow::Cow;

/// Target schema for every table in the pipeline.
pub const SCHEMA: &str = "dwh";

/// The seven tables of the star schema, in creation order.
pub const TABLES: [&str; 7] = [
    "staging_events",
    "staging_songs",
    "users",
    "songs",
    "artists",
    "time",
    "songplays",
];

/// A named SQL statement. DDL and transform statements are fixed text;
/// COPY statements are built at runtime from the configured S3 locations.
#[derive(Debug, Clone)]
pub struct Statement {
    pub name: &'static str,
    pub sql: Cow<'static, str>,
}

impl Statement {
    pub const fn fixed(name: &'static str, sql: &'static str) -> Self {
        Self {
            name,
            sql: Cow::Borrowed(sql),
        }
    }

    pub fn built(name: &'static str, sql: String) -> Self {
        Self {
            name,
            sql: Cow::Owned(sql),
        }
    }
}

/// Escape a value for embedding in a single-quoted SQL literal.
pub(crate) fn quote_literal(raw: &str) -> String {
    raw.replace('\'', "''")
}
