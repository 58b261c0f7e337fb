//! KazeDB - a single-file relational storage engine.
//!
//! The crate provides the core of a small relational database:
//! - Storage: fixed-size paged file, pin/unpin buffer pool with LRU
//!   eviction and a persistent free list, slotted pages, table heaps
//! - Catalog: self-describing on-disk schema with stable table ids
//! - SQL: lexer, recursive descent parser, three-valued expression
//!   evaluation, and DDL/DML executors
//!
//! [`engine::Engine`] is the entry point: open a database file and
//! feed it one statement at a time.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod sql;
pub mod storage;

pub use engine::{Engine, SelectOutput, StatementResult};
pub use error::{Error, Result, StatusCode};
