//! bulletin-core — Grade indicator engine, roster import and analysis reports.
//!
//! This crate defines the student data model, the statistics and
//! classification tables, and the engine that turns a roster into a
//! complete analysis. Everything here is synchronous and side-effect free
//! apart from the file loaders in [`parser`], [`config`] and [`report`].

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod recommendations;
pub mod report;
pub mod statistics;
