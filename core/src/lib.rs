//! Core of the ISO 9001 performance-evaluation desk.
//!
//! Leaf-first: the entity model, the hierarchy resolver over primary and
//! additional roles, the authorization scoper, the evaluation aggregator, the
//! analysis seam, persistence, and the `Workspace` that threads state through
//! all of them.

pub mod analysis;
pub mod auth;
pub mod authz;
pub mod config;
pub mod dataset;
pub mod error;
pub mod hierarchy;
pub mod model;
pub mod rubric;
pub mod seed;
pub mod stats;
pub mod store;
pub mod types;
pub mod workspace;
