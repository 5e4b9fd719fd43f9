//! crudagent: function-calling agent for a CRUD items API.
//!
//! A local language model is offered the item operations as tools; the
//! dispatcher executes whatever calls it asks for and renders the results.

pub mod agent;
pub mod config;
pub mod error;
pub mod inference;
pub mod items;
pub mod setup;
pub mod tools;
pub mod types;
