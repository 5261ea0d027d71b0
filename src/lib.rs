//! Intake pipeline for the children's activity dataset: turns an activity
//! submission issue into a validated, deduplicated dataset entry.

pub mod dataset;
pub mod dedup;
pub mod error;
pub mod event;
pub mod maintenance;
pub mod normalize;
pub mod outcome;
pub mod parser;
pub mod pipeline;
pub mod record;
pub mod schema;
pub mod settings;
