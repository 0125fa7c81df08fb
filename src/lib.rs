//! Keeps a map marker in step with Santa's location in a realtime store, and
//! plays a sound whenever the ho-ho-ho flag is raised.

pub mod config;
pub mod handlers;
pub mod models;
