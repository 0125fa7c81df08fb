pub mod commands;
pub mod error;
pub mod flag;
pub mod marker;
pub mod position;
