pub mod controller;
pub mod presenter;
pub mod routes;
pub mod source;
pub mod tracker;
pub mod websocket_actor;
