pub mod config;
pub mod error;
pub mod events;
pub mod extract;
pub mod logging;
pub mod routes;
pub mod shutdown;
pub mod state;
