pub mod config;
pub mod dispatch;
pub mod gateway;
pub mod routes;
pub mod state;
