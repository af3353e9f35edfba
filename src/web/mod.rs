// Web serving modules for the demo server

pub mod analytics;
pub mod config;
pub mod context;
pub mod embedding;
pub mod error;
pub mod flagging;
pub mod interface;
pub mod logger;
pub mod models;
pub mod ports;
pub mod request_parsing;
pub mod response_helpers;
pub mod routes;
pub mod server;
pub mod tunnel;
