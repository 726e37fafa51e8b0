// This file acts as the entry point for the `backend` library.
// The binary and the integration tests both build the gateway from here.
pub mod api_doc;
pub mod config;
pub mod cors;
pub mod db;
pub mod error;
pub mod keep_alive;
pub mod proxy;
pub mod routes;
pub mod web_server;
