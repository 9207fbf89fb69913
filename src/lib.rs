//! Backend for registering models, saving their capture data and storing
//! uploaded model artifacts.

pub mod config;
pub mod registry;
pub mod server;
