pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod identity;
pub mod resolvers;
pub mod schema;
pub mod security;
pub mod server;
pub mod storage;
pub mod token;
