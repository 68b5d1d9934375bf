pub mod client;
pub mod connection;
