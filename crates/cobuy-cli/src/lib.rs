pub mod input;
pub mod server;
