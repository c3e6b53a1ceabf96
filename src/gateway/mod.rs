pub mod client;
pub mod codec;
pub mod signature;

pub use client::ServerProtocolClient;
