pub mod client;
pub mod types;
pub mod util;

pub use client::ChatClient;
