pub mod client;

pub use client::TaskClient;
