pub mod rest;
pub mod wire;

pub use rest::RestClient;
