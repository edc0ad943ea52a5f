mod barentswatch_client;

pub use barentswatch_client::*;
