pub mod ais_ingester;
pub mod domain;
pub mod http;
pub mod nats;

pub use ais_ingester::*;
