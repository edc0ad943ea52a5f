mod logging;
mod publisher;
mod types;

pub use logging::*;
pub use publisher::*;
pub use types::*;
