mod field_normalizer;
mod producer;
mod result;
mod validation;
mod vessel_report;

pub use field_normalizer::*;
pub use producer::*;
pub use result::*;
pub use validation::*;
pub use vessel_report::*;
