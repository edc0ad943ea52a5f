mod flush_scheduler;
mod vessel_report_producer;

pub use flush_scheduler::*;
pub use vessel_report_producer::*;
