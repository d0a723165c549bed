pub mod analysis;
pub mod display;
pub mod report;
