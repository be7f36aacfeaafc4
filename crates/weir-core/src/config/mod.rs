pub mod combiner;
pub mod driver;

pub use combiner::CombinerConfig;
pub use driver::DriverConfig;
