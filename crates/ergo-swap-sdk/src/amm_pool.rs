pub mod math;
pub mod parse;
pub mod pool;
pub mod registry;
