pub mod params;
pub mod task;

pub use params::*;
pub use task::*;
