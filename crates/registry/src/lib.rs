pub mod feature;
pub mod marker;
pub mod registry;
pub mod set;

pub use feature::*;
pub use marker::*;
pub use registry::*;
pub use set::*;
