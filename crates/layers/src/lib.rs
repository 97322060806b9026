pub mod adapter;
pub mod aggregate;
pub mod cluster;
pub mod individual;
pub mod layer;
pub mod router;
pub mod symbology;

pub use adapter::*;
pub use aggregate::*;
pub use cluster::*;
pub use individual::*;
pub use layer::*;
pub use router::*;
pub use symbology::*;
