pub mod query;
pub mod registry;
pub mod result;

pub use query::*;
pub use registry::*;
pub use result::*;
