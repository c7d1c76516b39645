pub mod federator;
pub mod merge;

pub use federator::{Federator, RouteTarget, DEFAULT_DISPATCH_TIMEOUT};
pub use merge::TableBatch;
