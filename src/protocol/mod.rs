pub mod channel;
pub mod framing;
pub mod message;

pub use channel::Channel;
pub use message::{QueryRequest, QueryResponse};
