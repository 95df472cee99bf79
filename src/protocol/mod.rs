pub mod messages;

pub use messages::{ErrorResponse, GenerateRequest, ReplyTimings, ResponseEnvelope};
