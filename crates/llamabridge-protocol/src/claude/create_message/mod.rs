pub mod request;
pub mod response;

pub use request::{CreateMessageRequestBody, MessageContent, MessageParam, MessageRole};
pub use response::{ContentBlock, CreateMessageResponse};
