pub mod generate;

pub use generate::{GenerateOptions, GenerateRequest, GenerateResponse};
