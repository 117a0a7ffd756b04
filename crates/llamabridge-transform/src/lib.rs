//! Pure conversions between the Ollama generate surface and the Claude
//! Messages API. No function in this crate can fail.

mod generate;
mod model_table;


pub use generate::{first_text, generate_request_to_claude, generate_response_from_claude};
pub use model_table::{BUILTIN_ALIASES, ModelTable};
