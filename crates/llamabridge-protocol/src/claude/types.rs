pub type ModelId = String;

pub const HEADER_API_KEY: &str = "x-api-key";
pub const HEADER_ANTHROPIC_VERSION: &str = "anthropic-version";

pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MESSAGES_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
