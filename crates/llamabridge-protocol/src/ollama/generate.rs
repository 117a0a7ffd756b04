use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

/// Body of `POST /api/generate`. Missing and `null` fields take their zero
/// value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub model: String,
    #[serde(deserialize_with = "null_as_default")]
    pub prompt: String,
    /// Accepted for compatibility, the configured system prompt always wins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub options: GenerateOptions,
    /// Accepted but ignored: responses are never streamed.
    #[serde(deserialize_with = "null_as_default")]
    pub stream: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    #[serde(deserialize_with = "null_as_default")]
    pub temperature: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub top_p: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub top_k: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub num_predict: i64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The alias the client asked for, not the resolved provider model.
    pub model: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub response: String,
    pub done: bool,
}

impl GenerateResponse {
    pub fn completed(model: String, response: String, created_at: OffsetDateTime) -> Self {
        Self {
            model,
            created_at,
            response,
            done: true,
        }
    }
}
