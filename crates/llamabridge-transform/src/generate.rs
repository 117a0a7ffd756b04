use llamabridge_common::Settings;
use llamabridge_protocol::claude::create_message::{
    ContentBlock, CreateMessageRequestBody, CreateMessageResponse, MessageParam,
};
use llamabridge_protocol::ollama::{GenerateRequest, GenerateResponse};
use time::OffsetDateTime;

/// Builds the provider request for one generate call.
///
/// The configured system prompt is always used; `req.system` is not an
/// override. Sampling options are forwarded only when strictly positive,
/// otherwise the field is left out and the provider default applies.
pub fn generate_request_to_claude(
    req: &GenerateRequest,
    model: &str,
    settings: &Settings,
) -> CreateMessageRequestBody {
    let options = &req.options;
    CreateMessageRequestBody {
        model: model.to_string(),
        messages: vec![MessageParam::user_text(req.prompt.clone())],
        system: non_empty(&settings.system_prompt),
        max_tokens: (options.num_predict != 0).then_some(options.num_predict),
        temperature: positive_f64(options.temperature).map(|v| v as f32),
        top_p: positive_f64(options.top_p).map(|v| v as f32),
        top_k: (options.top_k > 0).then_some(options.top_k),
    }
}

/// Text of the first `text` block, or an empty string.
pub fn first_text(resp: Option<&CreateMessageResponse>) -> String {
    let Some(resp) = resp else {
        return String::new();
    };
    resp.content
        .iter()
        .find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.clone()),
            ContentBlock::Other => None,
        })
        .unwrap_or_default()
}

/// Wraps the provider reply in the Ollama envelope, echoing the alias the
/// client sent.
pub fn generate_response_from_claude(
    alias: &str,
    resp: &CreateMessageResponse,
    created_at: OffsetDateTime,
) -> GenerateResponse {
    GenerateResponse::completed(alias.to_string(), first_text(Some(resp)), created_at)
}

fn positive_f64(value: f64) -> Option<f64> {
    (value > 0.0).then_some(value)
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
