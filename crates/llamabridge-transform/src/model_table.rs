use std::collections::HashMap;

/// Short aliases understood out of the box.
pub const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("claude", "claude-3-opus-20240229"),
    ("claude-3", "claude-3-opus-20240229"),
    ("claude-3-opus", "claude-3-opus-20240229"),
    ("claude-3-sonnet", "claude-3-sonnet-20240229"),
    ("claude-3-haiku", "claude-3-haiku-20240307"),
    ("claude-2", "claude-2.0"),
    ("claude-2.1", "claude-2.1"),
    ("claude-3.5", "claude-3-5-sonnet-20240620"),
    ("claude-3.5-sonnet", "claude-3-5-sonnet-20240620"),
    ("claude-3.7", "claude-3-7-sonnet-20240610"),
    ("claude-3.7-sonnet", "claude-3-7-sonnet-20240610"),
];

/// Case-insensitive alias table with a fallback model.
///
/// Built once and shared read-only; there is no way to mutate it after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTable {
    aliases: HashMap<String, String>,
    default_model: String,
}

impl ModelTable {
    pub fn new<I, K, V>(entries: I, default_model: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let aliases = entries
            .into_iter()
            .map(|(alias, model)| (alias.as_ref().to_lowercase(), model.into()))
            .collect();
        Self {
            aliases,
            default_model: default_model.into(),
        }
    }

    pub fn builtin(default_model: impl Into<String>) -> Self {
        Self::new(BUILTIN_ALIASES.iter().copied(), default_model)
    }

    /// Unknown and empty aliases resolve to the default model.
    pub fn resolve(&self, alias: &str) -> &str {
        self.aliases
            .get(&alias.to_lowercase())
            .map(String::as_str)
            .unwrap_or(self.default_model.as_str())
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
