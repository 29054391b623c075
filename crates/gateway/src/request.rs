use crate::message::ChatMessage;

/// Sampling parameters forwarded verbatim to the completion endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplingParams {
    /// The model identifier.
    pub model: String,
    /// Sampling temperature, in `[0, 1]`.
    pub temperature: f32,
    /// Upper bound for the generated token count.
    pub max_tokens: u32,
    /// Nucleus sampling mass, in `[0, 1]`.
    pub top_p: f32,
    /// Penalty for tokens that already appeared, in `[-2, 2]`.
    pub frequency_penalty: f32,
    /// Penalty for topics that already appeared, in `[-2, 2]`.
    pub presence_penalty: f32,
}

impl SamplingParams {
    /// Creates parameters for the given model with neutral defaults.
    #[inline]
    pub fn for_model<S: Into<String>>(model: S) -> Self {
        Self {
            model: model.into(),
            temperature: 0.3,
            max_tokens: 1000,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

/// A request to be sent to the completion gateway.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    /// The conversation history, oldest record first.
    pub messages: Vec<ChatMessage>,
    /// The sampling configuration.
    pub sampling: SamplingParams,
}
