use chatline_gateway::{ChatMessage, ChatRole, CompletionRequest};
use serde::{Deserialize, Serialize};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Choice {
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Delta {
    pub content: Option<String>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System { content: String },
    User { content: String },
    Assistant { content: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    stream: bool,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(req: &CompletionRequest) -> ChatCompletionRequest {
    let sampling = &req.sampling;
    ChatCompletionRequest {
        model: sampling.model.clone(),
        messages: req.messages.iter().map(create_message).collect(),
        temperature: sampling.temperature,
        max_tokens: sampling.max_tokens,
        top_p: sampling.top_p,
        frequency_penalty: sampling.frequency_penalty,
        presence_penalty: sampling.presence_penalty,
        stream: true,
    }
}

#[inline]
fn create_message(msg: &ChatMessage) -> Message {
    let content = msg.content().to_owned();
    match msg.role() {
        ChatRole::System => Message::System { content },
        ChatRole::User => Message::User { content },
        ChatRole::Assistant => Message::Assistant { content },
    }
}

#[cfg(test)]
mod tests {
    use chatline_gateway::SamplingParams;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_create_request() {
        let request = CompletionRequest {
            messages: vec![
                ChatMessage::system("You are a helpful assistant."),
                ChatMessage::user("Hello"),
                ChatMessage::assistant("Hi, how can I help?"),
            ],
            sampling: SamplingParams {
                model: "custom".to_owned(),
                temperature: 0.3,
                max_tokens: 1000,
                top_p: 1.0,
                frequency_penalty: 1.0,
                presence_penalty: 0.0,
            },
        };
        let expected = ChatCompletionRequest {
            model: "custom".to_owned(),
            messages: vec![
                Message::System {
                    content: "You are a helpful assistant.".to_owned(),
                },
                Message::User {
                    content: "Hello".to_owned(),
                },
                Message::Assistant {
                    content: "Hi, how can I help?".to_owned(),
                },
            ],
            temperature: 0.3,
            max_tokens: 1000,
            top_p: 1.0,
            frequency_penalty: 1.0,
            presence_penalty: 0.0,
            stream: true,
        };
        assert_eq!(create_request(&request), expected);
    }

    #[test]
    fn test_request_payload() {
        // Sampling values that are exactly representable in f32, so the
        // JSON comparison is not affected by widening.
        let request = CompletionRequest {
            messages: vec![ChatMessage::user("Hi")],
            sampling: SamplingParams {
                model: "gpt-4.1-nano".to_owned(),
                temperature: 0.5,
                max_tokens: 1000,
                top_p: 1.0,
                frequency_penalty: 1.0,
                presence_penalty: 0.0,
            },
        };
        let payload = serde_json::to_value(create_request(&request)).unwrap();
        assert_eq!(
            payload,
            json!({
                "model": "gpt-4.1-nano",
                "messages": [{ "role": "user", "content": "Hi" }],
                "temperature": 0.5,
                "max_tokens": 1000,
                "top_p": 1.0,
                "frequency_penalty": 1.0,
                "presence_penalty": 0.0,
                "stream": true,
            })
        );
    }
}
