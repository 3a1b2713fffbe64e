use brain_domain::error::Result;
use brain_domain::message::Message;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Everything a generator receives for one chat turn.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    /// The new user message.
    pub message: String,
    /// Prior session history, oldest first.  Does not include `message`.
    pub history: Vec<Message>,
    pub user_id: String,
    pub session_id: String,
    /// Originating interface tag (e.g. `"voice"`, `"telegram"`, `"api"`).
    pub interface: String,
    /// Response language tag (e.g. `"en"`, `"pl"`).
    pub language: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The external text-generation capability.
///
/// Implementations own their transport, retries and prompt assembly; the
/// caller only sees reply text or an error.
#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, req: GenerationRequest) -> Result<String>;

    /// Identifier used in logs (e.g. `"anthropic"`).
    fn provider_id(&self) -> &str;

    /// Model the generator sends requests to.
    fn model(&self) -> &str;
}
