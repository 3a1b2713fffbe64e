use std::sync::Arc;

use brain_domain::config::{GenerationConfig, GeneratorKind, StartupPolicy};
use brain_domain::error::{Error, Result};

use crate::anthropic::AnthropicGenerator;
use crate::openai_compat::OpenAiCompatGenerator;
use crate::traits::{GenerationRequest, Generator};

/// Build the configured generator.
///
/// When initialization fails (usually a missing API key) the
/// [`StartupPolicy`] decides: `allow_none` logs a warning and returns an
/// [`UnavailableGenerator`], `require_one` returns the error.
pub fn build_generator(cfg: &GenerationConfig) -> Result<Arc<dyn Generator>> {
    let built: Result<Arc<dyn Generator>> = match cfg.kind {
        GeneratorKind::Anthropic => {
            AnthropicGenerator::from_config(cfg).map(|g| Arc::new(g) as Arc<dyn Generator>)
        }
        GeneratorKind::OpenaiCompat => {
            OpenAiCompatGenerator::from_config(cfg).map(|g| Arc::new(g) as Arc<dyn Generator>)
        }
    };

    match built {
        Ok(generator) => {
            tracing::info!(
                provider = generator.provider_id(),
                model = generator.model(),
                "generator initialized"
            );
            Ok(generator)
        }
        Err(e) if cfg.startup_policy == StartupPolicy::AllowNone => {
            tracing::warn!(
                error = %e,
                "generator unavailable; /chat will fail until it is configured"
            );
            Ok(Arc::new(UnavailableGenerator::new(e.to_string())))
        }
        Err(e) => Err(e),
    }
}

/// Stand-in used when the real generator could not be initialized.
/// Every call fails with the initialization error.
pub struct UnavailableGenerator {
    reason: String,
}

impl UnavailableGenerator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait::async_trait]
impl Generator for UnavailableGenerator {
    async fn generate(&self, _req: GenerationRequest) -> Result<String> {
        Err(Error::Auth(format!("generator not configured: {}", self.reason)))
    }

    fn provider_id(&self) -> &str {
        "unavailable"
    }

    fn model(&self) -> &str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_key_config(policy: StartupPolicy) -> GenerationConfig {
        GenerationConfig {
            api_key_env: Some("BRAIN_TEST_NO_SUCH_KEY".into()),
            startup_policy: policy,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn allow_none_yields_failing_placeholder() {
        let generator = build_generator(&missing_key_config(StartupPolicy::AllowNone)).unwrap();
        assert_eq!(generator.provider_id(), "unavailable");

        let err = generator.generate(GenerationRequest::default()).await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[test]
    fn require_one_aborts() {
        let result = build_generator(&missing_key_config(StartupPolicy::RequireOne));
        assert!(matches!(result, Err(Error::Auth(_))));
    }
}
