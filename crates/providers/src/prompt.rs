//! System prompt assembly from the interface and language tags.

/// Text returned when a provider answers with no content at all.
pub const EMPTY_COMPLETION_FALLBACK: &str = "I apologize, I couldn't generate a response.";

const BASE_PROMPT: &str = "You are a helpful AI assistant with access to various tools and systems.\n\
You can help with tasks, answer questions, and interact with connected services.";

fn interface_hint(interface: &str) -> Option<&'static str> {
    match interface {
        "voice" => Some("The user is interacting via voice. Keep responses concise and conversational."),
        "telegram" => Some("The user is messaging via Telegram. Use clear, formatted text."),
        "api" => Some("This is a programmatic API interaction."),
        _ => None,
    }
}

fn language_hint(language: &str) -> Option<&'static str> {
    match language {
        "pl" => Some("Respond in Polish."),
        "en" => Some("Respond in English."),
        _ => None,
    }
}

/// Build the system prompt.  Unknown tags contribute nothing.
pub fn build_system_prompt(interface: &str, language: &str) -> String {
    let mut parts = vec![BASE_PROMPT];
    parts.extend(interface_hint(interface));
    parts.extend(language_hint(language));
    parts.join("\n\n")
}
