use anyhow::Result;

use crate::cloudflare::client::WorkersAi;

/// Languages the UI offers. Prompts are always sent to models in English.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    En,
    He,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::He => "he",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub translated_text: String,
    pub language: Language,
}

fn is_hebrew(c: char) -> bool {
    ('\u{0590}'..='\u{05FF}').contains(&c) || ('\u{FB1D}'..='\u{FB4F}').contains(&c)
}

pub fn detect_language(text: &str) -> Language {
    if text.chars().any(is_hebrew) {
        Language::He
    } else {
        Language::En
    }
}

/// Bring a prompt into English, remembering what language it came in.
/// English input is returned as-is without a provider round trip.
pub async fn detect_and_translate(ai: &dyn WorkersAi, text: &str) -> Result<Translation> {
    if text.trim().is_empty() {
        anyhow::bail!("Prompt is required");
    }

    let language = detect_language(text);
    let translated_text = match language {
        Language::En => text.to_string(),
        source => {
            let translated = ai.translate(text, source.code(), Language::En.code()).await?;
            tracing::debug!(source = source.code(), "translated prompt to English");
            translated
        }
    };

    Ok(Translation {
        translated_text,
        language,
    })
}

pub async fn translate_english_to_hebrew(ai: &dyn WorkersAi, text: &str) -> Result<String> {
    ai.translate(text, Language::En.code(), Language::He.code()).await
}
