//! Language detection and translation behind capability-checked traits
//!
//! Hosts expose these services with an availability string (`no`,
//! `readily`, `after-download`). [`TextProcessor`] checks capability before
//! every call and enforces the translation rules, so the backends only need
//! to do the actual work.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::ApiError;

/// Languages offered for translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Pt,
    Es,
    Ru,
    Tr,
    Fr,
    De,
    It,
    Zh,
    Ja,
    Ko,
}

impl Language {
    pub fn all() -> &'static [Language] {
        &[
            Language::En,
            Language::Pt,
            Language::Es,
            Language::Ru,
            Language::Tr,
            Language::Fr,
            Language::De,
            Language::It,
            Language::Zh,
            Language::Ja,
            Language::Ko,
        ]
    }

    /// BCP 47 primary language code
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Pt => "pt",
            Language::Es => "es",
            Language::Ru => "ru",
            Language::Tr => "tr",
            Language::Fr => "fr",
            Language::De => "de",
            Language::It => "it",
            Language::Zh => "zh",
            Language::Ja => "ja",
            Language::Ko => "ko",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Pt => "Portuguese",
            Language::Es => "Spanish",
            Language::Ru => "Russian",
            Language::Tr => "Turkish",
            Language::Fr => "French",
            Language::De => "German",
            Language::It => "Italian",
            Language::Zh => "Chinese",
            Language::Ja => "Japanese",
            Language::Ko => "Korean",
        }
    }

    /// Parse a code such as `fr` or `pt-BR`
    pub fn from_code(code: &str) -> Option<Language> {
        let primary = code.split(['-', '_']).next()?.trim().to_lowercase();
        Language::all()
            .iter()
            .copied()
            .find(|lang| lang.code() == primary)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

/// Whether a language service can be used right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Unavailable,
    /// Usable once the model finishes downloading
    Initializing,
    Ready,
}

impl Capability {
    /// Map a host availability string; unknown values are `Unavailable`
    pub fn from_availability(value: &str) -> Capability {
        match value.trim() {
            "readily" => Capability::Ready,
            "after-download" => Capability::Initializing,
            _ => Capability::Unavailable,
        }
    }

    fn require_ready(self, provider: &str) -> Result<(), ApiError> {
        match self {
            Capability::Ready => Ok(()),
            Capability::Initializing => Err(ApiError::unavailable(
                provider,
                "model is still downloading, try again shortly",
            )),
            Capability::Unavailable => {
                Err(ApiError::unavailable(provider, "not supported on this host"))
            }
        }
    }
}

/// One candidate language for a piece of text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub language: Language,
    /// 0.0 to 1.0
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    pub source: Language,
    pub target: Language,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    pub source: Language,
    pub target: Language,
}

/// A piece of user text and what has been learned about it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Message {
    pub text: String,
    pub detected: Option<Detection>,
    pub translation: Option<Translation>,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait LanguageDetector: Send + Sync {
    fn name(&self) -> &str;

    async fn capability(&self) -> Capability;

    /// Candidate languages, in any order
    async fn detect(&self, text: &str) -> Result<Vec<Detection>, ApiError>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    fn name(&self) -> &str;

    /// Capability for a specific language pair
    async fn capability(&self, source: Language, target: Language) -> Capability;

    async fn translate(&self, request: &TranslationRequest) -> Result<String, ApiError>;
}

/// Runs detection and translation with capability and rule checks
pub struct TextProcessor<D, T> {
    detector: D,
    translator: T,
}

impl<D: LanguageDetector, T: Translator> TextProcessor<D, T> {
    pub fn new(detector: D, translator: T) -> Self {
        Self {
            detector,
            translator,
        }
    }

    /// Detect the most likely language of `message` and record it
    pub async fn detect(&self, message: &mut Message) -> Result<Detection, ApiError> {
        let provider = self.detector.name();
        if message.text.trim().is_empty() {
            return Err(ApiError::unsupported(provider, "nothing to detect"));
        }
        self.detector.capability().await.require_ready(provider)?;

        let best = self
            .detector
            .detect(&message.text)
            .await?
            .into_iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .ok_or_else(|| ApiError::invalid_response(provider, "no language candidates"))?;

        tracing::debug!(
            language = best.language.code(),
            confidence = best.confidence,
            "language detected"
        );
        message.detected = Some(best);
        Ok(best)
    }

    /// Translate `message` into `target` and record the result
    ///
    /// Detects the source language first when it is not yet known.
    pub async fn translate(
        &self,
        message: &mut Message,
        target: Language,
    ) -> Result<Translation, ApiError> {
        let provider = self.translator.name().to_string();
        if message.translation.is_some() {
            return Err(ApiError::unsupported(
                provider,
                "message has already been translated",
            ));
        }

        let source = match message.detected {
            Some(detection) => detection.language,
            None => self.detect(message).await?.language,
        };
        if source == target {
            return Err(ApiError::unsupported(
                provider,
                format!("message is already in {}", target.name()),
            ));
        }

        self.translator
            .capability(source, target)
            .await
            .require_ready(&provider)?;

        let request = TranslationRequest {
            text: message.text.clone(),
            source,
            target,
        };
        let text = self.translator.translate(&request).await?;

        let translation = Translation {
            text,
            source,
            target,
        };
        tracing::info!(
            source = source.code(),
            target = target.code(),
            "message translated"
        );
        message.translation = Some(translation.clone());
        Ok(translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedDetector {
        capability: Capability,
        candidates: Vec<Detection>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LanguageDetector for FixedDetector {
        fn name(&self) -> &str {
            "detector"
        }

        async fn capability(&self) -> Capability {
            self.capability
        }

        async fn detect(&self, _text: &str) -> Result<Vec<Detection>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.candidates.clone())
        }
    }

    struct UppercaseTranslator {
        availability: &'static str,
    }

    #[async_trait]
    impl Translator for UppercaseTranslator {
        fn name(&self) -> &str {
            "translator"
        }

        async fn capability(&self, _source: Language, _target: Language) -> Capability {
            Capability::from_availability(self.availability)
        }

        async fn translate(&self, request: &TranslationRequest) -> Result<String, ApiError> {
            Ok(format!("[{}] {}", request.target.code(), request.text.to_uppercase()))
        }
    }

    fn processor(
        detector_capability: Capability,
        availability: &'static str,
    ) -> (TextProcessor<FixedDetector, UppercaseTranslator>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let detector = FixedDetector {
            capability: detector_capability,
            candidates: vec![
                Detection {
                    language: Language::Fr,
                    confidence: 0.2,
                },
                Detection {
                    language: Language::En,
                    confidence: 0.9,
                },
            ],
            calls: Arc::clone(&calls),
        };
        (
            TextProcessor::new(detector, UppercaseTranslator { availability }),
            calls,
        )
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::from_code("pt-BR"), Some(Language::Pt));
        assert_eq!(Language::from_code("ZH"), Some(Language::Zh));
        assert_eq!(Language::from_code("xx"), None);
        assert_eq!(Language::from_code(""), None);
        assert_eq!(Language::all().len(), 11);
        assert_eq!(Language::Ja.to_string(), "Japanese (ja)");
    }

    #[test]
    fn test_capability_from_availability() {
        assert_eq!(Capability::from_availability("readily"), Capability::Ready);
        assert_eq!(
            Capability::from_availability("after-download"),
            Capability::Initializing
        );
        assert_eq!(Capability::from_availability("no"), Capability::Unavailable);
        assert_eq!(Capability::from_availability("maybe"), Capability::Unavailable);
    }

    #[tokio::test]
    async fn test_detect_picks_highest_confidence() {
        let (processor, _) = processor(Capability::Ready, "readily");
        let mut message = Message::new("Hello there");

        let detection = processor.detect(&mut message).await.unwrap();

        assert_eq!(detection.language, Language::En);
        assert_eq!(message.detected, Some(detection));
    }

    #[tokio::test]
    async fn test_detect_rejects_empty_text() {
        let (processor, calls) = processor(Capability::Ready, "readily");
        let mut message = Message::new("   ");

        assert!(processor.detect(&mut message).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_detect_requires_ready() {
        let (processor, calls) = processor(Capability::Initializing, "readily");
        let mut message = Message::new("Hello there");

        let err = processor.detect(&mut message).await.unwrap_err();

        assert!(matches!(err, ApiError::Unavailable { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(message.detected.is_none());
    }

    #[tokio::test]
    async fn test_translate_detects_then_translates() {
        let (processor, calls) = processor(Capability::Ready, "readily");
        let mut message = Message::new("see you soon");

        let translation = processor.translate(&mut message, Language::Fr).await.unwrap();

        assert_eq!(translation.source, Language::En);
        assert_eq!(translation.text, "[fr] SEE YOU SOON");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(message.translation, Some(translation));
    }

    #[tokio::test]
    async fn test_translate_refuses_same_language() {
        let (processor, _) = processor(Capability::Ready, "readily");
        let mut message = Message::new("see you soon");

        let err = processor.translate(&mut message, Language::En).await.unwrap_err();

        assert!(matches!(err, ApiError::Unsupported { .. }));
        assert!(message.translation.is_none());
    }

    #[tokio::test]
    async fn test_translate_refuses_retranslation() {
        let (processor, calls) = processor(Capability::Ready, "readily");
        let mut message = Message::new("see you soon");
        processor.translate(&mut message, Language::Fr).await.unwrap();

        let err = processor.translate(&mut message, Language::De).await.unwrap_err();

        assert!(matches!(err, ApiError::Unsupported { .. }));
        assert_eq!(message.translation.unwrap().target, Language::Fr);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_translate_unavailable_pair() {
        let (processor, _) = processor(Capability::Ready, "no");
        let mut message = Message::new("see you soon");

        let err = processor.translate(&mut message, Language::Ko).await.unwrap_err();

        assert_eq!(
            err,
            ApiError::unavailable("translator", "not supported on this host")
        );
        // Detection still recorded
        assert!(message.detected.is_some());
        assert!(message.translation.is_none());
    }
}
