//! Clients for external services
//!
//! - Avatar upload to the image host
//! - Language detection and translation behind capability checks
//!
//! Failures here are reported to the caller and never change wizard state.

pub mod error;
pub mod language;
pub mod upload;

pub use error::ApiError;
pub use language::{
    Capability, Detection, Language, LanguageDetector, Message, TextProcessor, Translation,
    TranslationRequest, Translator,
};
pub use upload::{check_image, AvatarUploader, ImgBbUploader, MAX_UPLOAD_BYTES};
