use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Extension used when the original name has none (or an unusable one)
pub const DEFAULT_EXTENSION: &str = ".wav";

/// Produces on-disk file names for uploaded voiceprints
pub trait FileNameGenerator: Send + Sync {
    fn generate(&self, original_file_name: Option<&str>) -> String;
}

/// `{yyyyMMdd_HHmmss}_{8 hex chars}{.ext}` names
///
/// The token is 32 random bits of a v4 UUID. The original name is never
/// reused beyond its extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampFileNameGenerator;

impl TimestampFileNameGenerator {
    /// Deterministic part of the name, split out for testing
    pub fn generate_at(&self, now: DateTime<Utc>, original_file_name: Option<&str>) -> String {
        let token = Uuid::new_v4().simple().to_string();

        format!(
            "{timestamp}_{token}{extension}",
            timestamp = now.format("%Y%m%d_%H%M%S"),
            token = &token[..8],
            extension = file_extension(original_file_name)
        )
    }
}

impl FileNameGenerator for TimestampFileNameGenerator {
    fn generate(&self, original_file_name: Option<&str>) -> String {
        self.generate_at(Utc::now(), original_file_name)
    }
}

/// Lowercased extension including the dot, or [`DEFAULT_EXTENSION`]
fn file_extension(original_file_name: Option<&str>) -> String {
    original_file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Display name derived from an upload file name: the name without its extension
pub fn file_stem(original_file_name: &str) -> &str {
    match original_file_name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => original_file_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn test_name_format() {
        let generator = TimestampFileNameGenerator;
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 45).unwrap();
        let name = generator.generate_at(now, Some("Recording.MP3"));

        assert!(name.starts_with("20240115_103045_"));
        assert!(name.ends_with(".mp3"));

        let token = &name["20240115_103045_".len()..name.len() - ".mp3".len()];
        assert_eq!(token.len(), 8);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension(Some("sample.wav")), ".wav");
        assert_eq!(file_extension(Some("take.2.FLAC")), ".flac");
        assert_eq!(file_extension(Some("noext")), DEFAULT_EXTENSION);
        assert_eq!(file_extension(Some("trailing.")), DEFAULT_EXTENSION);
        assert_eq!(file_extension(Some("evil./../../x")), DEFAULT_EXTENSION);
        assert_eq!(file_extension(None), DEFAULT_EXTENSION);
    }

    #[test]
    fn test_original_name_not_leaked() {
        let name = TimestampFileNameGenerator.generate(Some("alice_secret.wav"));
        assert!(!name.contains("alice_secret"));
    }

    #[test]
    fn test_unique_within_same_second() {
        let generator = TimestampFileNameGenerator;
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 45).unwrap();

        let names: HashSet<String> = (0..1000)
            .map(|_| generator.generate_at(now, Some("a.wav")))
            .collect();

        assert_eq!(names.len(), 1000);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("sample.wav"), "sample");
        assert_eq!(file_stem("take.2.wav"), "take.2");
        assert_eq!(file_stem("noext"), "noext");
    }
}
