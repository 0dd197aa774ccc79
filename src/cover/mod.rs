//! Cover images: the innocent-looking bytes a vault hides behind.
//!
//! A cover comes from a local file, a random image from a meme API
//! (behind the `cover-fetch` feature), or the built-in placeholder
//! when neither is available. The vault layer only needs the bytes.

use std::fs;
use std::path::Path;

use crate::config::Settings;
use crate::errors::{MemeVaultError, Result};

/// A 1x1 grey baseline JPEG, used when no cover can be fetched.
const PLACEHOLDER_JPEG: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x00,
    0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xDB, 0x00, 0x43, 0x00, 0x01, 0x01, 0x01,
    0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
    0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
    0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
    0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
    0x01, 0x01, 0x01, 0x01, 0x01, 0xFF, 0xC0, 0x00, 0x0B, 0x08, 0x00, 0x01, 0x00, 0x01,
    0x01, 0x01, 0x11, 0x00, 0xFF, 0xC4, 0x00, 0x14, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xC4,
    0x00, 0x14, 0x10, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00,
    0x3F, 0x00, 0x3F, 0xFF, 0xD9,
];

/// Upper bound on a downloaded cover image.
#[cfg(feature = "cover-fetch")]
const MAX_COVER_BYTES: u64 = 16 * 1024 * 1024;

/// Cover image bytes plus a description of where they came from.
#[derive(Debug, Clone)]
pub struct CoverImage {
    pub bytes: Vec<u8>,
    pub source: String,
}

/// The built-in placeholder image.
pub fn placeholder() -> CoverImage {
    CoverImage {
        bytes: PLACEHOLDER_JPEG.to_vec(),
        source: "built-in placeholder".to_string(),
    }
}

/// Read a cover image from a local file.
pub fn from_file(path: &Path) -> Result<CoverImage> {
    let bytes = fs::read(path)?;
    if bytes.is_empty() {
        return Err(MemeVaultError::CoverImageFailed(format!(
            "{} is empty",
            path.display()
        )));
    }
    Ok(CoverImage {
        bytes,
        source: path.display().to_string(),
    })
}

/// Fetch a random cover, falling back to the placeholder.
///
/// Returns the cover and, if the fetch failed, why.
pub fn random_or_placeholder(settings: &Settings) -> (CoverImage, Option<MemeVaultError>) {
    match fetch_random(settings) {
        Ok(cover) => (cover, None),
        Err(e) => (placeholder(), Some(e)),
    }
}

/// The JSON returned by the cover API. Only `url` is required.
#[cfg(feature = "cover-fetch")]
#[derive(Debug, serde::Deserialize)]
struct CoverResponse {
    url: String,
    #[serde(default)]
    title: Option<String>,
}

/// Download a random image from `settings.cover_api_url`.
#[cfg(feature = "cover-fetch")]
pub fn fetch_random(settings: &Settings) -> Result<CoverImage> {
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(settings.fetch_timeout()))
        .build()
        .into();
    let user_agent = format!("memevault/{}", env!("CARGO_PKG_VERSION"));

    let meta: CoverResponse = agent
        .get(&settings.cover_api_url)
        .header("User-Agent", &user_agent)
        .call()
        .map_err(fetch_error)?
        .body_mut()
        .read_json()
        .map_err(fetch_error)?;

    if meta.url.is_empty() {
        return Err(MemeVaultError::CoverImageFailed(
            "cover API returned no image URL".into(),
        ));
    }

    let bytes = agent
        .get(&meta.url)
        .header("User-Agent", &user_agent)
        .call()
        .map_err(fetch_error)?
        .body_mut()
        .with_config()
        .limit(MAX_COVER_BYTES)
        .read_to_vec()
        .map_err(fetch_error)?;

    if bytes.is_empty() {
        return Err(MemeVaultError::CoverImageFailed("downloaded image is empty".into()));
    }

    let source = match meta.title {
        Some(title) if !title.is_empty() => format!("{} ({title})", meta.url),
        _ => meta.url,
    };
    Ok(CoverImage { bytes, source })
}

#[cfg(feature = "cover-fetch")]
fn fetch_error(e: ureq::Error) -> MemeVaultError {
    MemeVaultError::CoverImageFailed(e.to_string())
}

#[cfg(not(feature = "cover-fetch"))]
pub fn fetch_random(_settings: &Settings) -> Result<CoverImage> {
    Err(MemeVaultError::CoverImageFailed(
        "built without the `cover-fetch` feature".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn placeholder_is_a_jpeg() {
        let cover = placeholder();
        assert!(cover.bytes.starts_with(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(cover.bytes.ends_with(&[0xFF, 0xD9]));
        assert_eq!(&cover.bytes[6..11], b"JFIF\0");
    }

    #[test]
    fn from_file_reads_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cat.jpg");
        fs::write(&path, b"\xFF\xD8\xFF").unwrap();

        let cover = from_file(&path).unwrap();
        assert_eq!(cover.bytes, b"\xFF\xD8\xFF");
        assert!(cover.source.ends_with("cat.jpg"));
    }

    #[test]
    fn from_file_rejects_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.jpg");
        fs::write(&path, b"").unwrap();
        assert!(from_file(&path).is_err());
    }

    #[test]
    fn unreachable_api_falls_back_to_placeholder() {
        let settings = Settings {
            cover_api_url: "http://127.0.0.1:1/nothing-here".to_string(),
            fetch_timeout_secs: 1,
            ..Settings::default()
        };

        let (cover, failure) = random_or_placeholder(&settings);
        assert!(failure.is_some());
        assert_eq!(cover.bytes, placeholder().bytes);
    }
}
