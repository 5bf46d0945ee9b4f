//! Local Piper voice models: listing, resolution and download.

use crate::error::{VoiceError, VoiceResult};
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

pub const VOICES_BASE_URL: &str = "https://huggingface.co/rhasspy/piper-voices/resolve/main";

/// A Piper voice name split into its parts, e.g. `en_US-ryan-medium`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PiperVoiceName {
    pub name: String,
    pub language: String,
    pub locale: String,
    pub speaker: String,
    pub quality: String,
}

impl PiperVoiceName {
    pub fn parse(name: &str) -> VoiceResult<Self> {
        let invalid = || VoiceError::InvalidVoiceName(name.to_string());

        let parts: Vec<&str> = name.split('-').collect();
        let [locale, speaker, quality] = parts[..] else {
            return Err(invalid());
        };
        let (language, region) = locale.split_once('_').ok_or_else(invalid)?;
        if [language, region, speaker, quality].iter().any(|p| p.is_empty()) {
            return Err(invalid());
        }

        Ok(Self {
            name: name.to_string(),
            language: language.to_string(),
            locale: locale.to_string(),
            speaker: speaker.to_string(),
            quality: quality.to_string(),
        })
    }

    /// Model file and its JSON config.
    pub fn file_names(&self) -> [String; 2] {
        [
            format!("{}.onnx", self.name),
            format!("{}.onnx.json", self.name),
        ]
    }

    /// Remote folder holding this voice's files.
    pub fn remote_dir(&self, base_url: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            base_url.trim_end_matches('/'),
            self.language,
            self.locale,
            self.speaker,
            self.quality
        )
    }
}

/// Result of a voice download. Per-file failures do not abort the others.
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub downloaded: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<VoiceError>,
}

impl DownloadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Directory tree of installed voices, `<root>/<locale>/<voice>.onnx`.
#[derive(Clone, Debug)]
pub struct VoiceDirectory {
    root: PathBuf,
    base_url: String,
}

impl VoiceDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            base_url: VOICES_BASE_URL.to_string(),
        }
    }

    /// `~/.local/share/piper-tts/voices`
    pub fn default_root() -> VoiceResult<PathBuf> {
        let home = dirs::home_dir().ok_or(VoiceError::NoHomeDir)?;
        Ok(home
            .join(".local")
            .join("share")
            .join("piper-tts")
            .join("voices"))
    }

    /// Download from a mirror instead of the public voice repository.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where a voice's model file lives once installed.
    pub fn model_path(&self, voice: &PiperVoiceName) -> PathBuf {
        self.root
            .join(&voice.locale)
            .join(format!("{}.onnx", voice.name))
    }

    /// Names of every `.onnx` model under the directory, sorted.
    pub fn list_installed(&self) -> Vec<String> {
        let mut voices: Vec<String> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::debug!("Skipping unreadable voice entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "onnx"))
            .filter_map(|entry| {
                entry
                    .path()
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
            })
            .collect();
        voices.sort();
        voices.dedup();
        voices
    }

    /// Turn a voice identifier into what the engine should receive.
    ///
    /// Existing paths are used as is, installed voices resolve to their model
    /// file, anything else is passed through unchanged.
    pub fn resolve(&self, voice: &str) -> String {
        if Path::new(voice).is_file() {
            return voice.to_string();
        }
        if let Ok(parsed) = PiperVoiceName::parse(voice) {
            let path = self.model_path(&parsed);
            if path.is_file() {
                return path.to_string_lossy().to_string();
            }
        }
        voice.to_string()
    }

    /// Fetch the model and config for `voice`, skipping files already present.
    pub async fn download(&self, voice: &str) -> VoiceResult<DownloadReport> {
        let parsed = PiperVoiceName::parse(voice)?;
        let target_dir = self.root.join(&parsed.locale);
        tokio::fs::create_dir_all(&target_dir)
            .await
            .map_err(|source| VoiceError::Io {
                path: target_dir.clone(),
                source,
            })?;

        let client = reqwest::Client::new();
        let remote_dir = parsed.remote_dir(&self.base_url);
        let mut report = DownloadReport::default();

        for file in parsed.file_names() {
            let target = target_dir.join(&file);
            if target.exists() {
                log::info!("{} already present", target.display());
                report.skipped.push(target);
                continue;
            }

            let url = format!("{}/{}", remote_dir, file);
            log::info!("Downloading {}", url);
            match download_file(&client, &url, &target).await {
                Ok(()) => report.downloaded.push(target),
                Err(e) => {
                    log::warn!("{}", e);
                    report.failed.push(e);
                }
            }
        }

        Ok(report)
    }
}

async fn download_file(client: &reqwest::Client, url: &str, target: &Path) -> VoiceResult<()> {
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| VoiceError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    save_stream(response.bytes_stream(), url, target).await
}

/// Write `body` to `<target>.part`, then move it into place.
///
/// The partial file is removed on every failure.
async fn save_stream<S, B, E>(body: S, url: &str, target: &Path) -> VoiceResult<()>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let partial = target.with_extension("part");
    let result = match write_partial(body, url, &partial).await {
        Ok(()) => tokio::fs::rename(&partial, target)
            .await
            .map_err(|source| VoiceError::Io {
                path: target.to_path_buf(),
                source,
            }),
        Err(e) => Err(e),
    };

    if result.is_err() {
        remove_partial(&partial).await;
    }
    result
}

async fn write_partial<S, B, E>(body: S, url: &str, partial: &Path) -> VoiceResult<()>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let io_err = |source| VoiceError::Io {
        path: partial.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::create(partial).await.map_err(io_err)?;
    let mut body = Box::pin(body);
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| VoiceError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        file.write_all(chunk.as_ref()).await.map_err(io_err)?;
    }
    file.flush().await.map_err(io_err)
}

async fn remove_partial(partial: &Path) {
    match tokio::fs::remove_file(partial).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::debug!("Could not remove {}: {}", partial.display(), e),
    }
}

/// Output of `<piper> --list-voices`, if the engine supports it.
pub async fn list_engine_voices(piper_bin: &str) -> Option<String> {
    let output = tokio::process::Command::new(piper_bin)
        .arg("--list-voices")
        .output()
        .await
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_voice_name() {
        let voice = PiperVoiceName::parse("en_US-ryan-medium").unwrap();
        assert_eq!(voice.language, "en");
        assert_eq!(voice.locale, "en_US");
        assert_eq!(voice.speaker, "ryan");
        assert_eq!(voice.quality, "medium");
        assert_eq!(
            voice.remote_dir(VOICES_BASE_URL),
            "https://huggingface.co/rhasspy/piper-voices/resolve/main/en/en_US/ryan/medium"
        );
        assert_eq!(
            voice.file_names(),
            [
                "en_US-ryan-medium.onnx".to_string(),
                "en_US-ryan-medium.onnx.json".to_string()
            ]
        );
    }

    #[test]
    fn test_parse_speaker_with_underscore() {
        let voice = PiperVoiceName::parse("en_GB-northern_english_male-medium").unwrap();
        assert_eq!(voice.speaker, "northern_english_male");
        assert_eq!(voice.locale, "en_GB");
    }

    #[test]
    fn test_parse_rejects_malformed_names() {
        for bad in ["ryan", "en-ryan-medium", "en_US-ryan", "en_US--medium", "a_b-c-d-e"] {
            assert!(
                matches!(PiperVoiceName::parse(bad), Err(VoiceError::InvalidVoiceName(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_list_installed_is_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("en_US")).unwrap();
        std::fs::create_dir_all(dir.path().join("de_DE")).unwrap();
        std::fs::write(dir.path().join("en_US/en_US-ryan-medium.onnx"), b"").unwrap();
        std::fs::write(dir.path().join("en_US/en_US-ryan-medium.onnx.json"), b"{}").unwrap();
        std::fs::write(dir.path().join("de_DE/de_DE-thorsten-low.onnx"), b"").unwrap();
        std::fs::write(dir.path().join("top-level.onnx"), b"").unwrap();

        let voices = VoiceDirectory::new(dir.path()).list_installed();
        assert_eq!(
            voices,
            vec!["de_DE-thorsten-low", "en_US-ryan-medium", "top-level"]
        );
    }

    #[test]
    fn test_list_installed_missing_root_is_empty() {
        let voices = VoiceDirectory::new("/nonexistent/voices/root").list_installed();
        assert!(voices.is_empty());
    }

    #[test]
    fn test_resolve_prefers_installed_model() {
        let dir = tempfile::tempdir().unwrap();
        let voices = VoiceDirectory::new(dir.path());

        assert_eq!(voices.resolve("en_US-ryan-medium"), "en_US-ryan-medium");

        std::fs::create_dir_all(dir.path().join("en_US")).unwrap();
        let model = dir.path().join("en_US/en_US-ryan-medium.onnx");
        std::fs::write(&model, b"").unwrap();
        assert_eq!(
            voices.resolve("en_US-ryan-medium"),
            model.to_string_lossy().to_string()
        );

        let explicit = model.to_string_lossy().to_string();
        assert_eq!(voices.resolve(&explicit), explicit);
    }

    #[tokio::test]
    async fn test_broken_body_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("voice.onnx");
        let body = futures::stream::iter(vec![Ok(b"first".to_vec()), Err("connection reset")]);

        let err = save_stream(body, "http://test/voice.onnx", &target)
            .await
            .unwrap_err();
        assert!(matches!(err, VoiceError::Download { .. }));
        assert!(!target.exists());
        assert!(!dir.path().join("voice.part").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_rename_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory where the file should land makes the rename fail.
        let target = dir.path().join("voice.onnx");
        std::fs::create_dir_all(target.join("occupied")).unwrap();
        let body = futures::stream::iter(vec![Ok::<_, &str>(b"bytes".to_vec())]);

        let err = save_stream(body, "http://test/voice.onnx", &target)
            .await
            .unwrap_err();
        assert!(matches!(err, VoiceError::Io { .. }));
        assert!(!dir.path().join("voice.part").exists());
    }

    #[tokio::test]
    async fn test_complete_body_is_moved_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("voice.onnx.json");
        let body = futures::stream::iter(vec![
            Ok::<_, &str>(b"{\"audio\":".to_vec()),
            Ok(b"{}}".to_vec()),
        ]);

        save_stream(body, "http://test/voice.onnx.json", &target)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "{\"audio\":{}}");
        assert!(!dir.path().join("voice.onnx.part").exists());
    }
}
