//! Local copy inspection
//!
//! The update utility can use an already installed `zoneinfo.res` as a
//! baseline. It is shown as the first entry of the source list, labelled with
//! whatever version could be read from it.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use url::Url;

use super::SourceError;

/// Label of the local entry when its version is unknown
pub const LOCAL_LABEL: &str = "Local Copy";

/// Label of the local entry when no local file exists
pub const LOCAL_MISSING_LABEL: &str = "Local Copy (not found)";

/// Resource key that precedes the version string in `zoneinfo.res`
const VERSION_KEY: &str = "TZVersion";

/// tzdata release tags: a year followed by one or two letters (2007k, 1999zz)
static VERSION_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:19|20)\d{2}[a-z]{1,2}\b").expect("version tag pattern is valid")
});

/// Reads the version embedded in a time zone resource file
pub trait VersionReader: Send + Sync {
    /// Return the version string of the file at `path`
    fn read_version(&self, path: &Path) -> Result<String, SourceError>;
}

/// Default reader for ICU `zoneinfo.res` resource bundles
///
/// Strings in the bundle are UTF-16 and NUL terminated. A single NUL byte is
/// the high half of an ASCII code unit and is dropped; a longer run of NUL
/// bytes ends a string and becomes a space, so neighbouring strings stay apart.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResourceVersionReader;

impl VersionReader for ResourceVersionReader {
    fn read_version(&self, path: &Path) -> Result<String, SourceError> {
        let bytes = std::fs::read(path).map_err(|source| SourceError::LocalRead {
            path: path.to_path_buf(),
            source,
        })?;

        let text = resource_text(&bytes);
        let after_key = text.find(VERSION_KEY).map(|i| &text[i + VERSION_KEY.len()..]);

        after_key
            .and_then(|tail| VERSION_TAG.find(tail))
            .or_else(|| VERSION_TAG.find(&text))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| SourceError::VersionNotFound {
                path: path.to_path_buf(),
            })
    }
}

/// Flatten resource bytes into searchable ASCII text
fn resource_text(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len() / 2);
    let mut nuls = 0;

    for &b in bytes {
        if b == 0 {
            nuls += 1;
            continue;
        }
        if nuls > 1 {
            text.push(' ');
        }
        nuls = 0;
        text.push(if b.is_ascii() { b as char } else { ' ' });
    }

    text
}

/// The local copy pseudo-entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalCopy {
    /// Display label, also the string that selects this entry
    pub label: String,

    /// `file://` location of the local resource, if it exists
    pub location: Option<Url>,

    /// Version read from the local resource, if any
    pub version: Option<String>,
}

impl Default for LocalCopy {
    fn default() -> Self {
        Self::missing()
    }
}

impl LocalCopy {
    /// Entry used when no local file exists
    pub fn missing() -> Self {
        Self {
            label: LOCAL_MISSING_LABEL.to_string(),
            location: None,
            version: None,
        }
    }

    /// Inspect the file at `path` and build the local entry
    ///
    /// Never fails: a missing file or an unreadable version only reduces the
    /// information carried by the entry, and is logged.
    pub fn inspect(path: &Path, reader: &dyn VersionReader) -> Self {
        if !path.is_file() {
            let err = SourceError::LocalMissing {
                path: path.to_path_buf(),
            };
            tracing::warn!("{}", err);
            return Self::missing();
        }

        let absolute = absolute_path(path);
        let location = match Url::from_file_path(&absolute) {
            Ok(url) => Some(url),
            Err(()) => {
                tracing::warn!("Cannot express {} as a file URL", absolute.display());
                None
            }
        };

        match reader.read_version(path) {
            Ok(version) => {
                tracing::debug!("Local copy {} has version {}", path.display(), version);
                Self {
                    label: format!("{LOCAL_LABEL} ({version})"),
                    location,
                    version: Some(version),
                }
            }
            Err(e) => {
                tracing::warn!("{}", e);
                Self {
                    label: LOCAL_LABEL.to_string(),
                    location,
                    version: None,
                }
            }
        }
    }

    /// Whether a local file was found
    pub fn exists(&self) -> bool {
        self.location.is_some()
    }

    /// Whether `choice` names this entry (case-insensitive)
    pub fn matches(&self, choice: &str) -> bool {
        self.label.eq_ignore_ascii_case(choice)
    }
}

/// Resolve `path` against the working directory, canonicalizing when possible
fn absolute_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

#[cfg(test)]
mod local_tests {
    use super::*;
    use tempfile::TempDir;

    struct FixedReader(Option<&'static str>);

    impl VersionReader for FixedReader {
        fn read_version(&self, path: &Path) -> Result<String, SourceError> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| SourceError::VersionNotFound {
                    path: path.to_path_buf(),
                })
        }
    }

    fn utf16be(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(u16::to_be_bytes).collect()
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let local = LocalCopy::inspect(&temp_dir.path().join("zoneinfo.res"), &FixedReader(None));

        assert_eq!(local, LocalCopy::missing());
        assert_eq!(local.label, LOCAL_MISSING_LABEL);
        assert!(!local.exists());
    }

    #[test]
    fn test_directory_is_not_a_local_copy() {
        let temp_dir = TempDir::new().unwrap();
        let local = LocalCopy::inspect(temp_dir.path(), &FixedReader(Some("2007k")));
        assert!(!local.exists());
    }

    #[test]
    fn test_unknown_version() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("zoneinfo.res");
        std::fs::write(&path, b"garbage").unwrap();

        let local = LocalCopy::inspect(&path, &FixedReader(None));

        assert_eq!(local.label, LOCAL_LABEL);
        assert!(local.version.is_none());
        let location = local.location.unwrap();
        assert_eq!(location.scheme(), "file");
        assert!(location.path().ends_with("/zoneinfo.res"));
    }

    #[test]
    fn test_known_version_embedded_in_label() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("zoneinfo.res");
        std::fs::write(&path, b"data").unwrap();

        let local = LocalCopy::inspect(&path, &FixedReader(Some("2007k")));

        assert_eq!(local.label, "Local Copy (2007k)");
        assert_eq!(local.version.as_deref(), Some("2007k"));
        assert!(local.exists());
    }

    #[test]
    fn test_label_match_is_case_insensitive() {
        let local = LocalCopy {
            label: LOCAL_LABEL.to_string(),
            location: None,
            version: None,
        };
        assert!(local.matches("Local Copy"));
        assert!(local.matches("LOCAL COPY"));
        assert!(!local.matches("2007k"));
    }

    #[test]
    fn test_resource_reader_utf16_bundle() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("zoneinfo.res");

        let mut bytes = vec![0x00, 0x20, 0xda, 0x27];
        bytes.extend(utf16be("Zones"));
        bytes.extend([0x00, 0x00, 0x01, 0x02]);
        bytes.extend(utf16be("TZVersion"));
        bytes.extend([0x00, 0x00]);
        bytes.extend(utf16be("2007k"));
        std::fs::write(&path, bytes).unwrap();

        assert_eq!(ResourceVersionReader.read_version(&path).unwrap(), "2007k");
    }

    #[test]
    fn test_resource_reader_version_followed_by_string() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("zoneinfo.res");

        let mut bytes = utf16be("TZVersion");
        for text in ["2007k", "Zones"] {
            bytes.extend([0x00, 0x00]);
            bytes.extend(utf16be(text));
        }
        bytes.extend([0x00, 0x00]);
        std::fs::write(&path, bytes).unwrap();

        assert_eq!(ResourceVersionReader.read_version(&path).unwrap(), "2007k");
    }

    #[test]
    fn test_resource_text_separates_terminated_strings() {
        let mut bytes = utf16be("TZVersion");
        bytes.extend([0x00, 0x00]);
        bytes.extend(utf16be("2007k"));
        bytes.extend([0x00, 0x00]);
        bytes.extend(utf16be("Zones"));

        assert_eq!(resource_text(&bytes), "TZVersion 2007k Zones");
        assert_eq!(resource_text(b"TZVersion 2007c"), "TZVersion 2007c");
    }

    #[test]
    fn test_resource_reader_prefers_tag_after_key() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("zoneinfo.res");
        std::fs::write(&path, b"built 2006a ... TZVersion 2007c").unwrap();

        assert_eq!(ResourceVersionReader.read_version(&path).unwrap(), "2007c");
    }

    #[test]
    fn test_resource_reader_without_version() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("zoneinfo.res");
        std::fs::write(&path, b"no version here").unwrap();

        let err = ResourceVersionReader.read_version(&path).unwrap_err();
        assert!(matches!(err, SourceError::VersionNotFound { .. }));
        assert!(err.is_degraded_local());
    }

    #[test]
    fn test_resource_reader_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = ResourceVersionReader
            .read_version(&temp_dir.path().join("absent.res"))
            .unwrap_err();
        assert!(matches!(err, SourceError::LocalRead { .. }));
    }
}
