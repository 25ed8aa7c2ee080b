use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Identifier of one playable audio resource.
///
/// Cloning is cheap (shared reference), so the render loop can copy the current track
/// out of the queue lock and work on it after releasing the lock.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Track(Arc<Path>);

impl Track {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self(Arc::from(path.as_ref()))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Lowercased file extension, used as a probe hint.
    pub fn extension_hint(&self) -> Option<String> {
        self.0
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }

    /// Display form used in notifications and status payloads.
    pub fn display_name(&self) -> String {
        self.0.to_string_lossy().into_owned()
    }
}

impl fmt::Debug for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Track").field(&self.0).finish()
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<&str> for Track {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Track {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&Path> for Track {
    fn from(value: &Path) -> Self {
        Self::new(value)
    }
}

impl From<PathBuf> for Track {
    fn from(value: PathBuf) -> Self {
        Self::new(value)
    }
}

impl From<&PathBuf> for Track {
    fn from(value: &PathBuf) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_hint_is_lowercased() {
        assert_eq!(Track::new("/music/A.MP3").extension_hint(), Some("mp3".to_string()));
        assert_eq!(Track::new("/music/noext").extension_hint(), None);
    }

    #[test]
    fn clones_share_the_same_path() {
        let a = Track::from("/music/a.flac");
        let b = a.clone();
        assert_eq!(a, b);
        assert!(std::ptr::eq(a.path(), b.path()));
    }
}
