//! Pre-recorded clips standing in for a microphone
//!
//! A clip must already be Opus audio in a `WebM` container, the same
//! encoding the browser recorder produces.

use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tokio::io::AsyncReadExt;

use crate::voice::{Inbox, Input};
use crate::{Error, Result};

/// EBML header magic that starts every `WebM` file
pub const WEBM_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

/// Location of a clip and how to slice it into fragments
#[derive(Debug, Clone)]
pub struct ClipSource {
    path: PathBuf,
    fragment_bytes: usize,
}

impl ClipSource {
    /// Describe a clip on disk
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, fragment_bytes: usize) -> Self {
        Self {
            path: path.into(),
            fragment_bytes: fragment_bytes.max(1),
        }
    }

    /// Path of the clip
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the clip exists at all
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.path.is_file()
    }

    /// Open the clip and check that it is `WebM`
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceUnavailable`] if the file cannot be read or is
    /// not a `WebM` file
    pub fn open(&self) -> Result<OpenClip> {
        let unavailable =
            |e: std::io::Error| Error::DeviceUnavailable(format!("{}: {e}", self.path.display()));

        let mut file = std::fs::File::open(&self.path).map_err(unavailable)?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic).map_err(unavailable)?;
        if magic != WEBM_MAGIC {
            return Err(Error::DeviceUnavailable(format!(
                "{} is not a WebM recording",
                self.path.display()
            )));
        }
        file.seek(SeekFrom::Start(0)).map_err(unavailable)?;

        tracing::debug!(path = %self.path.display(), "clip opened");

        Ok(OpenClip {
            file: tokio::fs::File::from_std(file),
            fragment_bytes: self.fragment_bytes,
        })
    }
}

/// A validated clip ready to be replayed
#[derive(Debug)]
pub struct OpenClip {
    file: tokio::fs::File,
    fragment_bytes: usize,
}

impl OpenClip {
    /// Replay the clip as fragments, then request a stop
    ///
    /// Reaching the end of the clip acts like the user pressing stop.
    pub async fn replay(mut self, inbox: Inbox) {
        let mut fragments = 0usize;

        loop {
            let mut buf = vec![0u8; self.fragment_bytes];
            match self.file.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    buf.truncate(n);
                    fragments += 1;
                    inbox.send(Input::FragmentReceived(buf));
                }
                Err(e) => {
                    tracing::error!(error = %e, "clip read failed");
                    inbox.send(Input::RecorderFailed(Error::Recorder(e.to_string())));
                    return;
                }
            }
        }

        tracing::debug!(fragments, "clip replayed");
        inbox.send(Input::StopRequested);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_clip(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_missing_clip_is_unavailable() {
        let source = ClipSource::new("/nonexistent/recording.webm", 1024);
        assert!(!source.is_available());
        assert!(matches!(source.open(), Err(Error::DeviceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_rejects_non_webm() {
        let file = write_clip(b"RIFF\0\0\0\0WAVEfmt ");
        let source = ClipSource::new(file.path(), 1024);

        assert!(source.is_available());
        let err = source.open().unwrap_err();
        assert!(err.to_string().contains("not a WebM recording"));
    }

    #[tokio::test]
    async fn test_rejects_short_file() {
        let file = write_clip(&[0x1A, 0x45]);
        let source = ClipSource::new(file.path(), 1024);
        assert!(matches!(source.open(), Err(Error::DeviceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_accepts_webm_header() {
        let mut bytes = WEBM_MAGIC.to_vec();
        bytes.extend_from_slice(&[0u8; 10]);
        let file = write_clip(&bytes);

        assert!(ClipSource::new(file.path(), 4).open().is_ok());
    }

    #[tokio::test]
    async fn test_replay_slices_clip_then_stops() {
        let mut bytes = WEBM_MAGIC.to_vec();
        bytes.extend_from_slice(&[7u8; 6]);
        let file = write_clip(&bytes);
        let clip = ClipSource::new(file.path(), 4).open().unwrap();

        let (inbox, mut rx) = Inbox::channel();
        clip.replay(inbox).await;

        let mut fragments = Vec::new();
        let mut stopped = false;
        while let Ok(Some(input)) = rx.try_next() {
            match input {
                Input::FragmentReceived(data) => fragments.push(data),
                Input::StopRequested => stopped = true,
                other => panic!("unexpected input {other:?}"),
            }
        }

        assert!(stopped);
        assert!(fragments.iter().all(|f| !f.is_empty() && f.len() <= 4));
        assert_eq!(fragments.concat(), bytes);
    }
}
