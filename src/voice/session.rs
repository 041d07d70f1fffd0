//! Recording sessions

use std::fmt;

use crate::api::AudioUpload;

/// Identifier of one recording, used to correlate logs and uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Wrap a raw session number
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rec-{}", self.0)
    }
}

/// Audio fragments collected during one recording
///
/// Fragments are kept in arrival order and only joined when the session is
/// finalized.
#[derive(Debug)]
pub struct RecordingSession {
    id: SessionId,
    fragments: Vec<Vec<u8>>,
    bytes: usize,
}

impl RecordingSession {
    /// Open an empty session
    #[must_use]
    pub const fn new(id: SessionId) -> Self {
        Self {
            id,
            fragments: Vec::new(),
            bytes: 0,
        }
    }

    /// Session identifier
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Append one fragment
    pub fn push(&mut self, fragment: Vec<u8>) {
        self.bytes += fragment.len();
        self.fragments.push(fragment);
    }

    /// Number of fragments received so far
    #[must_use]
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Total bytes received so far
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        self.bytes
    }

    /// Consume the session, joining all fragments into one upload
    #[must_use]
    pub fn finish(self) -> AudioUpload {
        let mut audio = Vec::with_capacity(self.bytes);
        for fragment in self.fragments {
            audio.extend_from_slice(&fragment);
        }

        AudioUpload {
            session: self.id,
            audio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragments_joined_in_order() {
        let mut session = RecordingSession::new(SessionId::new(3));
        session.push(vec![1, 2]);
        session.push(vec![]);
        session.push(vec![3, 4, 5]);

        assert_eq!(session.fragment_count(), 3);
        assert_eq!(session.byte_len(), 5);

        let upload = session.finish();
        assert_eq!(upload.session, SessionId::new(3));
        assert_eq!(upload.audio, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_empty_session() {
        let upload = RecordingSession::new(SessionId::new(1)).finish();
        assert!(upload.is_empty());
    }

    #[test]
    fn test_session_id_display() {
        assert_eq!(SessionId::new(42).to_string(), "rec-42");
    }
}
