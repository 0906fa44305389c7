//! Reception session state machine.
//!
//! The session keeps the first frame seen at each index in a map keyed by
//! index, so duplicate detection is O(1) and completeness is a length check.
//! `total` and `filename` are pinned by the first accepted frame; frames
//! disagreeing with them are dropped without ending the session.

use std::collections::BTreeMap;

use airlock_chunks::{decode_frame, join};
use airlock_core::{Frame, TransferError, TransferResult, MAX_FRAMES};
use airlock_crypto::{decrypt_with_params, KdfParams};
use secrecy::SecretString;

/// Logical session state, derived from what has been collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyState {
    /// No frames yet
    Empty,
    /// Some but not all distinct indices held
    Collecting { received: u64, total: u64 },
    /// Every index in `0..total` held, file not yet emitted
    Complete { total: u64 },
}

/// Result of feeding one captured string to [`Assembler::observe`].
///
/// None of these end the session; rejected input is simply not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// Frame stored; `complete` is set once every index is present.
    Accepted { index: u64, total: u64, complete: bool },
    /// This index was already held; the first copy is kept.
    DuplicateIgnored { index: u64 },
    /// Frame belongs to a different transmission.
    SessionMismatch {
        expected_filename: String,
        expected_total: u64,
        got_filename: String,
        got_total: u64,
    },
    /// Input is not a valid frame.
    ForeignData { reason: String },
}

impl Observation {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Observation::Accepted { .. })
    }

    /// True for the `Accepted` observation that completed the set.
    pub fn completed(&self) -> bool {
        matches!(self, Observation::Accepted { complete: true, .. })
    }

    /// Map rejections onto the shared error taxonomy, for callers that
    /// report them. Accepted and duplicate observations yield `None`.
    pub fn rejection(&self) -> Option<TransferError> {
        match self {
            Observation::SessionMismatch {
                expected_filename,
                expected_total,
                got_filename,
                got_total,
            } => Some(TransferError::SessionMismatch {
                expected_filename: expected_filename.clone(),
                expected_total: *expected_total,
                got_filename: got_filename.clone(),
                got_total: *got_total,
            }),
            Observation::ForeignData { reason } => {
                Some(TransferError::ForeignData(reason.clone()))
            }
            _ => None,
        }
    }
}

/// A file recovered from a complete, authenticated transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFile {
    pub filename: String,
    pub data: Vec<u8>,
    /// Size advertised on the frames; informational only
    pub declared_size: u64,
}

struct Session {
    filename: String,
    total: u64,
    size: u64,
    frames: BTreeMap<u64, Frame>,
}

impl Session {
    fn received(&self) -> u64 {
        self.frames.len() as u64
    }

    fn is_complete(&self) -> bool {
        self.received() == self.total
    }

    /// Gaps between held indices, walked over the map's keys.
    fn missing(&self) -> Vec<u64> {
        let mut missing = Vec::with_capacity((self.total - self.received()) as usize);
        let mut next = 0;
        for &index in self.frames.keys() {
            missing.extend(next..index);
            next = index + 1;
        }
        missing.extend(next..self.total);
        missing
    }
}

/// Collects frames of one transmission and emits the decrypted file.
pub struct Assembler {
    session: Option<Session>,
    kdf: KdfParams,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler {
    /// Empty assembler using the standard KDF parameters.
    pub fn new() -> Self {
        Self::with_kdf_params(KdfParams::default())
    }

    /// Empty assembler with explicit KDF parameters (must match the sender's).
    pub fn with_kdf_params(kdf: KdfParams) -> Self {
        Self { session: None, kdf }
    }

    /// Ingest one decoded barcode string.
    pub fn observe(&mut self, raw: &str) -> Observation {
        match decode_frame(raw) {
            Ok(frame) => self.observe_frame(frame),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring foreign data");
                Observation::ForeignData {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Ingest an already-parsed frame.
    pub fn observe_frame(&mut self, frame: Frame) -> Observation {
        if !frame.is_well_formed() {
            return Observation::ForeignData {
                reason: format!(
                    "frame index {} / total {} outside 0 <= index < total <= {}",
                    frame.index(),
                    frame.total(),
                    MAX_FRAMES
                ),
            };
        }

        let index = frame.index();
        if let Some(session) = &self.session {
            if session.filename != frame.metadata.filename || session.total != frame.total() {
                tracing::warn!(
                    expected_filename = %session.filename,
                    expected_total = session.total,
                    got_filename = %frame.metadata.filename,
                    got_total = frame.total(),
                    "frame from another transmission"
                );
                return Observation::SessionMismatch {
                    expected_filename: session.filename.clone(),
                    expected_total: session.total,
                    got_filename: frame.metadata.filename,
                    got_total: frame.metadata.total,
                };
            }
            if session.frames.contains_key(&index) {
                return Observation::DuplicateIgnored { index };
            }
        } else {
            tracing::info!(
                filename = %frame.metadata.filename,
                total = frame.total(),
                "reception session started"
            );
        }

        let session = self.session.get_or_insert_with(|| Session {
            filename: frame.metadata.filename.clone(),
            total: frame.metadata.total,
            size: frame.metadata.size,
            frames: BTreeMap::new(),
        });

        let total = session.total;
        session.frames.insert(index, frame);
        let complete = session.is_complete();

        tracing::debug!(index, total, received = session.received(), "frame accepted");
        if complete {
            tracing::info!(filename = %session.filename, total, "all frames received");
        }

        Observation::Accepted {
            index,
            total,
            complete,
        }
    }

    pub fn state(&self) -> AssemblyState {
        match &self.session {
            None => AssemblyState::Empty,
            Some(s) if s.is_complete() => AssemblyState::Complete { total: s.total },
            Some(s) => AssemblyState::Collecting {
                received: s.received(),
                total: s.total,
            },
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state(), AssemblyState::Complete { .. })
    }

    /// `(received, total)` for the current session, if one has started.
    pub fn progress(&self) -> Option<(u64, u64)> {
        self.session.as_ref().map(|s| (s.received(), s.total))
    }

    /// Indices not yet received, ascending. Empty before the first frame.
    pub fn missing_indices(&self) -> Vec<u64> {
        self.session.as_ref().map(Session::missing).unwrap_or_default()
    }

    /// Filename pinned by the first accepted frame.
    pub fn filename(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.filename.as_str())
    }

    /// Drop everything collected and return to `Empty`.
    pub fn reset(&mut self) {
        if self.session.take().is_some() {
            tracing::info!("reception session reset");
        }
    }

    /// Join, decrypt, and emit the file, ending the session.
    ///
    /// Before completion this fails with `IncompleteTransmission` and leaves
    /// the session untouched. Once complete, the session is consumed whether
    /// decryption succeeds or fails (`AuthenticationFailed` /
    /// `MalformedEnvelope`).
    pub fn finalize(&mut self, password: &SecretString) -> TransferResult<ReceivedFile> {
        let session = match self.session.take() {
            Some(s) if s.is_complete() => s,
            Some(s) => {
                let err = TransferError::IncompleteTransmission {
                    received: s.received(),
                    total: s.total,
                    missing: s.missing(),
                };
                self.session = Some(s);
                return Err(err);
            }
            None => {
                return Err(TransferError::IncompleteTransmission {
                    received: 0,
                    total: 0,
                    missing: Vec::new(),
                });
            }
        };

        // BTreeMap yields ascending indices, which is exactly join's precondition
        let frames: Vec<Frame> = session.frames.into_values().collect();
        let text = join(&frames);

        let data = decrypt_with_params(&text, password, &self.kdf).map_err(|e| {
            tracing::warn!(filename = %session.filename, error = %e, "finalize failed; session discarded");
            e
        })?;

        if data.len() as u64 != session.size {
            tracing::warn!(
                declared = session.size,
                actual = data.len(),
                "declared size differs from decrypted length"
            );
        }

        tracing::info!(filename = %session.filename, bytes = data.len(), "file reconstructed");
        Ok(ReceivedFile {
            filename: session.filename,
            data,
            declared_size: session.size,
        })
    }
}
