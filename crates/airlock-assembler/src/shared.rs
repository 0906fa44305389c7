//! Thread-safe handle to one reception session.
//!
//! Every call takes the same lock, so duplicate detection and the
//! completeness check never interleave between two capture threads.
//! `finalize` holds the lock through key derivation; observations made
//! meanwhile wait for it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use airlock_core::TransferResult;
use airlock_crypto::KdfParams;
use secrecy::SecretString;

use crate::assembler::{Assembler, AssemblyState, Observation, ReceivedFile};

#[derive(Clone, Default)]
pub struct SharedAssembler {
    inner: Arc<Mutex<Assembler>>,
}

impl SharedAssembler {
    pub fn new() -> Self {
        Self::from_assembler(Assembler::new())
    }

    pub fn with_kdf_params(kdf: KdfParams) -> Self {
        Self::from_assembler(Assembler::with_kdf_params(kdf))
    }

    pub fn from_assembler(assembler: Assembler) -> Self {
        Self {
            inner: Arc::new(Mutex::new(assembler)),
        }
    }

    pub fn observe(&self, raw: &str) -> Observation {
        self.lock().observe(raw)
    }

    pub fn finalize(&self, password: &SecretString) -> TransferResult<ReceivedFile> {
        self.lock().finalize(password)
    }

    pub fn state(&self) -> AssemblyState {
        self.lock().state()
    }

    pub fn progress(&self) -> Option<(u64, u64)> {
        self.lock().progress()
    }

    pub fn missing_indices(&self) -> Vec<u64> {
        self.lock().missing_indices()
    }

    pub fn reset(&self) {
        self.lock().reset()
    }

    // Each Assembler method leaves the session consistent before it can
    // panic, so a poisoned lock still guards valid state.
    fn lock(&self) -> MutexGuard<'_, Assembler> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
