//! The master-key lifecycle engine.
//!
//! `VaultEngine` owns the single in-memory master key and moves between
//! three states:
//!
//! ```text
//!                 fresh_start / unlock
//!  Uninitialized ──────────────────────────────► Active
//!        │                                         ▲  │ rotate_passphrase,
//!        │ session_start                           │  │ encrypt/decrypt
//!        ▼          cache hit / good passphrase    │  ▼
//!  AwaitingPassphrase ─────────────────────────────┘ Active
//!        ▲   │
//!        └───┘ recover_with_passphrase (wrong passphrase)
//! ```
//!
//! Resuming a session first tries the *session cache*: the master key
//! wrapped under a session token and kept in the injected
//! [`KeyValueStore`].  Any problem with the cache (absent, unreadable,
//! malformed, wrong token) is only a reason to fall back to the
//! passphrase-wrapped record, never an error.  A successful passphrase
//! recovery re-writes the cache under the current token.
//!
//! Every transition into `Active` replaces the cached key; no state ever
//! holds two master keys.

use std::fmt;

use tracing::{debug, info, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::{decrypt, derive_key, encrypt, Envelope, SessionToken, SymmetricKey};
use crate::errors::{Result, VaultError};
use crate::storage::KeyValueStore;

/// Storage key of the session cache entry, shared with the legacy tool.
pub const DEFAULT_SESSION_TAG: &str = "pmengine_masterkey";

/// The externally visible lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No master-key record loaded.
    Uninitialized,
    /// A record is loaded but the master key is still locked.
    AwaitingPassphrase,
    /// The master key is in memory.
    Active,
}

/// Where a recovered master key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveredFrom {
    SessionCache,
    Passphrase,
}

/// Why a supplied passphrase did not unlock the master-key record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassphraseRejection {
    /// Authentication failed: wrong passphrase or a tampered record.
    WrongPassphrase,
    /// The record opened but did not hold a valid key, or never parsed.
    MalformedRecord(String),
}

impl fmt::Display for PassphraseRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongPassphrase => f.write_str("Passphrase did not work. Please try again"),
            Self::MalformedRecord(reason) => {
                write!(f, "The master key record is malformed: {reason}")
            }
        }
    }
}

/// Outcome of a session start or passphrase recovery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    /// The engine is `Active`.
    Recovered(RecoveredFrom),
    /// The engine is `AwaitingPassphrase`.  `None` means no passphrase was
    /// tried yet; `Some` carries the reason the last one failed.
    NeedsPassphrase(Option<PassphraseRejection>),
}

impl Recovery {
    pub fn is_recovered(&self) -> bool {
        matches!(self, Self::Recovered(_))
    }

    pub fn rejection(&self) -> Option<&PassphraseRejection> {
        match self {
            Self::NeedsPassphrase(reason) => reason.as_ref(),
            Self::Recovered(_) => None,
        }
    }
}

enum Slot {
    Uninitialized,
    Awaiting {
        wrapped: Envelope,
        token: SessionToken,
    },
    Active {
        master_key: SymmetricKey,
        wrapped: Envelope,
        token: Option<SessionToken>,
    },
}

/// Owns the master key and orchestrates KDF, cipher, codec and storage.
pub struct VaultEngine<S> {
    store: S,
    session_tag: String,
    slot: Slot,
}

impl<S: KeyValueStore> VaultEngine<S> {
    /// Create an engine in the `Uninitialized` state using the default
    /// session cache tag.
    pub fn new(store: S) -> Self {
        Self::with_session_tag(store, DEFAULT_SESSION_TAG)
    }

    /// Create an engine that keeps its session cache under `tag`.
    pub fn with_session_tag(store: S, tag: impl Into<String>) -> Self {
        Self {
            store,
            session_tag: tag.into(),
            slot: Slot::Uninitialized,
        }
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub fn state(&self) -> EngineState {
        match self.slot {
            Slot::Uninitialized => EngineState::Uninitialized,
            Slot::Awaiting { .. } => EngineState::AwaitingPassphrase,
            Slot::Active { .. } => EngineState::Active,
        }
    }

    /// The passphrase-wrapped master-key record currently loaded, if any.
    pub fn wrapped_master_key(&self) -> Option<&Envelope> {
        match &self.slot {
            Slot::Uninitialized => None,
            Slot::Awaiting { wrapped, .. } | Slot::Active { wrapped, .. } => Some(wrapped),
        }
    }

    /// The unlocked master key.
    pub fn master_key(&self) -> Result<&SymmetricKey> {
        match &self.slot {
            Slot::Active { master_key, .. } => Ok(master_key),
            _ => Err(VaultError::State("master key is locked")),
        }
    }

    /// The session token the cache is wrapped under, if this session has one.
    pub fn session_token(&self) -> Option<&SessionToken> {
        match &self.slot {
            Slot::Uninitialized => None,
            Slot::Awaiting { token, .. } => Some(token),
            Slot::Active { token, .. } => token.as_ref(),
        }
    }

    pub fn session_tag(&self) -> &str {
        &self.session_tag
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Start over with a brand-new random master key.
    ///
    /// Wraps the key under `derive_key(passphrase)`, caches it under
    /// `token`, and returns the passphrase-wrapped record for the caller
    /// to persist.
    pub fn fresh_start(&mut self, passphrase: &str, token: SessionToken) -> Result<Envelope> {
        self.fresh_start_with_key(SymmetricKey::generate(), passphrase, token)
    }

    /// Like [`fresh_start`](Self::fresh_start) but adopts an existing key.
    pub fn fresh_start_with_key(
        &mut self,
        master_key: SymmetricKey,
        passphrase: &str,
        token: SessionToken,
    ) -> Result<Envelope> {
        let wrapped = encrypt(&derive_key(passphrase), master_key.as_bytes())?;
        self.cache_master_key(&master_key, &token);

        self.slot = Slot::Active {
            master_key,
            wrapped: wrapped.clone(),
            token: Some(token),
        };
        debug!("fresh start: new master key is active");
        Ok(wrapped)
    }

    /// Resume a session from a passphrase-wrapped record.
    ///
    /// Tries the session cache first.  If that does not yield a key and
    /// `passphrase` is given, tries the record; otherwise the engine waits
    /// in `AwaitingPassphrase` for [`recover_with_passphrase`](Self::recover_with_passphrase).
    pub fn session_start(
        &mut self,
        wrapped: Envelope,
        token: SessionToken,
        passphrase: Option<&str>,
    ) -> Recovery {
        if let Some(master_key) = self.read_session_cache(&token) {
            info!("master key recovered from session cache");
            self.slot = Slot::Active {
                master_key,
                wrapped,
                token: Some(token),
            };
            return Recovery::Recovered(RecoveredFrom::SessionCache);
        }

        self.slot = Slot::Awaiting { wrapped, token };
        match passphrase {
            Some(passphrase) => self.try_passphrase(passphrase),
            None => Recovery::NeedsPassphrase(None),
        }
    }

    /// [`session_start`](Self::session_start), notifying `prompt` when the
    /// caller needs to obtain a passphrase.
    ///
    /// `prompt` receives the failure reason of the last attempt, or `None`
    /// if no passphrase was tried.  The engine never retries on its own.
    pub fn session_start_with_prompt<F>(
        &mut self,
        wrapped: Envelope,
        token: SessionToken,
        passphrase: Option<&str>,
        prompt: F,
    ) -> Recovery
    where
        F: FnOnce(Option<&PassphraseRejection>),
    {
        let recovery = self.session_start(wrapped, token, passphrase);
        if let Recovery::NeedsPassphrase(reason) = &recovery {
            prompt(reason.as_ref());
        }
        recovery
    }

    /// Try a passphrase while `AwaitingPassphrase`.
    pub fn recover_with_passphrase(&mut self, passphrase: &str) -> Result<Recovery> {
        match self.state() {
            EngineState::AwaitingPassphrase => Ok(self.try_passphrase(passphrase)),
            EngineState::Uninitialized => Err(VaultError::State(
                "no master key record loaded, start a session first",
            )),
            EngineState::Active => Err(VaultError::State("master key is already unlocked")),
        }
    }

    /// Unlock a record with its passphrase, bypassing the session cache.
    pub fn unlock(&mut self, wrapped: Envelope, passphrase: &str) -> Result<()> {
        let master_key = unwrap_key(&wrapped, &derive_key(passphrase))?;
        self.slot = Slot::Active {
            master_key,
            wrapped,
            token: None,
        };
        debug!("master key unlocked with passphrase");
        Ok(())
    }

    /// Re-wrap the master key under a new passphrase.
    ///
    /// Returns the superseding record for the caller to persist.  The
    /// session cache is left untouched since the key itself is unchanged.
    pub fn rotate_passphrase(&mut self, new_passphrase: &str) -> Result<Envelope> {
        match &mut self.slot {
            Slot::Active {
                master_key,
                wrapped,
                ..
            } => {
                let rewrapped = encrypt(&derive_key(new_passphrase), master_key.as_bytes())?;
                *wrapped = rewrapped.clone();
                debug!("master key re-wrapped under a new passphrase");
                Ok(rewrapped)
            }
            _ => Err(VaultError::State("cannot rotate a locked master key")),
        }
    }

    /// Drop the master key and return to `Uninitialized`.
    pub fn lock(&mut self) {
        self.slot = Slot::Uninitialized;
        debug!("engine locked");
    }

    // ------------------------------------------------------------------
    // Secrets
    // ------------------------------------------------------------------

    /// Encrypt a secret under the master key.
    pub fn encrypt_secret(&self, plaintext: &[u8]) -> Result<Envelope> {
        let master_key = self
            .master_key()
            .map_err(|_| VaultError::State("cannot encrypt before a master key is unlocked"))?;
        encrypt(master_key, plaintext)
    }

    /// Decrypt a secret that was encrypted under the master key.
    pub fn decrypt_secret(&self, envelope: &Envelope) -> Result<Zeroizing<Vec<u8>>> {
        let master_key = self
            .master_key()
            .map_err(|_| VaultError::State("cannot decrypt before a master key is unlocked"))?;
        decrypt(master_key, envelope)
    }

    /// Decrypt a secret and require it to be UTF-8 text.
    pub fn decrypt_secret_text(&self, envelope: &Envelope) -> Result<Zeroizing<String>> {
        let mut plaintext = self.decrypt_secret(envelope)?;
        let bytes = std::mem::take(&mut *plaintext);
        match String::from_utf8(bytes) {
            Ok(text) => Ok(Zeroizing::new(text)),
            Err(e) => {
                e.into_bytes().zeroize();
                Err(VaultError::NotText)
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn try_passphrase(&mut self, passphrase: &str) -> Recovery {
        let (wrapped, token) = match std::mem::replace(&mut self.slot, Slot::Uninitialized) {
            Slot::Awaiting { wrapped, token } => (wrapped, token),
            other => {
                self.slot = other;
                return Recovery::NeedsPassphrase(None);
            }
        };

        match unwrap_key(&wrapped, &derive_key(passphrase)) {
            Ok(master_key) => {
                info!("master key recovered with passphrase");
                self.cache_master_key(&master_key, &token);
                self.slot = Slot::Active {
                    master_key,
                    wrapped,
                    token: Some(token),
                };
                Recovery::Recovered(RecoveredFrom::Passphrase)
            }
            Err(err) => {
                let rejection = match err {
                    VaultError::Auth => PassphraseRejection::WrongPassphrase,
                    other => PassphraseRejection::MalformedRecord(other.to_string()),
                };
                warn!(reason = %rejection, "passphrase did not unlock the master key record");
                self.slot = Slot::Awaiting { wrapped, token };
                Recovery::NeedsPassphrase(Some(rejection))
            }
        }
    }

    /// Look up and open the session cache entry.  Every failure is logged
    /// with its own cause and reported as `None`.
    fn read_session_cache(&self, token: &SessionToken) -> Option<SymmetricKey> {
        let cached = match self.store.get(&self.session_tag) {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!(tag = %self.session_tag, "no session cache entry");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "session cache is unreadable, falling back to passphrase");
                return None;
            }
        };

        let envelope = match Envelope::decode(&cached) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "session cache entry is malformed, falling back to passphrase");
                return None;
            }
        };

        match unwrap_key(&envelope, &token.as_key()) {
            Ok(master_key) => Some(master_key),
            Err(VaultError::Auth) => {
                info!("session cache entry was not sealed with this session token");
                None
            }
            Err(e) => {
                warn!(error = %e, "session cache entry holds no valid key, falling back to passphrase");
                None
            }
        }
    }

    /// Wrap the master key under the session token and store it.
    ///
    /// Best-effort: a failed write only costs a passphrase prompt on the
    /// next session start.
    fn cache_master_key(&mut self, master_key: &SymmetricKey, token: &SessionToken) {
        let result = encrypt(&token.as_key(), master_key.as_bytes())
            .and_then(|envelope| self.store.set(&self.session_tag, &envelope.encode()));
        match result {
            Ok(()) => debug!(tag = %self.session_tag, "session cache updated"),
            Err(e) => warn!(error = %e, "unable to update the session cache"),
        }
    }
}

/// Open a wrapped key and check it is a full-size key.
fn unwrap_key(wrapped: &Envelope, wrapping_key: &SymmetricKey) -> Result<SymmetricKey> {
    let raw = decrypt(wrapping_key, wrapped)?;
    SymmetricKey::from_slice(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn new_engine_is_uninitialized() {
        let engine = VaultEngine::new(MemoryStore::new());
        assert_eq!(engine.state(), EngineState::Uninitialized);
        assert!(engine.wrapped_master_key().is_none());
        assert_eq!(engine.session_tag(), DEFAULT_SESSION_TAG);
    }

    #[test]
    fn lock_returns_to_uninitialized() {
        let mut engine = VaultEngine::new(MemoryStore::new());
        engine.fresh_start("pw", SessionToken::generate()).unwrap();
        engine.lock();
        assert_eq!(engine.state(), EngineState::Uninitialized);
        assert!(engine.encrypt_secret(b"x").is_err());
    }

    #[test]
    fn recover_without_session_is_a_state_error() {
        let mut engine = VaultEngine::new(MemoryStore::new());
        assert!(matches!(
            engine.recover_with_passphrase("pw"),
            Err(VaultError::State(_))
        ));
    }

    #[test]
    fn recover_while_active_is_a_state_error() {
        let mut engine = VaultEngine::new(MemoryStore::new());
        engine.fresh_start("pw", SessionToken::generate()).unwrap();
        assert!(matches!(
            engine.recover_with_passphrase("pw"),
            Err(VaultError::State(_))
        ));
        assert_eq!(engine.state(), EngineState::Active);
    }

    #[test]
    fn rejection_messages_are_user_facing() {
        assert_eq!(
            PassphraseRejection::WrongPassphrase.to_string(),
            "Passphrase did not work. Please try again"
        );
        assert!(PassphraseRejection::MalformedRecord("short key".into())
            .to_string()
            .contains("short key"));
    }

    #[test]
    fn record_holding_a_short_key_is_malformed() {
        let wrapped = encrypt(&derive_key("pw"), &[1u8; 16]).unwrap();
        let mut engine = VaultEngine::new(MemoryStore::new());
        let recovery = engine.session_start(wrapped, SessionToken::generate(), Some("pw"));
        assert!(matches!(
            recovery.rejection(),
            Some(PassphraseRejection::MalformedRecord(_))
        ));
        assert_eq!(engine.state(), EngineState::AwaitingPassphrase);
    }
}
