//! Nullable transport: carries outbound messages between in-process engines.

use council_governance::{Clock, GovernanceEngine, GovernanceError, ProviderDirectory};
use council_messages::Envelope;
use council_store::{GovernanceStore, StoreError};
use council_types::{KeyPair, MessageHash, PublicKey};
use std::sync::Mutex;

/// Deterministic guardian keys for tests; seed byte `i + 1` for guardian `i`.
pub fn guardian_keys(count: u8) -> Vec<KeyPair> {
    (0..count)
        .map(|i| council_crypto::keypair_from_seed(&[i + 1; 32]))
        .collect()
}

pub fn public_keys(keys: &[KeyPair]) -> Vec<PublicKey> {
    keys.iter().map(|k| k.public.clone()).collect()
}

/// Pulls a source engine's outbox, signs each message with the configured
/// guardians, and hands the envelopes to a target engine.
pub struct NullTransport {
    signers: Vec<(u8, KeyPair)>,
    cursor: Mutex<u64>,
    delivered: Mutex<Vec<Envelope>>,
}

impl NullTransport {
    /// Sign with the given `(guardian_index, key)` pairs.
    pub fn new(signers: Vec<(u8, KeyPair)>) -> Self {
        Self {
            signers,
            cursor: Mutex::new(0),
            delivered: Mutex::new(Vec::new()),
        }
    }

    /// Sign with every key, indexed by position.
    pub fn with_guardians(keys: Vec<KeyPair>) -> Self {
        Self::new(keys.into_iter().enumerate().map(|(i, k)| (i as u8, k)).collect())
    }

    /// New outbound messages since the last collect, signed.
    pub fn collect<S, C, D>(
        &self,
        source: &GovernanceEngine<S, C, D>,
    ) -> Result<Vec<Envelope>, GovernanceError>
    where
        S: GovernanceStore,
        C: Clock,
        D: ProviderDirectory,
    {
        let mut cursor = self
            .cursor
            .lock()
            .map_err(|_| StoreError::Backend("transport poisoned".into()))?;
        let envelopes: Vec<Envelope> = source
            .outbound_envelopes(*cursor)?
            .into_iter()
            .map(|mut env| {
                for (index, key) in &self.signers {
                    env.sign(*index, &key.private);
                }
                env
            })
            .collect();
        if let Some(last) = envelopes.last() {
            *cursor = last.sequence;
        }
        Ok(envelopes)
    }

    /// Hand every envelope to `target`, returning each outcome in order.
    pub fn deliver<S, C, D>(
        &self,
        target: &GovernanceEngine<S, C, D>,
        envelopes: &[Envelope],
    ) -> Vec<Result<MessageHash, GovernanceError>>
    where
        S: GovernanceStore,
        C: Clock,
        D: ProviderDirectory,
    {
        if let Ok(mut log) = self.delivered.lock() {
            log.extend(envelopes.iter().cloned());
        }
        envelopes.iter().map(|e| target.receive_message(e)).collect()
    }

    /// Collect from `source` and deliver to `target`.
    pub fn relay<S1, C1, D1, S2, C2, D2>(
        &self,
        source: &GovernanceEngine<S1, C1, D1>,
        target: &GovernanceEngine<S2, C2, D2>,
    ) -> Result<Vec<Result<MessageHash, GovernanceError>>, GovernanceError>
    where
        S1: GovernanceStore,
        C1: Clock,
        D1: ProviderDirectory,
        S2: GovernanceStore,
        C2: Clock,
        D2: ProviderDirectory,
    {
        let envelopes = self.collect(source)?;
        Ok(self.deliver(target, &envelopes))
    }

    /// Every envelope handed to any target so far.
    pub fn delivered(&self) -> Vec<Envelope> {
        self.delivered.lock().map(|d| d.clone()).unwrap_or_default()
    }
}
