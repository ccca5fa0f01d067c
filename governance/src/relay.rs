//! Cross-chain relay: guardian-verified inbound messages applied exactly once,
//! and the local outbox.

use crate::clock::Clock;
use crate::engine::{require_admin, require_nonzero, require_period, GovernanceEngine};
use crate::error::GovernanceError;
use crate::provider::ProviderDirectory;
use council_messages::{message_hash, Envelope, GovernancePayload};
use council_store::{
    BallotRecord, ChangeSet, ConsumedMessage, CouncilState, ElectionRecord, GovernanceStore,
    GuardianSet, OutboundRecord, Tally,
};
use council_types::{Address, ChainId, EpochPeriod, MessageHash, PublicKey, Timestamp};
use std::collections::BTreeSet;

impl<S, C, D> GovernanceEngine<S, C, D>
where
    S: GovernanceStore,
    C: Clock,
    D: ProviderDirectory,
{
    /// Trust `guardians` to vouch for messages originating on `chain`.
    pub fn set_guardian_set(
        &self,
        caller: &Address,
        chain: ChainId,
        guardians: Vec<PublicKey>,
        quorum: u8,
    ) -> Result<(), GovernanceError> {
        let council = self.council()?;
        require_admin(&council, caller)?;
        if chain == council.local_chain {
            return Err(GovernanceError::InvalidGuardianSet(
                "the local chain needs no guardians".into(),
            ));
        }
        if guardians.len() > u8::MAX as usize {
            return Err(GovernanceError::InvalidGuardianSet("too many guardians".into()));
        }
        if quorum == 0 || quorum as usize > guardians.len() {
            return Err(GovernanceError::InvalidGuardianSet(format!(
                "quorum {quorum} outside 1..={}",
                guardians.len()
            )));
        }
        let distinct: BTreeSet<[u8; 32]> = guardians.iter().map(|k| k.0).collect();
        if distinct.len() != guardians.len() {
            return Err(GovernanceError::InvalidGuardianSet("duplicate guardian key".into()));
        }

        let size = guardians.len();
        let mut changes = ChangeSet::new();
        changes.put_guardian_set(GuardianSet {
            chain,
            guardians,
            quorum,
        });
        self.commit(changes)?;
        tracing::info!(%chain, guardians = size, quorum, "guardian set updated");
        Ok(())
    }

    pub fn guardian_set(&self, chain: ChainId) -> Result<Option<GuardianSet>, GovernanceError> {
        Ok(self.store().guardian_set(chain)?)
    }

    /// Verify, deduplicate and apply one inbound message.
    ///
    /// Nothing is written unless every check passes; the consumption mark and
    /// the payload's effect commit together.
    pub fn receive_message(&self, envelope: &Envelope) -> Result<MessageHash, GovernanceError> {
        let result = self.try_receive(envelope);
        match &result {
            Ok(hash) => {
                self.bump("messages_received");
                tracing::info!(origin = %envelope.origin, sequence = envelope.sequence, %hash, "message applied");
            }
            Err(e) => {
                self.bump("messages_rejected");
                tracing::warn!(origin = %envelope.origin, sequence = envelope.sequence, error = %e, "message rejected");
            }
        }
        result
    }

    fn try_receive(&self, envelope: &Envelope) -> Result<MessageHash, GovernanceError> {
        let hash = envelope.hash();
        let origin = envelope.origin;

        let set = self
            .store()
            .guardian_set(origin)?
            .ok_or(GovernanceError::InvalidSignature {
                origin,
                valid: 0,
                required: 0,
            })?;
        let required = set.quorum as usize;
        let valid = envelope.valid_signature_count(&set.guardians);
        if required == 0 || valid < required {
            return Err(GovernanceError::InvalidSignature {
                origin,
                valid,
                required,
            });
        }

        if self.store().is_consumed(&hash)? {
            return Err(GovernanceError::MessageAlreadyConsumed(hash));
        }
        if let Some(consumed_by) = self.store().consumed_sequence(origin, envelope.sequence)? {
            return Err(GovernanceError::SequenceAlreadyConsumed {
                origin,
                sequence: envelope.sequence,
                consumed_by,
            });
        }

        let payload = envelope.decode_payload()?;
        let now = self.now();
        let (council, record) = self.current()?;
        if payload.election() != council.current_election {
            return Err(GovernanceError::ElectionMismatch {
                expected: council.current_election,
                found: payload.election(),
            });
        }

        let mut changes = ChangeSet::new();
        self.stage_payload(&council, record, origin, payload, now, &mut changes)?;
        changes.mark_consumed(
            hash,
            ConsumedMessage {
                origin,
                sequence: envelope.sequence,
                consumed_at: now,
            },
        );
        self.commit(changes)?;
        Ok(hash)
    }

    fn stage_payload(
        &self,
        council: &CouncilState,
        mut record: ElectionRecord,
        origin: ChainId,
        payload: GovernancePayload,
        now: Timestamp,
        changes: &mut ChangeSet,
    ) -> Result<(), GovernanceError> {
        let election = council.current_election;
        match payload {
            GovernancePayload::NominationAnnounced { candidate, .. } => {
                require_period(&record, EpochPeriod::Nomination, now)?;
                require_nonzero(&candidate)?;
                // Announcements for a candidate already known are still consumed.
                if record.nominees.insert(candidate) {
                    changes.put_election(election, record);
                }
            }
            GovernancePayload::BallotPower {
                voter,
                contributions,
                ..
            } => {
                require_period(&record, EpochPeriod::Voting, now)?;
                require_nonzero(&voter)?;
                if self.store().cast_vote(election, &voter)?.is_some() {
                    return Err(GovernanceError::VoteAlreadyCast(voter));
                }
                let mut ballot = BallotRecord::default();
                for (provider, power) in contributions {
                    ballot.set_contribution(provider, power);
                }
                changes.put_ballot(election, voter, origin, ballot);
            }
            GovernancePayload::Tally { votes, .. } => {
                require_period(&record, EpochPeriod::Evaluation, now)?;
                if record.evaluated {
                    return Err(GovernanceError::ElectionAlreadyEvaluated);
                }
                let mut tally = Tally::new();
                for (candidate, count) in votes {
                    let entry = tally.entry(candidate).or_insert(0);
                    *entry = entry.saturating_add(count);
                }
                changes.put_remote_tally(election, origin, tally);
            }
        }
        Ok(())
    }

    pub fn is_consumed(&self, hash: &MessageHash) -> Result<bool, GovernanceError> {
        Ok(self.store().is_consumed(hash)?)
    }

    /// Append a payload to the outbox under the next local sequence number.
    pub fn emit(
        &self,
        destination: ChainId,
        payload: &GovernancePayload,
    ) -> Result<OutboundRecord, GovernanceError> {
        let council = self.council()?;
        let mut changes = ChangeSet::new();
        let record = self.stage_outbound(&council, destination, payload, &mut changes)?;
        self.commit(changes)?;
        self.emitted(&record, payload);
        Ok(record)
    }

    fn stage_outbound(
        &self,
        council: &CouncilState,
        destination: ChainId,
        payload: &GovernancePayload,
        changes: &mut ChangeSet,
    ) -> Result<OutboundRecord, GovernanceError> {
        let bytes = payload.encode()?;
        let sequence = self
            .store()
            .last_outbound_sequence()?
            .unwrap_or(0)
            .checked_add(1)
            .ok_or(GovernanceError::OutboxExhausted)?;
        let record = OutboundRecord {
            sequence,
            destination,
            hash: message_hash(council.local_chain, sequence, &bytes),
            payload: bytes,
            emitted_at: self.now(),
        };
        changes.append_outbound(record.clone());
        Ok(record)
    }

    fn emitted(&self, record: &OutboundRecord, payload: &GovernancePayload) {
        self.bump("messages_emitted");
        tracing::info!(
            destination = %record.destination,
            sequence = record.sequence,
            kind = payload.kind(),
            hash = %record.hash,
            "message emitted"
        );
    }

    /// Announce a locally nominated candidate to another precinct.
    pub fn emit_nomination(
        &self,
        candidate: &Address,
        destination: ChainId,
    ) -> Result<OutboundRecord, GovernanceError> {
        let now = self.now();
        let (council, record) = self.current()?;
        require_period(&record, EpochPeriod::Nomination, now)?;
        if !record.nominees.contains(candidate) {
            return Err(GovernanceError::NotNominated(*candidate));
        }
        self.emit(
            destination,
            &GovernancePayload::NominationAnnounced {
                election: council.current_election,
                candidate: *candidate,
            },
        )
    }

    /// Send `voter`'s local-precinct vote power to another precinct.
    ///
    /// The local ballot is marked exported in the same commit, so the power
    /// is spent in `destination` only and never counted here as well.
    pub fn emit_ballot(
        &self,
        voter: &Address,
        destination: ChainId,
    ) -> Result<OutboundRecord, GovernanceError> {
        let now = self.now();
        let (council, record) = self.current()?;
        require_period(&record, EpochPeriod::Voting, now)?;
        let election = council.current_election;
        if self.store().cast_vote(election, voter)?.is_some() {
            return Err(GovernanceError::VoteAlreadyCast(*voter));
        }
        let mut ballot = self
            .store()
            .ballot(election, voter, council.local_chain)?
            .unwrap_or_default();
        if let Some(exported) = ballot.exported_to {
            return Err(GovernanceError::BallotExported {
                voter: *voter,
                destination: exported,
            });
        }
        if ballot.voting_power() == 0 {
            return Err(GovernanceError::NoVotingPower(*voter));
        }

        let payload = GovernancePayload::BallotPower {
            election,
            voter: *voter,
            contributions: ballot.contributions.iter().map(|(p, v)| (*p, *v)).collect(),
        };
        let mut changes = ChangeSet::new();
        let outbound = self.stage_outbound(&council, destination, &payload, &mut changes)?;
        ballot.exported_to = Some(destination);
        changes.put_ballot(election, *voter, council.local_chain, ballot);
        self.commit(changes)?;
        self.emitted(&outbound, &payload);
        Ok(outbound)
    }

    /// Send the local tally to another precinct for evaluation.
    pub fn emit_tally(&self, destination: ChainId) -> Result<OutboundRecord, GovernanceError> {
        let now = self.now();
        let (council, record) = self.current()?;
        require_period(&record, EpochPeriod::Evaluation, now)?;
        self.emit(
            destination,
            &GovernancePayload::Tally {
                election: council.current_election,
                votes: record.local_tally.into_iter().collect(),
            },
        )
    }

    /// Outbound messages with sequence greater than `after`.
    pub fn outbound_since(&self, after: u64) -> Result<Vec<OutboundRecord>, GovernanceError> {
        Ok(self.store().outbound_since(after)?)
    }

    /// Outbound messages as unsigned envelopes, ready for guardians to sign.
    pub fn outbound_envelopes(&self, after: u64) -> Result<Vec<Envelope>, GovernanceError> {
        let origin = self.local_chain()?;
        Ok(self
            .outbound_since(after)?
            .into_iter()
            .map(|r| Envelope::new(origin, r.sequence, r.payload))
            .collect())
    }
}
