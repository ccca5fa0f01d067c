//! The council node: one chain's governance engine on durable storage.

use std::path::Path;

use council_governance::{GovernanceEngine, SystemClock};
use council_messages::Envelope;
use council_store::{RelayStore, SnapshotStore};
use council_store_lmdb::LmdbEnvironment;
use council_types::{
    Address, ChainId, ElectionId, EpochPeriod, EpochSchedule, KeyPair, MessageHash, Timestamp,
};
use serde::Serialize;

use crate::config::{GuardianKeyConfig, NodeConfig};
use crate::error::NodeError;
use crate::provider::ConfiguredProviders;

pub type NodeEngine = GovernanceEngine<LmdbEnvironment, SystemClock, ConfiguredProviders>;

/// Snapshot of the node's election state for display.
#[derive(Clone, Debug, Serialize)]
pub struct NodeStatus {
    pub chain: ChainId,
    pub now: Timestamp,
    pub election: ElectionId,
    pub period: EpochPeriod,
    pub schedule: EpochSchedule,
    pub administrator: Address,
    pub council_members: Vec<Address>,
    pub nominees: Vec<Address>,
    pub enabled_providers: Vec<Address>,
    pub evaluated: bool,
    pub outbound_messages: u64,
}

pub struct GovernanceNode {
    config: NodeConfig,
    engine: NodeEngine,
    guardian: Option<(u8, KeyPair)>,
}

impl GovernanceNode {
    /// Open storage and load providers. Relative provider and key paths are
    /// resolved against `base_dir`.
    pub fn open(config: NodeConfig, base_dir: &Path) -> Result<Self, NodeError> {
        config.validate()?;
        let data_dir = base_dir.join(&config.data_dir);
        let env = LmdbEnvironment::open(&data_dir, config.lmdb_map_size)?;
        let providers = ConfiguredProviders::load(&config.providers, base_dir, SystemClock)?;
        let guardian = match &config.guardian_key {
            Some(key) => Some(load_guardian_key(key, base_dir)?),
            None => None,
        };
        tracing::info!(
            chain = config.chain_id,
            data_dir = %data_dir.display(),
            providers = providers.len(),
            guardian = guardian.as_ref().map(|(i, _)| *i),
            "council node opened"
        );
        Ok(Self {
            engine: GovernanceEngine::new(env, SystemClock, providers),
            config,
            guardian,
        })
    }

    pub fn engine(&self) -> &NodeEngine {
        &self.engine
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Create the council and first epoch from configuration, then install
    /// the configured guardian sets.
    pub fn initialize(&self) -> Result<EpochSchedule, NodeError> {
        let administrator = self
            .config
            .administrator
            .ok_or_else(|| NodeError::Config("administrator is required to initialize".into()))?;
        let start = self
            .config
            .initial_epoch_start
            .map(Timestamp::new)
            .unwrap_or_else(|| self.engine.now());
        let schedule = self.config.settings.schedule_from(start);
        self.engine.initialize(
            administrator,
            self.config.chain(),
            self.config.settings,
            schedule,
        )?;
        self.install_guardian_sets(&administrator)?;
        Ok(schedule)
    }

    /// Apply every configured guardian set as `caller`.
    pub fn install_guardian_sets(&self, caller: &Address) -> Result<usize, NodeError> {
        for set in &self.config.guardian_sets {
            self.engine.set_guardian_set(
                caller,
                ChainId(set.chain),
                set.guardians.clone(),
                set.quorum,
            )?;
        }
        Ok(self.config.guardian_sets.len())
    }

    pub fn status(&self) -> Result<NodeStatus, NodeError> {
        let engine = &self.engine;
        let election = engine.current_election_id()?;
        let schedule = engine.get_epoch_schedule()?;
        let now = engine.now();
        Ok(NodeStatus {
            chain: engine.local_chain()?,
            now,
            election,
            period: schedule.period_at(now),
            schedule,
            administrator: engine.administrator()?,
            council_members: engine.council_members()?,
            nominees: engine.nominees(election)?,
            enabled_providers: engine.store().enabled_providers()?,
            evaluated: engine.is_evaluated(election)?,
            outbound_messages: engine.store().last_outbound_sequence()?.unwrap_or(0),
        })
    }

    /// Outbound envelopes after `after`, signed with this node's guardian key
    /// when one is configured.
    pub fn signed_outbox(&self, after: u64) -> Result<Vec<Envelope>, NodeError> {
        let mut envelopes = self.engine.outbound_envelopes(after)?;
        if let Some((index, key)) = &self.guardian {
            for envelope in &mut envelopes {
                envelope.sign(*index, &key.private);
            }
        }
        Ok(envelopes)
    }

    /// Apply an envelope read from a JSON file.
    pub fn receive_file(&self, path: &Path) -> Result<MessageHash, NodeError> {
        let json = std::fs::read_to_string(path)?;
        let envelope = Envelope::from_json(&json)?;
        Ok(self.engine.receive_message(&envelope)?)
    }
}

fn load_guardian_key(config: &GuardianKeyConfig, base_dir: &Path) -> Result<(u8, KeyPair), NodeError> {
    let path = base_dir.join(&config.seed_file);
    let text = std::fs::read_to_string(&path)
        .map_err(|e| NodeError::GuardianKey(format!("{}: {e}", path.display())))?;
    let bytes = hex::decode(text.trim()).map_err(|e| NodeError::GuardianKey(e.to_string()))?;
    let seed: [u8; 32] = bytes
        .try_into()
        .map_err(|_| NodeError::GuardianKey("seed must be 32 bytes".into()))?;
    Ok((config.index, council_crypto::keypair_from_seed(&seed)))
}
