//! Snapshot provider registry: which balance sources may contribute vote power.

use crate::clock::Clock;
use crate::engine::{require_admin, require_nonzero, GovernanceEngine};
use crate::error::GovernanceError;
use crate::provider::ProviderDirectory;
use council_store::{ChangeSet, GovernanceStore};
use council_types::Address;

impl<S, C, D> GovernanceEngine<S, C, D>
where
    S: GovernanceStore,
    C: Clock,
    D: ProviderDirectory,
{
    /// Enable or disable a snapshot provider.
    ///
    /// Disabling never touches snapshots already frozen for the provider;
    /// it only blocks new snapshots and new ballots.
    pub fn set_snapshot_contract(
        &self,
        caller: &Address,
        provider: Address,
        enabled: bool,
    ) -> Result<(), GovernanceError> {
        let council = self.council()?;
        require_admin(&council, caller)?;
        require_nonzero(&provider)?;

        if self.store().provider_enabled(&provider)? == enabled {
            return Err(GovernanceError::NoChange);
        }
        if enabled && self.directory().resolve(&provider).is_none() {
            return Err(GovernanceError::NotAContract(provider));
        }

        let mut changes = ChangeSet::new();
        changes.set_provider_enabled(provider, enabled);
        self.commit(changes)?;
        self.bump("providers_updated");

        tracing::info!(%provider, enabled, "snapshot provider updated");
        Ok(())
    }

    /// Whether `provider` is currently allowed to contribute vote power.
    pub fn is_enabled(&self, provider: &Address) -> Result<bool, GovernanceError> {
        Ok(self.store().provider_enabled(provider)?)
    }

    pub fn enabled_providers(&self) -> Result<Vec<Address>, GovernanceError> {
        Ok(self.store().enabled_providers()?)
    }
}
