//! Rent schedule parameters.
//!
//! Production networks run with the protocol constants; test networks and
//! the integration suites override individual fields through configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_UPGRADE_BLOCK, EVICTION_BOUNDARY, MIGRATION_GRACE_BLOCKS, RENT_ACCOUNT_COST,
    RENT_STIPEND, RENT_WORD_COST,
};
use crate::error::ParamsError;
use crate::types::EvictionBoundary;

/// Parameters of the rent schedule.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct RentParams {
    /// Flat per-block cost of an account.
    pub account_cost: u64,
    /// Per-block cost of each code word and each occupied storage slot.
    pub word_cost: u64,
    /// Minimum rent balance granted on activation.
    pub stipend: u64,
    /// First block at which rent accounting runs.
    pub upgrade_block: u64,
    /// Blocks of rent granted to pre-existing accounts at migration.
    pub migration_grace_blocks: u64,
    /// Eviction comparison policy.
    pub eviction_boundary: EvictionBoundary,
}

impl Default for RentParams {
    fn default() -> Self {
        Self {
            account_cost: RENT_ACCOUNT_COST,
            word_cost: RENT_WORD_COST,
            stipend: RENT_STIPEND,
            upgrade_block: DEFAULT_UPGRADE_BLOCK,
            migration_grace_blocks: MIGRATION_GRACE_BLOCKS,
            eviction_boundary: EVICTION_BOUNDARY,
        }
    }
}

impl RentParams {
    /// Check the parameters for values that would break the sentinel or
    /// activation rules.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.upgrade_block == 0 {
            return Err(ParamsError::ZeroUpgradeBlock);
        }
        if self.migration_grace_blocks == 0 {
            return Err(ParamsError::ZeroGracePeriod);
        }
        if self.stipend < self.account_cost {
            return Err(ParamsError::StipendTooSmall {
                stipend: self.stipend,
                account_cost: self.account_cost,
            });
        }
        Ok(())
    }

    /// Whether rent accounting is active at `block`.
    pub fn is_active(&self, block: u64) -> bool {
        block >= self.upgrade_block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(RentParams::default().validate().is_ok());
    }

    #[test]
    fn zero_upgrade_block_rejected() {
        let p = RentParams {
            upgrade_block: 0,
            ..RentParams::default()
        };
        assert_eq!(p.validate(), Err(ParamsError::ZeroUpgradeBlock));
    }

    #[test]
    fn zero_grace_rejected() {
        let p = RentParams {
            migration_grace_blocks: 0,
            ..RentParams::default()
        };
        assert_eq!(p.validate(), Err(ParamsError::ZeroGracePeriod));
    }

    #[test]
    fn tiny_stipend_rejected() {
        let p = RentParams {
            stipend: 1,
            ..RentParams::default()
        };
        assert!(matches!(
            p.validate(),
            Err(ParamsError::StipendTooSmall { stipend: 1, .. })
        ));
    }

    #[test]
    fn activation_starts_at_upgrade_block() {
        let p = RentParams {
            upgrade_block: 10,
            ..RentParams::default()
        };
        assert!(!p.is_active(9));
        assert!(p.is_active(10));
        assert!(p.is_active(11));
    }
}
