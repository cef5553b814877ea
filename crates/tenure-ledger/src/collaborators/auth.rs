//! Delegation-based authorization
//!
//! A depositor always acts for themselves; any other caller needs an explicit
//! delegation from that depositor. Pool administration is limited to a single
//! administrator account.

use std::collections::HashSet;

use dashmap::DashMap;
use parking_lot::RwLock;
use tenure_common::AccountId;
use tracing::info;

use super::Authorizer;

/// Administrator plus per-depositor delegate sets
#[derive(Debug)]
pub struct DelegationAuthorizer {
    admin: RwLock<AccountId>,
    delegates: DashMap<AccountId, HashSet<AccountId>>,
}

impl DelegationAuthorizer {
    pub fn new(admin: AccountId) -> Self {
        Self {
            admin: RwLock::new(admin),
            delegates: DashMap::new(),
        }
    }

    /// Allow `agent` to create and withdraw rounds for `depositor`
    pub fn approve_delegate(&self, depositor: &AccountId, agent: &AccountId) {
        self.delegates
            .entry(depositor.clone())
            .or_default()
            .insert(agent.clone());
        info!(%depositor, %agent, "Delegate approved");
    }

    /// Returns whether a delegation existed
    pub fn revoke_delegate(&self, depositor: &AccountId, agent: &AccountId) -> bool {
        let removed = self
            .delegates
            .get_mut(depositor)
            .map(|mut set| set.remove(agent))
            .unwrap_or(false);
        if removed {
            info!(%depositor, %agent, "Delegate revoked");
        }
        removed
    }

    pub fn admin(&self) -> AccountId {
        self.admin.read().clone()
    }

    pub fn transfer_admin(&self, new_admin: AccountId) {
        info!(%new_admin, "Administrator changed");
        *self.admin.write() = new_admin;
    }
}

impl Authorizer for DelegationAuthorizer {
    fn authorize_depositor(&self, caller: &AccountId, depositor: &AccountId) -> bool {
        caller == depositor
            || self
                .delegates
                .get(depositor)
                .map(|set| set.contains(caller))
                .unwrap_or(false)
    }

    fn is_admin(&self, caller: &AccountId) -> bool {
        *self.admin.read() == *caller
    }
}
