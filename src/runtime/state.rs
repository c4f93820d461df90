//! Ephemeral account state and its initialisation.
//!
//! [`StateStore`] wraps revm's in-memory [`CacheDB`] with the handful of
//! operations the harness needs: create an account, install code, apply a
//! state diff, collect emitted logs and dump everything as JSON.
//! [`initialize`] builds one, optionally seeded from a genesis file.

use crate::runtime::genesis::{read_genesis, Genesis};
use crate::Result;
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use revm::db::{AccountState, CacheDB, EmptyDB};
use revm::primitives::{AccountInfo, Bytecode, EvmState, Log, KECCAK_EMPTY};
use revm::DatabaseCommit;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// In-memory account state shared by every invocation of a run.
#[derive(Debug, Clone)]
pub struct StateStore {
    db: CacheDB<EmptyDB>,
    logs: Vec<Log>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    /// An empty state over a fresh backing store.
    pub fn new() -> Self {
        Self {
            db: CacheDB::new(EmptyDB::default()),
            logs: Vec::new(),
        }
    }

    /// A fresh store holding the genesis `alloc` accounts.
    pub fn from_genesis(genesis: &Genesis) -> Self {
        let mut store = Self::new();
        for (address, account) in &genesis.alloc {
            let mut info = AccountInfo {
                balance: account.balance,
                nonce: account.nonce,
                ..AccountInfo::default()
            };
            if !account.code.is_empty() {
                info.code_hash = keccak256(&account.code);
                info.code = Some(Bytecode::LegacyRaw(account.code.clone()));
            }
            store.db.insert_account_info(*address, info);

            let entry = store.db.accounts.entry(*address).or_default();
            for (slot, value) in &account.storage {
                entry
                    .storage
                    .insert(U256::from_be_bytes(slot.0), U256::from_be_bytes(value.0));
            }
        }
        store
    }

    /// Create (or recreate) an account. An existing balance is carried over;
    /// nonce, code and storage start empty.
    pub fn create_account(&mut self, address: Address) {
        let account = self.db.accounts.entry(address).or_default();
        let balance = account.info.balance;
        account.info = AccountInfo {
            balance,
            ..AccountInfo::default()
        };
        account.storage.clear();
        account.account_state = AccountState::StorageCleared;
    }

    /// Install `code` at `address`, replacing whatever was there.
    pub fn set_code(&mut self, address: Address, code: Bytes) {
        let mut info = self.account(address).cloned().unwrap_or_default();
        if code.is_empty() {
            info.code_hash = KECCAK_EMPTY;
            info.code = None;
        } else {
            info.code_hash = keccak256(&code);
            info.code = Some(Bytecode::LegacyRaw(code));
        }
        self.db.insert_account_info(address, info);
    }

    pub fn account(&self, address: Address) -> Option<&AccountInfo> {
        self.db
            .accounts
            .get(&address)
            .filter(|account| !matches!(account.account_state, AccountState::NotExisting))
            .map(|account| &account.info)
    }

    /// Code installed at `address`; empty when the account has none.
    pub fn code(&self, address: Address) -> Bytes {
        let Some(info) = self.account(address) else {
            return Bytes::new();
        };
        if info.code_hash == KECCAK_EMPTY {
            return Bytes::new();
        }
        info.code
            .as_ref()
            .or_else(|| self.db.contracts.get(&info.code_hash))
            .map(|code| code.original_bytes())
            .unwrap_or_default()
    }

    pub fn storage(&self, address: Address, slot: U256) -> U256 {
        self.db
            .accounts
            .get(&address)
            .and_then(|account| account.storage.get(&slot).copied())
            .unwrap_or_default()
    }

    /// Apply the state diff produced by one execution.
    pub fn commit(&mut self, changes: EvmState) {
        debug!(accounts = changes.len(), "committing state changes");
        self.db.commit(changes);
    }

    pub fn add_logs(&mut self, logs: impl IntoIterator<Item = Log>) {
        self.logs.extend(logs);
    }

    /// Logs emitted by every execution so far, in order.
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    pub(crate) fn db_mut(&mut self) -> &mut CacheDB<EmptyDB> {
        &mut self.db
    }

    /// Snapshot of every live account, sorted by address.
    pub fn dump(&self) -> StateDump {
        let mut accounts = BTreeMap::new();
        for (address, account) in &self.db.accounts {
            if matches!(account.account_state, AccountState::NotExisting) {
                continue;
            }
            let storage = account
                .storage
                .iter()
                .filter(|(_, value)| !value.is_zero())
                .map(|(slot, value)| (B256::new(slot.to_be_bytes()), B256::new(value.to_be_bytes())))
                .collect();
            accounts.insert(
                *address,
                DumpAccount {
                    balance: account.info.balance.to_string(),
                    nonce: account.info.nonce,
                    code_hash: account.info.code_hash,
                    code: self.code(*address),
                    storage,
                },
            );
        }
        StateDump { accounts }
    }
}

/// JSON shape printed by `--dump`.
#[derive(Debug, Clone, Serialize)]
pub struct StateDump {
    pub accounts: BTreeMap<Address, DumpAccount>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DumpAccount {
    pub balance: String,
    pub nonce: u64,
    pub code_hash: B256,
    #[serde(skip_serializing_if = "<[u8]>::is_empty")]
    pub code: Bytes,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub storage: BTreeMap<B256, B256>,
}

/// Output of [`initialize`].
pub struct InitializedState {
    pub state: StateStore,
    /// The parsed genesis, or a zero-valued one when none was supplied.
    pub genesis: Genesis,
}

/// Build the run's state, seeding it from `genesis_path` when given, and
/// create the `sender` account.
#[tracing::instrument(skip_all, fields(sender = %sender))]
pub fn initialize(genesis_path: Option<&Path>, sender: Address) -> Result<InitializedState> {
    let (mut state, genesis) = match genesis_path {
        Some(path) => {
            let genesis = read_genesis(path)?;
            (StateStore::from_genesis(&genesis), genesis)
        }
        None => (StateStore::new(), Genesis::default()),
    };
    state.create_account(sender);
    debug!("State initialized");
    Ok(InitializedState { state, genesis })
}
