use parking_lot::Mutex;

use crate::session_id::SessionIdGenerator;
use crate::store::KeyValueStore;
use crate::types::{AccountUri, SessionId};

/// Hosting sessions keyed both ways: session ID ↔ account URI.
///
/// Each direction is its own [`KeyValueStore`]. Writers additionally take
/// `pair_lock`, so ID generation and both inserts happen as one step; readers
/// only touch the store for the direction they need.
///
/// Insert order is `session → account` first, so any account that resolves to
/// a session ID also resolves back from that ID.
pub struct SessionCoordinator {
    sessions: KeyValueStore<SessionId, AccountUri>,
    accounts: KeyValueStore<AccountUri, SessionId>,
    generator: SessionIdGenerator,
    pair_lock: Mutex<()>,
}

impl SessionCoordinator {
    #[must_use]
    pub fn new(generator: SessionIdGenerator) -> Self {
        Self {
            sessions: KeyValueStore::new(),
            accounts: KeyValueStore::new(),
            generator,
            pair_lock: Mutex::new(()),
        }
    }

    /// Start hosting for `account`, returning its session ID.
    ///
    /// An account that already hosts keeps its existing ID.
    pub fn create_session(&self, account: &AccountUri) -> SessionId {
        let _guard = self.pair_lock.lock();

        if let Some(existing) = self.accounts.read(account) {
            tracing::debug!(session_id = %existing, account = %account, "account already hosting");
            return existing;
        }

        let session_id = self.generator.generate(&self.sessions);
        self.sessions.add(session_id.clone(), account.clone());
        self.accounts.add(account.clone(), session_id.clone());

        tracing::info!(session_id = %session_id, account = %account, "hosting session created");
        session_id
    }

    #[must_use]
    pub fn lookup_session_by_account(&self, account: &AccountUri) -> Option<SessionId> {
        self.accounts.read(account)
    }

    #[must_use]
    pub fn lookup_account_by_session(&self, session_id: &SessionId) -> Option<AccountUri> {
        self.sessions.read(session_id)
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for SessionCoordinator {
    fn default() -> Self {
        Self::new(SessionIdGenerator::new())
    }
}
