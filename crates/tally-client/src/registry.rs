use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tally_engine::Engine;
use tokio::runtime::Handle;
use tracing::info;

use crate::client::Client;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Holds at most one active session.
///
/// Opening while a session is active fails, whatever the arguments. The slot
/// is filled only when the engine accepted the session and is emptied when
/// that session closes. The lock is held for the whole open, so concurrent
/// opens are serialized and only one can win.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    state: Arc<Mutex<RegistryState>>,
}

#[derive(Default)]
struct RegistryState {
    active: Option<ActiveSession>,
    next_session: u64,
}

struct ActiveSession {
    session: u64,
    config: ClientConfig,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static SessionRegistry {
        static GLOBAL: OnceLock<SessionRegistry> = OnceLock::new();
        GLOBAL.get_or_init(SessionRegistry::new)
    }

    /// Open a session on `engine`. Must be called from within a tokio
    /// runtime, which runs the session's drive cadence.
    pub fn open(&self, engine: &dyn Engine, config: ClientConfig) -> ClientResult<Client> {
        let mut state = self.lock();
        if let Some(active) = &state.active {
            return Err(if active.config.same_identity(&config) {
                ClientError::AlreadyInitializedSameArgs
            } else {
                ClientError::AlreadyInitializedDifferentArgs
            });
        }

        let runtime = Handle::try_current().map_err(|_| ClientError::NoRuntime)?;
        let context = engine.open(
            config.client_id,
            config.cluster_id,
            &config.replica_addresses,
        )?;

        state.next_session += 1;
        let session = state.next_session;
        state.active = Some(ActiveSession {
            session,
            config: config.clone(),
        });
        info!(
            session,
            client = %format_args!("{:#x}", config.client_id),
            cluster = %format_args!("{:#x}", config.cluster_id),
            "session opened"
        );
        Ok(Client::start(self.clone(), session, config, context, &runtime))
    }

    pub fn is_active(&self) -> bool {
        self.lock().active.is_some()
    }

    /// Configuration of the active session, if any.
    pub fn active_config(&self) -> Option<ClientConfig> {
        self.lock().active.as_ref().map(|a| a.config.clone())
    }

    /// Empty the slot if `session` still owns it.
    pub(crate) fn release(&self, session: u64) {
        let mut state = self.lock();
        if state.active.as_ref().is_some_and(|a| a.session == session) {
            state.active = None;
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
