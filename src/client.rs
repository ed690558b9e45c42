//! Explicit wiring of the client core. Everything that shares session state
//! receives the same `SessionStore` handle; there is no global state.

use std::sync::Arc;

use crate::api::{AuthApi, DepartmentsApi, EquipmentApi, ResourceApi, TicketsApi, UsersApi};
use crate::config::ClientConfig;
use crate::gateway::{ApiGateway, LogNavigator, Navigator};
use crate::identity::{Authorizer, FileTokenStorage, SessionManager, SessionStore, TokenStorage};
use crate::workflow::{TicketWorkflow, TransitionPolicy};

pub struct HelpdeskClient {
    pub config: ClientConfig,
    pub store: SessionStore,
    pub gateway: Arc<ApiGateway>,
    pub sessions: SessionManager,
    pub authz: Authorizer,
    pub tickets: TicketWorkflow,
    pub departments: DepartmentsApi,
    pub users: UsersApi,
    pub equipment: EquipmentApi,
}

impl HelpdeskClient {
    /// File-backed token storage and log-only navigation.
    pub fn from_config(config: ClientConfig) -> anyhow::Result<Self> {
        let storage = Arc::new(FileTokenStorage::new(config.token_file.clone()));
        Self::with_parts(config, storage, Arc::new(LogNavigator))
    }

    pub fn with_parts(config: ClientConfig, storage: Arc<dyn TokenStorage>, navigator: Arc<dyn Navigator>) -> anyhow::Result<Self> {
        let store = SessionStore::new(storage);
        let gateway = Arc::new(ApiGateway::new(&config, store.clone(), navigator)?);
        let sessions = SessionManager::new(store.clone(), AuthApi::new(gateway.clone()), config.session_ttl);
        let authz = Authorizer::new(Arc::new(store.clone()));
        let tickets = TicketWorkflow::new(
            TicketsApi::new(gateway.clone()),
            authz.clone(),
            TransitionPolicy::from_strict(config.strict_transitions),
        );
        Ok(Self {
            departments: ResourceApi::departments(gateway.clone(), authz.clone()),
            users: ResourceApi::users(gateway.clone(), authz.clone()),
            equipment: ResourceApi::equipment(gateway.clone(), authz.clone()),
            config,
            store,
            gateway,
            sessions,
            authz,
            tickets,
        })
    }
}
