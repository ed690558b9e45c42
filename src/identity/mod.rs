//! Identity: who is signed in, with what credential, and what they may do.
//! Keep the public surface thin and split implementation across sub-modules.

mod authorizer;
mod principal;
mod provider;
mod role;
mod session;
mod storage;

pub use authorizer::{evaluate, Action, Authorizer, CapabilityRequest, PrincipalSource, ResourceType};
pub use principal::{Principal, Profile};
pub(crate) use principal::{de_id, de_opt_id};
pub use provider::{LoginRequest, SessionManager};
pub use role::{normalize, Role};
pub use session::{AuthState, Credential, Session, SessionStore};
pub use storage::{FileTokenStorage, MemoryTokenStorage, TokenStorage};
