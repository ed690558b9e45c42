//! Typed wrappers over the backend REST endpoints.

pub mod auth;
pub mod models;
pub mod resources;
pub mod tickets;

pub use auth::{AuthApi, LoginResponse};
pub use models::{Category, Department, Equipment, NewTicket, Priority, SupportLevel, Ticket, TicketChanges, TicketFilter, TicketStatus, UserAccount};
pub use resources::{DepartmentsApi, EquipmentApi, ResourceApi, UsersApi};
pub use tickets::TicketsApi;
