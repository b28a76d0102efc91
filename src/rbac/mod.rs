/// Role-based access control
///
/// A fixed role → module table plus the gate that consults it.

mod gate;
pub mod modules;
mod policy;

pub use gate::AuthorizationGate;
pub use policy::{ModuleGrant, RolePermissionTable};
