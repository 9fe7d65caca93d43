//! Session-based role authorization.

pub mod gate;
pub mod password;
pub mod permission;
pub mod session;

pub use gate::{GateDecision, PathClass, decide, normalize_path};
pub use password::PasswordHasher;
pub use permission::{Permission, granted_permissions, has_admin_access, has_permission};
pub use session::{SessionClaims, SessionError, SessionIssuer, VerifiedIdentity};
