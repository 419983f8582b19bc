//! Authentication and role-based access control

pub mod clock;
pub mod endpoint;
pub mod middleware;
pub mod password;
pub mod permission;
pub mod session;
pub mod store;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use middleware::{check_access, AccessControl, AccessGrant, AccessRejection, AccessStage, Authenticated};
pub use store::{AccessStore, AccountStore};
pub use token::{AccessClaims, IssuedToken, TokenService};
