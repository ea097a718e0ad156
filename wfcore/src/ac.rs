pub mod agent;
pub mod genpolicy;
pub mod principal;
pub mod role;
pub mod traits;
pub mod user;

pub use self::role::{
    Permission,
    PermissionFilter,
    Role,
};
