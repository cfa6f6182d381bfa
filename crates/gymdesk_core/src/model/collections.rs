//! Collection names used by the domain services.

pub const MEMBERS: &str = "members";
pub const BILLS: &str = "bills";
pub const NOTIFICATIONS: &str = "notifications";
pub const FEE_PACKAGES: &str = "feePackages";
pub const SUPPLEMENTS: &str = "supplements";
pub const DIETS: &str = "diets";
pub const ACTIVITY_LOGS: &str = "activityLogs";
pub const USERS: &str = "users";
