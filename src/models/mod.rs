pub mod activity;
pub mod building;
pub mod organization;
pub mod phone;

pub use activity::{Activity, MAX_ACTIVITY_LEVEL};
pub use building::Building;
pub use organization::{Organization, OrganizationDetails};
pub use phone::Phone;
