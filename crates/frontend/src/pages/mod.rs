pub mod country;
pub mod home;
