pub mod camera;
pub mod models;
pub mod peace;
pub mod ramp;
pub mod store;
