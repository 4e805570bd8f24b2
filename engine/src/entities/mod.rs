pub mod aircraft;
pub mod airline;
pub mod avn;
pub mod runway;
pub mod world;
