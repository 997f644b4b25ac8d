//! Domain models for the Crop Advisor platform

mod crop;
mod fertilizer;
mod recommendation;
mod request;
mod soil;
mod soil_health;

pub use crop::*;
pub use fertilizer::*;
pub use recommendation::*;
pub use request::*;
pub use soil::*;
pub use soil_health::*;
