pub mod dht22;
pub mod sensor;

pub use dht22::{decode_frame, Dht22Error};
#[cfg(target_os = "none")]
pub use dht22::Dht22;
pub use sensor::{Humiture, HumitureSensor};
