pub mod device;
pub mod http;
pub mod resources;

pub use device::{DeviceClient, EmergencyStatusSource, StreamStatusSource};
pub use resources::{ApiClient, Device, FaceMatch, FamilyMatch, PlaybackUrl, Resource, Video};
