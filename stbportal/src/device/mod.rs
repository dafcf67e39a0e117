pub mod identity;
pub mod registry;

pub use identity::DeviceIdentity;
pub use registry::{
    DeviceRegistry, FileRegistry, MemoryRegistry, RegistrationError, is_known, register_device,
};
