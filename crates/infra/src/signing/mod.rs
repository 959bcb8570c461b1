//! Device certificate signing for PKeyAuth challenges

mod jws;

pub use jws::{DeviceAssertionClaims, DeviceCertificateSigner};
