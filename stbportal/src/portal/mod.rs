pub mod action;
pub mod dispatcher;
pub mod responses;

pub use dispatcher::{Portal, PortalRequest};
pub use responses::Envelope;
