//! Core data model types: attachment records and mail client profiles.

pub mod attachment;
pub mod profile;

pub use attachment::AttachmentRecord;
pub use profile::{DispatchMode, Profile};
