//! Per-message workflow state machines.
//!
//! Each workflow is keyed by the correlation id (`mensaje_id`) backend events
//! use to address one message, and only ever mutates that message's fields.
//! Shared policy: an event for an unknown correlation id, or for a message no
//! longer present in the active transcript, is dropped and logged — races
//! around conversation switches are expected, not errors.

pub mod image;
pub mod publishing;
pub mod video;

pub use image::ImageWorkflows;
pub use publishing::PublishingWorkflows;
pub use video::VideoWorkflows;
