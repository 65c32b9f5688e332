//! Audio device subsystem

pub mod buffer;
pub mod capture;
pub mod device;
pub mod render;

#[cfg(test)]
pub(crate) mod stub;

pub use buffer::SampleRing;
pub use capture::CpalCapture;
pub use device::{AudioBackend, CaptureDevice, CpalBackend, RenderDevice};
pub use render::CpalRender;
