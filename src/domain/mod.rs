pub mod source;
pub mod content;
pub mod notification;

pub use source::{Author, Footer, ImagePlacement, SourceDescriptor};
pub use content::{BodyFormat, ChangeKey, ContentRecord};
pub use notification::Notification;
