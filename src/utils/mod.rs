pub mod html;
pub mod logging;

pub use html::{Document, Element};
