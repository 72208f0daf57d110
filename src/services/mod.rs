pub mod extractor;
pub mod notifier;
pub mod session;

pub use notifier::{LogNotifier, Notifier};
pub use session::Session;
