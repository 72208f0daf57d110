pub mod transport;

pub use transport::{HttpPage, ReqwestTransport, Transport};
