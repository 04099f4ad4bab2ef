pub mod types;
pub mod upstream;
pub mod utils;

pub use upstream::{Forwarded, ProxyError, UpstreamClient};
