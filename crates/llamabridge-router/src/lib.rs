pub mod proxy;

pub use proxy::{REQUEST_ID_HEADER, proxy_router};
