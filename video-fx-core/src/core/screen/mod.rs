pub use service::*;

mod service;
