pub use errors::*;
pub use events::*;
pub use publisher::*;

mod errors;
mod events;
mod publisher;
