//! Error types for the GestureCall protocol layer.

mod capture;
mod page;
mod relay;
mod store;
mod tracker;

pub use capture::*;
pub use page::*;
pub use relay::*;
pub use store::*;
pub use tracker::*;
