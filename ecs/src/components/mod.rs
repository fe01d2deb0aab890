//! Built-in components maintained by the world itself.

mod hierarchy;

pub use hierarchy::{Children, Parent};
