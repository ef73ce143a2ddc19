//! Type system utilities for the lathe plane.
//!
//! ## Modules
//!
//! - [`aliases`]: Type aliases for `Rc<RefCell<T>>`, `Arc<Mutex<T>>`, etc.
//! - [`geometry`]: Lathe-plane points, angle normalization, zero snapping.

pub mod aliases;
pub mod geometry;

pub use aliases::*;
pub use geometry::*;
