mod controller;
mod geometry;
mod hover;
mod item;
mod linear;
mod policy;
mod position;
mod programmatic;
mod session;
mod view_state;

pub use crate::controller::*;
pub use crate::geometry::*;
pub use crate::hover::*;
pub use crate::item::*;
pub use crate::linear::*;
pub use crate::policy::*;
pub use crate::position::*;
pub use crate::programmatic::*;
pub use crate::session::*;
pub use crate::view_state::*;
