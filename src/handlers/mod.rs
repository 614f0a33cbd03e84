pub mod people;
pub mod publications;
pub mod author_orders;
pub mod dissertations;
pub mod web;

pub use people::*;
pub use publications::*;
pub use author_orders::*;
pub use dissertations::*;
