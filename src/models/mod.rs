pub mod person;
pub mod publication;
pub mod dissertation;

pub use person::*;
pub use publication::*;
pub use dissertation::*;
