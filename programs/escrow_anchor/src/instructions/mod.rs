pub mod initialize;
pub mod take;

pub use initialize::*;
pub use take::*;
