mod plan;
mod product;
mod propagator;

pub use plan::*;
pub use product::*;
pub use propagator::*;
