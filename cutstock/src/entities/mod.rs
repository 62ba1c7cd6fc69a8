mod instance;
mod pattern;
mod solution;

pub use instance::{Instance, Item};
pub use pattern::{Pattern, PatternId, PatternPool};
pub use solution::{IntegerSolution, RelaxedSolution};
