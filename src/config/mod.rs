mod model;

pub use model::{Config, RuleConfig};
