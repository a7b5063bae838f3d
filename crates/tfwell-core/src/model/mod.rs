pub mod resource;
pub mod value;

pub use resource::{Attributes, Block, Resource};
pub use value::ConfigValue;
