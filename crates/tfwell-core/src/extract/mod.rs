pub mod plan;
pub mod read;
pub mod source;
pub mod walk;

pub use plan::{parse_plan, parse_plan_file, parse_plan_str};
pub use source::{parse_dir, parse_file, parse_source};
