pub mod builtin;
pub mod registry;
pub mod schema;

pub use builtin::{default_team, write_default_team};
pub use registry::{TeamFormat, TeamRegistry};
pub use schema::MemberDefinition;
