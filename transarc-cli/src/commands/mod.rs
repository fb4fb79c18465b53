//! Command implementations for the Transarc CLI.

pub mod create;
pub mod extract;
pub mod info;
pub mod list;
pub mod repack;
pub mod test;

pub use create::{cmd_create, cmd_multi_create};
pub use extract::{ExtractOptions, cmd_extract};
pub use info::cmd_info;
pub use list::{ListOptions, cmd_list};
pub use repack::cmd_repack;
pub use test::cmd_test;
