//! CLI subcommands.

mod build;
mod create;
mod live;
mod purge;

pub(crate) use build::BuildArgs;
pub(crate) use create::CreateArgs;
pub(crate) use live::LiveArgs;
pub(crate) use purge::PurgeArgs;
