//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; a single route table dispatches to library services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, ConfigCommands, DirtyCommands};
pub use presentation::{format_dirty_entries_json, format_dirty_entries_text, format_plan_json, format_plan_text};
pub use route::RunContext;
