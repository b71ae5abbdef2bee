//! CLI command handlers, one per file.

mod add;
mod run;
mod status;
mod stop;

pub use add::run_add;
pub use run::run_fetch;
#[cfg(test)]
pub(crate) use run::interface_specs;
pub use status::run_status;
pub use stop::run_stop;
