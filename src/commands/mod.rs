mod check;
pub mod config;
mod fetch;
mod resolve;
mod show;

pub use check::check;
pub use config::{Config, ResolveOptions};
pub use fetch::{DEFAULT_OUT_DIR, fetch};
pub use resolve::resolve;
pub use show::show;
