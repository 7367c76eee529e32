//! Single-file bundler for Lua scripts built on `require` and
//! `package.preload`.
//!
//! [`bundler::bundle_module`] walks the `require` graph of an entry script
//! and emits every reachable module as a lazy `package.preload` registration
//! ahead of the entry's own code. [`orchestrator::BundleOrchestrator`] runs
//! it over a directory of scripts.

pub mod bundler;
pub mod comments;
pub mod config;
pub mod import_discovery;
pub mod inject;
pub mod module_wrapper;
pub mod orchestrator;
pub mod postprocess;
pub mod regions;
pub mod resolver;
pub mod types;

pub use bundler::{BundleOptions, bundle_module};
pub use config::Config;
pub use resolver::{FsSourceLoader, SourceLoader, import_module};
pub use types::{BundleOutput, ModuleCache, ResolvedModule, UnresolvedImport};
