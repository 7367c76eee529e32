use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use log::debug;

use crate::{
    import_discovery::discover_imports,
    module_wrapper::wrap_module,
    types::{ModuleCache, ResolvedModule},
};

/// File extension appended to module paths
const LUA_EXTENSION: &str = "lua";

/// Source text provider used by the resolver and the bundle traversal
///
/// Paths are relative, `/`-separated resource paths such as
/// `library/mixin.lua`. Any closure `Fn(&str) -> Result<String>` is a loader,
/// which keeps tests free of filesystem setup.
pub trait SourceLoader {
    fn load(&self, path: &str) -> Result<String>;
}

impl<F> SourceLoader for F
where
    F: Fn(&str) -> Result<String>,
{
    fn load(&self, path: &str) -> Result<String> {
        self(path)
    }
}

/// Loads sources from a directory on disk
#[derive(Debug, Clone)]
pub struct FsSourceLoader {
    root: PathBuf,
}

impl FsSourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SourceLoader for FsSourceLoader {
    fn load(&self, path: &str) -> Result<String> {
        let full_path = self.root.join(path);
        std::fs::read_to_string(&full_path)
            .with_context(|| format!("Failed to read {}", full_path.display()))
    }
}

/// Map a module name to its resource path, following Lua's `?.lua` rule
///
/// `library.mixin` becomes `library/mixin.lua`, and `/` is passed through as
/// the searcher does, so `library/utils` maps to `library/utils.lua`. Names
/// with an empty path segment (`""`, `.a`, `a..b`, `a.`, `/a`, `a//b`) or a
/// backslash have no path; the empty-segment rule also rejects `..`.
pub fn module_path(module_name: &str) -> Result<String> {
    let path = module_name.replace('.', "/");
    if module_name.contains('\\') || path.split('/').any(str::is_empty) {
        return Err(anyhow!("Invalid module name '{module_name}'"));
    }
    Ok(format!("{path}.{LUA_EXTENSION}"))
}

/// Make sure `module_name` is present in `cache`
///
/// On a cache miss the module is loaded through `loader`, scanned for its own
/// imports and wrapped, then stored. Returns `false` when the module could
/// not be mapped to a path or loaded; the cache is left untouched in that case
/// so a later encounter tries again.
pub fn import_module<L>(module_name: &str, cache: &mut ModuleCache, loader: &L) -> bool
where
    L: SourceLoader + ?Sized,
{
    if cache.contains(module_name) {
        return true;
    }

    match load_module(module_name, loader) {
        Ok(module) => {
            debug!(
                "Resolved module '{module_name}' with {} dependencies",
                module.dependencies.len()
            );
            cache.insert(module_name, module);
            true
        }
        Err(e) => {
            debug!("Failed to resolve module '{module_name}': {e:#}");
            false
        }
    }
}

fn load_module<L>(module_name: &str, loader: &L) -> Result<ResolvedModule>
where
    L: SourceLoader + ?Sized,
{
    let path = module_path(module_name)?;
    let contents = loader.load(&path)?;
    Ok(ResolvedModule {
        dependencies: discover_imports(&contents),
        wrapped: wrap_module(module_name, &contents),
    })
}
