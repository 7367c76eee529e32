//! Worklist traversal that turns an entry script into a single bundle
//!
//! Modules are discovered with a LIFO stack. Each resolved module's wrapped
//! text is appended to an output stack right before its own dependencies are
//! pushed, and the output stack is reversed at the end. That places every
//! registration above the module that required it, and the entry script,
//! which sits at the bottom of the stack, last of all. Registrations do not
//! run at load time, so only that final position of the entry matters.

use anyhow::{Context, Result};
use log::{debug, error, trace};

use crate::{
    import_discovery::discover_imports,
    inject::EntryInjector,
    resolver::{SourceLoader, import_module, module_path},
    types::{BundleOutput, FxIndexSet, ModuleCache, UnresolvedImport},
};

/// Separator placed between blocks of the bundle
const BLOCK_SEPARATOR: &str = "\n\n";

/// Per-bundle parameters
#[derive(Debug, Clone, Default)]
pub struct BundleOptions {
    /// Module whose resolution pulls in `extra_modules`
    pub extension_point: Option<String>,
    /// Modules that the extension point loads without naming them in source
    pub extra_modules: Vec<String>,
    /// Entry-only pre-processing
    pub injector: EntryInjector,
}

impl BundleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extension_point(
        mut self,
        extension_point: impl Into<String>,
        extra_modules: Vec<String>,
    ) -> Self {
        self.extension_point = Some(extension_point.into());
        self.extra_modules = extra_modules;
        self
    }

    pub fn with_injector(mut self, injector: EntryInjector) -> Self {
        self.injector = injector;
        self
    }

    /// Resource path of the extension point, compared against each resolved
    /// module's path so that aliases of the same file also trigger injection
    fn extension_point_path(&self) -> Option<String> {
        let name = self.extension_point.as_deref()?;
        match module_path(name) {
            Ok(path) => Some(path),
            Err(e) => {
                debug!("Extension point disabled: {e}");
                None
            }
        }
    }
}

/// Bundle `entry` and everything it transitively requires
///
/// The entry is loaded by its own name, which is expected to be a resource
/// path such as `tools/transpose.lua`; failing to load it is the only error.
/// Unresolvable imports are logged, collected in
/// [`BundleOutput::unresolved`] and otherwise skipped, so the returned bundle
/// holds everything that did resolve.
pub fn bundle_module<L>(
    entry: &str,
    cache: &mut ModuleCache,
    options: &BundleOptions,
    loader: &L,
) -> Result<BundleOutput>
where
    L: SourceLoader + ?Sized,
{
    let raw = loader
        .load(entry)
        .with_context(|| format!("Failed to load entry script '{entry}'"))?;
    let contents = options.injector.apply(entry, &raw);

    let mut import_stack = discover_imports(&contents);
    let mut file_stack = vec![contents];
    let mut imported = FxIndexSet::default();
    let mut unresolved = Vec::new();
    let extension_point_path = options.extension_point_path();

    debug!(
        "Bundling '{entry}' with {} direct imports",
        import_stack.len()
    );

    while let Some(next_import) = import_stack.pop() {
        if imported.contains(&next_import) {
            continue;
        }
        trace!("Processing import '{next_import}'");

        if !import_module(&next_import, cache, loader) {
            let report = UnresolvedImport {
                module: next_import,
                requested_by: entry.to_owned(),
            };
            error!("{report}");
            unresolved.push(report);
            continue;
        }

        if let Some(module) = cache.get(&next_import) {
            import_stack.extend(module.dependencies.iter().cloned());
            file_stack.push(module.wrapped.clone());
        }

        if extension_point_path.is_some()
            && module_path(&next_import).ok() == extension_point_path
        {
            debug!(
                "Extension point '{next_import}' resolved, adding {} extra modules",
                options.extra_modules.len()
            );
            import_stack.extend(options.extra_modules.iter().cloned());
        }

        imported.insert(next_import);
    }

    file_stack.reverse();

    Ok(BundleOutput {
        text: file_stack.join(BLOCK_SEPARATOR),
        modules: imported.into_iter().collect(),
        unresolved,
    })
}
