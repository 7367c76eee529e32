//! Drives a bundling run over one or more entry scripts
//!
//! The orchestrator owns the configuration and the module cache shared by
//! every entry of the run. It discovers entries and mixins on disk, bundles
//! each entry, post-processes the result and writes it to the output
//! directory.

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::{
    bundler::{BundleOptions, bundle_module},
    config::Config,
    inject::EntryInjector,
    postprocess::finalize_bundle,
    resolver::FsSourceLoader,
    types::{BundleOutput, ModuleCache, UnresolvedImport},
};

const LUA_EXTENSION: &str = "lua";

/// A bundle written to disk
#[derive(Debug, Clone)]
pub struct WrittenBundle {
    /// Entry path relative to the source directory
    pub entry: String,
    pub output_path: PathBuf,
    /// Number of modules wrapped into the bundle
    pub module_count: usize,
}

/// Outcome of [`BundleOrchestrator::run`]
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub bundles: Vec<WrittenBundle>,
    pub unresolved: Vec<UnresolvedImport>,
}

impl RunSummary {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

#[derive(Debug)]
pub struct BundleOrchestrator {
    config: Config,
    cache: ModuleCache,
    loader: FsSourceLoader,
}

impl BundleOrchestrator {
    pub fn new(config: Config) -> Self {
        let loader = FsSourceLoader::new(config.source_dir.clone());
        Self {
            config,
            cache: ModuleCache::new(),
            loader,
        }
    }

    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }

    /// Build the per-bundle options, injecting `mixins` at the configured
    /// extension point
    pub fn bundle_options(&self, mixins: Vec<String>) -> BundleOptions {
        let mut options = BundleOptions::new();
        if let Some(extension_point) = self.config.extension_point() {
            options = options.with_extension_point(extension_point, mixins);
        }
        if let Some(prelude) = &self.config.entry_prelude {
            options = options.with_injector(EntryInjector::with_prelude(prelude.as_str()));
        }
        options
    }

    /// Bundle one entry and apply post-processing, without writing anything
    pub fn bundle_entry(&mut self, entry: &str, options: &BundleOptions) -> Result<BundleOutput> {
        let mut output = bundle_module(entry, &mut self.cache, options, &self.loader)?;
        output.text = finalize_bundle(&output.text, self.config.strip_comments);
        Ok(output)
    }

    /// Bundle every entry and write the results to the output directory
    ///
    /// With no `entries`, every `.lua` file directly inside the source
    /// directory is bundled. With no `mixins`, the mixin directory is scanned.
    pub fn run(&mut self, entries: &[String], mixins: Option<Vec<String>>) -> Result<RunSummary> {
        let entries = if entries.is_empty() {
            discover_entries(&self.config.source_dir)?
        } else {
            entries.to_vec()
        };
        if entries.is_empty() {
            warn!(
                "No entry scripts found in {}",
                self.config.source_dir.display()
            );
        }

        let mixins = match mixins {
            Some(mixins) => mixins,
            None => discover_mixins(&self.config.source_dir, &self.config.mixin_root())?,
        };
        debug!("Using {} mixins", mixins.len());
        let options = self.bundle_options(mixins);

        fs::create_dir_all(&self.config.output_dir).with_context(|| {
            format!(
                "Failed to create output directory {}",
                self.config.output_dir.display()
            )
        })?;

        let mut summary = RunSummary::default();
        for entry in entries {
            let output = self.bundle_entry(&entry, &options)?;
            let output_path = self.output_path(&entry)?;
            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(&output_path, &output.text)
                .with_context(|| format!("Failed to write bundle {}", output_path.display()))?;
            info!(
                "Bundled {entry} ({} modules) -> {}",
                output.modules.len(),
                output_path.display()
            );

            summary.unresolved.extend(output.unresolved);
            summary.bundles.push(WrittenBundle {
                entry,
                output_path,
                module_count: output.modules.len(),
            });
        }

        Ok(summary)
    }

    /// Output location for `entry`: the same relative path inside the output
    /// directory, so entries in different subdirectories never collide
    fn output_path(&self, entry: &str) -> Result<PathBuf> {
        let relative = Path::new(entry);
        let inside_source = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !inside_source || relative.file_name().is_none() {
            return Err(anyhow!(
                "Entry '{entry}' must be a file path relative to the source directory"
            ));
        }
        Ok(self.config.output_dir.join(relative))
    }
}

fn is_lua_file(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == LUA_EXTENSION)
}

/// Every `.lua` file directly inside `source_dir`, sorted by name
pub fn discover_entries(source_dir: &Path) -> Result<Vec<String>> {
    let read_dir = fs::read_dir(source_dir)
        .with_context(|| format!("Failed to read source directory {}", source_dir.display()))?;

    let mut entries = Vec::new();
    for dir_entry in read_dir {
        let path = dir_entry?.path();
        if !is_lua_file(&path) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            entries.push(name.to_owned());
        }
    }
    entries.sort();
    Ok(entries)
}

/// Module names of every `.lua` file below `mixin_root`, sorted
///
/// Names are relative to `source_dir`, so `mixin/FCMControl.lua` becomes
/// `mixin.FCMControl`; a missing mixin directory yields no mixins.
pub fn discover_mixins(source_dir: &Path, mixin_root: &Path) -> Result<Vec<String>> {
    if !mixin_root.is_dir() {
        debug!("No mixin directory at {}", mixin_root.display());
        return Ok(Vec::new());
    }

    let mut mixins = Vec::new();
    for dir_entry in WalkDir::new(mixin_root).follow_links(true) {
        let dir_entry =
            dir_entry.with_context(|| format!("Failed to scan {}", mixin_root.display()))?;
        let path = dir_entry.path();
        if !is_lua_file(path) {
            continue;
        }
        let relative = path
            .strip_prefix(source_dir)
            .with_context(|| format!("Mixin {} outside source directory", path.display()))?
            .with_extension("");
        let segments: Option<Vec<&str>> = relative
            .components()
            .map(|component| component.as_os_str().to_str())
            .collect();
        match segments {
            Some(segments) => mixins.push(segments.join(".")),
            None => warn!("Skipping mixin with non UTF-8 path {}", path.display()),
        }
    }
    mixins.sort();
    Ok(mixins)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn write(root: &Path, relative: &str, contents: &str) -> Result<()> {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        Ok(())
    }

    #[test]
    fn test_discover_entries_top_level_only() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        write(root, "b.lua", "")?;
        write(root, "a.lua", "")?;
        write(root, "notes.txt", "")?;
        write(root, "library/util.lua", "")?;

        assert_eq!(discover_entries(root)?, vec!["a.lua", "b.lua"]);
        Ok(())
    }

    #[test]
    fn test_discover_mixins_as_module_names() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        write(root, "mixin/FCMString.lua", "")?;
        write(root, "mixin/FCMControl.lua", "")?;
        write(root, "mixin/nested/FCXCustom.lua", "")?;
        write(root, "mixin/README.md", "")?;

        assert_eq!(
            discover_mixins(root, &root.join("mixin"))?,
            vec!["mixin.FCMControl", "mixin.FCMString", "mixin.nested.FCXCustom"]
        );
        Ok(())
    }

    #[test]
    fn test_missing_mixin_dir_is_empty() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        assert!(discover_mixins(root, &root.join("mixin"))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_bundle_options_follow_config() {
        let config = Config {
            extension_point: String::new(),
            ..Default::default()
        };
        let orchestrator = BundleOrchestrator::new(config);
        let options = orchestrator.bundle_options(vec!["mixin.A".to_owned()]);

        assert_eq!(options.extension_point, None);
        assert!(options.extra_modules.is_empty());
        assert!(options.injector.is_identity());
    }

    #[test]
    fn test_run_uses_configured_mixin_dir() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let source_dir = temp_dir.path().join("src");
        write(&source_dir, "main.lua", "require('library.mixin')")?;
        write(&source_dir, "library/mixin.lua", "return {}")?;
        write(&source_dir, "plugins/FCMTree.lua", "return {}")?;
        write(&source_dir, "mixin/FCMIgnored.lua", "return {}")?;
        let config = Config {
            source_dir,
            output_dir: temp_dir.path().join("dist"),
            mixin_dir: PathBuf::from("plugins"),
            ..Default::default()
        };

        let mut orchestrator = BundleOrchestrator::new(config);
        let summary = orchestrator.run(&["main.lua".to_owned()], None)?;

        assert_eq!(summary.bundles[0].module_count, 2);
        assert!(orchestrator.cache().contains("plugins.FCMTree"));
        assert!(!orchestrator.cache().contains("mixin.FCMIgnored"));
        Ok(())
    }

    #[test]
    fn test_entries_with_same_file_name_keep_their_directories() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let source_dir = temp_dir.path().join("src");
        let output_dir = temp_dir.path().join("dist");
        write(&source_dir, "a/x.lua", "return 'a'")?;
        write(&source_dir, "b/x.lua", "return 'b'")?;
        let config = Config {
            source_dir,
            output_dir: output_dir.clone(),
            strip_comments: false,
            ..Default::default()
        };

        let mut orchestrator = BundleOrchestrator::new(config);
        let summary = orchestrator.run(&["a/x.lua".to_owned(), "b/x.lua".to_owned()], None)?;

        assert_eq!(summary.bundles[0].output_path, output_dir.join("a/x.lua"));
        assert_eq!(fs::read_to_string(output_dir.join("a/x.lua"))?, "return 'a'");
        assert_eq!(fs::read_to_string(output_dir.join("b/x.lua"))?, "return 'b'");
        Ok(())
    }

    #[test]
    fn test_entry_outside_source_dir_is_rejected() {
        let orchestrator = BundleOrchestrator::new(Config::default());
        for entry in ["../x.lua", "/tmp/x.lua", ".."] {
            assert!(orchestrator.output_path(entry).is_err(), "{entry}");
        }
    }
}
