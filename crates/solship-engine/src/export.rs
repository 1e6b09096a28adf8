//! Artifact export: classify, copy into the deploy directory, register.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use solship_platform::{Artifact, ArtifactKind, BuildPlatform};
use solship_util::archive::Archiver;
use solship_util::fs::{clear_destination, copy_dir, copy_file, numbered_file_name, ConflictPolicy};

use crate::collect::ProjectOutput;
use crate::error::EngineError;
use crate::sink::EnvSink;

/// How an artifact reaches the deploy directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStrategy {
    /// Copy the file under its own name.
    File,
    /// Copy the directory tree under its own name.
    Directory,
    /// Zip the directory into `<name>.zip`, rooted at the directory's name.
    Zip,
}

/// One row of the classification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRule {
    pub platform: BuildPlatform,
    pub kind: ArtifactKind,
    pub strategy: ExportStrategy,
    /// Environment key the exported path is registered under.
    pub key: &'static str,
    /// Short name used in log lines.
    pub label: &'static str,
}

const fn rule(
    platform: BuildPlatform,
    kind: ArtifactKind,
    strategy: ExportStrategy,
    key: &'static str,
    label: &'static str,
) -> ExportRule {
    ExportRule {
        platform,
        kind,
        strategy,
        key,
        label,
    }
}

/// Every exportable (platform, kind) pair.
///
/// iOS keys are unqualified; the other Apple platforms carry their name so a
/// run building several of them never overwrites another platform's key.
pub const EXPORT_RULES: &[ExportRule] = {
    use ArtifactKind::{AppBundle, DebugSymbols, InstallablePackage, InstallerPackage, PackageArchive};
    use BuildPlatform::{Android, Ios, MacOs, TvOs};
    use ExportStrategy::{Directory, File, Zip};
    &[
        rule(Android, InstallablePackage, File, "BITRISE_APK_PATH", "apk"),
        rule(Ios, PackageArchive, Directory, "BITRISE_XCARCHIVE_PATH", "xcarchive"),
        rule(Ios, InstallablePackage, File, "BITRISE_IPA_PATH", "ipa"),
        rule(Ios, DebugSymbols, Zip, "BITRISE_DSYM_PATH", "dSYM zip"),
        rule(Ios, AppBundle, Directory, "BITRISE_APP_PATH", "app"),
        rule(TvOs, PackageArchive, Directory, "BITRISE_TVOS_XCARCHIVE_PATH", "tvOS xcarchive"),
        rule(TvOs, InstallablePackage, File, "BITRISE_TVOS_IPA_PATH", "tvOS ipa"),
        rule(TvOs, DebugSymbols, Zip, "BITRISE_TVOS_DSYM_PATH", "tvOS dSYM zip"),
        rule(TvOs, AppBundle, Directory, "BITRISE_TVOS_APP_PATH", "tvOS app"),
        rule(MacOs, PackageArchive, Directory, "BITRISE_MACOS_XCARCHIVE_PATH", "macOS xcarchive"),
        rule(MacOs, AppBundle, Directory, "BITRISE_MACOS_APP_PATH", "macOS app"),
        rule(MacOs, InstallerPackage, File, "BITRISE_MACOS_PKG_PATH", "macOS pkg"),
    ]
};

/// Look up the rule for a (platform, kind) pair.
pub fn rule_for(platform: BuildPlatform, kind: ArtifactKind) -> Option<&'static ExportRule> {
    EXPORT_RULES
        .iter()
        .find(|r| r.platform == platform && r.kind == kind)
}

/// An exported artifact: the key it was registered under and where it now lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRecord {
    pub key: String,
    pub path: PathBuf,
}

/// Exports artifacts into one deploy directory and registers each result.
///
/// Within a run nothing is overwritten: a key registered again gets a
/// `_<n>` suffix and a file name used again gets a `-<n>` suffix.
pub struct Exporter<'a> {
    deploy_dir: PathBuf,
    policy: ConflictPolicy,
    archiver: &'a dyn Archiver,
    sink: &'a mut dyn EnvSink,
    key_uses: HashMap<&'static str, usize>,
    used_names: HashSet<String>,
    records: Vec<ExportRecord>,
}

impl<'a> Exporter<'a> {
    pub fn new(deploy_dir: &Path, archiver: &'a dyn Archiver, sink: &'a mut dyn EnvSink) -> Self {
        Self {
            deploy_dir: deploy_dir.to_path_buf(),
            policy: ConflictPolicy::default(),
            archiver,
            sink,
            key_uses: HashMap::new(),
            used_names: HashSet::new(),
            records: Vec::new(),
        }
    }

    /// What to do with a destination left behind by an earlier run.
    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Records exported so far, in export order.
    pub fn records(&self) -> &[ExportRecord] {
        &self.records
    }

    /// Export every artifact of every project, stopping at the first failure.
    ///
    /// # Errors
    /// Returns an error for the first export that fails. Artifacts exported
    /// before the failure stay registered.
    pub fn export_all(&mut self, outputs: &[ProjectOutput]) -> Result<Vec<ExportRecord>, EngineError> {
        for output in outputs {
            if !output.artifacts.is_empty() {
                tracing::info!("{} outputs:", output.project);
            }
            for artifact in &output.artifacts {
                self.export(output.platform, artifact)?;
            }
        }
        Ok(self.records.clone())
    }

    /// Export one artifact. Returns `None` when no rule covers it.
    ///
    /// # Errors
    /// Returns `EngineError::Export` if copying or archiving fails, or
    /// `EngineError::Register` if the sink rejects the key.
    pub fn export(
        &mut self,
        platform: BuildPlatform,
        artifact: &Artifact,
    ) -> Result<Option<ExportRecord>, EngineError> {
        let Some(rule) = rule_for(platform, artifact.kind) else {
            tracing::warn!(
                "no export rule for {platform} {}, skipping {}",
                artifact.kind,
                artifact.path.display()
            );
            return Ok(None);
        };

        let export_err = |source| EngineError::Export {
            path: artifact.path.display().to_string(),
            source,
        };
        let Some(name) = artifact.path.file_name() else {
            return Err(export_err(solship_util::error::UtilError::NoFileName {
                path: artifact.path.display().to_string(),
            }));
        };
        let name = name.to_string_lossy();
        solship_util::fs::ensure_dir(&self.deploy_dir).map_err(export_err)?;

        let dest = match rule.strategy {
            ExportStrategy::File => {
                let dest = self.destination(&name);
                copy_file(&artifact.path, &dest, self.policy).map_err(export_err)?;
                dest
            }
            ExportStrategy::Directory => {
                let dest = self.destination(&name);
                copy_dir(&artifact.path, &dest, self.policy).map_err(export_err)?;
                dest
            }
            ExportStrategy::Zip => {
                let dest = self.destination(&format!("{name}.zip"));
                clear_destination(&dest, self.policy).map_err(export_err)?;
                self.archiver
                    .zip_dir(&artifact.path, &dest)
                    .map_err(export_err)?;
                dest
            }
        };

        let key = self.next_key(rule.key);
        let value = dest.display().to_string();
        self.sink.register(&key, &value)?;
        tracing::info!(
            "The {} path is now available in the Environment Variable: {key} (value: {value})",
            rule.label
        );

        let record = ExportRecord { key, path: dest };
        self.records.push(record.clone());
        Ok(Some(record))
    }

    /// A deploy path for `name` not yet used in this run.
    fn destination(&mut self, name: &str) -> PathBuf {
        let mut candidate = name.to_owned();
        let mut n = 1;
        while self.used_names.contains(&candidate) {
            n += 1;
            candidate = numbered_file_name(name, n);
        }
        let dest = self.deploy_dir.join(&candidate);
        self.used_names.insert(candidate);
        dest
    }

    fn next_key(&mut self, key: &'static str) -> String {
        let uses = self.key_uses.entry(key).or_insert(0);
        *uses += 1;
        match *uses {
            1 => key.to_owned(),
            n => format!("{key}_{n}"),
        }
    }
}
