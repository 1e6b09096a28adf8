use std::path::Path;

use serde::{Deserialize, Serialize};
use solship_platform::BuildPlatform;

/// Environment variable names the step reads its inputs from.
pub mod env {
    pub const SOLUTION: &str = "xamarin_solution";
    pub const CONFIGURATION: &str = "xamarin_configuration";
    pub const PLATFORM: &str = "xamarin_platform";
    pub const PROJECT_TYPE_WHITELIST: &str = "project_type_whitelist";
    pub const ANDROID_CUSTOM_OPTIONS: &str = "android_build_command_custom_options";
    pub const IOS_CUSTOM_OPTIONS: &str = "ios_build_command_custom_options";
    pub const TVOS_CUSTOM_OPTIONS: &str = "tvos_build_command_custom_options";
    pub const MACOS_CUSTOM_OPTIONS: &str = "macos_build_command_custom_options";
    pub const FORCE_MDTOOL: &str = "force_mdtool";
    pub const DEPLOY_DIR: &str = "BITRISE_DEPLOY_DIR";
}

/// Step inputs. Every value is a plain string; absent values are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    pub solution: String,
    pub configuration: String,
    pub platform: String,
    pub project_type_whitelist: String,

    pub android_custom_options: String,
    pub ios_custom_options: String,
    pub tvos_custom_options: String,
    pub macos_custom_options: String,
    pub force_mdtool: String,

    pub deploy_dir: String,
}

impl StepConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, treating `None` as an empty value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).unwrap_or_default();
        Self {
            solution: get(env::SOLUTION),
            configuration: get(env::CONFIGURATION),
            platform: get(env::PLATFORM),
            project_type_whitelist: get(env::PROJECT_TYPE_WHITELIST),
            android_custom_options: get(env::ANDROID_CUSTOM_OPTIONS),
            ios_custom_options: get(env::IOS_CUSTOM_OPTIONS),
            tvos_custom_options: get(env::TVOS_CUSTOM_OPTIONS),
            macos_custom_options: get(env::MACOS_CUSTOM_OPTIONS),
            force_mdtool: get(env::FORCE_MDTOOL),
            deploy_dir: get(env::DEPLOY_DIR),
        }
    }

    /// Read and parse a TOML configuration file using the same field names.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Check every required input, including the deploy directory.
    ///
    /// # Errors
    /// Returns `ConfigError::Missing` for the first empty required input, or
    /// `ConfigError::SolutionNotFound` if the solution path does not exist.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_build_inputs()?;
        if self.deploy_dir.is_empty() {
            return Err(ConfigError::Missing {
                input: "deploy directory",
            });
        }
        Ok(())
    }

    /// Check the inputs needed to compute build commands: solution,
    /// configuration and platform.
    ///
    /// # Errors
    /// Returns `ConfigError::Missing` for the first empty input, or
    /// `ConfigError::SolutionNotFound` if the solution path does not exist.
    pub fn validate_build_inputs(&self) -> Result<(), ConfigError> {
        if self.solution.is_empty() {
            return Err(ConfigError::Missing { input: "solution" });
        }
        match std::fs::metadata(&self.solution) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::SolutionNotFound {
                    path: self.solution.clone(),
                })
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.solution.clone(),
                    source,
                })
            }
        }
        if self.configuration.is_empty() {
            return Err(ConfigError::Missing {
                input: "configuration",
            });
        }
        if self.platform.is_empty() {
            return Err(ConfigError::Missing { input: "platform" });
        }
        Ok(())
    }

    /// The raw custom build option string for `platform`.
    pub fn custom_options_for(&self, platform: BuildPlatform) -> &str {
        match platform {
            BuildPlatform::Android => &self.android_custom_options,
            BuildPlatform::Ios => &self.ios_custom_options,
            BuildPlatform::TvOs => &self.tvos_custom_options,
            BuildPlatform::MacOs => &self.macos_custom_options,
        }
    }

    /// Whether Apple projects should be built with mdtool instead of msbuild.
    pub fn use_mdtool(&self) -> bool {
        self.force_mdtool == "yes"
    }

    /// Log every input, grouped the way operators expect to read them.
    pub fn log(&self) {
        tracing::info!("Configs:");
        tracing::info!("- Solution: {}", self.solution);
        tracing::info!("- Configuration: {}", self.configuration);
        tracing::info!("- Platform: {}", self.platform);
        tracing::info!("- ProjectTypeWhitelist: {}", self.project_type_whitelist);

        tracing::info!("Experimental configs:");
        tracing::info!("- AndroidCustomOptions: {}", self.android_custom_options);
        tracing::info!("- IOSCustomOptions: {}", self.ios_custom_options);
        tracing::info!("- TvOSCustomOptions: {}", self.tvos_custom_options);
        tracing::info!("- MacOSCustomOptions: {}", self.macos_custom_options);
        tracing::info!("- ForceMDTool: {}", self.force_mdtool);

        tracing::info!("Other configs:");
        tracing::info!("- DeployDir: {}", self.deploy_dir);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no {input} specified")]
    Missing { input: &'static str },
    #[error("solution does not exist at {path}")]
    SolutionNotFound { path: String },
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid step configuration at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use super::*;

    fn valid_config(dir: &Path) -> StepConfig {
        let solution = dir.join("App.sln");
        fs::write(&solution, "").unwrap();
        StepConfig {
            solution: solution.display().to_string(),
            configuration: "Release".to_owned(),
            platform: "iPhone".to_owned(),
            deploy_dir: dir.join("deploy").display().to_string(),
            ..StepConfig::default()
        }
    }

    #[test]
    fn from_lookup_reads_known_keys() {
        let vars: HashMap<&str, &str> = [
            ("xamarin_solution", "/src/App.sln"),
            ("xamarin_configuration", "Release"),
            ("xamarin_platform", "iPhone"),
            ("project_type_whitelist", "ios,android"),
            ("ios_build_command_custom_options", "/p:A=1"),
            ("force_mdtool", "yes"),
            ("BITRISE_DEPLOY_DIR", "/deploy"),
        ]
        .into_iter()
        .collect();

        let config = StepConfig::from_lookup(|k| vars.get(k).map(|v| (*v).to_owned()));
        assert_eq!(config.solution, "/src/App.sln");
        assert_eq!(config.configuration, "Release");
        assert_eq!(config.platform, "iPhone");
        assert_eq!(config.project_type_whitelist, "ios,android");
        assert_eq!(config.custom_options_for(BuildPlatform::Ios), "/p:A=1");
        assert_eq!(config.custom_options_for(BuildPlatform::Android), "");
        assert!(config.use_mdtool());
        assert_eq!(config.deploy_dir, "/deploy");
    }

    #[test]
    fn absent_values_are_empty() {
        let config = StepConfig::from_lookup(|_| None);
        assert_eq!(config, StepConfig::default());
        assert!(!config.use_mdtool());
    }

    #[test]
    fn force_mdtool_requires_exact_yes() {
        let config = StepConfig {
            force_mdtool: "true".to_owned(),
            ..StepConfig::default()
        };
        assert!(!config.use_mdtool());
    }

    #[test]
    fn from_path_parses_partial_toml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("solship.toml");
        fs::write(
            &path,
            r#"
solution = "App.sln"
configuration = "Release"
platform = "iPhone"
tvos_custom_options = "-p:Foo=\"a b\""
"#,
        )
        .unwrap();

        let config = StepConfig::from_path(&path).unwrap();
        assert_eq!(config.solution, "App.sln");
        assert_eq!(config.tvos_custom_options, r#"-p:Foo="a b""#);
        assert_eq!(config.deploy_dir, "");
    }

    #[test]
    fn from_path_rejects_invalid_toml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("solship.toml");
        fs::write(&path, "solution = [").unwrap();
        let err = StepConfig::from_path(&path).unwrap_err().to_string();
        assert!(err.contains("invalid step configuration"), "error was: {err}");
    }

    #[test]
    fn from_path_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = StepConfig::from_path(&tmp.path().join("nope.toml"))
            .unwrap_err()
            .to_string();
        assert!(err.contains("cannot read"), "error was: {err}");
    }

    #[test]
    fn validate_accepts_complete_config() {
        let tmp = tempfile::tempdir().unwrap();
        valid_config(tmp.path()).validate().unwrap();
    }

    #[test]
    fn validate_requires_solution() {
        let err = StepConfig::default().validate().unwrap_err().to_string();
        assert_eq!(err, "no solution specified");
    }

    #[test]
    fn validate_requires_existing_solution() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StepConfig {
            solution: tmp.path().join("Missing.sln").display().to_string(),
            ..valid_config(tmp.path())
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("does not exist"), "error was: {err}");
    }

    #[test]
    fn validate_requires_configuration_and_platform() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StepConfig {
            configuration: String::new(),
            ..valid_config(tmp.path())
        };
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "no configuration specified"
        );

        let config = StepConfig {
            platform: String::new(),
            ..valid_config(tmp.path())
        };
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "no platform specified"
        );
    }

    #[test]
    fn validate_requires_deploy_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StepConfig {
            deploy_dir: String::new(),
            ..valid_config(tmp.path())
        };
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "no deploy directory specified"
        );
        assert!(config.validate_build_inputs().is_ok());
    }

    #[tracing_test::traced_test]
    #[test]
    fn log_prints_every_group() {
        let config = StepConfig {
            solution: "App.sln".to_owned(),
            macos_custom_options: "/p:X=1".to_owned(),
            deploy_dir: "/deploy".to_owned(),
            ..StepConfig::default()
        };
        config.log();
        assert!(logs_contain("- Solution: App.sln"));
        assert!(logs_contain("Experimental configs:"));
        assert!(logs_contain("- MacOSCustomOptions: /p:X=1"));
        assert!(logs_contain("- DeployDir: /deploy"));
    }
}
