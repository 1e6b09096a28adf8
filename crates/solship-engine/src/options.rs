//! Per-platform custom build options.

use std::collections::BTreeMap;

use solship_config::StepConfig;
use solship_msbuild::BuildCommand;
use solship_platform::BuildPlatform;

/// Extra command-line tokens appended to every build of a platform.
///
/// A platform without an entry gets no override. Built once before the
/// orchestrator runs and never changed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomOptions {
    by_platform: BTreeMap<BuildPlatform, Vec<String>>,
}

impl CustomOptions {
    /// Split each platform's raw option string with shell rules.
    ///
    /// An empty (or all-whitespace) string leaves the platform without an
    /// entry. A string that cannot be split is logged, reported in the
    /// returned warnings, and dropped; other platforms are unaffected.
    pub fn resolve<'a, I>(raw: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = (BuildPlatform, &'a str)>,
    {
        let mut options = Self::default();
        let mut warnings = Vec::new();

        for (platform, input) in raw {
            if input.trim().is_empty() {
                continue;
            }
            match solship_util::shell::split(input) {
                Ok(tokens) => {
                    options.by_platform.insert(platform, tokens);
                }
                Err(e) => {
                    tracing::error!("Failed to parse {platform} custom options: {e}");
                    warnings.push(format!(
                        "ignoring {platform} custom options \"{input}\": {e}"
                    ));
                }
            }
        }

        (options, warnings)
    }

    /// Resolve the raw option strings of every platform in `config`.
    pub fn from_config(config: &StepConfig) -> (Self, Vec<String>) {
        Self::resolve(
            BuildPlatform::ALL
                .into_iter()
                .map(|p| (p, config.custom_options_for(p))),
        )
    }

    pub fn get(&self, platform: BuildPlatform) -> Option<&[String]> {
        self.by_platform.get(&platform).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.by_platform.is_empty()
    }

    /// Append the options for `platform`, if any, to `command`.
    pub fn apply(&self, platform: BuildPlatform, command: &mut BuildCommand) {
        if let Some(options) = self.get(platform) {
            command.set_custom_options(options);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn quoted_option_stays_one_token() {
        let (options, warnings) =
            CustomOptions::resolve([(BuildPlatform::Ios, r#"-target:Build -p:Foo="a b""#)]);
        assert!(warnings.is_empty());
        assert_eq!(
            options.get(BuildPlatform::Ios).unwrap(),
            ["-target:Build", "-p:Foo=a b"]
        );
    }

    #[test]
    fn empty_string_means_no_entry() {
        let (options, warnings) = CustomOptions::resolve([
            (BuildPlatform::Android, ""),
            (BuildPlatform::MacOs, "   "),
        ]);
        assert!(warnings.is_empty());
        assert!(options.is_empty());
        assert_eq!(options.get(BuildPlatform::Android), None);
    }

    #[tracing_test::traced_test]
    #[test]
    fn malformed_platform_is_dropped_others_kept() {
        let (options, warnings) = CustomOptions::resolve([
            (BuildPlatform::Android, "/p:A=1"),
            (BuildPlatform::Ios, r#"/p:B="unterminated"#),
            (BuildPlatform::TvOs, "/v:minimal"),
        ]);

        assert_eq!(warnings.len(), 1);
        assert!(warnings.first().unwrap().contains("iOS"));
        assert_eq!(options.get(BuildPlatform::Ios), None);
        assert_eq!(options.get(BuildPlatform::Android).unwrap(), ["/p:A=1"]);
        assert_eq!(options.get(BuildPlatform::TvOs).unwrap(), ["/v:minimal"]);
        assert!(logs_contain("Failed to parse iOS custom options"));
    }

    #[test]
    fn from_config_reads_each_platform() {
        let config = StepConfig {
            android_custom_options: "/p:AndroidKeyStore=true".to_owned(),
            macos_custom_options: "/p:CreatePackage=true".to_owned(),
            ..StepConfig::default()
        };
        let (options, _) = CustomOptions::from_config(&config);
        assert_eq!(
            options.get(BuildPlatform::Android).unwrap(),
            ["/p:AndroidKeyStore=true"]
        );
        assert_eq!(options.get(BuildPlatform::Ios), None);
        assert_eq!(
            options.get(BuildPlatform::MacOs).unwrap(),
            ["/p:CreatePackage=true"]
        );
    }

    #[test]
    fn apply_appends_only_matching_platform() {
        let (options, _) = CustomOptions::resolve([(BuildPlatform::Ios, "/p:BuildIpa=false")]);

        let mut ios = BuildCommand::msbuild(Path::new("App.sln")).target("Build");
        options.apply(BuildPlatform::Ios, &mut ios);
        assert_eq!(ios.custom_options(), ["/p:BuildIpa=false"]);

        let mut android = BuildCommand::msbuild(Path::new("App.csproj"));
        options.apply(BuildPlatform::Android, &mut android);
        assert!(android.custom_options().is_empty());
    }
}
