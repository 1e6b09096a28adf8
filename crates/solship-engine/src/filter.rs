//! Project type whitelist.

use solship_platform::{BuildPlatform, PlatformError, Project};

/// Parse a comma-separated list of platform names.
///
/// Tokens are trimmed and empty tokens skipped, so `""` and `" , "` both mean
/// "no whitelist".
///
/// # Errors
/// Returns an error naming the first token that is not a known platform.
pub fn parse_whitelist(raw: &str) -> Result<Vec<BuildPlatform>, PlatformError> {
    let mut platforms = Vec::new();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let platform: BuildPlatform = token.parse()?;
        if !platforms.contains(&platform) {
            platforms.push(platform);
        }
    }
    Ok(platforms)
}

/// Keep the projects whose platform is whitelisted, in their original order.
/// An empty whitelist keeps everything.
pub fn filter_projects(projects: Vec<Project>, whitelist: &[BuildPlatform]) -> Vec<Project> {
    if whitelist.is_empty() {
        return projects;
    }
    projects
        .into_iter()
        .filter(|p| {
            let keep = whitelist.contains(&p.platform);
            if !keep {
                tracing::debug!(project = %p.name, platform = %p.platform, "not whitelisted");
            }
            keep
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;

    use super::*;

    fn project(name: &str, platform: BuildPlatform) -> Project {
        Project::new(name, Path::new(name), platform)
    }

    #[test]
    fn parse_trims_and_skips_empty_tokens() {
        assert_eq!(
            parse_whitelist(" ios , ,Android,").unwrap(),
            vec![BuildPlatform::Ios, BuildPlatform::Android]
        );
        assert!(parse_whitelist("").unwrap().is_empty());
        assert!(parse_whitelist(" , ").unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_unknown_platform() {
        let err = parse_whitelist("ios,windows").unwrap_err();
        assert!(err.to_string().contains("windows"), "error was: {err}");
    }

    #[test]
    fn filter_keeps_whitelisted_in_order() {
        let projects = vec![
            project("A.Droid", BuildPlatform::Android),
            project("A.iOS", BuildPlatform::Ios),
            project("A.Mac", BuildPlatform::MacOs),
            project("B.iOS", BuildPlatform::Ios),
        ];
        let kept = filter_projects(projects, &[BuildPlatform::Ios, BuildPlatform::MacOs]);
        let names: Vec<&str> = kept.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["A.iOS", "A.Mac", "B.iOS"]);
    }

    #[test]
    fn empty_whitelist_keeps_everything() {
        let projects = vec![
            project("A.Droid", BuildPlatform::Android),
            project("A.iOS", BuildPlatform::Ios),
        ];
        assert_eq!(filter_projects(projects.clone(), &[]), projects);
    }
}
