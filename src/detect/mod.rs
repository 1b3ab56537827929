//! Project framework detection
//!
//! Each detector inspects the project root and reports a framework when
//! its markers are present. Detectors are dispatched through the trait,
//! first match in registry order wins; `Other` is the fallback.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Supported integration profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Framework {
    React,
    Vue,
    Angular,
    StaticSite,
    Other,
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::React => "react",
            Self::Vue => "vue",
            Self::Angular => "angular",
            Self::StaticSite => "static-site",
            Self::Other => "other",
        };
        write!(f, "{}", name)
    }
}

/// What a detector found
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub framework: Framework,
    /// Files or fields that triggered the match
    pub markers: Vec<String>,
}

/// A single framework heuristic
pub trait Detector {
    /// Detector name for logging
    fn name(&self) -> &'static str;

    /// Inspect the project root; `None` when the markers are absent
    fn detect(&self, root: &Path) -> Option<DetectionResult>;
}

/// Matches a dependency name inside package.json
struct PackageJsonDetector {
    framework: Framework,
    dependency: &'static str,
}

impl Detector for PackageJsonDetector {
    fn name(&self) -> &'static str {
        self.dependency
    }

    fn detect(&self, root: &Path) -> Option<DetectionResult> {
        let content = std::fs::read_to_string(root.join("package.json")).ok()?;
        let package: serde_json::Value = serde_json::from_str(&content).ok()?;

        let has_dep = ["dependencies", "devDependencies"].iter().any(|section| {
            package
                .get(section)
                .and_then(|deps| deps.get(self.dependency))
                .is_some()
        });

        has_dep.then(|| DetectionResult {
            framework: self.framework,
            markers: vec![format!("package.json: {}", self.dependency)],
        })
    }
}

/// Matches a bare index.html with no package.json
struct StaticSiteDetector;

impl Detector for StaticSiteDetector {
    fn name(&self) -> &'static str {
        "static-site"
    }

    fn detect(&self, root: &Path) -> Option<DetectionResult> {
        let has_index = root.join("index.html").is_file();
        let has_package = root.join("package.json").is_file();
        (has_index && !has_package).then(|| DetectionResult {
            framework: Framework::StaticSite,
            markers: vec!["index.html".to_string()],
        })
    }
}

/// All detectors in priority order
fn registry() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(PackageJsonDetector {
            framework: Framework::Angular,
            dependency: "@angular/core",
        }),
        Box::new(PackageJsonDetector {
            framework: Framework::React,
            dependency: "react",
        }),
        Box::new(PackageJsonDetector {
            framework: Framework::Vue,
            dependency: "vue",
        }),
        Box::new(StaticSiteDetector),
    ]
}

/// Detect the project's framework, falling back to `Other`.
pub fn detect_project(root: &Path) -> DetectionResult {
    for detector in registry() {
        if let Some(result) = detector.detect(root) {
            debug!("Detector {} matched: {}", detector.name(), result.framework);
            return result;
        }
    }
    DetectionResult {
        framework: Framework::Other,
        markers: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_package_json(dir: &TempDir, deps: &str) {
        std::fs::write(
            dir.path().join("package.json"),
            format!(r#"{{"name": "app", "dependencies": {deps}}}"#),
        )
        .unwrap();
    }

    #[test]
    fn detects_react() {
        let dir = TempDir::new().unwrap();
        write_package_json(&dir, r#"{"react": "^18.0.0"}"#);

        let result = detect_project(dir.path());
        assert_eq!(result.framework, Framework::React);
        assert!(result.markers[0].contains("react"));
    }

    #[test]
    fn detects_vue_from_dev_dependencies() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"name": "app", "devDependencies": {"vue": "^3.4.0"}}"#,
        )
        .unwrap();

        assert_eq!(detect_project(dir.path()).framework, Framework::Vue);
    }

    #[test]
    fn angular_wins_over_react_shims() {
        // Angular projects often pull react-flavored tooling transitively;
        // the registry checks @angular/core first
        let dir = TempDir::new().unwrap();
        write_package_json(&dir, r#"{"@angular/core": "^17.0.0", "react": "*"}"#);

        assert_eq!(detect_project(dir.path()).framework, Framework::Angular);
    }

    #[test]
    fn detects_static_site() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        assert_eq!(detect_project(dir.path()).framework, Framework::StaticSite);
    }

    #[test]
    fn falls_back_to_other() {
        let dir = TempDir::new().unwrap();
        let result = detect_project(dir.path());
        assert_eq!(result.framework, Framework::Other);
        assert!(result.markers.is_empty());
    }

    #[test]
    fn malformed_package_json_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("package.json"), "not json").unwrap();

        assert_eq!(detect_project(dir.path()).framework, Framework::Other);
    }
}
