/// Declarative build specifications handed to the external build service
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::buildspec::BuildSpec;
    use crate::utils::tests::get_sample_resource_file;

    #[test]
    fn default_recipe_builds_into_the_build_folder() {
        let spec = BuildSpec::node_default();
        assert_eq!(spec.artifacts.base_directory, Some("build".to_string()));
        assert_eq!(spec.phases.build.commands, vec!["npm run build".to_string()]);
        assert!(spec
            .phases
            .pre_build
            .commands
            .iter()
            .any(|c| c == "npm install"));
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn custom_spec_parses_from_yaml() {
        let s = get_sample_resource_file("custom_buildspec.yml")
            .expect("could not find custom_buildspec");
        let spec = BuildSpec::from_yaml(&s).expect("could not parse custom_buildspec");
        assert_eq!(spec.version, "0.2");
        assert_eq!(spec.env.shell, "bash");
        assert_eq!(spec.phases.build.commands, vec!["npm run build:prod".to_string()]);
        assert_eq!(spec.artifacts.base_directory, Some("dist".to_string()));
        assert_eq!(spec.artifacts.files, vec!["**/*".to_string()]);
        assert_eq!(spec.artifacts.discard_paths, false);
        assert_eq!(spec.cache.paths, vec!["node_modules/**/*".to_string()]);
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        let mut spec = BuildSpec::node_default();
        spec.cache.paths.push("node_modules/[".to_string());
        assert!(spec.validate().is_err());
    }

    #[test]
    fn missing_artifact_patterns_are_rejected() {
        let mut spec = BuildSpec::node_default();
        spec.artifacts.files.clear();
        assert!(spec.validate().is_err());
    }

    #[test]
    fn serializes_with_provider_key_names() {
        let s = serde_yaml::to_string(&BuildSpec::node_default())
            .expect("could not serialize default spec");
        assert!(s.contains("base-directory"));
        assert!(s.contains("pre_build"));
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
/// A complete phase → commands mapping plus artifact and cache patterns.
/// Serializes to:
/// ```yaml
/// version: "0.2"
/// env:
///   shell: bash
/// phases:
///   pre_build:
///     commands:
///       - npm install
///   build:
///     commands:
///       - npm run build
/// artifacts:
///   base-directory: build
///   files:
///     - "**/*"
/// cache:
///   paths:
///     - "node_modules/**/*"
/// ```
pub struct BuildSpec {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub env: BuildSpecEnv,
    pub phases: Phases,
    pub artifacts: ArtifactPatterns,
    #[serde(default)]
    pub cache: CachePatterns,
}

fn default_version() -> String {
    "0.2".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
/// Shell the build service runs commands under
pub struct BuildSpecEnv {
    pub shell: String,
}

impl Default for BuildSpecEnv {
    fn default() -> Self {
        BuildSpecEnv {
            shell: "bash".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq, Default)]
/// The three phases, always executed in declaration order
pub struct Phases {
    #[serde(default)]
    pub pre_build: Phase,
    #[serde(default)]
    pub build: Phase,
    #[serde(default)]
    pub post_build: Phase,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq, Default)]
/// Commands run sequentially; the first failure aborts the phase
pub struct Phase {
    #[serde(default)]
    pub commands: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
/// Path patterns describing what the build phase hands downstream
pub struct ArtifactPatterns {
    #[serde(rename = "base-directory", skip_serializing_if = "Option::is_none")]
    pub base_directory: Option<String>,
    pub files: Vec<String>,
    #[serde(rename = "discard-paths", default)]
    pub discard_paths: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq, Default)]
/// Path patterns kept warm between executions
pub struct CachePatterns {
    #[serde(default)]
    pub paths: Vec<String>,
}

impl BuildSpec {
    /// The shared default recipe: install dependencies, build, collect the
    /// fixed `build` output folder.
    pub fn node_default() -> Self {
        BuildSpec {
            version: default_version(),
            env: BuildSpecEnv::default(),
            phases: Phases {
                pre_build: Phase {
                    commands: vec![
                        "echo Build started on `date`".to_string(),
                        "node --version".to_string(),
                        "npm install".to_string(),
                    ],
                },
                build: Phase {
                    commands: vec!["npm run build".to_string()],
                },
                post_build: Phase {
                    commands: vec!["echo Build completed on `date`".to_string()],
                },
            },
            artifacts: ArtifactPatterns {
                base_directory: Some("build".to_string()),
                files: vec!["**/*".to_string()],
                discard_paths: false,
            },
            cache: CachePatterns {
                paths: vec!["node_modules/**/*".to_string()],
            },
        }
    }

    /// Recipe packaging the backend function bundle (gradle + npm build)
    pub fn lambda_package() -> Self {
        BuildSpec {
            version: default_version(),
            env: BuildSpecEnv::default(),
            phases: Phases {
                pre_build: Phase {
                    commands: vec![
                        "echo Build started on `date`".to_string(),
                        "gradle --version".to_string(),
                        "node --version".to_string(),
                        "npm install".to_string(),
                    ],
                },
                build: Phase {
                    commands: vec![
                        "./gradlew build".to_string(),
                        "npm run build".to_string(),
                    ],
                },
                post_build: Phase {
                    commands: vec!["echo Build completed on `date`".to_string()],
                },
            },
            artifacts: ArtifactPatterns {
                base_directory: None,
                files: vec!["build/**/*".to_string()],
                discard_paths: false,
            },
            cache: CachePatterns {
                paths: vec!["node_modules/**/*".to_string()],
            },
        }
    }

    /// Recipe projecting the generated API model out of the gradle build
    pub fn api_model() -> Self {
        BuildSpec {
            version: default_version(),
            env: BuildSpecEnv::default(),
            phases: Phases {
                pre_build: Phase {
                    commands: vec![
                        "echo Build started on `date`".to_string(),
                        "gradle --version".to_string(),
                    ],
                },
                build: Phase {
                    commands: vec!["./gradlew build".to_string()],
                },
                post_build: Phase {
                    commands: vec!["echo Build completed on `date`".to_string()],
                },
            },
            artifacts: ArtifactPatterns {
                base_directory: None,
                files: vec!["server/codegen/build/smithyprojections/**/openapi/*".to_string()],
                discard_paths: true,
            },
            cache: CachePatterns::default(),
        }
    }

    /// Reads a specification from its YAML form and validates it
    pub fn from_yaml(s: &str) -> Result<Self> {
        let spec: BuildSpec = serde_yaml::from_str(s)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Checks the declared path patterns. Command contents are deliberately
    /// not inspected; they only fail at execution time, outside this crate.
    pub fn validate(&self) -> Result<()> {
        if self.artifacts.files.is_empty() {
            return Err(anyhow!("build spec declares no output artifact patterns"));
        }
        for p in self.artifacts.files.iter().chain(self.cache.paths.iter()) {
            glob::Pattern::new(p).map_err(|e| anyhow!("invalid path pattern {:?}: {}", p, e))?;
        }
        Ok(())
    }
}
