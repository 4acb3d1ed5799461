/// Assembly of the release pipeline a repository deploys through.
///
/// The caller hands in a source location, a destination and optional build
/// specifications; the assembler wires every stage and artifact itself and
/// checks the result before returning it. Nothing here executes; the
/// definition is interpreted by the external orchestrator.
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use anyhow::{anyhow, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::buildspec::BuildSpec;
use crate::stack::ResourceRef;
use crate::utils::ensure_present;

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::buildspec::BuildSpec;
    use crate::cicd::{
        assemble_release_pipeline, verify_wiring, Action, Artifact, AuxiliaryBuild,
        DeploymentTarget, PipelineDefinition, ReleasePipelineProps, SecretRef, SourceRef, Stage,
        BUILD_STAGE, DEPLOY_STAGE, SOURCE_STAGE,
    };
    use crate::stack::ResourceRef;

    fn sample_props() -> ReleasePipelineProps {
        ReleasePipelineProps {
            source: SourceRef {
                owner: "Acme".to_string(),
                repository: "Widgets".to_string(),
                branch: "main".to_string(),
                credential: SecretRef("github-token".to_string()),
            },
            deployment_target: DeploymentTarget::new(ResourceRef {
                stack: "pipeline".to_string(),
                id: "assets-bucket".to_string(),
            }),
            build_spec: None,
            auxiliary: None,
        }
    }

    fn with_auxiliary(mut props: ReleasePipelineProps) -> ReleasePipelineProps {
        props.auxiliary = Some(AuxiliaryBuild {
            build_spec: BuildSpec::api_model(),
            destination_key: "api/definition".to_string(),
        });
        props
    }

    #[test]
    fn three_stages_in_fixed_order() {
        let p = assemble_release_pipeline(&sample_props()).expect("could not assemble");
        let names: Vec<&str> = p.definition.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec![SOURCE_STAGE, BUILD_STAGE, DEPLOY_STAGE]);
    }

    #[test]
    fn single_leg_has_one_action_per_stage() {
        let p = assemble_release_pipeline(&sample_props()).expect("could not assemble");
        assert_eq!(p.definition.stages[1].actions.len(), 1);
        assert_eq!(p.definition.stages[2].actions.len(), 1);
        assert_eq!(p.projects.len(), 1);
    }

    #[test]
    fn auxiliary_leg_doubles_build_and_deploy() {
        let p = assemble_release_pipeline(&with_auxiliary(sample_props()))
            .expect("could not assemble");
        assert_eq!(p.definition.stages[0].actions.len(), 1);
        assert_eq!(p.definition.stages[1].actions.len(), 2);
        assert_eq!(p.definition.stages[2].actions.len(), 2);
        assert_eq!(p.projects.len(), 2);
    }

    #[test]
    fn source_fetches_the_configured_repository() {
        let p = assemble_release_pipeline(&sample_props()).expect("could not assemble");
        match &p.definition.stages[0].actions[0] {
            Action::FetchSource {
                owner,
                repository,
                branch,
                webhook,
                output,
                ..
            } => {
                assert_eq!(owner, "Acme");
                assert_eq!(repository, "Widgets");
                assert_eq!(branch, "main");
                assert!(*webhook);
                assert_eq!(output, &Artifact("WidgetsSource".to_string()));
            }
            other => panic!("unexpected first action: {:?}", other),
        }
        // the default recipe is used when no spec is given
        assert_eq!(p.projects[0].1.build_spec, BuildSpec::node_default());
        // extraction stays disabled by default
        match &p.definition.stages[2].actions[0] {
            Action::Deploy {
                extract,
                destination_key,
                ..
            } => {
                assert!(!extract);
                assert_eq!(destination_key, &None);
            }
            other => panic!("unexpected deploy action: {:?}", other),
        }
        // no auxiliary artifacts anywhere in the definition
        for stage in &p.definition.stages {
            for action in &stage.actions {
                for artifact in action.inputs().iter().chain(action.outputs().iter()) {
                    assert!(!artifact.0.ends_with("PackageOutput"));
                }
            }
        }
    }

    #[test]
    fn legs_do_not_share_artifacts() {
        let p = assemble_release_pipeline(&with_auxiliary(sample_props()))
            .expect("could not assemble");
        let build = &p.definition.stages[1].actions;
        let deploy = &p.definition.stages[2].actions;
        let primary_output = build[0].outputs()[0].clone();
        let auxiliary_output = build[1].outputs()[0].clone();
        assert_eq!(deploy[0].inputs(), vec![&primary_output]);
        assert_eq!(deploy[1].inputs(), vec![&auxiliary_output]);
        assert!(primary_output != auxiliary_output);
    }

    #[test]
    fn target_policy_passes_through() {
        let mut props = sample_props();
        props.deployment_target.extract = true;
        props.deployment_target.destination_key = Some("site".to_string());
        let p = assemble_release_pipeline(&props).expect("could not assemble");
        match &p.definition.stages[2].actions[0] {
            Action::Deploy {
                extract,
                destination_key,
                ..
            } => {
                assert!(*extract);
                assert_eq!(destination_key, &Some("site".to_string()));
            }
            other => panic!("unexpected deploy action: {:?}", other),
        }
    }

    #[test]
    fn auxiliary_deploy_always_extracts() {
        // the primary leg keeps extraction off, the auxiliary one never does
        let p = assemble_release_pipeline(&with_auxiliary(sample_props()))
            .expect("could not assemble");
        match &p.definition.stages[2].actions[1] {
            Action::Deploy {
                extract,
                destination_key,
                ..
            } => {
                assert!(*extract);
                assert_eq!(destination_key, &Some("api/definition".to_string()));
            }
            other => panic!("unexpected deploy action: {:?}", other),
        }
    }

    #[test]
    fn empty_repository_name_is_rejected() {
        let mut props = sample_props();
        props.source.repository = "".to_string();
        let err = assemble_release_pipeline(&props).expect_err("assembly should fail");
        assert!(format!("{}", err).contains("repository name"));
    }

    #[test]
    fn auxiliary_key_must_differ_from_primary() {
        let mut props = with_auxiliary(sample_props());
        props.deployment_target.destination_key = Some("api/definition".to_string());
        assert!(assemble_release_pipeline(&props).is_err());
    }

    #[test]
    fn wiring_rejects_same_stage_consumption() {
        let a = Artifact("A".to_string());
        let definition = PipelineDefinition {
            name: "broken".to_string(),
            stages: vec![Stage {
                name: BUILD_STAGE.to_string(),
                actions: vec![
                    Action::FetchSource {
                        name: "produce".to_string(),
                        owner: "o".to_string(),
                        repository: "r".to_string(),
                        branch: "main".to_string(),
                        credential: SecretRef("token".to_string()),
                        webhook: true,
                        output: a.clone(),
                    },
                    Action::Deploy {
                        name: "consume".to_string(),
                        bucket: ResourceRef {
                            stack: "s".to_string(),
                            id: "b".to_string(),
                        },
                        input: a,
                        extract: false,
                        destination_key: None,
                    },
                ],
            }],
        };
        assert!(verify_wiring(&definition).is_err());
    }

    #[test]
    fn wiring_rejects_double_production() {
        let a = Artifact("A".to_string());
        let stage = |name: &str| Stage {
            name: name.to_string(),
            actions: vec![Action::FetchSource {
                name: "fetch".to_string(),
                owner: "o".to_string(),
                repository: "r".to_string(),
                branch: "main".to_string(),
                credential: SecretRef("token".to_string()),
                webhook: true,
                output: a.clone(),
            }],
        };
        let definition = PipelineDefinition {
            name: "broken".to_string(),
            stages: vec![stage("first"), stage("second")],
        };
        assert!(verify_wiring(&definition).is_err());
    }
}

pub const SOURCE_STAGE: &str = "Source";
pub const BUILD_STAGE: &str = "Build";
pub const DEPLOY_STAGE: &str = "Deploy";

/// Execution image and timeout every build project runs with
const BUILD_IMAGE: &str = "standard:6.0";
const BUILD_TIMEOUT_MINUTES: u64 = 30;

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
/// Identifies one remote version-control location and the credential able to
/// read it
pub struct SourceRef {
    pub owner: String,
    pub repository: String,
    pub branch: String,
    pub credential: SecretRef,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq, Hash)]
#[serde(transparent)]
/// An opaque handle to a secret. The orchestrator resolves it at execution
/// time; the value is never read here.
pub struct SecretRef(pub String);

impl Display for SecretRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
/// A storage location plus its write policy
pub struct DeploymentTarget {
    pub bucket: ResourceRef,
    /// extract the archive before writing instead of placing it as-is
    #[serde(default)]
    pub extract: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_key: Option<String>,
}

impl DeploymentTarget {
    /// Target with the default write policy: overwrite in place, no key
    /// override
    pub fn new(bucket: ResourceRef) -> Self {
        DeploymentTarget {
            bucket,
            extract: false,
            destination_key: None,
        }
    }
}

#[derive(Debug, Clone)]
/// The optional second build/publish leg. Its artifacts always land
/// extracted, under a key of their own.
pub struct AuxiliaryBuild {
    pub build_spec: BuildSpec,
    pub destination_key: String,
}

#[derive(Debug, Clone)]
pub struct ReleasePipelineProps {
    pub source: SourceRef,
    pub deployment_target: DeploymentTarget,
    /// None falls back to [BuildSpec::node_default]
    pub build_spec: Option<BuildSpec>,
    pub auxiliary: Option<AuxiliaryBuild>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq, Hash)]
#[serde(transparent)]
/// A named opaque bundle passed between actions
pub struct Artifact(pub String);

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
/// A single unit of work within a stage
pub enum Action {
    /// Fetches the repository content on webhook push events
    FetchSource {
        name: String,
        owner: String,
        repository: String,
        branch: String,
        credential: SecretRef,
        webhook: bool,
        output: Artifact,
    },
    /// Runs a build project against an input artifact
    Build {
        name: String,
        /// logical id of the build project within the owning stack
        project: String,
        input: Artifact,
        output: Artifact,
    },
    /// Publishes an artifact to a bucket
    Deploy {
        name: String,
        bucket: ResourceRef,
        input: Artifact,
        extract: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        destination_key: Option<String>,
    },
}

impl Action {
    pub fn name(&self) -> &str {
        match self {
            Action::FetchSource { name, .. } => name,
            Action::Build { name, .. } => name,
            Action::Deploy { name, .. } => name,
        }
    }

    pub fn inputs(&self) -> Vec<&Artifact> {
        match self {
            Action::FetchSource { .. } => vec![],
            Action::Build { input, .. } => vec![input],
            Action::Deploy { input, .. } => vec![input],
        }
    }

    pub fn outputs(&self) -> Vec<&Artifact> {
        match self {
            Action::FetchSource { output, .. } => vec![output],
            Action::Build { output, .. } => vec![output],
            Action::Deploy { .. } => vec![],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
/// An ordered phase of a pipeline. Stages execute strictly in sequence;
/// actions inside one stage may run concurrently when they share no artifact.
pub struct Stage {
    pub name: String,
    pub actions: Vec<Action>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct PipelineDefinition {
    pub name: String,
    pub stages: Vec<Stage>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
/// Where a build project pulls its source from
pub struct ProjectSource {
    pub owner: String,
    pub repository: String,
    pub branch: String,
    pub webhook: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ComputeSize {
    Small,
    Medium,
    Large,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct BuildEnvironment {
    pub image: String,
    pub compute: ComputeSize,
    pub privileged: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
/// What the external build service runs for one build action
pub struct BuildProject {
    pub source: ProjectSource,
    pub environment: BuildEnvironment,
    pub timeout_minutes: u64,
    pub build_spec: BuildSpec,
}

#[derive(Debug, Clone)]
/// A fully wired pipeline plus the build projects its build actions run
pub struct ReleasePipeline {
    pub definition: PipelineDefinition,
    /// (logical id, project) pairs, one per build action
    pub projects: Vec<(String, BuildProject)>,
}

/// Assembles the three-stage release pipeline for one repository. No manual
/// stage wiring is required by the caller; the returned definition has been
/// verified against the artifact-flow invariants.
pub fn assemble_release_pipeline(props: &ReleasePipelineProps) -> Result<ReleasePipeline> {
    validate_props(props)?;
    let repo = &props.source.repository;
    let build_spec = props
        .build_spec
        .clone()
        .unwrap_or_else(BuildSpec::node_default);
    build_spec.validate()?;

    let source_artifact = Artifact(format!("{}Source", repo));
    let build_output = Artifact(format!("{}BuildOutput", repo));

    let mut projects = vec![(
        format!("{}-build-project", repo),
        build_project(&props.source, build_spec),
    )];

    let fetch = Action::FetchSource {
        name: "Github".to_string(),
        owner: props.source.owner.clone(),
        repository: repo.clone(),
        branch: props.source.branch.clone(),
        credential: props.source.credential.clone(),
        webhook: true,
        output: source_artifact.clone(),
    };
    let mut build_actions = vec![Action::Build {
        name: "Build".to_string(),
        project: projects[0].0.clone(),
        input: source_artifact.clone(),
        output: build_output.clone(),
    }];
    let mut deploy_actions = vec![Action::Deploy {
        name: "Deploy".to_string(),
        bucket: props.deployment_target.bucket.clone(),
        input: build_output,
        extract: props.deployment_target.extract,
        destination_key: props.deployment_target.destination_key.clone(),
    }];

    // the optional second leg is a plain conditional append
    if let Some(aux) = &props.auxiliary {
        aux.build_spec.validate()?;
        let package_output = Artifact(format!("{}PackageOutput", repo));
        let project_id = format!("{}-package-project", repo);
        projects.push((
            project_id.clone(),
            build_project(&props.source, aux.build_spec.clone()),
        ));
        build_actions.push(Action::Build {
            name: "PackageBuild".to_string(),
            project: project_id,
            input: source_artifact,
            output: package_output.clone(),
        });
        deploy_actions.push(Action::Deploy {
            name: "PackageDeploy".to_string(),
            bucket: props.deployment_target.bucket.clone(),
            input: package_output,
            // the second leg always unpacks its archive
            extract: true,
            destination_key: Some(aux.destination_key.clone()),
        });
    }

    let definition = PipelineDefinition {
        name: format!("{}-deployment-pipeline", repo),
        stages: vec![
            Stage {
                name: SOURCE_STAGE.to_string(),
                actions: vec![fetch],
            },
            Stage {
                name: BUILD_STAGE.to_string(),
                actions: build_actions,
            },
            Stage {
                name: DEPLOY_STAGE.to_string(),
                actions: deploy_actions,
            },
        ],
    };
    verify_wiring(&definition)?;
    debug!("assembled pipeline {:?}", definition.name);

    Ok(ReleasePipeline {
        definition,
        projects,
    })
}

fn build_project(source: &SourceRef, build_spec: BuildSpec) -> BuildProject {
    BuildProject {
        source: ProjectSource {
            owner: source.owner.clone(),
            repository: source.repository.clone(),
            branch: source.branch.clone(),
            webhook: true,
        },
        environment: BuildEnvironment {
            image: BUILD_IMAGE.to_string(),
            compute: ComputeSize::Small,
            privileged: true,
        },
        timeout_minutes: BUILD_TIMEOUT_MINUTES,
        build_spec,
    }
}

fn validate_props(props: &ReleasePipelineProps) -> Result<()> {
    ensure_present("repository owner", &props.source.owner)?;
    ensure_present("repository name", &props.source.repository)?;
    ensure_present("target branch", &props.source.branch)?;
    ensure_present("credential reference", &props.source.credential.0)?;
    if let Some(aux) = &props.auxiliary {
        ensure_present("auxiliary destination key", &aux.destination_key)?;
        if props.deployment_target.destination_key.as_deref() == Some(aux.destination_key.as_str())
        {
            return Err(anyhow!(
                "auxiliary leg must publish to its own destination key, got {:?} for both legs",
                aux.destination_key
            ));
        }
    }
    Ok(())
}

/// Checks the artifact flow of a definition: every artifact is produced
/// exactly once, consumed at most once, and only by a stage after the one
/// producing it.
pub fn verify_wiring(definition: &PipelineDefinition) -> Result<()> {
    let mut produced: HashMap<&Artifact, usize> = HashMap::new();
    for (idx, stage) in definition.stages.iter().enumerate() {
        for action in &stage.actions {
            for output in action.outputs() {
                if produced.insert(output, idx).is_some() {
                    return Err(anyhow!("artifact {:?} is produced more than once", output.0));
                }
            }
        }
    }
    let mut consumers: HashMap<&Artifact, usize> = HashMap::new();
    for (idx, stage) in definition.stages.iter().enumerate() {
        for action in &stage.actions {
            for input in action.inputs() {
                match produced.get(input) {
                    None => {
                        return Err(anyhow!(
                            "action {:?} consumes unknown artifact {:?}",
                            action.name(),
                            input.0
                        ));
                    }
                    Some(&p) if p >= idx => {
                        return Err(anyhow!(
                            "action {:?} consumes artifact {:?}, which is not produced by an earlier stage",
                            action.name(),
                            input.0
                        ));
                    }
                    Some(_) => {}
                }
                let seen = consumers.entry(input).or_insert(0);
                *seen += 1;
                if *seen > 1 {
                    return Err(anyhow!("artifact {:?} is consumed more than once", input.0));
                }
            }
        }
    }
    Ok(())
}
