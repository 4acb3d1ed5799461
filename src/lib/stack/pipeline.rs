/// Website assets bucket, origin access and both release pipelines
use anyhow::Result;

use crate::buildspec::BuildSpec;
use crate::cicd::{
    assemble_release_pipeline, AuxiliaryBuild, DeploymentTarget, ReleasePipeline,
    ReleasePipelineProps, SecretRef, SourceRef,
};
use crate::conf::PlatformConfig;
use crate::stack::backend::BackendOutputs;
use crate::stack::repositories::RepositoriesOutputs;
use crate::stack::{
    Bucket, BucketAccess, OriginAccessIdentity, Resource, ResourceRef, Stack,
};

pub const STACK_NAME: &str = "pipeline";
pub const ASSETS_BUCKET_ID: &str = "website-assets-bucket";
pub const ORIGIN_ACCESS_IDENTITY_ID: &str = "origin-access-identity";
pub const WEBSITE_PIPELINE_ID: &str = "website-deploy-pipeline";
pub const BACKEND_PIPELINE_ID: &str = "backend-deploy-pipeline";


/// Handles the content-hosting stack consumes
pub struct PipelineOutputs {
    pub assets_bucket: ResourceRef,
    pub origin_access_identity: ResourceRef,
}

pub fn assemble(
    config: &PlatformConfig,
    repos: &RepositoriesOutputs,
    backend: &BackendOutputs,
) -> Result<(Stack, PipelineOutputs)> {
    let mut stack = Stack::new(STACK_NAME, config.environment())?;

    let origin_access_identity = stack.add_resource(
        ORIGIN_ACCESS_IDENTITY_ID,
        Resource::OriginAccessIdentity(OriginAccessIdentity {
            comment: "read access for the blog distribution".to_string(),
        }),
    )?;
    let assets_bucket = stack.add_resource(
        ASSETS_BUCKET_ID,
        Resource::Bucket(Bucket {
            access_control: BucketAccess::Private,
            read_grants: vec![origin_access_identity.clone()],
        }),
    )?;

    let website = assemble_release_pipeline(&ReleasePipelineProps {
        source: source_ref(config, &repos.website_repo_name),
        deployment_target: DeploymentTarget {
            bucket: assets_bucket.clone(),
            // site files must land unpacked for the CDN to serve them
            extract: true,
            destination_key: config.deploy.destination_key.clone(),
        },
        build_spec: config.primary_build_spec()?,
        auxiliary: None,
    })?;
    add_pipeline(&mut stack, WEBSITE_PIPELINE_ID, website)?;

    let backend_pipeline = assemble_release_pipeline(&ReleasePipelineProps {
        source: source_ref(config, &config.backend.repository),
        deployment_target: DeploymentTarget {
            bucket: backend.lambda_bucket.clone(),
            // the function bundle is consumed as-is, at its well-known key
            extract: false,
            destination_key: Some(config.backend.lambda_output_key.clone()),
        },
        build_spec: Some(BuildSpec::lambda_package()),
        auxiliary: Some(AuxiliaryBuild {
            build_spec: BuildSpec::api_model(),
            destination_key: config.backend.api_definition_key.clone(),
        }),
    })?;
    add_pipeline(&mut stack, BACKEND_PIPELINE_ID, backend_pipeline)?;

    Ok((
        stack,
        PipelineOutputs {
            assets_bucket,
            origin_access_identity,
        },
    ))
}

fn source_ref(config: &PlatformConfig, repository: &str) -> SourceRef {
    SourceRef {
        owner: config.source.owner.clone(),
        repository: repository.to_string(),
        branch: config.source.branch.clone(),
        credential: SecretRef(config.source.credential_secret.clone()),
    }
}

fn add_pipeline(stack: &mut Stack, id: &str, pipeline: ReleasePipeline) -> Result<()> {
    for (project_id, project) in pipeline.projects {
        stack.add_resource(&project_id, Resource::BuildProject(project))?;
    }
    stack.add_resource(id, Resource::Pipeline(pipeline.definition))?;
    Ok(())
}
