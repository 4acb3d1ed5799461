/// Source repositories and their chat-ops notification rules
use anyhow::Result;

use crate::conf::PlatformConfig;
use crate::stack::{
    NotificationRule, Repository, RepositoryEvent, Resource, ResourceRef, Stack,
};

pub const STACK_NAME: &str = "repositories";


/// Handles downstream stacks consume
pub struct RepositoriesOutputs {
    pub website_repo: ResourceRef,
    pub website_repo_name: String,
    pub infrastructure_repo: ResourceRef,
}

pub fn assemble(config: &PlatformConfig) -> Result<(Stack, RepositoriesOutputs)> {
    let mut stack = Stack::new(STACK_NAME, config.environment())?;
    let website_repo = add_repository(
        &mut stack,
        &config.source.website_repository,
        "Repository for the blog react application",
        &config.notifications.channel_arn,
    )?;
    let infrastructure_repo = add_repository(
        &mut stack,
        &config.source.infrastructure_repository,
        "Managed infrastructure repository for the blog project",
        &config.notifications.channel_arn,
    )?;
    Ok((
        stack,
        RepositoriesOutputs {
            website_repo,
            website_repo_name: config.source.website_repository.clone(),
            infrastructure_repo,
        },
    ))
}

/// Adds a repository plus a rule forwarding every PR lifecycle event to the
/// chat channel
fn add_repository(
    stack: &mut Stack,
    name: &str,
    description: &str,
    channel_arn: &str,
) -> Result<ResourceRef> {
    let repo = stack.add_resource(
        name,
        Resource::Repository(Repository {
            repository_name: name.to_string(),
            description: description.to_string(),
        }),
    )?;
    stack.add_resource(
        &format!("{}-pr-notifications", name),
        Resource::NotificationRule(NotificationRule {
            enabled: true,
            events: vec![
                RepositoryEvent::PullRequestCreated,
                RepositoryEvent::PullRequestComment,
                RepositoryEvent::PullRequestSourceUpdated,
                RepositoryEvent::PullRequestStatusChanged,
                RepositoryEvent::PullRequestMerged,
            ],
            channel_arn: channel_arn.to_string(),
        }),
    )?;
    Ok(repo)
}
