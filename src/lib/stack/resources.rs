/// The vocabulary of managed-service records a stack can declare. These are
/// inert configuration values; every behavior behind them is owned by the
/// provider.
use serde::{Deserialize, Serialize};

use crate::cicd::{BuildProject, PipelineDefinition};
use crate::stack::ResourceRef;

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(tag = "type", content = "properties", rename_all = "snake_case")]
/// Represents all resource kinds the platform declares
pub enum Resource {
    Bucket(Bucket),
    OriginAccessIdentity(OriginAccessIdentity),
    Distribution(Distribution),
    AliasRecord(AliasRecord),
    Repository(Repository),
    NotificationRule(NotificationRule),
    BuildProject(BuildProject),
    Pipeline(PipelineDefinition),
    UserPool(UserPool),
    UserPoolClient(UserPoolClient),
    UserPoolDomain(UserPoolDomain),
    Function(Function),
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
/// An object storage location
pub struct Bucket {
    pub access_control: BucketAccess,
    /// identities granted read access, e.g. the CDN origin identity
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub read_grants: Vec<ResourceRef>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BucketAccess {
    Private,
    PublicRead,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
/// The identity the CDN uses to read a private bucket
pub struct OriginAccessIdentity {
    pub comment: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
/// An edge distribution fronting a bucket origin
pub struct Distribution {
    pub default_root_object: String,
    pub origin: DistributionOrigin,
    pub viewer_protocol_policy: ViewerProtocolPolicy,
    pub domain_names: Vec<String>,
    pub certificate_arn: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct DistributionOrigin {
    pub bucket: ResourceRef,
    pub access_identity: ResourceRef,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ViewerProtocolPolicy {
    RedirectToHttps,
    HttpsOnly,
    AllowAll,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
/// A DNS alias. `record_name` of None targets the zone apex.
pub struct AliasRecord {
    pub zone: HostedZoneRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_name: Option<String>,
    pub target: AliasTarget,
    pub ttl_secs: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
/// A zone that already exists, referenced by its attributes
pub struct HostedZoneRef {
    pub zone_name: String,
    pub zone_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(tag = "kind", content = "ref", rename_all = "snake_case")]
pub enum AliasTarget {
    Distribution(ResourceRef),
    UserPoolDomain(ResourceRef),
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
/// A hosted source-control repository
pub struct Repository {
    pub repository_name: String,
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
/// Forwards repository events to a chat channel
pub struct NotificationRule {
    pub enabled: bool,
    pub events: Vec<RepositoryEvent>,
    pub channel_arn: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryEvent {
    PullRequestCreated,
    PullRequestComment,
    PullRequestSourceUpdated,
    PullRequestStatusChanged,
    PullRequestMerged,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
/// A self-service user directory
pub struct UserPool {
    pub pool_name: String,
    pub self_sign_up: bool,
    pub sign_in_aliases: SignInAliases,
    pub auto_verify_email: bool,
    pub verification: VerificationEmail,
    pub required_attributes: Vec<RequiredAttribute>,
    pub password_policy: PasswordPolicy,
    pub account_recovery: AccountRecovery,
    pub from_email: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
pub struct SignInAliases {
    pub username: bool,
    pub email: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct VerificationEmail {
    pub subject: String,
    pub body: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct RequiredAttribute {
    pub name: StandardAttribute,
    pub mutable: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StandardAttribute {
    Email,
    Birthdate,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
pub struct PasswordPolicy {
    pub min_length: u32,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_digits: bool,
    pub require_symbols: bool,
    pub temp_password_validity_days: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AccountRecovery {
    EmailOnly,
    PhoneAndEmail,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
/// An OAuth client of a user pool
pub struct UserPoolClient {
    pub user_pool: ResourceRef,
    pub implicit_grant: bool,
    pub callback_urls: Vec<String>,
    pub logout_urls: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
/// The custom domain sign-in pages are served from
pub struct UserPoolDomain {
    pub user_pool: ResourceRef,
    pub domain_name: String,
    pub certificate_arn: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
/// A serverless function whose code is read from a bucket
pub struct Function {
    pub runtime: String,
    pub handler: String,
    pub code: FunctionCode,
    pub timeout_secs: u64,
    pub memory_mb: u32,
    pub log_retention_days: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct FunctionCode {
    pub bucket: ResourceRef,
    pub key: String,
}
