/// Self-service user directory, its OAuth client and the auth subdomain
use anyhow::Result;

use crate::conf::PlatformConfig;
use crate::stack::blog::{self, BlogOutputs};
use crate::stack::{
    AccountRecovery, AliasRecord, AliasTarget, PasswordPolicy, RequiredAttribute, Resource,
    SignInAliases, Stack, StandardAttribute, UserPool, UserPoolClient, UserPoolDomain,
    VerificationEmail,
};

pub const STACK_NAME: &str = "user-pool";
pub const POOL_ID: &str = "user-pool";
pub const CLIENT_ID: &str = "client";
pub const DOMAIN_ID: &str = "domain";
pub const LOGIN_RECORD_ID: &str = "login-alias-record";

const POOL_NAME: &str = "standardUserPool";


pub fn assemble(config: &PlatformConfig, blog: &BlogOutputs) -> Result<Stack> {
    let mut stack = Stack::new(STACK_NAME, config.environment())?;
    // the zone arrives by reference, so the ordering edge has to be explicit
    stack.add_dependency(blog::STACK_NAME);

    let zone = &blog.hosted_zone;
    let root_url = format!("https://{}/", zone.zone_name);

    let pool = stack.add_resource(
        POOL_ID,
        Resource::UserPool(UserPool {
            pool_name: POOL_NAME.to_string(),
            self_sign_up: true,
            sign_in_aliases: SignInAliases {
                username: true,
                email: true,
            },
            auto_verify_email: true,
            verification: VerificationEmail {
                subject: format!("Verify your email for {}", zone.zone_name),
                body: format!(
                    "Thanks for signing up for {}. Your verification code is {{####}}",
                    zone.zone_name
                ),
            },
            required_attributes: vec![
                RequiredAttribute {
                    name: StandardAttribute::Email,
                    mutable: false,
                },
                RequiredAttribute {
                    name: StandardAttribute::Birthdate,
                    mutable: false,
                },
            ],
            password_policy: PasswordPolicy {
                min_length: 12,
                require_lowercase: true,
                require_uppercase: true,
                require_digits: true,
                require_symbols: true,
                temp_password_validity_days: 3,
            },
            account_recovery: AccountRecovery::EmailOnly,
            from_email: format!("no-reply@{}", zone.zone_name),
        }),
    )?;

    stack.add_resource(
        CLIENT_ID,
        Resource::UserPoolClient(UserPoolClient {
            user_pool: pool.clone(),
            implicit_grant: true,
            callback_urls: vec![root_url.clone()],
            logout_urls: vec![root_url],
        }),
    )?;

    let domain = stack.add_resource(
        DOMAIN_ID,
        Resource::UserPoolDomain(UserPoolDomain {
            user_pool: pool,
            domain_name: format!("auth.{}", zone.zone_name),
            certificate_arn: config.certificates.auth.clone(),
        }),
    )?;

    stack.add_resource(
        LOGIN_RECORD_ID,
        Resource::AliasRecord(AliasRecord {
            zone: zone.clone(),
            record_name: Some("auth".to_string()),
            target: AliasTarget::UserPoolDomain(domain),
            ttl_secs: 3600,
        }),
    )?;

    Ok(stack)
}
