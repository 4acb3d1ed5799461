/// Content hosting: the distribution in front of the assets bucket, and the
/// apex record pointing at it
use anyhow::Result;

use crate::conf::PlatformConfig;
use crate::stack::pipeline::PipelineOutputs;
use crate::stack::{
    AliasRecord, AliasTarget, Distribution, DistributionOrigin, HostedZoneRef, Resource, Stack,
    ViewerProtocolPolicy,
};

pub const STACK_NAME: &str = "blog";
pub const DISTRIBUTION_ID: &str = "distribution";
pub const WEBSITE_RECORD_ID: &str = "website-alias-record";

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::stack::blog::{assemble, DISTRIBUTION_ID, WEBSITE_RECORD_ID};
    use crate::stack::{backend, pipeline, repositories};
    use crate::stack::{AliasTarget, Resource, ViewerProtocolPolicy};
    use crate::utils::tests::sample_config;

    #[test]
    fn distribution_fronts_the_assets_bucket() {
        let config = sample_config();
        let (_, repos) = repositories::assemble(&config).unwrap();
        let (_, backend_out) = backend::assemble(&config).unwrap();
        let (_, pipeline_out) = pipeline::assemble(&config, &repos, &backend_out).unwrap();
        let (stack, outputs) = assemble(&config, &pipeline_out).expect("could not assemble");

        match stack.resource(DISTRIBUTION_ID) {
            Some(Resource::Distribution(distribution)) => {
                assert_eq!(distribution.origin.bucket, pipeline_out.assets_bucket);
                assert_eq!(
                    distribution.origin.access_identity,
                    pipeline_out.origin_access_identity
                );
                assert_eq!(distribution.default_root_object, "index.html");
                assert_eq!(
                    distribution.viewer_protocol_policy,
                    ViewerProtocolPolicy::RedirectToHttps
                );
                assert_eq!(distribution.domain_names, vec![config.dns.zone_name.clone()]);
                assert_eq!(distribution.certificate_arn, config.certificates.apex);
            }
            other => panic!("unexpected resource: {:?}", other),
        }

        match stack.resource(WEBSITE_RECORD_ID) {
            Some(Resource::AliasRecord(record)) => {
                // apex record: no record name
                assert_eq!(record.record_name, None);
                assert_eq!(record.zone.zone_name, config.dns.zone_name);
                match &record.target {
                    AliasTarget::Distribution(r) => assert_eq!(r.id, DISTRIBUTION_ID),
                    other => panic!("unexpected alias target: {:?}", other),
                }
            }
            other => panic!("unexpected resource: {:?}", other),
        }

        assert_eq!(outputs.hosted_zone.zone_id, config.dns.zone_id);
    }
}

/// Handle the auth stack consumes
pub struct BlogOutputs {
    pub hosted_zone: HostedZoneRef,
}

pub fn assemble(
    config: &PlatformConfig,
    pipeline: &PipelineOutputs,
) -> Result<(Stack, BlogOutputs)> {
    let mut stack = Stack::new(STACK_NAME, config.environment())?;
    let hosted_zone = HostedZoneRef {
        zone_name: config.dns.zone_name.clone(),
        zone_id: config.dns.zone_id.clone(),
    };

    let distribution = stack.add_resource(
        DISTRIBUTION_ID,
        Resource::Distribution(Distribution {
            default_root_object: "index.html".to_string(),
            origin: DistributionOrigin {
                bucket: pipeline.assets_bucket.clone(),
                access_identity: pipeline.origin_access_identity.clone(),
            },
            viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
            domain_names: vec![hosted_zone.zone_name.clone()],
            certificate_arn: config.certificates.apex.clone(),
        }),
    )?;

    stack.add_resource(
        WEBSITE_RECORD_ID,
        Resource::AliasRecord(AliasRecord {
            zone: hosted_zone.clone(),
            record_name: None,
            target: AliasTarget::Distribution(distribution),
            ttl_secs: 3600,
        }),
    )?;

    Ok((stack, BlogOutputs { hosted_zone }))
}
