/// Backend function and the bucket its deployable bundle lands in
use anyhow::Result;

use crate::conf::PlatformConfig;
use crate::stack::{
    Bucket, BucketAccess, Function, FunctionCode, Resource, ResourceRef, Stack,
};

pub const STACK_NAME: &str = "backend";
pub const LAMBDA_BUCKET_ID: &str = "lambda-source-bucket";
pub const FUNCTION_ID: &str = "backend-function";

const FUNCTION_RUNTIME: &str = "nodejs18.x";


/// Handle the pipeline stack deploys into
pub struct BackendOutputs {
    pub lambda_bucket: ResourceRef,
}

pub fn assemble(config: &PlatformConfig) -> Result<(Stack, BackendOutputs)> {
    let mut stack = Stack::new(STACK_NAME, config.environment())?;
    let lambda_bucket = stack.add_resource(
        LAMBDA_BUCKET_ID,
        Resource::Bucket(Bucket {
            access_control: BucketAccess::Private,
            read_grants: vec![],
        }),
    )?;
    stack.add_resource(
        FUNCTION_ID,
        Resource::Function(Function {
            runtime: FUNCTION_RUNTIME.to_string(),
            handler: config.backend.handler.clone(),
            code: FunctionCode {
                bucket: lambda_bucket.clone(),
                key: config.backend.lambda_output_key.clone(),
            },
            timeout_secs: 60,
            memory_mb: 128,
            log_retention_days: 30,
        }),
    )?;
    Ok((stack, BackendOutputs { lambda_bucket }))
}
