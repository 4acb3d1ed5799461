use anyhow::Result;
use log::debug;

use crate::conf::PlatformConfig;
use crate::stack::{backend, blog, pipeline, repositories, userpool, App};

pub mod buildspec;
pub mod cicd;
pub mod conf;
pub mod stack;
pub mod utils;


/// Name of the composed application, recorded in the synthesis manifest
pub const APP_NAME: &str = "blog-platform";

/// Wires every stack of the platform into one deployable graph, passing
/// created-resource handles from producer stacks to consumer stacks.
pub fn build_blog_platform(config: &PlatformConfig) -> Result<App> {
    config.validate()?;
    debug!("composing app \"{}\"", APP_NAME);
    let mut app = App::new(APP_NAME);

    let (repositories_stack, repos) = repositories::assemble(config)?;
    app.add_stack(repositories_stack)?;

    let (backend_stack, backend_out) = backend::assemble(config)?;
    app.add_stack(backend_stack)?;

    let (pipeline_stack, pipeline_out) = pipeline::assemble(config, &repos, &backend_out)?;
    app.add_stack(pipeline_stack)?;

    let (blog_stack, blog_out) = blog::assemble(config, &pipeline_out)?;
    app.add_stack(blog_stack)?;

    app.add_stack(userpool::assemble(config, &blog_out)?)?;

    Ok(app)
}
