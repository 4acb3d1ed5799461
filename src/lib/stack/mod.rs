/// The deployable-unit model: stacks of resource records, composed into an
/// app and synthesized to static templates.
use std::collections::BTreeMap;
use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub mod backend;
pub mod blog;
pub mod pipeline;
pub mod repositories;
mod resources;
pub mod userpool;

pub use resources::*;

lazy_static! {
    static ref LOGICAL_ID_PATTERN: Regex =
        Regex::new(r"^[A-Za-z][A-Za-z0-9\-]*$").expect("could not compile pattern");
}


#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
/// Account and region a stack deploys into
pub struct Environment {
    pub account: String,
    pub region: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq, Hash)]
/// Points at a resource declared by some stack
pub struct ResourceRef {
    pub stack: String,
    pub id: String,
}

#[derive(Debug, Clone)]
/// One deployable unit: a named set of resource records bound to an
/// environment, with explicit ordering edges to other stacks
pub struct Stack {
    name: String,
    env: Environment,
    depends_on: Vec<String>,
    resources: BTreeMap<String, Resource>,
}

impl Stack {
    pub fn new(name: &str, env: Environment) -> Result<Stack> {
        if !LOGICAL_ID_PATTERN.is_match(name) {
            return Err(anyhow!("invalid stack name {:?}", name));
        }
        Ok(Stack {
            name: name.to_string(),
            env,
            depends_on: Vec::new(),
            resources: BTreeMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    /// Declares an explicit ordering edge, for consumption that is not
    /// visible as output-to-input wiring
    pub fn add_dependency(&mut self, stack_name: &str) {
        self.depends_on.push(stack_name.to_string());
    }

    /// Declares a resource under a stack-unique logical id and hands back
    /// the reference other records use to point at it
    pub fn add_resource(&mut self, id: &str, resource: Resource) -> Result<ResourceRef> {
        if !LOGICAL_ID_PATTERN.is_match(id) {
            return Err(anyhow!("invalid logical id {:?} in stack {:?}", id, self.name));
        }
        if self.resources.contains_key(id) {
            return Err(anyhow!(
                "duplicate logical id {:?} in stack {:?}",
                id,
                self.name
            ));
        }
        self.resources.insert(id.to_string(), resource);
        Ok(ResourceRef {
            stack: self.name.clone(),
            id: id.to_string(),
        })
    }

    pub fn resources(&self) -> &BTreeMap<String, Resource> {
        &self.resources
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }
}

#[derive(Debug, Clone)]
/// The whole deployable graph, stacks held in deploy order
pub struct App {
    name: String,
    stacks: Vec<Stack>,
}

impl App {
    pub fn new(name: &str) -> App {
        App {
            name: name.to_string(),
            stacks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declares a stack. A stack consuming another's output must be added
    /// after it, so dependencies may only point backwards.
    pub fn add_stack(&mut self, stack: Stack) -> Result<()> {
        if self.stacks.iter().any(|s| s.name == stack.name) {
            return Err(anyhow!("duplicate stack name {:?}", stack.name));
        }
        for dep in &stack.depends_on {
            if !self.stacks.iter().any(|s| &s.name == dep) {
                return Err(anyhow!(
                    "stack {:?} depends on {:?}, which must be declared before it",
                    stack.name,
                    dep
                ));
            }
        }
        info!("declared stack \"{}\"", stack.name);
        self.stacks.push(stack);
        Ok(())
    }

    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    pub fn stack(&self, name: &str) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.name == name)
    }

    pub fn deploy_order(&self) -> Vec<&str> {
        self.stacks.iter().map(|s| s.name.as_str()).collect()
    }

    /// Writes one template per stack plus the manifest, and returns the
    /// manifest path
    pub fn synth(&self, out_dir: &Path) -> Result<PathBuf> {
        create_dir_all(out_dir)?;
        let mut entries = Vec::new();
        for stack in &self.stacks {
            let file_name = format!("{}.template.json", stack.name);
            let template = StackTemplate {
                stack: &stack.name,
                environment: &stack.env,
                resources: &stack.resources,
            };
            let mut f = File::create(out_dir.join(&file_name))?;
            f.write_all(serde_json::to_string_pretty(&template)?.as_bytes())?;
            info!("wrote template for stack \"{}\"", stack.name);
            entries.push(ManifestEntry {
                name: stack.name.clone(),
                environment: stack.env.clone(),
                depends_on: stack.depends_on.clone(),
                template: file_name,
            });
        }
        let manifest = SynthesisManifest {
            app: self.name.clone(),
            synthesized_at: Utc::now(),
            stacks: entries,
        };
        let manifest_path = out_dir.join("manifest.json");
        let mut f = File::create(&manifest_path)?;
        f.write_all(serde_json::to_string_pretty(&manifest)?.as_bytes())?;
        info!("wrote manifest for app \"{}\"", self.name);
        Ok(manifest_path)
    }
}

#[derive(Serialize)]
struct StackTemplate<'a> {
    stack: &'a str,
    environment: &'a Environment,
    resources: &'a BTreeMap<String, Resource>,
}

#[derive(Serialize, Deserialize, Debug)]
/// What `synth` records about a run, consumed by the provisioning engine
pub struct SynthesisManifest {
    pub app: String,
    pub synthesized_at: DateTime<Utc>,
    pub stacks: Vec<ManifestEntry>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ManifestEntry {
    pub name: String,
    pub environment: Environment,
    pub depends_on: Vec<String>,
    pub template: String,
}
