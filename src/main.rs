use std::path::Path;

use anyhow::Result;
use clap::{App, Arg, SubCommand};
use log::{debug, info, LevelFilter};

use bloginfra::build_blog_platform;
use bloginfra::conf::PlatformConfig;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<()> {
    pretty_env_logger::formatted_timed_builder()
        .filter_level(LevelFilter::Info)
        .init();
    let matches = App::new("blog-infra")
        .version(VERSION)
        .about("Declares the blog platform infrastructure")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("Sets a context file")
                .takes_value(true)
                .default_value("bloginfra.toml"),
        )
        .subcommand(
            SubCommand::with_name("synth")
                .about("Assembles every stack and writes the templates")
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .value_name("DIR")
                        .help("Directory the templates are written to")
                        .takes_value(true)
                        .default_value("out"),
                ),
        )
        .subcommand(SubCommand::with_name("ls").about("Prints the stacks in deploy order"))
        .get_matches();

    let config = PlatformConfig::from_file(Path::new(matches.value_of("config").unwrap()))?;
    debug!("config: {:#?}", config);

    if let Some(matches) = matches.subcommand_matches("synth") {
        let app = build_blog_platform(&config)?;
        let manifest = app.synth(Path::new(matches.value_of("output").unwrap()))?;
        info!("wrote manifest to {}", manifest.display());
    } else if let Some(_matches) = matches.subcommand_matches("ls") {
        let app = build_blog_platform(&config)?;
        for stack in app.stacks() {
            if stack.depends_on().is_empty() {
                println!("{}", stack.name());
            } else {
                println!("{} (depends on {})", stack.name(), stack.depends_on().join(", "));
            }
        }
    }
    Ok(())
}
