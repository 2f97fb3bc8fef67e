//! `wharf resolve` - solve and materialize project dependencies.

use anyhow::Result;
use wharf::ops;

use crate::cli::ResolveArgs;
use crate::commands::{build_environment, open_cache};

pub fn execute(args: ResolveArgs) -> Result<()> {
    let env = build_environment(&args.project)?;
    let cache = open_cache(args.cache_path)?;

    let lock = ops::resolve_project(&args.project.project_dir, &env, &cache)?;

    println!("resolved {} component(s)", lock.dependencies.len());
    for (name, solved) in &lock.dependencies {
        println!("  {name} {}", solved.version);
    }
    Ok(())
}
