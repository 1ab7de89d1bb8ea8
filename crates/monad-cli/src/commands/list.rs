//! List deployed services of the current repository.

use anyhow::Result;
use monad_config::GitContext;
use monad_core::provider::lambda::FunctionSummary;

use super::Context;

/// Managed functions of `git`'s repository, only its branch unless `all`.
pub fn matching<'a>(
    functions: &'a [FunctionSummary],
    git: &GitContext,
    all: bool,
) -> Vec<&'a FunctionSummary> {
    let tag = |f: &FunctionSummary, key: &str| f.tags.get(key).cloned().unwrap_or_default();
    let mut found: Vec<_> = functions
        .iter()
        .filter(|f| tag(f, "Monad") == "true")
        .filter(|f| tag(f, "Owner") == git.owner && tag(f, "Repo") == git.repo)
        .filter(|f| all || tag(f, "Branch") == git.branch)
        .collect();
    found.sort_by(|a, b| a.name.cmp(&b.name));
    found
}

pub fn row(function: &FunctionSummary) -> String {
    let tag = |key: &str| function.tags.get(key).map(String::as_str).unwrap_or("-");
    format!(
        "{}\t{}\t{}\t{}",
        function.name,
        tag("Service"),
        tag("Branch"),
        tag("Sha")
    )
}

pub async fn list(ctx: &Context, all: bool) -> Result<()> {
    let basis = ctx.basis().await?;
    let functions = ctx.clients.lambda.list_functions().await?;

    let found = matching(&functions, &basis.git, all);
    if found.is_empty() {
        println!("No services found for {}/{}", basis.git.owner, basis.git.repo);
        return Ok(());
    }

    println!("NAME\tSERVICE\tBRANCH\tSHA");
    for function in found {
        println!("{}", row(function));
    }
    Ok(())
}
