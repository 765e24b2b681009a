//! Command line surface of `min-reqs`.

use crate::config::{EnvSource, MinReqsOptions, Settings};
use crate::error::Result;
use crate::hook::MinRequirementsHook;
use crate::patch::patch_pyproject;
use crate::provider::build_provider;
use clap::{Args, Parser, Subcommand};
use minreqs_pypi::Minimizer;
use std::io::Write;
use std::path::PathBuf;

/// min-reqs - pin Python dependencies to their minimum allowed versions
///
/// Every option falls back to the project's
/// [tool.hatch.metadata.hooks.min_requirements] table and then to the
/// MIN_REQS_* environment variables.
///
/// Examples:
///   min-reqs patch                      # add a min-reqs group to ./pyproject.toml
///   min-reqs resolve "numpy>=1.20,<2"   # print numpy==1.20.0
#[derive(Parser, Debug)]
#[command(name = "min-reqs", author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub options: OptionArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add the minimized requirements group to a pyproject.toml
    Patch {
        /// Project file to patch; a .BAK copy is written next to it
        #[arg(value_name = "PATH", default_value = "pyproject.toml")]
        path: PathBuf,
    },

    /// Print the minimized form of each specifier, one per line
    Resolve {
        /// PEP 508 dependency specifiers
        #[arg(value_name = "SPEC", required = true)]
        specs: Vec<String>,
    },

    /// Update project metadata JSON read from stdin and write it to stdout
    Metadata,
}

#[derive(Args, Debug, Default)]
pub struct OptionArgs {
    /// Infer minimums from constraint bounds only, without querying an index
    #[arg(long, global = true, overrides_with = "online")]
    pub offline: bool,

    /// Query the package index for published versions
    #[arg(long, global = true, overrides_with = "offline")]
    pub online: bool,

    /// Ask `pip index versions` before the simple index
    #[arg(long, global = true, overrides_with = "no_pip")]
    pub pip: bool,

    /// Query only the simple index
    #[arg(long, global = true, overrides_with = "pip")]
    pub no_pip: bool,

    /// Pin dependencies that declare no version constraint
    #[arg(long, global = true, overrides_with = "no_pin_unconstrained")]
    pub pin_unconstrained: bool,

    /// Leave dependencies without a version constraint as written
    #[arg(long, global = true, overrides_with = "pin_unconstrained")]
    pub no_pin_unconstrained: bool,

    /// Optional-dependencies group to write (default: min-reqs)
    #[arg(long, global = true, value_name = "NAME")]
    pub group: Option<String>,

    /// Simple API root (default: https://pypi.org/simple)
    #[arg(long, global = true, value_name = "URL")]
    pub index_url: Option<String>,
}

impl OptionArgs {
    /// The explicit configuration layer these flags describe.
    pub fn to_options(&self) -> MinReqsOptions {
        MinReqsOptions {
            offline: switch(self.offline, self.online),
            try_pip: switch(self.pip, self.no_pip),
            no_pip: None,
            pin_unconstrained: switch(self.pin_unconstrained, self.no_pin_unconstrained),
            group: self.group.clone(),
            index_url: self.index_url.clone(),
        }
    }
}

fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Runs `cli`, writing command output to `out`. `stdin` is only read by
/// the `metadata` command.
///
/// # Errors
///
/// Returns the first error; `resolve` stops at the first specifier that
/// cannot be minimized.
pub async fn run(
    cli: Cli,
    env: &dyn EnvSource,
    stdin: impl AsyncFnOnce() -> std::io::Result<String>,
    out: &mut dyn Write,
) -> Result<()> {
    let explicit = cli.options.to_options();

    match cli.command {
        Command::Patch { path } => {
            let outcome = patch_pyproject(&path, &explicit, env).await?;
            writeln!(
                out,
                "wrote {} requirements to optional group '{}' in {} (backup: {})",
                outcome.requirements.len(),
                outcome.group,
                path.display(),
                outcome.backup.display()
            )?;
        }
        Command::Resolve { specs } => {
            let settings = Settings::resolve(&explicit, &MinReqsOptions::default(), env);
            let provider = build_provider(&settings)?;
            let minimizer = Minimizer::new(provider, settings.resolve_options());
            for pinned in minimizer.try_minimize_all(&specs).await? {
                writeln!(out, "{}", pinned)?;
            }
        }
        Command::Metadata => {
            let hook = MinRequirementsHook::new(&explicit, env)?;
            let input = stdin().await?;
            writeln!(out, "{}", hook.update_json(&input).await?)?;
        }
    }

    Ok(())
}
