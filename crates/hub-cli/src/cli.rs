//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Default limit for the gzipped compact template size.
pub const DEFAULT_MAX_TEMPLATE_BYTES: usize = 16_384;

/// ConfigHub - Resolve and cache entitlement-driven remote configuration
#[derive(Parser, Debug)]
#[command(name = "confighub")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Engine configuration file (TOML)
    #[arg(short, long, global = true, env = "CONFIGHUB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache document location, overriding `[cache] path`
    #[arg(long, global = true, env = "CONFIGHUB_CACHE")]
    pub cache: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Resolve the effective configuration for a set of contexts
    ///
    /// Remote values are read from a template file of the form
    /// {"contexts": {"<context>": {"plan_displayName": ..., ...}}}.
    ///
    /// Examples:
    ///   confighub resolve -t template.json acme_personal acme_business
    ///   confighub resolve -t template.json acme_personal --json
    Resolve {
        /// Remote-config template providing each context's values
        #[arg(short, long)]
        template: PathBuf,

        /// Entitlement contexts held by the user
        #[arg(required = true)]
        contexts: Vec<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show the cached configuration and its freshness
    Show {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Erase the cached configuration
    Reset,

    /// Validate a remote-config template
    Lint {
        /// Template to validate
        template: PathBuf,

        /// Set meta_config_version to the current UTC time
        #[arg(long)]
        bump: bool,

        /// Write the (possibly bumped) template back to disk
        #[arg(long)]
        write: bool,

        /// Maximum gzipped size of the compact template in bytes
        #[arg(long, default_value_t = DEFAULT_MAX_TEMPLATE_BYTES)]
        max_bytes: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_resolve_with_contexts() {
        let cli = Cli::parse_from([
            "confighub",
            "resolve",
            "--template",
            "t.json",
            "acme_personal",
            "acme_business",
        ]);
        assert_eq!(
            cli.command,
            Commands::Resolve {
                template: PathBuf::from("t.json"),
                contexts: vec!["acme_personal".into(), "acme_business".into()],
                json: false,
            }
        );
    }

    #[test]
    fn resolve_requires_a_context() {
        let result = Cli::try_parse_from(["confighub", "resolve", "--template", "t.json"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["confighub", "show", "--json", "--cache", "/tmp/c.json", "-v"]);
        assert!(cli.verbose);
        assert_eq!(cli.cache, Some(PathBuf::from("/tmp/c.json")));
        assert_eq!(cli.command, Commands::Show { json: true });
    }

    #[test]
    fn lint_defaults() {
        let cli = Cli::parse_from(["confighub", "lint", "template.json"]);
        assert_eq!(
            cli.command,
            Commands::Lint {
                template: PathBuf::from("template.json"),
                bump: false,
                write: false,
                max_bytes: DEFAULT_MAX_TEMPLATE_BYTES,
            }
        );
    }
}
