//! CLI argument definitions using clap derive macros.

use clap::{Args, Parser, Subcommand};

/// OpenShift-style control-plane client
///
/// Talks to servers speaking different API versions through one set of
/// commands.
#[derive(Parser, Debug)]
#[command(name = "osc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection options shared by every command. Flags win over config and
/// environment.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// API server URL
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Bearer token
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Namespace for namespaced kinds
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Output raw JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the negotiated API versions
    Versions,

    /// Show one resource
    Get {
        /// Kind or plural name (pod, pods, deploymentconfigs, ...)
        kind: String,
        /// Resource name
        name: String,
    },

    /// List resources of a kind
    List {
        /// Kind or plural name
        kind: String,
    },

    /// Run a command in a pod
    Exec(ExecCommand),

    /// Print a pod's logs
    Logs {
        /// Pod name
        pod: String,
        /// Container name
        #[arg(short, long)]
        container: Option<String>,
    },

    /// Set the replica count of a deployment config or replication controller
    Scale {
        /// deploymentconfig or replicationcontroller
        kind: String,
        /// Resource name
        name: String,
        /// Desired replicas
        replicas: i64,
    },

    /// Cancel a running build
    CancelBuild {
        /// Build name
        name: String,
    },

    /// Request a new project
    NewProject {
        /// Project name
        name: String,
        /// Human-readable name
        #[arg(long)]
        display_name: Option<String>,
        /// Project description
        #[arg(long)]
        description: Option<String>,
    },

    /// Show the config file location and effective settings
    Config {
        /// Write the effective settings back to the config file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args, Debug)]
pub struct ExecCommand {
    /// Pod name
    pub pod: String,

    /// Container name (defaults to the pod's first container)
    #[arg(short, long)]
    pub container: Option<String>,

    /// Allocate a TTY
    #[arg(short, long)]
    pub tty: bool,

    /// Command and arguments
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_command_after_separator() {
        let cli = Cli::parse_from(["osc", "-n", "demo", "exec", "web", "-c", "app", "--", "ls", "-la"]);
        assert_eq!(cli.global.namespace.as_deref(), Some("demo"));
        match cli.command {
            Commands::Exec(cmd) => {
                assert_eq!(cmd.pod, "web");
                assert_eq!(cmd.container.as_deref(), Some("app"));
                assert_eq!(cmd.command, vec!["ls", "-la"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["osc", "list", "pods", "--json", "--timeout", "5"]);
        assert!(cli.global.json);
        assert_eq!(cli.global.timeout, Some(5));
    }

    #[test]
    fn test_exec_requires_command() {
        assert!(Cli::try_parse_from(["osc", "exec", "web"]).is_err());
    }
}
