use anyhow::Result;
use clap::Parser;
use langprov::{
    application::{ProvisionKind, ProvisionRequest},
    commands::{self, Settings},
    package::DevPackage,
    platform::Platform,
    provision::ProvisionOptions,
};
use std::path::PathBuf;

/// langprov - language runtime provisioner
///
/// Install, upgrade and remove language runtimes (python, ruby, ...) from the
/// native package manager, or from a software collection where the platform
/// packages are too old.
///
/// Examples:
///   langprov install python --version 3.5
///   langprov plan ruby --version 2.3 --platform centos/7
///   langprov env ruby --version 2.3
#[derive(Parser, Debug)]
#[command(author, version = env!("LANGPROV_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Runtime definitions file (defaults to the built-in definitions)
    #[arg(long, env = "LANGPROV_DEFINITIONS", value_name = "PATH", global = true)]
    pub definitions: Option<PathBuf>,

    /// Platform to provision for instead of the detected one
    #[arg(long, env = "LANGPROV_PLATFORM", value_name = "NAME/VERSION", global = true)]
    pub platform: Option<Platform>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Install a language runtime
    Install(ProvisionArgs),

    /// Upgrade a runtime installed from system packages
    Upgrade(ProvisionArgs),

    /// Remove a language runtime
    Uninstall(ProvisionArgs),

    /// Show the packages and steps an install would use
    Plan(ProvisionArgs),

    /// Print the environment a software collection exports
    Env(EnvArgs),
}

#[derive(clap::Args, Debug)]
pub struct ProvisionArgs {
    /// Runtime name (e.g. python, ruby)
    #[arg(value_name = "RUNTIME")]
    pub runtime: String,

    /// Language version prefix; empty accepts any version
    #[arg(long, default_value = "")]
    pub version: String,

    /// Provision from system packages or a software collection (system, scl)
    #[arg(long)]
    pub kind: Option<ProvisionKind>,

    /// Main package name, bypassing name resolution
    #[arg(long)]
    pub package_name: Option<String>,

    /// Package manager version to pin
    #[arg(long)]
    pub package_version: Option<String>,

    /// Headers package name
    #[arg(long, conflicts_with = "no_dev_package")]
    pub dev_package: Option<String>,

    /// Do not install headers
    #[arg(long)]
    pub no_dev_package: bool,

    /// Upgrade packages that are already installed
    #[arg(long)]
    pub upgrade: bool,
}

impl ProvisionArgs {
    fn request(&self) -> ProvisionRequest {
        let dev_package = match (&self.dev_package, self.no_dev_package) {
            (_, true) => DevPackage::Disabled,
            (Some(name), false) => DevPackage::Named(name.clone()),
            (None, false) => DevPackage::Auto,
        };
        let options = ProvisionOptions {
            package_name: self.package_name.clone(),
            dev_package,
            package_version: self.package_version.clone(),
            package_upgrade: self.upgrade,
        };
        let request = ProvisionRequest::new(&self.runtime, &self.version).options(options);
        match self.kind {
            Some(kind) => request.kind(kind),
            None => request,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct EnvArgs {
    /// Runtime name (e.g. python, ruby)
    #[arg(value_name = "RUNTIME", required_unless_present = "path")]
    pub runtime: Option<String>,

    /// Language version prefix; empty accepts any version
    #[arg(long, default_value = "")]
    pub version: String,

    /// Read this activation script instead of the collection's enable file
    #[arg(long, value_name = "PATH")]
    pub path: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = langprov::runtime::RealRuntime;
    let settings = Settings {
        definitions: cli.definitions,
        platform: cli.platform,
    };

    match cli.command {
        Commands::Install(args) => commands::install(&runtime, &settings, &args.request())?,
        Commands::Upgrade(args) => commands::upgrade(&runtime, &settings, &args.request())?,
        Commands::Uninstall(args) => commands::uninstall(&runtime, &settings, &args.request())?,
        Commands::Plan(args) => commands::plan(&runtime, &settings, &args.request())?,
        Commands::Env(args) => commands::env(
            &runtime,
            &settings,
            args.runtime.as_deref().unwrap_or_default(),
            &args.version,
            args.path.as_deref(),
        )?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn provision_args(cli: Cli) -> ProvisionArgs {
        match cli.command {
            Commands::Install(args)
            | Commands::Upgrade(args)
            | Commands::Uninstall(args)
            | Commands::Plan(args) => args,
            Commands::Env(_) => panic!("Expected a provisioning command"),
        }
    }

    #[test]
    fn test_cli_install_parsing() {
        let cli = Cli::try_parse_from(["langprov", "install", "python", "--version", "3.5"]).unwrap();
        assert_eq!(cli.platform, None);
        let request = provision_args(cli).request();
        assert_eq!(request.runtime, "python");
        assert_eq!(request.version, "3.5");
        assert_eq!(request.kind, None);
        assert_eq!(request.options, ProvisionOptions::default());
    }

    #[test]
    fn test_cli_version_defaults_to_any() {
        let cli = Cli::try_parse_from(["langprov", "uninstall", "ruby"]).unwrap();
        assert_eq!(provision_args(cli).request().version, "");
    }

    #[test]
    fn test_cli_provision_options_parsing() {
        let cli = Cli::try_parse_from([
            "langprov",
            "install",
            "ruby",
            "--kind",
            "scl",
            "--package-name",
            "ruby2.3",
            "--package-version",
            "2.3.1-2",
            "--dev-package",
            "ruby2.3-dev",
            "--upgrade",
        ])
        .unwrap();
        let request = provision_args(cli).request();
        assert_eq!(request.kind, Some(ProvisionKind::Collection));
        assert_eq!(request.options.package_name.as_deref(), Some("ruby2.3"));
        assert_eq!(request.options.package_version.as_deref(), Some("2.3.1-2"));
        assert_eq!(
            request.options.dev_package,
            DevPackage::Named("ruby2.3-dev".to_string())
        );
        assert!(request.options.package_upgrade);
    }

    #[test]
    fn test_cli_no_dev_package_parsing() {
        let cli = Cli::try_parse_from(["langprov", "plan", "python", "--no-dev-package"]).unwrap();
        assert_eq!(
            provision_args(cli).request().options.dev_package,
            DevPackage::Disabled
        );
    }

    #[test]
    fn test_cli_dev_package_conflicts() {
        let result = Cli::try_parse_from([
            "langprov",
            "install",
            "python",
            "--dev-package",
            "python-dev",
            "--no-dev-package",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_global_platform_parsing() {
        let cli =
            Cli::try_parse_from(["langprov", "--platform", "ubuntu/16.04", "plan", "python"]).unwrap();
        assert_eq!(cli.platform, Some(Platform::new("ubuntu", "16.04")));
    }

    #[test]
    fn test_cli_unknown_kind_fails() {
        let result = Cli::try_parse_from(["langprov", "install", "python", "--kind", "docker"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_env_parsing() {
        let cli = Cli::try_parse_from(["langprov", "env", "--path", "/opt/rh/rh-ruby23/enable"]).unwrap();
        match cli.command {
            Commands::Env(args) => {
                assert_eq!(args.runtime, None);
                assert_eq!(args.path, Some(PathBuf::from("/opt/rh/rh-ruby23/enable")));
            }
            _ => panic!("Expected Env command"),
        }
    }

    #[test]
    fn test_cli_env_requires_runtime_or_path() {
        let result = Cli::try_parse_from(["langprov", "env"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        let result = Cli::try_parse_from(["langprov", "python"]);
        assert!(result.is_err());
    }
}
