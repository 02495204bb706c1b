// src/main.rs

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use grove::config::{Config, Scope};
use grove::installer::{InstallOptions, Installer};
use grove::requirement::Requirement;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScopeArg {
    Local,
    Global,
    Root,
}

impl From<ScopeArg> for Scope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::Local => Scope::Local,
            ScopeArg::Global => Scope::Global,
            ScopeArg::Root => Scope::Root,
        }
    }
}

#[derive(Parser)]
#[command(name = "grove")]
#[command(author, version, about = "Package manager for the grove module ecosystem", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install packages, or the project's dependencies when no spec is given
    Install {
        /// Package specs: name, name@selector, a path, or git+<url>[@ref]
        specs: Vec<String>,
        /// Project directory holding grove.json (default: current directory)
        #[arg(short = 'C', long)]
        dir: Option<PathBuf>,
        /// Install scope
        #[arg(short, long, value_enum, default_value_t = ScopeArg::Local)]
        scope: ScopeArg,
        /// Reinstall packages that are already present
        #[arg(short, long)]
        upgrade: bool,
        /// Include cfg(dev)-guarded dependencies of the project manifest
        #[arg(long)]
        dev: bool,
        /// Do not install the dependencies of fetched packages
        #[arg(long)]
        no_recursive: bool,
    },
    /// Remove an installed package
    Uninstall {
        /// Package name to remove
        name: String,
        /// Project directory holding grove.json (default: current directory)
        #[arg(short = 'C', long)]
        dir: Option<PathBuf>,
        /// Install scope
        #[arg(short, long, value_enum, default_value_t = ScopeArg::Local)]
        scope: ScopeArg,
    },
    /// List installed packages
    List {
        /// Project directory holding grove.json (default: current directory)
        #[arg(short = 'C', long)]
        dir: Option<PathBuf>,
        /// Install scope
        #[arg(short, long, value_enum, default_value_t = ScopeArg::Local)]
        scope: ScopeArg,
    },
}

/// Turn a command-line spec into a requirement line: `name@selector` and a
/// bare `name` become named registry requirements, everything else goes to
/// the requirement-line parser as-is.
fn parse_spec(spec: &str) -> Result<Requirement> {
    let looks_like_path = spec.starts_with("./")
        || spec.starts_with("../")
        || spec.starts_with('/')
        || spec.starts_with("~/");
    if !looks_like_path && !spec.starts_with("git+") && !spec.starts_with("--") {
        if let Some((name, selector)) = spec.split_once('@') {
            return Ok(Requirement::parse_named(name, selector)?);
        }
        return Ok(Requirement::parse_named(spec, "*")?);
    }
    Ok(Requirement::parse(spec)?)
}

fn project_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    Ok(match dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    })
}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Install {
            specs,
            dir,
            scope,
            upgrade,
            dev,
            no_recursive,
        }) => {
            let project = project_dir(dir)?;
            let config = Config::standard(&project);
            let opts = InstallOptions {
                scope: scope.into(),
                upgrade,
                recursive: !no_recursive,
                dev,
            };
            let mut installer = Installer::new(config, opts)?;

            let installed = if specs.is_empty() {
                info!("Installing project dependencies from {}", project.display());
                installer.install_project(&project)?
            } else {
                let mut installed = Vec::new();
                for spec in &specs {
                    let requirement = parse_spec(spec)?;
                    installed.push(installer.install_requirement(&requirement, &project)?);
                }
                installed
            };

            if installed.is_empty() {
                println!("Nothing to install.");
            } else {
                for (name, version) in &installed {
                    println!("Installed {} {}", name, version);
                }
                println!("\nTotal: {} package(s)", installed.len());
            }
            if !installer.extension_metadata().is_empty() {
                println!("Foreign extensions:");
                for (name, version) in installer.extension_metadata() {
                    println!("  {} {}", name, version);
                }
            }
            Ok(())
        }
        Some(Commands::Uninstall { name, dir, scope }) => {
            let project = project_dir(dir)?;
            let config = Config::standard(&project);
            let opts = InstallOptions {
                scope: scope.into(),
                ..Default::default()
            };
            let mut installer = Installer::new(config, opts)?;
            installer.uninstall(&name)?;
            println!("Uninstalled package: {}", name);
            Ok(())
        }
        Some(Commands::List { dir, scope }) => {
            let project = project_dir(dir)?;
            let config = Config::standard(&project);
            let opts = InstallOptions {
                scope: scope.into(),
                ..Default::default()
            };
            let installer = Installer::new(config, opts)?;
            let packages = installer.list()?;

            if packages.is_empty() {
                println!("No packages installed.");
            } else {
                println!("Installed packages:");
                for package in &packages {
                    print!("  {} {}", package.name, package.version);
                    if package.linked {
                        print!(" -> {}", package.dir.display());
                    }
                    println!();
                }
                println!("\nTotal: {} package(s)", packages.len());
            }
            Ok(())
        }
        None => {
            // No command provided, show help
            println!("Grove Package Manager v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'grove --help' for usage information");
            Ok(())
        }
    }
}
