// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn scope_arg() -> Arg {
    Arg::new("scope")
        .short('s')
        .long("scope")
        .value_parser(["local", "global", "root"])
        .default_value("local")
        .help("Install scope")
}

fn dir_arg() -> Arg {
    Arg::new("dir")
        .short('C')
        .long("dir")
        .value_name("DIR")
        .help("Project directory holding grove.json (default: current directory)")
}

fn build_cli() -> Command {
    Command::new("grove")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Grove Contributors")
        .about("Package manager for the grove module ecosystem")
        .subcommand_required(false)
        .subcommand(
            Command::new("install")
                .about("Install packages, or the project's dependencies when no spec is given")
                .arg(
                    Arg::new("specs")
                        .num_args(0..)
                        .help("Package specs: name, name@selector, a path, or git+<url>[@ref]"),
                )
                .arg(dir_arg())
                .arg(scope_arg())
                .arg(
                    Arg::new("upgrade")
                        .short('u')
                        .long("upgrade")
                        .action(clap::ArgAction::SetTrue)
                        .help("Reinstall packages that are already present"),
                )
                .arg(
                    Arg::new("dev")
                        .long("dev")
                        .action(clap::ArgAction::SetTrue)
                        .help("Include cfg(dev)-guarded dependencies of the project manifest"),
                )
                .arg(
                    Arg::new("no_recursive")
                        .long("no-recursive")
                        .action(clap::ArgAction::SetTrue)
                        .help("Do not install the dependencies of fetched packages"),
                ),
        )
        .subcommand(
            Command::new("uninstall")
                .about("Remove an installed package")
                .arg(Arg::new("name").required(true).help("Package name to remove"))
                .arg(dir_arg())
                .arg(scope_arg()),
        )
        .subcommand(
            Command::new("list")
                .about("List installed packages")
                .arg(dir_arg())
                .arg(scope_arg()),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory
    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    // Generate main man page
    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("grove.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");

    println!("cargo:warning=Man page generated at {}", man_path.display());
}
