use std::path::PathBuf;

use anyhow::Result;
use structopt::StructOpt;

use breccia::{build, tree, BuildOptions, PrintOptions};

#[derive(StructOpt)]
#[structopt(about = "Single-file bundler for custom HTML widgets")]
enum BrecciaCommands {
    /// Build a widget directory into a deploy artifact
    Build {
        /// Output directory, defaults to <dir>/deploy
        #[structopt(short, long, parse(from_os_str))]
        out_dir: Option<PathBuf>,

        /// Widget directory containing the build config
        #[structopt(parse(from_os_str), default_value = ".")]
        dir: PathBuf,
    },

    /// Print the module graph for an entry point
    Tree {
        /// Print the registry id for each module
        #[structopt(short = "i", long)]
        include_id: bool,

        /// Print the file name for each module
        #[structopt(short = "f", long)]
        include_file: bool,

        /// Module entry point
        #[structopt(parse(from_os_str))]
        module: PathBuf,
    },
}

fn main() -> Result<()> {
    if std::env::var("RUST_LOG").ok().is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    let args = BrecciaCommands::from_args();
    match args {
        BrecciaCommands::Build { dir, out_dir } => {
            let options = BuildOptions {
                out_dir,
                build_date: None,
            };
            build(&dir, &options)?;
        }
        BrecciaCommands::Tree {
            module,
            include_id,
            include_file,
        } => {
            let options = PrintOptions {
                include_id,
                include_file,
            };
            tree(module, options)?;
        }
    }
    Ok(())
}
