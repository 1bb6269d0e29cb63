use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use cfgbake_compiler::{bake_source, compile, docs_source, lua_source, parse_and_resolve};
use cfgbake_compiler::error::CompileError;

#[derive(Parser)]
#[command(name = "cfgbake")]
#[command(about = "Generate bake, verifier and Lua glue from annotated declarations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a declaration file and write the generated sources
    Generate {
        /// Input declaration file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory (defaults to the input file's directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse and validate a declaration file without writing anything
    Check {
        /// Input declaration file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Dump the resolved declaration tree as JSON (printed to stdout)
    Dump {
        /// Input declaration file
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<(), CompileError> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { input, output } => {
            let text = fs::read_to_string(input)?;
            let result = compile(&text)?;

            let dir = match output {
                Some(dir) => dir.clone(),
                None => input.parent().unwrap_or(Path::new(".")).to_path_buf(),
            };
            let stem = input
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "out".to_string());

            let docs_path = dir.join(format!("{}.docs.cpp", stem));
            let bake_path = dir.join(format!("{}.bake.cpp", stem));
            let lua_path = dir.join(format!("{}.lua.cpp", stem));
            fs::write(&docs_path, docs_source(&result))?;
            fs::write(&bake_path, bake_source(&result))?;
            fs::write(&lua_path, lua_source(&result))?;

            println!(
                "Compiled {} → {}, {}, {}",
                input.display(),
                docs_path.display(),
                bake_path.display(),
                lua_path.display()
            );
            Ok(())
        }

        Commands::Check { input } => {
            let text = fs::read_to_string(input)?;
            // Running the whole pipeline surfaces attribute and generator
            // errors, not just syntax.
            let result = compile(&text)?;
            println!(
                "{}: {} record(s), {} exported function(s), {} enum conversion(s)",
                input.display(),
                result.docs.len(),
                result.bindings.len(),
                result.stringifies.len()
            );
            Ok(())
        }

        Commands::Dump { input } => {
            let text = fs::read_to_string(input)?;
            let unit = parse_and_resolve(&text)?;
            let json = serde_json::to_string_pretty(&unit)
                .map_err(|e| CompileError::Internal(e.to_string()))?;
            println!("{}", json);
            Ok(())
        }
    }
}
