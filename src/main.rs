use anyhow::Result;
use artres::commands::{self, ResolveOptions};
use clap::Parser;
use std::path::PathBuf;

/// artres - Android library dependency resolver
///
/// Resolves the dependencies of an Android library module against its
/// declared repositories: flat directories for `name@ext` file dependencies,
/// Maven indexes (google, mavenCentral, custom URLs) for
/// `group:artifact:version` coordinates. Repositories are probed in
/// declaration order and the first match wins.
///
/// If the ARTRES_TOKEN environment variable is set, it is sent as a bearer
/// token to remote repositories.
#[derive(Parser, Debug)]
#[command(author, version = env!("ARTRES_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Module declaration file (defaults to module.json; also via ARTRES_CONFIG)
    #[arg(
        long = "config",
        short = 'c',
        env = "ARTRES_CONFIG",
        value_name = "PATH",
        global = true
    )]
    pub config: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Resolve every declared dependency and print where it comes from
    Resolve(ResolveArgs),

    /// Resolve every dependency and place it in the output directory
    Fetch(FetchArgs),

    /// Show the module declaration
    Show,

    /// Validate a dependency reference such as group:artifact:version or name@ext
    Check(CheckArgs),
}

#[derive(clap::Args, Debug)]
pub struct ResolutionFlags {
    /// Probe every repository and fail if a dependency matches in more than one
    #[arg(long)]
    pub strict: bool,

    /// Only probe local flat directories
    #[arg(long)]
    pub offline: bool,
}

impl From<&ResolutionFlags> for ResolveOptions {
    fn from(flags: &ResolutionFlags) -> Self {
        ResolveOptions {
            strict: flags.strict,
            offline: flags.offline,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub flags: ResolutionFlags,

    /// Print the resolved artifacts as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    #[command(flatten)]
    pub flags: ResolutionFlags,

    /// Output directory, relative to the module (defaults to build/libs)
    #[arg(long = "out", short = 'o', value_name = "DIR")]
    pub out: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// The reference to validate
    #[arg(value_name = "REFERENCE")]
    pub reference: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = artres::runtime::RealRuntime;

    match cli.command {
        Commands::Resolve(args) => {
            commands::resolve(runtime, cli.config, (&args.flags).into(), args.json).await?
        }
        Commands::Fetch(args) => {
            commands::fetch(runtime, cli.config, args.out, (&args.flags).into()).await?
        }
        Commands::Show => commands::show(runtime, cli.config)?,
        Commands::Check(args) => commands::check(&args.reference)?,
    }
    Ok(())
}
