//! Command-line entry point: profile management and offline statement rendering.
#![forbid(unsafe_code)]

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use cypher_tools::{
    profile::{self, write_profile},
    statement, ConnectionProfile, Node, ProfileUpdate,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "cypher-tools",
    version,
    about = "Connection profiles and statement rendering for property-graph databases",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage connection profiles
    #[command(subcommand)]
    Profile(ProfileCmd),
    /// Print a statement without running it
    #[command(subcommand)]
    Render(RenderCmd),
}

#[derive(Subcommand, Debug)]
enum ProfileCmd {
    /// Create or update a profile file
    Set(SetProfileArgs),
    /// Resolve a profile by name or path and print it (password redacted)
    Show {
        #[arg(value_name = "NAME|PATH")]
        name: String,
    },
}

#[derive(Args, Debug)]
struct SetProfileArgs {
    #[arg(long, default_value = "default", help = "Profile name under the per-user directory")]
    name: String,

    #[arg(long, value_name = "FILE", help = "Write to this file instead of a named profile")]
    path: Option<PathBuf>,

    #[arg(long, help = "Full connection URI")]
    uri: Option<String>,

    #[arg(short, long, help = "Server host, used when --uri is absent")]
    server: Option<String>,

    #[arg(short = 'o', long, help = "Server port, used with --server")]
    port: Option<u16>,

    #[arg(short, long)]
    user: Option<String>,

    #[arg(short, long, env = "CYPHER_TOOLS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(short, long, help = "Default database name")]
    database: Option<String>,

    #[arg(short, long, value_name = "DIR", help = "Server-side import directory")]
    import_folder: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum RenderCmd {
    /// CREATE INDEX for a node label or relationship type
    Index {
        #[arg(long)]
        label: String,
        #[arg(long)]
        prop: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, help = "Index a relationship type instead of a node label")]
        edge: bool,
    },
    /// CREATE CONSTRAINT ... IS UNIQUE
    UniqueConstraint {
        #[arg(long)]
        label: String,
        #[arg(long)]
        prop: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Two-pass batched delete (edges, then nodes)
    BatchedDelete {
        #[arg(long, help = "Restrict to nodes with this label")]
        label: Option<String>,
        #[arg(long, default_value_t = 10_000)]
        transaction_size: usize,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Profile(ProfileCmd::Set(args)) => set_profile(args),
        Command::Profile(ProfileCmd::Show { name }) => {
            let profile = ConnectionProfile::resolve(&name)?;
            println!("uri:           {}", profile.uri);
            println!("user:          {}", profile.user);
            println!("password:      ********");
            println!("database:      {}", profile.database.as_deref().unwrap_or("-"));
            println!(
                "import_folder: {}",
                profile
                    .import_folder
                    .as_ref()
                    .map_or_else(|| "-".to_string(), |p| p.display().to_string())
            );
            Ok(())
        }
        Command::Render(cmd) => {
            println!("{}", render(cmd)?);
            Ok(())
        }
    }
}

fn set_profile(args: SetProfileArgs) -> Result<(), Box<dyn Error>> {
    let target = match args.path {
        Some(path) => path,
        None => {
            let dir = profile::profile_dir().ok_or(cypher_tools::ProfileError::NoHomeDir)?;
            profile::named_profile_path(&dir, &args.name)
        }
    };
    let update = ProfileUpdate {
        uri: args.uri,
        server: args.server,
        port: args.port,
        user: args.user,
        password: args.password,
        database: args.database,
        import_folder: args.import_folder,
    };
    write_profile(&target, &update)?;
    println!("profile written to {}", target.display());
    Ok(())
}

fn render(cmd: RenderCmd) -> cypher_tools::Result<String> {
    match cmd {
        RenderCmd::Index {
            label,
            prop,
            name,
            edge: false,
        } => statement::create_node_index(&label, &prop, name.as_deref()),
        RenderCmd::Index {
            label,
            prop,
            name,
            edge: true,
        } => statement::create_edge_index(&label, &prop, name.as_deref()),
        RenderCmd::UniqueConstraint { label, prop, name } => {
            statement::create_unique_constraint(&label, &prop, name.as_deref())
        }
        RenderCmd::BatchedDelete {
            label,
            transaction_size,
        } => {
            let scope = label.map(Node::new);
            let edges = statement::batched_delete_edges(scope.as_ref(), transaction_size)?;
            let nodes = statement::batched_delete_nodes(scope.as_ref(), transaction_size)?;
            Ok(format!("{edges};\n{nodes};"))
        }
    }
}
