use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use loom_cli::{
    inspect_report, load_config, open_session, render_text, save_session, search_report,
    validate_report, window_report,
};
use loom_core::{LoomConfig, NodeId};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn session_arg() -> Arg {
    Arg::new("session")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Session file (JSON)")
}

fn node_arg() -> Arg {
    Arg::new("node")
        .long("node")
        .value_parser(value_parser!(NodeId))
        .help("Node id (defaults to the saved focus)")
}

fn cli() -> Command {
    Command::new("loom")
        .version(loom_cli::VERSION)
        .about("Inspect and edit branching text-revision trees")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .subcommand(
            Command::new("inspect")
                .about("Summarize tree size and aggregate statistics")
                .arg(session_arg()),
        )
        .subcommand(
            Command::new("render")
                .about("Print the full text of a node")
                .arg(session_arg())
                .arg(node_arg()),
        )
        .subcommand(
            Command::new("window")
                .about("Print the bounded tree window around a node")
                .arg(session_arg())
                .arg(node_arg())
                .arg(
                    Arg::new("expand-ancestors")
                        .long("expand-ancestors")
                        .action(ArgAction::SetTrue)
                        .help("List ancestors hidden above the window"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Check references and statistics; exits 1 on problems")
                .arg(session_arg()),
        )
        .subcommand(
            Command::new("search")
                .about("Search node text and summaries")
                .arg(session_arg())
                .arg(Arg::new("query").required(true).help("Search terms"))
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .default_value("10")
                        .value_parser(value_parser!(usize))
                        .help("Maximum results"),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Add a text file as an imported node")
                .arg(session_arg())
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Text file to import"),
                )
                .arg(
                    Arg::new("parent")
                        .long("parent")
                        .value_parser(value_parser!(NodeId))
                        .help("Parent node id (defaults to the root)"),
                ),
        )
        .subcommand(Command::new("config").about("Print the effective configuration"))
}

fn session_path(args: &ArgMatches) -> Result<PathBuf> {
    args.get_one::<PathBuf>("session")
        .cloned()
        .context("missing session path")
}

async fn run(matches: ArgMatches) -> Result<()> {
    let config: LoomConfig = load_config(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    match matches.subcommand() {
        Some(("inspect", args)) => {
            let session = open_session(&session_path(args)?, &config).await?;
            print!("{}", inspect_report(&session));
        }
        Some(("render", args)) => {
            let session = open_session(&session_path(args)?, &config).await?;
            println!("{}", render_text(&session, args.get_one::<NodeId>("node").copied())?);
        }
        Some(("window", args)) => {
            let session = open_session(&session_path(args)?, &config).await?;
            if let Some(node) = args.get_one::<NodeId>("node") {
                session.set_focus(*node)?;
            }
            print!("{}", window_report(&session, args.get_flag("expand-ancestors"))?);
        }
        Some(("validate", args)) => {
            let session = open_session(&session_path(args)?, &config).await?;
            let (report, ok) = session.with_tree(validate_report);
            print!("{report}");
            if !ok {
                std::process::exit(1);
            }
        }
        Some(("search", args)) => {
            let session = open_session(&session_path(args)?, &config).await?;
            let query = args.get_one::<String>("query").context("missing query")?;
            let limit = args.get_one::<usize>("limit").copied().unwrap_or(10);
            print!("{}", search_report(&session, query, limit));
        }
        Some(("import", args)) => {
            let path = session_path(args)?;
            let file = args.get_one::<PathBuf>("file").context("missing file")?;
            let text = tokio::fs::read_to_string(file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let parent = args
                .get_one::<NodeId>("parent")
                .copied()
                .unwrap_or(NodeId::ROOT);

            let session = open_session(&path, &config).await?;
            let summary = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let id = session.import_text(parent, &text, &summary)?;
            save_session(&session, &path).await?;
            println!("imported node {id}");
        }
        Some(("config", _)) => {
            print!("{}", config.to_toml_string()?);
        }
        Some((other, _)) => bail!("unknown command: {other}"),
        None => bail!("no command given"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    run(cli().get_matches()).await
}
