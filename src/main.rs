use clap::{
    ArgAction, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use tidlcli::{
    cli::{self, GetOptions, Resource, SearchOptions, SearchScope},
    config, error,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Log in as a TIDAL user (authorization code flow with PKCE)
    Auth(AuthOptions),

    /// Request an application token (client credentials grant)
    Token,

    /// Fetch a catalog resource or one of its relationships
    Get(GetArgs),

    /// Search the catalog
    Search(SearchArgs),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct AuthOptions {
    /// Scope to request; can be repeated. Defaults to TIDAL_SCOPE
    #[clap(long, action = ArgAction::Append, num_args = 1)]
    pub scope: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct GetArgs {
    /// Resource collection
    #[clap(value_enum)]
    pub resource: Resource,

    /// Resource id (`me` for the current user)
    pub id: String,

    /// Relationship to fetch instead of the resource itself
    #[clap(long)]
    pub relationship: Option<String>,

    /// Related resources to embed; can be repeated
    #[clap(long, action = ArgAction::Append, num_args = 1)]
    pub include: Vec<String>,

    /// ISO 3166-1 country code. Defaults to TIDAL_COUNTRY_CODE
    #[clap(long)]
    pub country: Option<String>,

    /// Print the JSON:API document as received
    #[clap(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Search term
    pub term: String,

    /// Only return this kind of result
    #[clap(long, value_enum)]
    pub relationship: Option<SearchScope>,

    /// Related resources to embed; can be repeated
    #[clap(long, action = ArgAction::Append, num_args = 1)]
    pub include: Vec<String>,

    /// ISO 3166-1 country code. Defaults to TIDAL_COUNTRY_CODE
    #[clap(long)]
    pub country: Option<String>,

    /// Print the JSON:API document as received
    #[clap(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = config::load_env() {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Auth(opt) => cli::auth(opt.scope),
        Command::Token => cli::token(),
        Command::Get(opt) => cli::get(GetOptions {
            resource: opt.resource,
            id: opt.id,
            relationship: opt.relationship,
            include: opt.include,
            country: opt.country,
            json: opt.json,
        }),
        Command::Search(opt) => cli::search(SearchOptions {
            term: opt.term,
            scope: opt.relationship,
            include: opt.include,
            country: opt.country,
            json: opt.json,
        }),
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
