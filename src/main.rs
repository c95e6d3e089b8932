use store_search::{config, Category, SearchSession, SearchState};
use tracing::{info, warn};

const USAGE: &str =
    "usage: store-search [--category all|music|software|ebooks] [--json] <term>...";

#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Version,
    Search {
        term: String,
        category: Category,
        json: bool,
    },
}

fn parse_args<I>(args: I) -> anyhow::Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut category = Category::All;
    let mut json = false;
    let mut words: Vec<String> = Vec::new();

    let mut args = args.into_iter();
    while let Some(a) = args.next() {
        match a.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            "--json" => json = true,
            "--category" | "-c" => {
                let Some(v) = args.next() else {
                    anyhow::bail!("--category needs a value\n{}", USAGE);
                };
                category = v.parse()?;
            }
            other => {
                if let Some(rest) = other.strip_prefix("--category=") {
                    category = rest.parse()?;
                } else {
                    words.push(a);
                }
            }
        }
    }

    Ok(Command::Search {
        term: words.join(" "),
        category,
        json,
    })
}

fn print_state(state: &SearchState, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(state.results())?);
        return Ok(());
    }

    match state {
        SearchState::Results(list) => {
            for r in list.iter() {
                println!("{} — {}", r.name, r.artist_label());
            }
        }
        SearchState::NoResults => println!("Nothing Found"),
        SearchState::NotSearchedYet | SearchState::Loading => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let (term, category, json) = match parse_args(std::env::args().skip(1))? {
        Command::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        Command::Version => {
            println!("store-search {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Command::Search {
            term,
            category,
            json,
        } => (term, category, json),
    };

    let cfg = config::load_config();
    let mut session = SearchSession::from_config(&cfg)?;

    if !session.perform_search(&term, category, |_| {}) {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    }
    info!("searching '{}' in {}", term, category);

    let outcome = tokio::select! {
        done = session.wait_for_completion() => done,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted; cancelling search");
            None
        }
    };

    match outcome {
        Some(true) => print_state(session.state(), json),
        Some(false) => {
            if let Some(e) = session.last_failure() {
                eprintln!("search failed: {}", e);
            }
            std::process::exit(1);
        }
        None => {
            session.cancel();
            std::process::exit(130);
        }
    }
}
