use std::{error::Error, path::PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use skola::{
    auth,
    config::{Config, ConfigStore, FileConfigStore},
    drill,
    report::{format_statistics, format_word},
    server,
    store::SqliteStore,
    user::UserProfile,
    vocabulary::{seed, UserId, WordFilter, WordId, WordList},
};

/// czech vocabulary drill that keeps asking the words you get wrong
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A Czech vocabulary drill. Words you have never seen come up first, then the ones you keep misspelling, with per-user statistics and an HTTP API for the web frontend."
)]
pub struct Cli {
    /// sqlite database to use instead of the configured one
    #[clap(short = 'd', long, global = true)]
    database: Option<PathBuf>,

    /// json config file to load instead of the default location
    #[clap(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// run the HTTP API
    Serve {
        /// port to listen on, overrides SKOLA_PORT and the config file
        #[clap(short = 'p', long)]
        port: Option<u16>,
    },

    /// load words into the database
    Seed {
        /// csv file with a czech,english,category,level header; defaults to the bundled list
        #[clap(long)]
        csv: Option<PathBuf>,

        /// import even when the database already has words
        #[clap(long)]
        force: bool,
    },

    /// register a user locally and print a bearer token for the API
    Login {
        #[clap(long)]
        google_id: String,

        #[clap(long)]
        email: String,

        #[clap(long)]
        name: Option<String>,
    },

    /// draw words for a user
    Random {
        #[clap(short = 'u', long)]
        user: UserId,

        #[clap(flatten)]
        filter: FilterArgs,

        /// number of words to draw
        #[clap(short = 'n', long, default_value_t = 1)]
        count: usize,

        #[clap(short = 'o', long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// record one attempt for a user
    Attempt {
        #[clap(short = 'u', long)]
        user: UserId,

        #[clap(short = 'w', long)]
        word: WordId,

        #[clap(short = 'm', long, allow_negative_numbers = true)]
        mistakes: i64,
    },

    /// show a user's statistics
    Stats {
        #[clap(short = 'u', long)]
        user: UserId,

        #[clap(flatten)]
        filter: FilterArgs,

        #[clap(short = 'o', long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// only words in this category, may be repeated
    #[clap(long = "category")]
    categories: Vec<String>,

    /// only words at this level, may be repeated
    #[clap(long = "level")]
    levels: Vec<String>,
}

impl From<FilterArgs> for WordFilter {
    fn from(args: FilterArgs) -> Self {
        WordFilter::new(args.categories, args.levels)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    fn load_config(&self) -> Config {
        let store = match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        };
        let mut config = store.load().with_env_overrides();
        if let Some(path) = &self.database {
            config.database_path = Some(path.clone());
        }
        config
    }
}

fn open_store(config: &Config) -> Result<SqliteStore, Box<dyn Error>> {
    let store = match &config.database_path {
        Some(path) => SqliteStore::open(path)?,
        None => SqliteStore::open_default()?,
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = cli.load_config();

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            server::start_server(config).await?;
        }
        Command::Seed { csv, force } => {
            let mut store = open_store(&config)?;
            let words = match &csv {
                Some(path) => seed::read_csv_file(path)?,
                None => WordList::czech()?.words,
            };
            let imported = if force {
                store.import_words(&words)?
            } else {
                store.seed_if_empty(&words)?
            };
            info!("Imported {imported} words");
            println!(
                "Imported {imported} words ({} total)",
                store.count_words()?
            );
        }
        Command::Login {
            google_id,
            email,
            name,
        } => {
            let store = open_store(&config)?;
            let profile = UserProfile {
                google_id,
                email,
                name,
                picture: None,
            };
            let (user, token) = auth::sign_in(&store, &profile, config.token_ttl())?;
            println!("user {}", user.id);
            println!("token {}", token.access_token);
        }
        Command::Random {
            user,
            filter,
            count,
            output,
        } => {
            let store = open_store(&config)?;
            let filter = WordFilter::from(filter);
            let mut rng = rand::thread_rng();
            let words = (0..count)
                .map(|_| drill::select_word(&store, user, &filter, &mut rng))
                .collect::<skola::Result<Vec<_>>>()?;

            match output {
                OutputFormat::Text => {
                    for word in &words {
                        println!("{}", format_word(word));
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&words)?),
            }
        }
        Command::Attempt {
            user,
            word,
            mistakes,
        } => {
            let store = open_store(&config)?;
            let attempt = drill::record_attempt(&store, user, word, mistakes)?;
            println!(
                "Recorded attempt {} for word {} with {} mistakes",
                attempt.id, attempt.word_id, attempt.mistake_count
            );
        }
        Command::Stats {
            user,
            filter,
            output,
        } => {
            let store = open_store(&config)?;
            let stats = drill::compute_statistics(&store, user, &WordFilter::from(filter))?;
            match output {
                OutputFormat::Text => print!("{}", format_statistics(&stats)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
            }
        }
    }

    Ok(())
}
