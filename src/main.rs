use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use gridiron::config::{self, GridironConfig};
use gridiron::db::SqliteStore;
use gridiron::output::{json as json_out, table};
use gridiron::pages::{self, analysis::Report, options::FilterPage, PageOutput};
use gridiron::query::filters::Selection;

#[derive(Parser)]
#[command(name = "gridiron", version, about = "Gridiron — filterable college-football tables and reports over SQLite")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to database file (default: ~/.gridiron/gridiron.db)
    #[arg(long, global = true, env = "GRIDIRON_DB")]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Overview: teams, active players, seasons
    Home,

    /// Explore teams by conference, division and venue state
    Teams {
        /// Conference name, or "All"
        #[arg(long, default_value = "All")]
        conference: Selection,

        /// Division name, or "All"
        #[arg(long, default_value = "All")]
        division: Selection,

        /// Venue state, or "All"
        #[arg(long, default_value = "All")]
        state: Selection,

        /// Match team name, market or alias (partial)
        #[arg(long)]
        search: Option<String>,

        /// Show the roster for this team id
        #[arg(long)]
        roster: Option<String>,
    },

    /// Explore players by position, status and eligibility
    Players {
        #[arg(long, default_value = "All")]
        position: Selection,

        #[arg(long, default_value = "All")]
        status: Selection,

        #[arg(long, default_value = "All")]
        eligibility: Selection,

        /// Match player name, team name or market (partial)
        #[arg(long)]
        search: Option<String>,
    },

    /// Seasons and the rankings of one season
    Seasons {
        /// Season year, or "All"
        #[arg(long, default_value = "All")]
        year: Selection,

        /// Season status, or "All"
        #[arg(long, default_value = "All")]
        status: Selection,

        /// Season id to show rankings for (default: first filtered season)
        #[arg(long)]
        season: Option<String>,

        /// Ranking week, or "All"
        #[arg(long, default_value = "All")]
        week: Selection,
    },

    /// AP poll table for one season
    Rankings {
        /// Season year (default: latest)
        #[arg(long)]
        year: Option<i64>,

        /// Ranking week, or "All"
        #[arg(long, default_value = "All")]
        week: Selection,

        #[arg(long, default_value_t = pages::rankings::MIN_RANK)]
        min_rank: i64,

        #[arg(long, default_value_t = pages::rankings::MAX_RANK)]
        max_rank: i64,

        /// Match team name or market (partial)
        #[arg(long)]
        team: Option<String>,
    },

    /// Venue directory
    Venues {
        #[arg(long, default_value = "All")]
        state: Selection,

        #[arg(long, default_value = "All")]
        roof_type: Selection,
    },

    /// Coaches directory
    Coaches {
        /// Match coach name, team name or market (partial)
        #[arg(long)]
        search: Option<String>,
    },

    /// Run an aggregate report (slug or menu number 1-8)
    Analysis {
        /// Report to run; omit to list reports
        report: Option<String>,
    },

    /// List filter choices for a page: teams, players, seasons, rankings, venues
    Options {
        page: String,

        /// Season year whose ranking weeks to list (rankings only; default: latest)
        #[arg(long)]
        year: Option<i64>,
    },

    /// Create the database schema
    Init,

    /// Show database info
    Info,

    /// Show or create the config file
    Config {
        /// Write the default config template if none exists
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let json_output = cli.json;

    let cfg = GridironConfig::load()?;
    let db_path = cfg.resolve_db_path(cli.db.as_deref())?;
    let store = SqliteStore::new(cfg.store_config(db_path.clone()));
    let style = table::TableStyle {
        max_rows: cfg.max_rows(),
        max_column_width: cfg.max_column_width(),
    };

    let show = |page: PageOutput| -> Result<()> {
        if json_output {
            json_out::print_json(&page)?;
        } else {
            table::print_page(&page, style);
        }
        Ok(())
    };

    match cli.command {
        Commands::Home => show(pages::home::render(&store)?)?,

        Commands::Teams {
            conference,
            division,
            state,
            search,
            roster,
        } => {
            let selection = pages::teams::TeamsSelection {
                conference,
                division,
                state,
                search,
                roster_team: roster,
            };
            show(pages::teams::render(&store, &selection)?)?;
        }

        Commands::Players {
            position,
            status,
            eligibility,
            search,
        } => {
            let selection = pages::players::PlayersSelection {
                position,
                status,
                eligibility,
                search,
            };
            show(pages::players::render(&store, &selection)?)?;
        }

        Commands::Seasons {
            year,
            status,
            season,
            week,
        } => {
            let selection = pages::seasons::SeasonsSelection {
                year,
                status,
                season_id: season,
                week,
            };
            show(pages::seasons::render(&store, &selection)?)?;
        }

        Commands::Rankings {
            year,
            week,
            min_rank,
            max_rank,
            team,
        } => {
            let selection = pages::rankings::RankingsSelection {
                year,
                week,
                min_rank,
                max_rank,
                team,
            };
            show(pages::rankings::render(&store, &selection)?)?;
        }

        Commands::Venues { state, roof_type } => {
            let selection = pages::venues::VenuesSelection { state, roof_type };
            show(pages::venues::render(&store, &selection)?)?;
        }

        Commands::Coaches { search } => {
            let selection = pages::coaches::CoachesSelection { search };
            show(pages::coaches::render(&store, &selection)?)?;
        }

        Commands::Analysis { report: None } => {
            if json_output {
                let reports: Vec<_> = Report::ALL
                    .iter()
                    .map(|r| serde_json::json!({ "slug": r.slug(), "title": r.title() }))
                    .collect();
                json_out::print_json(&reports)?;
            } else {
                println!("Reports:\n");
                for (i, r) in Report::ALL.iter().enumerate() {
                    println!("  {}. {:<24} {}", i + 1, r.slug(), r.title());
                }
            }
        }

        Commands::Analysis {
            report: Some(name),
        } => {
            let report = Report::from_str(&name)
                .with_context(|| format!("Unknown report: {name}. Run `gridiron analysis` to list reports"))?;
            show(pages::analysis::render(&store, report)?)?;
        }

        Commands::Options { page, year } => {
            let which = match FilterPage::from_str(&page) {
                Some(FilterPage::Rankings { .. }) => FilterPage::Rankings { year },
                Some(other) => other,
                None => bail!("Unknown page: {page}. Use: teams, players, seasons, rankings, venues"),
            };
            let options = pages::options::filter_options(&store, which)?;
            if json_output {
                json_out::print_json(&options)?;
            } else {
                table::print_options(&page, &options);
            }
        }

        Commands::Init => {
            store.init_schema()?;
            println!("Initialized schema at {}", db_path.display());
        }

        Commands::Info => {
            let stats = store.stats()?;
            let schema_ver = store
                .schema_version()
                .unwrap_or_else(|| "unknown".to_string());

            if json_output {
                json_out::print_json(&serde_json::json!({
                    "version": env!("CARGO_PKG_VERSION"),
                    "schema_version": schema_ver,
                    "db_path": db_path.display().to_string(),
                    "stats": stats,
                }))?;
            } else {
                println!("gridiron v{}", env!("CARGO_PKG_VERSION"));
                println!("  Schema:   v{schema_ver}");
                println!("  Database: {}\n", db_path.display());
                table::print_stats(&stats);
            }
        }

        Commands::Config { init } => {
            if init {
                let path = config::config_path()?;
                if config::init_config()? {
                    println!("Created {}", path.display());
                } else {
                    println!("Config already exists: {}", path.display());
                }
            } else if json_output {
                json_out::print_json(&cfg)?;
            } else {
                println!("{}", cfg.display(&db_path));
            }
        }
    }

    Ok(())
}
