use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::future::join_all;
use tracing_subscriber::EnvFilter;

use shopfront::api::ApiClient;
use shopfront::breadcrumbs::BreadcrumbStore;
use shopfront::catalog::Catalog;
use shopfront::config::{Settings, save_setting};
use shopfront::models::Labelled;
use shopfront::router::{Route, Router};
use shopfront::session::{ConfigLoad, Language, Session};
use shopfront::status::CallName;
use shopfront::storage::Storage;

#[derive(Parser)]
#[command(name = "shopfront")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Named browsing session; its state survives between runs
    #[arg(short, long)]
    session: Option<String>,

    /// Override the API host for this run
    #[arg(long)]
    host: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the site configuration and report success, maintenance or error
    Config {
        /// Ignore the cached copy
        #[arg(long)]
        reload: bool,
    },
    /// GET a URI through the dispatcher and print the payload
    Fetch {
        /// Call name (products, search, showO, ...)
        call: CallName,
        /// URI below the API prefix, e.g. /products/latest?page=1
        uri: String,
    },
    /// Load everything the home page shows at once
    Home,
    /// Show or switch the language
    Lang {
        /// Flip between ita and eng
        #[arg(long)]
        toggle: bool,
        /// Set explicitly (ita | eng)
        #[arg(long, conflicts_with = "toggle")]
        set: Option<Language>,
    },
    /// Inspect or change the category breadcrumbs
    Crumbs {
        #[command(subcommand)]
        action: CrumbAction,
    },
    /// Navigate between two paths and print the resulting page head
    Navigate { from: String, to: String },
    /// Persist the API host in the user config file
    SetHost { host: String },
}

#[derive(Subcommand)]
enum CrumbAction {
    Show,
    Set {
        level: u8,
        label_ita: String,
        label_eng: String,
        #[arg(long)]
        id: Option<i64>,
        #[arg(long)]
        parent: Option<i64>,
    },
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .init();

    let mut settings = Settings::new().context("could not load settings")?;
    if let Some(host) = cli.host {
        settings.host = host;
    }
    let storage = Storage::open(&settings.storage_path(), cli.session.as_deref())
        .context("could not open storage")?;
    let api = Arc::new(ApiClient::from_settings(settings)?);
    let mut session = Session::new(storage.clone());

    match cli.command {
        Commands::Config { reload } => {
            let outcome = if reload {
                session.reload_config(&api).await
            } else {
                session.load_config(&api).await
            };
            println!("{outcome}");
            if outcome == ConfigLoad::Success {
                println!("{}", serde_json::to_string_pretty(session.config())?);
            }
        }
        Commands::Fetch { call, uri } => {
            let outcome = api.dispatch(&uri, call).await;
            match outcome.status() {
                Some(status) => println!("{call}: {status}"),
                None => println!("{call}: canceled"),
            }
            if let Some(data) = outcome.data() {
                println!("{}", serde_json::to_string_pretty(data)?);
            }
        }
        Commands::Home => {
            if session.load_config(&api).await == ConfigLoad::Maintenance {
                println!("maintenance");
                return Ok(());
            }
            let per_page = session.config().pagination.home_product_page_pagination.unwrap_or(8);
            let catalog = Catalog::new(api.clone());
            let lang = session.language();
            let (products, shows) = tokio::join!(catalog.home_products(per_page), catalog.upcoming_shows());
            for product in products?.data {
                println!("{}", product.label(lang));
            }
            for show in shows? {
                println!("{} ({}, {})", show.label(lang), show.location, show.start_date);
            }
            let lookups = join_all([CallName::Categories, CallName::Contacts].map(|call| {
                let api = api.clone();
                async move {
                    let uri = format!("/{call}");
                    (call, api.dispatch(&uri, call).await.status())
                }
            }))
            .await;
            for (call, status) in lookups {
                tracing::debug!(%call, ?status, "home lookup finished");
            }
            println!("status: {}", api.statuses().global());
        }
        Commands::Lang { toggle, set } => {
            if toggle {
                session.change_language();
            } else if let Some(language) = set {
                session.set_language(language);
            }
            println!("{} ({})", session.language(), session.language().html_lang());
        }
        Commands::Crumbs { action } => {
            let mut crumbs = BreadcrumbStore::new(storage.session.clone());
            match action {
                CrumbAction::Show => {}
                CrumbAction::Set { level, label_ita, label_eng, id, parent } => {
                    crumbs.set_breadcrumb(level, &label_ita, &label_eng, id, parent)
                }
                CrumbAction::Reset => crumbs.reset_breadcrumbs(),
            }
            let lang = session.language();
            let path: Vec<&str> = crumbs.path().map(|crumb| crumb.label(lang)).collect();
            println!("{}", path.join(" > "));
            println!("{}", serde_json::to_string_pretty(crumbs.breadcrumbs())?);
        }
        Commands::Navigate { from, to } => {
            let mut crumbs = BreadcrumbStore::new(storage.session.clone());
            let (from, to) = (Route::resolve(&from), Route::resolve(&to));
            let head = Router::new(&session, &mut crumbs).navigate(&from, &to);
            println!("{} -> {} [{}]", from.name(), to.path(), head.lang);
            println!("title: {}", head.title);
            for tag in head.meta {
                let key = tag.name.or(tag.property).unwrap_or_default();
                println!("  {key}: {}", tag.content);
            }
            println!("breadcrumbs: {}", serde_json::to_string(crumbs.breadcrumbs())?);
        }
        Commands::SetHost { host } => {
            save_setting("host", toml::Value::String(host.clone()))?;
            println!("host set to {host}");
        }
    }

    Ok(())
}
