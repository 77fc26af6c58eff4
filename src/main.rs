use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, FixedOffset, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use takeover::banner::ReturnBanner;
use takeover::config::{ConfigError, Settings};
use takeover::host::{Clock, ManualClock, SimulatedPage, SystemClock, Window};
use takeover::models::{parse_cookie_header, Cookie};
use takeover::protocol::navigable_url;
use takeover::redirect::Dispatcher;
use takeover::storage::{CookieStore, FileCookieJar};

#[derive(Parser)]
#[command(name = "takeover")]
#[command(about = "Rehearse date-based landing page takeovers and return banners", long_about = None)]
struct Cli {
    /// Settings file (TOML, YAML or JSON). Defaults to ./takeover.* when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Cookie jar shared by every step of a simulated visit
    #[arg(long, global = true, default_value = "takeover-cookies.json")]
    jar: PathBuf,
    /// Pretend the current time is this RFC 3339 instant
    #[arg(long, global = true)]
    now: Option<DateTime<FixedOffset>>,
    /// Cookies the browser already holds, in document.cookie form ("a=1; b=2")
    #[arg(long, global = true)]
    cookie: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a landing page and let the dispatcher decide
    Dispatch {
        /// Full landing page URL, query string included
        url: Url,
    },
    /// Load a destination page and let the return banner run
    Banner {
        /// Full destination page URL, query string included
        url: Url,
        /// document.referrer of the page
        #[arg(long)]
        referrer: Option<String>,
        /// The page is framed by another site
        #[arg(long)]
        iframe: bool,
        /// The script runs before <body> exists
        #[arg(long)]
        no_body: bool,
    },
    /// Load a destination page, then click its return link
    Return {
        /// Full destination page URL, query string included
        url: Url,
        /// document.referrer of the page
        #[arg(long)]
        referrer: Option<String>,
        /// The page is framed by another site
        #[arg(long)]
        iframe: bool,
    },
    /// Validate settings and list the redirect calendar
    Check,
    /// Remove a cookie from the jar
    Forget {
        /// Cookie name
        name: String,
    },
}

fn destination_page(url: Url, referrer: Option<String>, iframe: bool) -> SimulatedPage {
    let page = SimulatedPage::new(url).embedded(iframe);
    match referrer {
        Some(referrer) => page.with_referrer(referrer),
        None => page,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn check(settings: &Settings) -> Result<()> {
    let dispatcher = settings.dispatcher_config();
    let banner = settings.banner_config();

    let dispatcher_report = match &dispatcher {
        Ok(config) => json!({
            "date_format": config.date_format,
            "suppression_cookie": config.suppression_cookie,
            "suppression_minutes": config.suppression_duration.num_minutes(),
            "rules": config
                .rules
                .iter()
                .map(|(key, rule)| json!({
                    "date": key.to_string(),
                    "configured_as": rule.key,
                    "destination": rule.destination,
                    "navigable": navigable_url(&rule.destination).is_some(),
                }))
                .collect::<Vec<_>>(),
        }),
        Err(err) => json!({ "error": err.to_string() }),
    };

    let banner_report = match &banner {
        Ok(config) => json!({
            "link_text_template": config.link_text_template,
            "origin_cookie": config.origin_cookie,
            "cookie_expiration_seconds": config.cookie_lifetime.num_seconds(),
        }),
        Err(err) => json!({ "error": err.to_string() }),
    };

    print_json(&json!({ "dispatcher": dispatcher_report, "banner": banner_report }))?;

    let errors: Vec<&ConfigError> = [dispatcher.as_ref().err(), banner.as_ref().err()]
        .into_iter()
        .flatten()
        .collect();
    if !errors.is_empty() {
        bail!("{} configuration error(s) found", errors.len());
    }
    Ok(())
}

fn main() -> Result<()> {
    // Diagnostics go to stderr; stdout carries the JSON report
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    let clock: Arc<dyn Clock> = match cli.now {
        Some(now) => Arc::new(ManualClock::with_offset(now.with_timezone(&Utc), *now.offset())),
        None => Arc::new(SystemClock),
    };

    let mut jar = FileCookieJar::open(&cli.jar, Arc::clone(&clock))?;
    if let Some(header) = cli.cookie.as_deref() {
        for (name, value) in parse_cookie_header(header) {
            info!(cookie = %name, "seeding cookie");
            jar.set(Cookie::new(name, value, clock.now() + Duration::days(1)));
        }
    }

    match cli.command {
        Commands::Dispatch { url } => {
            let config = settings
                .dispatcher_config()
                .context("dispatcher disabled")?;
            let mut page = SimulatedPage::new(url);
            let outcome = Dispatcher::new(config).run(&mut page, &mut jar, &*clock);
            print_json(&json!({
                "outcome": outcome,
                "document_cookie": jar.store().document_cookie(),
            }))?;
        }
        Commands::Banner {
            url,
            referrer,
            iframe,
            no_body,
        } => {
            let config = settings.banner_config().context("return banner disabled")?;
            let mut page = destination_page(url, referrer, iframe);
            if no_body {
                page = page.without_body();
            }
            let outcome = ReturnBanner::new(config).run(&mut page, &mut jar, &*clock);
            page.run_animation_frames();
            print_json(&json!({
                "outcome": outcome,
                "address_bar": page.location().as_str(),
                "body_margin_top": page.body_margin_top(),
                "document_cookie": jar.store().document_cookie(),
            }))?;
        }
        Commands::Return {
            url,
            referrer,
            iframe,
        } => {
            let config = settings.banner_config().context("return banner disabled")?;
            let mut page = destination_page(url, referrer, iframe);
            let outcome = ReturnBanner::new(config).run(&mut page, &mut jar, &*clock);
            page.run_animation_frames();
            let back_target = match &outcome.link {
                Some(link) => Some(link.click(&mut page)),
                None => {
                    info!("no return banner on this page, nothing to click");
                    None
                }
            };
            print_json(&json!({
                "outcome": outcome,
                "back_target": back_target,
                "document_cookie": jar.store().document_cookie(),
            }))?;
        }
        Commands::Check => {
            check(&settings)?;
            return Ok(());
        }
        Commands::Forget { name } => {
            jar.clear(&name);
            info!(cookie = %name, jar = %jar.path().display(), "cookie removed");
        }
    }

    jar.save()?;
    Ok(())
}
