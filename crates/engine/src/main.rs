//! Chatling - terminal demo entry point.
//!
//! A minimal presentation layer over the engine: prints dialogue messages
//! from the event bus, reads choices from stdin, and shows the parent report
//! on demand.

use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatling_domain::{Language, ScenarioId, Sender, UserId};
use chatling_engine::infrastructure::ports::Identity;
use chatling_engine::use_cases::Affordance;
use chatling_engine::{App, AppConfig, SessionEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional .env beside the binary's working directory
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatling=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Chatling");

    let config = config_from_env();
    let language = std::env::var("CHATLING_LANG")
        .ok()
        .and_then(|s| Language::from_str(&s).ok())
        .unwrap_or(Language::En);

    let app = App::build(config)?;
    if app.catalog.is_empty() {
        anyhow::bail!("no scenarios found; set CHATLING_CONTENT_DIR to a content directory");
    }

    // On startup with an identity present, reconcile with the cloud.
    app.sync.on_sign_in().await;

    // The "presentation layer": print everything the walker emits. Completion
    // events also feed the reminder counter, so a defensive halt on broken
    // content never counts as a finished scenario.
    let completions = Arc::new(AtomicU64::new(0));
    {
        let completions = Arc::clone(&completions);
        app.events
            .subscribe(move |event| match event {
                SessionEvent::Message { sender, text } => {
                    let prefix = match sender {
                        Sender::Narrator => "Chatling",
                        Sender::User => "You",
                        Sender::System => "*",
                    };
                    println!("{}: {}", prefix, text);
                }
                SessionEvent::ActionTriggered { tag, .. } => {
                    println!("  [{}]", tag);
                }
                SessionEvent::QuizRequested { scenario_id } => {
                    println!("  (quiz for '{}' would start here)", scenario_id);
                }
                SessionEvent::ScenarioCompleted { .. } => {
                    completions.fetch_add(1, Ordering::Relaxed);
                }
                SessionEvent::ChoicesOffered { .. } => {}
            })
            .await;
    }

    loop {
        println!();
        print_catalog(&app, language).await;
        println!("Type a scenario id to play, 'report' for the parent report, 'quit' to exit.");

        let input = prompt("> ")?;
        match input.as_str() {
            "" => continue,
            "quit" | "q" => break,
            "report" => {
                let state = app.progress.state().await;
                println!("{}", app.report.compute(&state));
            }
            id => run_scenario(&app, id, &completions).await?,
        }
    }

    Ok(())
}

fn config_from_env() -> AppConfig {
    let content_dir = std::env::var("CHATLING_CONTENT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("content"));

    let data_dir = std::env::var("CHATLING_DATA_DIR")
        .map(PathBuf::from)
        .ok()
        .or_else(|| {
            directories::ProjectDirs::from("org", "chatling", "chatling")
                .map(|dirs| dirs.data_dir().to_path_buf())
        })
        .unwrap_or_else(|| PathBuf::from("data"));

    let identity = std::env::var("CHATLING_USER_ID")
        .ok()
        .and_then(|raw| uuid::Uuid::parse_str(&raw).ok())
        .map(|uuid| Identity {
            user_id: UserId::from_uuid(uuid),
            email: std::env::var("CHATLING_EMAIL").ok(),
        });

    AppConfig {
        content_dir,
        data_dir,
        remote_url: std::env::var("CHATLING_REMOTE_URL").ok(),
        identity,
    }
}

async fn print_catalog(app: &App, language: Language) {
    let state = app.progress.state().await;
    let scenarios = app.catalog.by_language(language);
    println!(
        "Missions ({}% complete):",
        state.global_progress(scenarios.len())
    );
    for scenario in &scenarios {
        let status = if state.is_completed(&scenario.id) {
            "done"
        } else if scenario.is_unlocked(&state.badges) {
            "open"
        } else {
            "locked"
        };
        println!("  {:<18} {:<8} {}", scenario.id.as_str(), status, scenario.title);
    }
}

async fn run_scenario(
    app: &App,
    raw_id: &str,
    completions: &Arc<AtomicU64>,
) -> anyhow::Result<()> {
    let id = ScenarioId::from(raw_id);
    let Some(scenario) = app.catalog.get(&id) else {
        println!("No scenario called '{}'.", raw_id);
        return Ok(());
    };

    let state = app.progress.state().await;
    if !scenario.is_unlocked(&state.badges) {
        // Premium/locked content is where a real frontend would route to
        // checkout; the engine just reports the gate.
        println!(
            "'{}' is locked - earn the '{}' badge first.",
            scenario.title,
            scenario
                .required_badge_id
                .as_ref()
                .map(|b| b.as_str())
                .unwrap_or("?")
        );
        return Ok(());
    }

    let Some(mut session) = app.session(&id) else {
        return Ok(());
    };
    let completions_before = completions.load(Ordering::Relaxed);
    session.start_or_resume().await;

    while !session.is_finished() {
        match session.affordance().clone() {
            Affordance::Choices(choices) => {
                for (i, choice) in choices.iter().enumerate() {
                    println!("  {}) {}", i + 1, choice.label);
                }
                let input = prompt("choose> ")?;
                match input.parse::<usize>() {
                    Ok(n) if n >= 1 => {
                        if let Err(e) = session.choose(n - 1).await {
                            println!("{}", e);
                        }
                    }
                    _ => println!("pick a number between 1 and {}", choices.len()),
                }
            }
            Affordance::Continue(_) => {
                prompt("[enter to continue] ")?;
                if let Err(e) = session.advance().await {
                    println!("{}", e);
                }
            }
            Affordance::Finished => break,
        }
    }

    // Only walks that actually reached a terminal node count toward the
    // reminder cadence.
    for _ in completions_before..completions.load(Ordering::Relaxed) {
        app.reminder.on_scenario_completed().await;
    }
    if app.reminder.should_show().await {
        println!("Tip: sign in to keep this progress across devices.");
        app.reminder.on_shown().await;
    }

    Ok(())
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{}", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
