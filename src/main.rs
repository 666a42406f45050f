use chrono::Utc;
use dotenvy::dotenv;
use loveverse::config::{AppSettings, database};
use loveverse::core::{Session, stats};
use loveverse::errors::{Error, Result};
use loveverse::models::{MemoryInput, PlanInput};
use loveverse::store::{SqlDocumentStore, SqlLocalStore};
use std::{env, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: loveverse [status | note <text> | plan <title> [YYYY-MM-DD] | \
                     memory <title> [YYYY-MM-DD] | mood <mood> | challenge <id> | \
                     invite | join <code or link>]";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();

    // 3. Settings and seeds
    let settings = AppSettings::from_env()?;
    let seeds = settings
        .load_seeds()
        .inspect_err(|e| error!("Failed to load seeds: {}", e))?;

    // 4. Database behind both stores
    let db = database::create_connection(&settings.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))?;

    // 5. Open the owner's session
    let owner = env::var("LOVEVERSE_OWNER").ok();
    let mut session = Session::open(
        owner.as_deref(),
        Arc::new(SqlDocumentStore::new(db.clone())),
        Arc::new(SqlLocalStore::new(db)),
        seeds,
        settings,
    )
    .await;

    // 6. Run the requested command
    let args: Vec<String> = env::args().skip(1).collect();
    let outcome = run(&mut session, &args).await;

    let mirror = session.sign_out().await;
    if mirror.failed > 0 {
        error!("{} changes could not be mirrored remotely", mirror.failed);
    }
    outcome
}

async fn run(session: &mut Session, args: &[String]) -> Result<()> {
    let command = args.first().map_or("status", String::as_str);
    let rest = args.get(1..).unwrap_or_default().join(" ");

    match command {
        "status" => print_status(session),
        "note" => match session.add_note(&rest).await {
            Ok(note) => println!("Saved note {}", note.id),
            Err(reason) => println!("Note not saved: {reason}"),
        },
        "plan" | "memory" => {
            let (title, date) = split_trailing_date(&args[1..]);
            let outcome = if command == "plan" {
                session
                    .add_plan(PlanInput {
                        title,
                        planned_for: date,
                    })
                    .await
                    .map(|plan| plan.id)
            } else {
                let mut input = MemoryInput::titled(title);
                input.date_text = date;
                session.add_memory(input).await.map(|memory| memory.id)
            };
            match outcome {
                Ok(id) => println!("Saved {command} {id}"),
                Err(reason) => println!("{command} not saved: {reason}"),
            }
        }
        "mood" => match session.log_mood(Utc::now().date_naive(), &rest).await {
            Ok(_) => println!("Today's vibe set to {}", rest.trim()),
            Err(reason) => println!("Mood not saved: {reason}"),
        },
        "challenge" => match session.toggle_challenge(rest.trim()).await {
            Ok(challenge) => println!(
                "{}: {}",
                challenge.title,
                if challenge.done { "done" } else { "not done" }
            ),
            Err(reason) => println!("Challenge not updated: {reason}"),
        },
        "invite" => {
            let links = session.create_invite_code().await?;
            println!("Invite code: {}", links.code);
            println!("App link:    {}", links.app_deep_link);
            println!("Web link:    {}", links.web_invite_link);
        }
        "join" => {
            let result = session.join_by_invite_code(&rest).await?;
            println!(
                "Linked with {} (couple {})",
                result.partner_user_id, result.couple_id
            );
        }
        other => {
            println!("{USAGE}");
            return Err(Error::Config {
                message: format!("Unknown command '{other}'"),
            });
        }
    }
    Ok(())
}

fn split_trailing_date(words: &[String]) -> (String, Option<String>) {
    match words.split_last() {
        Some((last, title)) if !title.is_empty() && looks_like_day(last) => {
            (title.join(" "), Some(last.clone()))
        }
        _ => (words.join(" "), None),
    }
}

fn looks_like_day(word: &str) -> bool {
    let bytes = word.as_bytes();
    bytes.len() == 10 && bytes[4] == b'-' && bytes[7] == b'-'
}

fn print_status(session: &Session) {
    let state = session.state();
    let today = Utc::now().date_naive();
    let profile = &state.profile;

    println!("{} & {}", profile.your_name, profile.partner_name);
    if let Some(days) = stats::days_together(&profile.anniversary, today) {
        println!("Together for {days} days (since {})", profile.anniversary);
    }
    if let Some(partner) = &state.partner {
        println!("Linked partner: {}", partner.your_name);
    } else if stats::needs_partner_onboarding(profile) {
        println!("No partner linked yet. Run `loveverse invite` to create a code.");
    }
    println!(
        "Streak: {} days, challenge score: {}",
        stats::activity_streak(state, today),
        stats::challenge_score(&state.challenges)
    );
    println!(
        "Today's mood: {}",
        stats::today_mood(profile, today).unwrap_or("Not selected")
    );
    println!(
        "{} notes, {} plans, {} memories",
        state.notes.len(),
        state.plans.len(),
        state.memories.len()
    );
    for challenge in &state.challenges {
        let mark = if challenge.done { "x" } else { " " };
        println!(
            "  [{mark}] {} {} ({} pts)",
            challenge.id, challenge.title, challenge.points
        );
    }
}
