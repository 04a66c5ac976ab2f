use std::time::Duration;

use chrono::Utc;
use clap::Subcommand;
use garden_core::session::{link_with_nickname, nickname_from_query};
use garden_core::{Database, PersistStatus, SessionOutcome, SessionRecorder};

use super::{print_json, CliResult, Context};

const RECORDER_KEY: &str = "session_recorder";

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a focus session with a flower
    Start {
        /// Flower code (see `garden flowers list`)
        flower: String,
        /// Nickname for the recorded session
        #[arg(long, conflicts_with = "link")]
        user: Option<String>,
        /// Shared link carrying the nickname in its `u` parameter
        #[arg(long)]
        link: Option<String>,
    },
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// Print the current session view as JSON, finishing it if time is up
    Status,
    /// Tick until the session finishes, printing one JSON line per tick
    Watch {
        /// Stop after this many ticks
        #[arg(long)]
        max_ticks: Option<u64>,
    },
    /// End the session now
    End {
        /// Give up before the full length; nothing is recorded
        #[arg(long)]
        early: bool,
    },
    /// Abandon the session without recording it
    Reset,
    /// Print a shareable link that carries your nickname
    Link {
        /// Base URL of the garden page
        base_url: String,
    },
}

/// The persisted recorder, or a fresh one from config. Unreadable state is
/// reported and replaced; database errors propagate.
fn load_recorder(db: &Database, ctx: &Context) -> CliResult<SessionRecorder> {
    let stored = match db.kv_get(RECORDER_KEY)? {
        Some(json) => match serde_json::from_str::<SessionRecorder>(&json) {
            Ok(recorder) => Some(recorder),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable session state");
                eprintln!("warning: saved session state is unreadable and was reset: {e}");
                None
            }
        },
        None => None,
    };
    let mut recorder = stored.unwrap_or_else(|| ctx.config.recorder());
    recorder.configure(
        ctx.config.timer.session_length_secs,
        ctx.config.timer.tolerance_secs,
    );
    Ok(recorder)
}

fn save_recorder(db: &Database, recorder: &SessionRecorder) -> CliResult {
    let json = serde_json::to_string(recorder)?;
    db.kv_set(RECORDER_KEY, &json)?;
    Ok(())
}

fn print_outcome(outcome: &SessionOutcome) -> CliResult {
    match outcome {
        SessionOutcome::Completed { persistence, .. } => match persistence {
            PersistStatus::Failed { warning, .. } => eprintln!("warning: {warning}"),
            PersistStatus::NotConfigured => {
                eprintln!("note: no session backend configured; the session was counted locally")
            }
            PersistStatus::Saved { .. } => {}
        },
        SessionOutcome::NothingToEnd => eprintln!("no active session to end"),
        SessionOutcome::EndedEarly { .. } => {}
    }
    print_json(outcome)
}

/// End the session and store the idle recorder before anything else can
/// read the finished one.
fn finish(db: &Database, ctx: &Context, recorder: &mut SessionRecorder, early: bool) -> CliResult {
    let store = ctx.store();
    let outcome = recorder.end_session(early, store.as_deref(), Utc::now());
    save_recorder(db, recorder)?;
    print_outcome(&outcome)
}

pub fn run(action: SessionAction) -> CliResult {
    let ctx = Context::load()?;
    let db = Database::open()?;
    let sizes = ctx.config.size_range();

    match action {
        SessionAction::Start { flower, user, link } => {
            let mut recorder = load_recorder(&db, &ctx)?;
            if !recorder.clock().is_active() {
                let nickname = match (user, link) {
                    (Some(user), _) => Some(user),
                    (None, Some(link)) => Some(nickname_from_query(&link)),
                    (None, None) => ctx.config.user.name.clone(),
                };
                recorder.set_user_name(nickname.as_deref());
            }
            match recorder.start(&flower, &ctx.catalog, Utc::now())? {
                Some(event) => print_json(&event)?,
                None => {
                    eprintln!("a session is already active");
                    print_json(&recorder.clock().snapshot(Utc::now()))?;
                }
            }
            save_recorder(&db, &recorder)?;
        }
        SessionAction::Pause => {
            let mut recorder = load_recorder(&db, &ctx)?;
            match recorder.pause(Utc::now()) {
                Some(event) => print_json(&event)?,
                None => print_json(&recorder.clock().snapshot(Utc::now()))?,
            }
            save_recorder(&db, &recorder)?;
        }
        SessionAction::Resume => {
            let mut recorder = load_recorder(&db, &ctx)?;
            match recorder.resume(Utc::now()) {
                Some(event) => print_json(&event)?,
                None => print_json(&recorder.clock().snapshot(Utc::now()))?,
            }
            save_recorder(&db, &recorder)?;
        }
        SessionAction::Reset => {
            let mut recorder = load_recorder(&db, &ctx)?;
            match recorder.reset(Utc::now()) {
                Some(event) => print_json(&event)?,
                None => print_json(&recorder.clock().snapshot(Utc::now()))?,
            }
            save_recorder(&db, &recorder)?;
        }
        SessionAction::Status => {
            let mut recorder = load_recorder(&db, &ctx)?;
            match recorder.tick(Utc::now(), &ctx.catalog, &sizes) {
                Some(view) => {
                    print_json(&view)?;
                    if view.due {
                        finish(&db, &ctx, &mut recorder, false)?;
                    }
                }
                None => print_json(&recorder.clock().snapshot(Utc::now()))?,
            }
        }
        SessionAction::Watch { max_ticks } => {
            let interval = Duration::from_millis(ctx.config.timer.tick_interval_ms.max(1));
            let mut ticks = 0u64;
            loop {
                // Other invocations may pause, resume or end the session between ticks.
                let mut recorder = load_recorder(&db, &ctx)?;
                let Some(view) = recorder.tick(Utc::now(), &ctx.catalog, &sizes) else {
                    print_json(&recorder.clock().snapshot(Utc::now()))?;
                    break;
                };
                println!("{}", serde_json::to_string(&view)?);
                if view.due {
                    finish(&db, &ctx, &mut recorder, false)?;
                    break;
                }
                ticks += 1;
                if max_ticks.is_some_and(|max| ticks >= max) {
                    break;
                }
                std::thread::sleep(interval);
            }
        }
        SessionAction::End { early } => {
            let mut recorder = load_recorder(&db, &ctx)?;
            finish(&db, &ctx, &mut recorder, early)?;
        }
        SessionAction::Link { base_url } => {
            let recorder = load_recorder(&db, &ctx)?;
            println!("{}", link_with_nickname(&base_url, recorder.user_name())?);
        }
    }
    Ok(())
}
