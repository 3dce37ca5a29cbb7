// Integration tests for the service loop, the weekly poll hook, command
// execution and the shipped default configuration.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;

use scrimbot_app::cli::{self, Cli, Command};
use scrimbot_app::{PollPoster, Service};
use scrimbot_core::config::load_config_from;
use scrimbot_core::model::{Scrim, ScrimFormat, Team};
use scrimbot_core::{
    Dispatcher, ErrorKind, MessageHandle, Reconciler, ScrimActions, ScrimError, ScrimEvent,
    ScrimSource,
};
use scrimbot_notify::{PollSchedule, PollWeek};

// ===========================================================================
// Fakes
// ===========================================================================

/// Serves one fixed team schedule and counts ticks by incoming reads.
#[derive(Default)]
struct FakeSource {
    team: Vec<Scrim>,
    reads: Arc<AtomicUsize>,
}

#[async_trait]
impl ScrimSource for FakeSource {
    async fn incoming_requests(&self) -> Result<Vec<Scrim>, ScrimError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn outgoing_requests(&self) -> Result<Vec<Scrim>, ScrimError> {
        Ok(Vec::new())
    }

    async fn team_scrims(&self, _team: &Team) -> Result<Vec<Scrim>, ScrimError> {
        Ok(self.team.clone())
    }
}

#[derive(Default)]
struct FakeDispatcher {
    events: Mutex<Vec<&'static str>>,
    polls: Mutex<Vec<String>>,
    poll_failures: AtomicUsize,
}

#[async_trait]
impl Dispatcher for FakeDispatcher {
    async fn announce(&self, event: &ScrimEvent) -> anyhow::Result<Option<MessageHandle>> {
        self.events.lock().unwrap().push(event.kind());
        Ok(Some(MessageHandle::new("100", "1")))
    }

    async fn retract(&self, _handle: &MessageHandle) -> anyhow::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl PollPoster for FakeDispatcher {
    async fn post_poll(&self, week: &PollWeek) -> anyhow::Result<()> {
        if self.poll_failures.load(Ordering::SeqCst) > 0 {
            self.poll_failures.fetch_sub(1, Ordering::SeqCst);
            anyhow::bail!("discord down");
        }
        self.polls.lock().unwrap().push(week.question());
        Ok(())
    }
}

/// Records which action ran with which arguments.
#[derive(Default)]
struct FakeActions {
    calls: Mutex<Vec<String>>,
}

impl FakeActions {
    fn push(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ScrimActions for FakeActions {
    async fn create_request(&self, scrim: &Scrim) -> Result<(), ScrimError> {
        self.push(format!("create {}", scrim.format));
        Ok(())
    }

    async fn cancel_request(&self, _scrim: &Scrim) -> Result<(), ScrimError> {
        Err(ScrimError::not_found("type='cancel'"))
    }

    async fn respond_to_request(&self, scrim: &Scrim, accept: bool) -> Result<(), ScrimError> {
        self.push(format!("respond {} {accept}", scrim.opponent.display_name()));
        Ok(())
    }

    async fn cancel_booking(&self, scrim: &Scrim, reason: &str) -> Result<(), ScrimError> {
        assert!(!scrim.open);
        self.push(format!("cancel_booking {reason}"));
        Ok(())
    }

    async fn send_request(&self, scrim: &Scrim) -> Result<(), ScrimError> {
        let number = scrim.opponent.team().map(|t| t.number).unwrap_or_default();
        self.push(format!("send {number}"));
        Ok(())
    }
}

// ===========================================================================
// Fixtures
// ===========================================================================

/// September 2025: the 20th is a Saturday.
fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 9, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn service(
    team: Vec<Scrim>,
    dispatcher: FakeDispatcher,
    poll: Option<PollSchedule>,
) -> Service<FakeSource, FakeDispatcher> {
    let source = FakeSource {
        team,
        ..FakeSource::default()
    };
    Service::new(
        Reconciler::new(source, dispatcher, Team::new(84830, "Cryobark")),
        poll,
    )
}

// ===========================================================================
// Ticks and the weekly poll
// ===========================================================================

#[tokio::test]
async fn tick_reconciles_then_posts_poll_once_per_saturday() {
    let open = Scrim::open(at(24, 21), ScrimFormat::BestOf3);
    let mut service = service(vec![open], FakeDispatcher::default(), Some(PollSchedule::new(6)));

    // Friday: scrim announced, no poll.
    let summary = service.tick_at(at(19, 12)).await;
    assert_eq!(summary.events, 1);

    service.tick_at(at(20, 5)).await;
    service.tick_at(at(20, 6)).await;
    service.tick_at(at(20, 18)).await;

    let dispatcher = service.reconciler().dispatcher();
    assert_eq!(*dispatcher.events.lock().unwrap(), vec!["created"]);
    assert_eq!(
        *dispatcher.polls.lock().unwrap(),
        vec!["📅 Scrim Availability 22/09 - 28/09".to_string()]
    );
}

#[tokio::test]
async fn failed_poll_is_retried_next_tick() {
    let dispatcher = FakeDispatcher::default();
    dispatcher.poll_failures.store(1, Ordering::SeqCst);
    let mut service = service(Vec::new(), dispatcher, Some(PollSchedule::new(6)));

    service.tick_at(at(20, 7)).await;
    assert!(service.reconciler().dispatcher().polls.lock().unwrap().is_empty());

    service.tick_at(at(20, 8)).await;
    assert_eq!(service.reconciler().dispatcher().polls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn disabled_poll_never_posts() {
    let mut service = service(Vec::new(), FakeDispatcher::default(), None);
    service.tick_at(at(20, 12)).await;
    assert!(service.reconciler().dispatcher().polls.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn run_ticks_on_interval_until_shutdown() {
    let reads = Arc::new(AtomicUsize::new(0));
    let source = FakeSource {
        team: Vec::new(),
        reads: reads.clone(),
    };
    let service = Service::new(
        Reconciler::new(source, FakeDispatcher::default(), Team::new(84830, "Cryobark")),
        None,
    );

    // Ticks at 0s, 60s and 120s; shutdown at 150s.
    service
        .run(
            Duration::from_secs(60),
            tokio::time::sleep(Duration::from_secs(150)),
        )
        .await;
    assert_eq!(reads.load(Ordering::SeqCst), 3);
}

// ===========================================================================
// One-shot commands
// ===========================================================================

fn parse(list: &[&str]) -> Command {
    Cli::try_parse_from(std::iter::once("scrimbot").chain(list.iter().copied()))
        .unwrap()
        .into_command()
}

#[tokio::test]
async fn commands_reach_matching_actions() {
    let actions = FakeActions::default();

    let message = cli::execute(&actions, &parse(&["create", "2025-09-24T21:00", "Bo3"]))
        .await
        .unwrap();
    assert!(message.unwrap().starts_with("created request for"));

    cli::execute(&actions, &parse(&["decline", "2025-09-24T21:00", "Bo3", "Glacier"]))
        .await
        .unwrap();
    cli::execute(
        &actions,
        &parse(&["cancel-booking", "2025-09-24T21:00", "Bo1", "Glacier", "roster", "issue"]),
    )
    .await
    .unwrap();
    cli::execute(&actions, &parse(&["send", "2025-09-24T21:00", "Bo1", "9"]))
        .await
        .unwrap();

    assert_eq!(
        *actions.calls.lock().unwrap(),
        vec![
            "create Bo3",
            "respond Glacier false",
            "cancel_booking roster issue",
            "send 9",
        ]
    );
}

#[tokio::test]
async fn command_errors_keep_their_kind() {
    let actions = FakeActions::default();
    let err = cli::execute(&actions, &parse(&["cancel", "2025-09-24T21:00", "Bo3"]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ScrimNotFound);

    assert_eq!(cli::execute(&actions, &Command::Run).await.unwrap(), None);
}

// ===========================================================================
// Shipped defaults
// ===========================================================================

#[test]
fn shipped_defaults_load_and_validate() {
    let defaults = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../defaults");
    let tmp = std::env::temp_dir().join("scrimbot_app_shipped_defaults");
    let _ = std::fs::remove_dir_all(&tmp);
    std::fs::create_dir_all(tmp.join("config")).unwrap();
    std::fs::copy(
        defaults.join("scrimbot.toml"),
        tmp.join("config").join("scrimbot.toml"),
    )
    .unwrap();

    let config = load_config_from(&tmp).unwrap();
    assert_eq!(config.team.name, "Cryobark");
    assert_eq!(config.polling.interval_secs, 60);
    assert!(config.poll.enabled);
    assert_eq!(config.poll.hour, 6);
    assert!(config.credentials.gankster_bearer.is_none());

    let _ = std::fs::remove_dir_all(&tmp);
}
