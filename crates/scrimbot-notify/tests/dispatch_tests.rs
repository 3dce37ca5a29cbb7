// Integration tests for DiscordDispatcher and the sheet backends against a
// mock HTTP server.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use tokio::sync::Mutex;

use scrimbot_core::config::DiscordConfig;
use scrimbot_core::model::{Opponent, Scrim, ScrimFormat, Team};
use scrimbot_core::{Dispatcher, MessageHandle, ScrimEvent};
use scrimbot_notify::{AppsScriptSheet, DiscordDispatcher, LedgerSheet, PollWeek, ScrimSheet};

// ===========================================================================
// Fixtures
// ===========================================================================

fn nine_pm() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 9, 20)
        .unwrap()
        .and_hms_opt(21, 0, 0)
        .unwrap()
}

fn config(server: &ServerGuard, error_channel: Option<&str>, role: Option<&str>) -> DiscordConfig {
    DiscordConfig {
        api_base: server.url(),
        channel_id: "100".into(),
        error_channel_id: error_channel.map(String::from),
        ping_role_id: role.map(String::from),
        team_page_base: "https://lol.gankster.gg/teams".into(),
    }
}

fn dispatcher(server: &ServerGuard, error_channel: Option<&str>, role: Option<&str>) -> DiscordDispatcher {
    DiscordDispatcher::new(
        &config(server, error_channel, role),
        Some("bot-token".into()),
        "Cryobark",
    )
    .unwrap()
}

fn booked() -> Scrim {
    Scrim::booked(
        nine_pm(),
        ScrimFormat::BestOf3,
        Opponent::Team(Team::new(9, "Glacier")),
    )
}

/// Records which sheet calls were made.
#[derive(Default, Clone)]
struct RecordingSheet {
    calls: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

#[async_trait]
impl ScrimSheet for RecordingSheet {
    async fn scrim_found(&self, scrim: &Scrim) -> Result<()> {
        self.calls.lock().await.push(format!("found {}", scrim.format));
        anyhow::ensure!(!self.fail, "sheet down");
        Ok(())
    }

    async fn update_results(&self) -> Result<()> {
        self.calls.lock().await.push("results".into());
        anyhow::ensure!(!self.fail, "sheet down");
        Ok(())
    }

    async fn scrim_cancelled(&self, scrim: &Scrim) -> Result<()> {
        self.calls.lock().await.push(format!("cancelled {}", scrim.format));
        anyhow::ensure!(!self.fail, "sheet down");
        Ok(())
    }
}

// ===========================================================================
// Announce / retract
// ===========================================================================

#[tokio::test]
async fn announce_posts_embed_and_returns_handle() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/channels/100/messages")
        .match_header("authorization", "Bot bot-token")
        .match_body(Matcher::PartialJson(json!({
            "embeds": [{"title": "Scrim Request Sent", "color": 0xF1C40F}]
        })))
        .with_status(200)
        .with_body(json!({"id": "555"}).to_string())
        .create_async()
        .await;

    let event = ScrimEvent::Created(Scrim::open(nine_pm(), ScrimFormat::BestOf3));
    let handle = dispatcher(&server, None, None)
        .announce(&event)
        .await
        .unwrap();
    assert_eq!(handle, Some(MessageHandle::new("100", "555")));
    mock.assert_async().await;
}

#[tokio::test]
async fn silent_events_post_nothing() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let event = ScrimEvent::RequestPassed(Scrim::open(nine_pm(), ScrimFormat::BestOf3));
    let handle = dispatcher(&server, None, None)
        .announce(&event)
        .await
        .unwrap();
    assert_eq!(handle, None);
    mock.assert_async().await;
}

#[tokio::test]
async fn bookings_mention_the_ping_role() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/channels/100/messages")
        .match_body(Matcher::PartialJson(json!({
            "content": "<@&42>",
            "allowed_mentions": {"roles": ["42"]},
            "embeds": [{"title": "Scrim Found vs Glacier", "url": "https://lol.gankster.gg/teams/9"}]
        })))
        .with_status(200)
        .with_body(json!({"id": "1"}).to_string())
        .create_async()
        .await;

    dispatcher(&server, None, Some("42"))
        .announce(&ScrimEvent::Booked(booked()))
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn requests_do_not_mention_the_role() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/channels/100/messages")
        .match_body(Matcher::Regex("^\\{\"embeds\"".into()))
        .with_status(200)
        .with_body(json!({"id": "2"}).to_string())
        .create_async()
        .await;

    let request = Scrim::request(
        nine_pm(),
        ScrimFormat::BestOf1,
        Opponent::Team(Team::named("Glacier")),
    );
    dispatcher(&server, None, Some("42"))
        .announce(&ScrimEvent::RequestReceived(request))
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn failed_post_is_an_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/channels/100/messages")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let err = dispatcher(&server, None, None)
        .announce(&ScrimEvent::Booked(booked()))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("500"), "{err:#}");
}

#[tokio::test]
async fn retract_deletes_and_tolerates_missing_message() {
    let mut server = Server::new_async().await;
    let deleted = server
        .mock("DELETE", "/channels/100/messages/555")
        .match_header("authorization", "Bot bot-token")
        .with_status(204)
        .create_async()
        .await;
    server
        .mock("DELETE", "/channels/100/messages/404")
        .with_status(404)
        .create_async()
        .await;
    server
        .mock("DELETE", "/channels/100/messages/403")
        .with_status(403)
        .create_async()
        .await;

    let dispatcher = dispatcher(&server, None, None);
    dispatcher
        .retract(&MessageHandle::new("100", "555"))
        .await
        .unwrap();
    dispatcher
        .retract(&MessageHandle::new("100", "404"))
        .await
        .unwrap();
    assert!(dispatcher
        .retract(&MessageHandle::new("100", "403"))
        .await
        .is_err());
    deleted.assert_async().await;
}

// ===========================================================================
// Failure reports and poll
// ===========================================================================

#[tokio::test]
async fn failures_go_to_error_channel() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/channels/900/messages")
        .match_body(Matcher::PartialJson(json!({
            "content": "⚠️ **team scrims** failed: Unavailable"
        })))
        .with_status(200)
        .with_body(json!({"id": "3"}).to_string())
        .create_async()
        .await;

    dispatcher(&server, Some("900"), None)
        .report_failure("team scrims", "Unavailable")
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn failures_without_error_channel_are_dropped() {
    let mut server = Server::new_async().await;
    let mock = server.mock("POST", Matcher::Any).expect(0).create_async().await;

    dispatcher(&server, None, None)
        .report_failure("team scrims", "Unavailable")
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn weekly_poll_is_posted_to_scrim_channel() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/channels/100/messages")
        .match_body(Matcher::PartialJson(json!({
            "poll": {"question": {"text": "📅 Scrim Availability 22/09 - 28/09"}, "duration": 48}
        })))
        .with_status(200)
        .with_body(json!({"id": "4"}).to_string())
        .create_async()
        .await;

    let week = PollWeek::following(nine_pm().date());
    let handle = dispatcher(&server, None, None)
        .post_poll(&week)
        .await
        .unwrap();
    assert_eq!(handle.id, "4");
    mock.assert_async().await;
}

// ===========================================================================
// Sheet hooks
// ===========================================================================

#[tokio::test]
async fn bookings_and_played_reach_the_sheets() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/channels/100/messages")
        .with_status(200)
        .with_body(json!({"id": "5"}).to_string())
        .expect_at_least(1)
        .create_async()
        .await;

    let sheet = RecordingSheet::default();
    let dispatcher = dispatcher(&server, None, None).with_sheet(Box::new(sheet.clone()));

    dispatcher.announce(&ScrimEvent::Booked(booked())).await.unwrap();
    let wildcard = Scrim::booked(nine_pm(), ScrimFormat::BestOf1, Opponent::Wildcard);
    dispatcher
        .announce(&ScrimEvent::WildcardBooked(wildcard))
        .await
        .unwrap();
    dispatcher.announce(&ScrimEvent::Played(booked())).await.unwrap();
    dispatcher
        .announce(&ScrimEvent::Created(Scrim::open(nine_pm(), ScrimFormat::BestOf3)))
        .await
        .unwrap();

    assert_eq!(*sheet.calls.lock().await, vec!["found Bo3", "results"]);
}

#[tokio::test]
async fn fallen_through_bookings_reach_the_sheets() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/channels/100/messages")
        .with_status(200)
        .with_body(json!({"id": "7"}).to_string())
        .expect_at_least(1)
        .create_async()
        .await;

    let sheet = RecordingSheet::default();
    let dispatcher = dispatcher(&server, None, None).with_sheet(Box::new(sheet.clone()));

    dispatcher
        .announce(&ScrimEvent::FoundCancelled(booked()))
        .await
        .unwrap();
    dispatcher
        .announce(&ScrimEvent::CreatedCancelled(Scrim::open(nine_pm(), ScrimFormat::BestOf1)))
        .await
        .unwrap();
    dispatcher
        .announce(&ScrimEvent::CreatedCancelled(booked()))
        .await
        .unwrap();
    let shorter = Scrim::booked(
        nine_pm(),
        ScrimFormat::BestOf1,
        Opponent::Team(Team::new(9, "Glacier")),
    );
    dispatcher
        .announce(&ScrimEvent::BookedUpdated {
            old: booked(),
            new: shorter,
        })
        .await
        .unwrap();

    assert_eq!(
        *sheet.calls.lock().await,
        vec!["cancelled Bo3", "cancelled Bo3", "cancelled Bo3", "found Bo1"]
    );
}

#[tokio::test]
async fn withdrawn_booking_is_not_counted_as_played() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/channels/100/messages")
        .with_status(200)
        .with_body(json!({"id": "8"}).to_string())
        .expect_at_least(1)
        .create_async()
        .await;

    let path = std::env::temp_dir().join("scrimbot_dispatch_withdrawn_booking.db");
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
    let path = path.to_string_lossy().to_string();

    let dispatcher = dispatcher(&server, None, None)
        .with_sheet(Box::new(LedgerSheet::open(&path).unwrap()));
    dispatcher.announce(&ScrimEvent::Booked(booked())).await.unwrap();
    dispatcher
        .announce(&ScrimEvent::CreatedCancelled(booked()))
        .await
        .unwrap();

    let ledger = LedgerSheet::open(&path).unwrap();
    assert_eq!(ledger.mark_played(nine_pm() + Duration::hours(4)).unwrap(), 0);
    let entries = ledger.entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].opponent, "Glacier");
    assert_eq!(entries[0].status, "cancelled");
}

#[tokio::test]
async fn sheet_failure_does_not_fail_the_announcement() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/channels/100/messages")
        .with_status(200)
        .with_body(json!({"id": "6"}).to_string())
        .create_async()
        .await;

    let sheet = RecordingSheet {
        fail: true,
        ..RecordingSheet::default()
    };
    let handle = dispatcher(&server, None, None)
        .with_sheet(Box::new(sheet))
        .announce(&ScrimEvent::Booked(booked()))
        .await
        .unwrap();
    assert_eq!(handle.unwrap().id, "6");
}

#[tokio::test]
async fn apps_script_sheet_calls_named_functions() {
    let mut server = Server::new_async().await;
    let found = server
        .mock("POST", "/exec")
        .match_header("authorization", "Bearer google-token")
        .match_body(Matcher::Json(json!({
            "function": "scrimFound",
            "parameters": ["Glacier", "https://lol.gankster.gg/teams/9", "", "09/20/2025", "Bo3"],
            "devMode": true
        })))
        .with_status(200)
        .create_async()
        .await;
    let results = server
        .mock("POST", "/exec")
        .match_body(Matcher::Json(json!({"function": "updateScrimResults", "devMode": true})))
        .with_status(200)
        .create_async()
        .await;

    let sheet = AppsScriptSheet::new(
        reqwest::Client::new(),
        format!("{}/exec", server.url()),
        Some("google-token".into()),
        "https://lol.gankster.gg/teams/",
    );
    sheet.scrim_found(&booked()).await.unwrap();
    sheet.update_results().await.unwrap();
    found.assert_async().await;
    results.assert_async().await;
}

#[tokio::test]
async fn apps_script_error_status_is_an_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/exec")
        .with_status(401)
        .create_async()
        .await;

    let sheet = AppsScriptSheet::new(
        reqwest::Client::new(),
        format!("{}/exec", server.url()),
        None,
        "",
    );
    assert!(sheet.update_results().await.is_err());
}
