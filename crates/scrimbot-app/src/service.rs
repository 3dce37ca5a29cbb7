// The fixed-interval tick loop, plus construction of the live collaborators
// from configuration.

use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use scrimbot_core::config::Config;
use scrimbot_core::{Dispatcher, Reconciler, ScrimSource, TickSummary};
use scrimbot_gankster::GanksterClient;
use scrimbot_notify::{AppsScriptSheet, DiscordDispatcher, LedgerSheet, PollSchedule, PollWeek};

/// Something that can post the weekly availability poll.
#[async_trait]
pub trait PollPoster: Send + Sync {
    async fn post_poll(&self, week: &PollWeek) -> anyhow::Result<()>;
}

#[async_trait]
impl PollPoster for DiscordDispatcher {
    async fn post_poll(&self, week: &PollWeek) -> anyhow::Result<()> {
        DiscordDispatcher::post_poll(self, week).await.map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub struct Service<S, D> {
    reconciler: Reconciler<S, D>,
    poll: Option<PollSchedule>,
}

impl<S: ScrimSource, D: Dispatcher + PollPoster> Service<S, D> {
    pub fn new(reconciler: Reconciler<S, D>, poll: Option<PollSchedule>) -> Self {
        Self { reconciler, poll }
    }

    pub fn reconciler(&self) -> &Reconciler<S, D> {
        &self.reconciler
    }

    /// One reconciliation tick, then the weekly poll if it is due.
    pub async fn tick_at(&mut self, now: NaiveDateTime) -> TickSummary {
        let summary = self.reconciler.tick_at(now).await;
        self.post_poll_if_due(now).await;
        summary
    }

    async fn post_poll_if_due(&mut self, now: NaiveDateTime) {
        let Some(schedule) = self.poll.as_mut() else {
            return;
        };
        let Some(week) = schedule.due(now) else {
            return;
        };
        // Left unmarked on failure so the next tick retries.
        match self.reconciler.dispatcher().post_poll(&week).await {
            Ok(()) => schedule.mark_posted(now),
            Err(e) => warn!(question = %week.question(), error = %e, "failed to post weekly poll"),
        }
    }

    /// Tick every `period` until `shutdown` resolves. A slow tick delays the
    /// next one; ticks never overlap.
    pub async fn run<F>(mut self, period: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(period_secs = period.as_secs(), "polling loop started");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested, stopping polling loop");
                    break;
                }
                _ = interval.tick() => {
                    self.tick_at(Local::now().naive_local()).await;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Scheduling-service client for the configured team, with its number
/// resolved from the name when only the name is configured.
pub async fn connect_source(config: &Config) -> anyhow::Result<GanksterClient> {
    let mut client = GanksterClient::new(
        config.gankster.base_url.clone(),
        Duration::from_secs(config.gankster.timeout_secs),
        config.credentials.gankster_bearer.clone(),
        config.team.to_team(),
    )?;
    client
        .resolve_tracked_team()
        .await
        .context("failed to resolve the tracked team")?;
    Ok(client)
}

/// Build the live service: scheduling-service source, Discord dispatcher and
/// the configured sheet backends.
pub async fn build(config: &Config) -> anyhow::Result<Service<GanksterClient, DiscordDispatcher>> {
    let client = connect_source(config).await?;

    let mut team = client.team().clone();
    if team.name.is_empty() {
        if let Err(e) = client.fill_team(&mut team).await {
            warn!(team = %team, error = %e, "failed to look up tracked team name");
        }
    }

    let display_name = if team.name.is_empty() {
        team.to_string()
    } else {
        team.name.clone()
    };
    let mut dispatcher = DiscordDispatcher::new(
        &config.discord,
        config.credentials.discord_bot_token.clone(),
        &display_name,
    )?;
    if let Some(url) = config.sheet.script_url.as_deref().filter(|u| !u.is_empty()) {
        let sheet = AppsScriptSheet::new(
            dispatcher.http().clone(),
            url,
            config.credentials.google_bearer.clone(),
            config.discord.team_page_base.clone(),
        );
        dispatcher = dispatcher.with_sheet(Box::new(sheet));
        info!(url, "apps script sheet enabled");
    }
    if let Some(path) = config.sheet.ledger_path.as_deref().filter(|p| !p.is_empty()) {
        let ledger = LedgerSheet::open(path)?;
        dispatcher = dispatcher.with_sheet(Box::new(ledger));
        info!(path, "scrim ledger enabled");
    }

    let poll = config
        .poll
        .enabled
        .then(|| PollSchedule::new(config.poll.hour));

    info!(team = %team, "tracking team");
    Ok(Service::new(Reconciler::new(client, dispatcher, team), poll))
}
