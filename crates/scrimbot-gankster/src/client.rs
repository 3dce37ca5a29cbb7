// REST client for the scrim scheduling service.
//
// Every call goes through `call`, which attaches the bearer and active-team
// cookie, maps non-success statuses onto `ErrorKind`, and decodes JSON.

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use reqwest::header::{AUTHORIZATION, COOKIE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

use scrimbot_core::model::{Player, Scrim, Team};
use scrimbot_core::{ErrorKind, ScrimActions, ScrimError, ScrimSource};

use crate::wire::{self, ChatsResponse, PlayerStatsResponse, PublicEvents, SearchResponse, TeamWire};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://lol.gankster.gg/api/v1/";
const DEFAULT_SERVER: &str = "NA";
/// How long one `chats/scrim` response serves the request and booking reads
/// of a tick. Shorter than the minimum polling interval.
const CHATS_TTL: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// GanksterClient
// ---------------------------------------------------------------------------

/// Client bound to one tracked team; requests are made on that team's behalf.
#[derive(Debug, Clone)]
pub struct GanksterClient {
    http: reqwest::Client,
    base_url: String,
    bearer: Option<String>,
    team: Team,
    chats_cache: Arc<Mutex<Option<(Instant, ChatsResponse)>>>,
}

impl GanksterClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        bearer: Option<String>,
        team: Team,
    ) -> Result<Self, ScrimError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("scrimbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ScrimError::new(ErrorKind::Network, "building http client").with_source(e))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            bearer: bearer.filter(|b| !b.trim().is_empty()),
            team,
            chats_cache: Arc::default(),
        })
    }

    pub fn team(&self) -> &Team {
        &self.team
    }

    /// Fill in the tracked team's number from its name when only the name
    /// was configured.
    pub async fn resolve_tracked_team(&mut self) -> Result<(), ScrimError> {
        if self.team.number == 0 {
            let number = self.team_number(&self.team).await?;
            info!(team = %self.team, number, "resolved tracked team number");
            self.team.number = number;
        }
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    #[instrument(skip(self, query, body), fields(team = self.team.number))]
    async fn call(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, ScrimError> {
        let url = self.url(path);
        let fields = match body {
            Some(body) => format!("type='{method}', url='{url}', payload={body}"),
            None => format!("type='{method}', url='{url}'"),
        };

        let mut request = self
            .http
            .request(method, &url)
            .header(COOKIE, format!("g-active-team={}", self.team.number));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(bearer) = &self.bearer {
            request = request.header(AUTHORIZATION, format!("Bearer {bearer}"));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ScrimError::new(ErrorKind::Network, fields.clone()).with_source(e))?;
        let status = response.status().as_u16();
        debug!(status, "response received");
        if let Some(err) = ScrimError::status(status, fields.clone()) {
            return Err(err);
        }

        let text = response
            .text()
            .await
            .map_err(|e| ScrimError::new(ErrorKind::Network, fields.clone()).with_source(e))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| ScrimError::new(ErrorKind::Decode, fields).with_source(e))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ScrimError> {
        let value = self.call(Method::GET, path, query, None).await?;
        serde_json::from_value(value).map_err(|e| {
            ScrimError::new(ErrorKind::Decode, format!("type='GET', path='{path}'")).with_source(e)
        })
    }

    /// Issue a mutation. The cached chats are dropped since they no longer
    /// reflect the service.
    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<(), ScrimError> {
        let result = self.call(method, path, &[], body.as_ref()).await.map(|_| ());
        *self.chats_cache.lock().unwrap_or_else(PoisonError::into_inner) = None;
        result
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The `chats/scrim` listing, shared by incoming, outgoing and booked
    /// reads made within `CHATS_TTL` of each other.
    async fn chats(&self) -> Result<ChatsResponse, ScrimError> {
        let cached = self
            .chats_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|(fetched, _)| fetched.elapsed() < CHATS_TTL)
            .map(|(_, chats)| chats.clone());
        if let Some(chats) = cached {
            debug!("reusing chats response");
            return Ok(chats);
        }

        let chats: ChatsResponse = self.get("chats/scrim", &[]).await?;
        *self.chats_cache.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((Instant::now(), chats.clone()));
        Ok(chats)
    }

    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }

    /// Confirmed scrims for the tracked team, opponent resolved.
    pub async fn booked_scrims(&self) -> Result<Vec<Scrim>, ScrimError> {
        let chats = self.chats().await?;
        Ok(wire::booked_scrims(chats, self.team.number, Self::now()))
    }

    /// `team`'s public open and booked slots. Booked slots carry a wildcard
    /// opponent.
    pub async fn public_scrims(&self, team: &Team) -> Result<Vec<Scrim>, ScrimError> {
        let number = self.team_number(team).await?;
        let events: PublicEvents = self.get(&format!("events/public/{number}"), &[]).await?;
        Ok(wire::public_scrims(events))
    }

    // -----------------------------------------------------------------------
    // Team and player lookups
    // -----------------------------------------------------------------------

    async fn search_team(&self, name: &str) -> Result<TeamWire, ScrimError> {
        let response: SearchResponse = self
            .get("teams/search_advanced", &[("query", name)])
            .await?;
        response
            .results
            .into_iter()
            .next()
            .map(|result| result.team)
            .ok_or_else(|| ScrimError::new(ErrorKind::TeamNotFound, format!("team_name={name}")))
    }

    /// The service number for `team`, searching by name when it has none.
    pub async fn team_number(&self, team: &Team) -> Result<u64, ScrimError> {
        if team.number != 0 {
            return Ok(team.number);
        }
        if team.name.is_empty() {
            return Err(ScrimError::new(ErrorKind::InvalidTeam, format!("team={team}")));
        }
        Ok(self.search_team(&team.name).await?.id)
    }

    /// Replace `team` with the service's full record: by number when known,
    /// otherwise by name search.
    pub async fn fill_team(&self, team: &mut Team) -> Result<(), ScrimError> {
        let wire = if team.number != 0 {
            self.get::<TeamWire>(&format!("teams/{}", team.number), &[])
                .await?
        } else if !team.name.is_empty() {
            self.search_team(&team.name).await?
        } else {
            return Err(ScrimError::new(ErrorKind::InvalidTeam, format!("team={team}")));
        };
        *team = wire.into_team();
        Ok(())
    }

    /// Refresh `player`'s rank and champion stats. Needs a puuid; the server
    /// defaults to NA.
    pub async fn fill_player(&self, player: &mut Player) -> Result<(), ScrimError> {
        if player.puuid.is_empty() {
            return Err(ScrimError::new(
                ErrorKind::InvalidPlayer,
                format!("player={}", player.name),
            ));
        }
        if player.server.is_empty() {
            player.server = DEFAULT_SERVER.to_string();
        }
        let response: PlayerStatsResponse = self
            .get(
                "lol/player/data/stats",
                &[("puuid", player.puuid.as_str()), ("server", player.server.as_str())],
            )
            .await?;
        *player = response.player.into_player(player.is_sub);
        Ok(())
    }
}

/// Payload fields shared by every event mutation.
fn timing(scrim: &Scrim) -> Value {
    json!({
        "startTime": scrim.start_millis(),
        "endTime": scrim.end_millis(),
        "format": {"bestOf": scrim.format.gankster_code()},
    })
}

fn merge(mut base: Value, extra: Value) -> Value {
    if let (Value::Object(base), Value::Object(extra)) = (&mut base, extra) {
        base.extend(extra);
    }
    base
}

// ---------------------------------------------------------------------------
// ScrimSource
// ---------------------------------------------------------------------------

#[async_trait]
impl ScrimSource for GanksterClient {
    async fn incoming_requests(&self) -> Result<Vec<Scrim>, ScrimError> {
        let chats = self.chats().await?;
        Ok(wire::incoming_requests(chats, self.team.number, Self::now()))
    }

    async fn outgoing_requests(&self) -> Result<Vec<Scrim>, ScrimError> {
        let chats = self.chats().await?;
        Ok(wire::outgoing_requests(chats, self.team.number, Self::now()))
    }

    async fn team_scrims(&self, team: &Team) -> Result<Vec<Scrim>, ScrimError> {
        let mut scrims = self.public_scrims(team).await?;
        if *team != self.team {
            return Ok(scrims);
        }

        let mut booked = self.booked_scrims().await?;
        for scrim in scrims.iter_mut().filter(|s| !s.open) {
            if let Some(pos) = booked.iter().position(|b| b.same_slot(scrim)) {
                scrim.opponent = booked.swap_remove(pos).opponent;
            }
        }
        Ok(scrims)
    }
}

// ---------------------------------------------------------------------------
// ScrimActions
// ---------------------------------------------------------------------------

#[async_trait]
impl ScrimActions for GanksterClient {
    async fn create_request(&self, scrim: &Scrim) -> Result<(), ScrimError> {
        let body = json!([merge(
            timing(scrim),
            json!({
                "eventType": "LFS",
                "isHighlighted": false,
                "isNow": false,
                "isPublic": true,
            }),
        )]);
        self.send(Method::POST, "events/bulk", Some(body)).await?;
        info!(scrim = %scrim, "scrim request created");
        Ok(())
    }

    async fn cancel_request(&self, scrim: &Scrim) -> Result<(), ScrimError> {
        let target = self
            .public_scrims(&self.team)
            .await?
            .into_iter()
            .find(|s| s.open && s.same_slot(scrim))
            .ok_or_else(|| ScrimError::not_found(format!("scrim={scrim}")))?;

        self.send(Method::DELETE, &format!("events/{}", target.gankster_id), None)
            .await?;
        info!(scrim = %target, "scrim request cancelled");
        Ok(())
    }

    async fn respond_to_request(&self, scrim: &Scrim, accept: bool) -> Result<(), ScrimError> {
        let target = self
            .incoming_requests()
            .await?
            .into_iter()
            .find(|s| s.same_slot(scrim) && s.opponent == scrim.opponent)
            .ok_or_else(|| ScrimError::not_found(format!("scrim={scrim}")))?;

        let body = if accept {
            merge(
                timing(&target),
                json!({"eventType": "SCRIM", "status": "CONFIRMED"}),
            )
        } else {
            json!({"eventType": "SCRIM", "status": "REJECTED"})
        };
        self.send(
            Method::PATCH,
            &format!("events/{}", target.gankster_id),
            Some(body),
        )
        .await?;
        info!(scrim = %target, accept, "responded to scrim request");
        Ok(())
    }

    async fn cancel_booking(&self, scrim: &Scrim, reason: &str) -> Result<(), ScrimError> {
        let target = self
            .booked_scrims()
            .await?
            .into_iter()
            .find(|s| s.time == scrim.time && s.opponent == scrim.opponent)
            .ok_or_else(|| ScrimError::not_found(format!("scrim={scrim}")))?;

        let body = json!({
            "cancellationReason": reason,
            "eventType": "SCRIM",
            "status": "CANCELED",
        });
        self.send(
            Method::PATCH,
            &format!("events/{}", target.gankster_id),
            Some(body),
        )
        .await?;
        info!(scrim = %target, reason, "scrim booking cancelled");
        Ok(())
    }

    async fn send_request(&self, scrim: &Scrim) -> Result<(), ScrimError> {
        let opponent = scrim
            .opponent
            .team()
            .ok_or_else(|| ScrimError::new(ErrorKind::InvalidTeam, format!("scrim={scrim}")))?;
        let opponent_number = self.team_number(opponent).await?;
        let opponent = Team::new(opponent_number, opponent.name.clone());

        let lfs = self
            .public_scrims(&opponent)
            .await?
            .into_iter()
            .find(|s| s.open && s.time == scrim.time)
            .ok_or_else(|| {
                ScrimError::new(ErrorKind::NoOutgoingRequest, format!("scrim={scrim}"))
            })?;

        let body = merge(
            timing(scrim),
            json!({
                "eventType": "SCRIM",
                "lfsId": lfs.gankster_id,
                "opponentId": opponent_number,
            }),
        );
        self.send(Method::POST, "events", Some(body)).await?;
        info!(scrim = %scrim, "scrim request sent");
        Ok(())
    }
}
