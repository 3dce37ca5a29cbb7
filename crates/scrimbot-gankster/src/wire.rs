// Wire types for the scheduling service REST API, and their mapping into
// the domain model.
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use scrimbot_core::model::{
    datetime_from_millis, Champion, GanksterRank, Opponent, Player, Reputation, ResponseTime,
    Scrim, ScrimFormat, Team,
};

pub const STATUS_REQUESTED: &str = "REQUESTED";
pub const STATUS_CONFIRMED: &str = "CONFIRMED";
pub const STATUS_OPEN: &str = "OPEN";
pub const STATUS_BOOKED: &str = "BOOKED";
const CHAT_KIND_SCRIM: &str = "SCRIM";

/// Identifiers arrive as numbers on some endpoints and strings on others.
fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn de_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// chats/scrim
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default, Debug, Clone)]
pub struct ChatsResponse {
    #[serde(default)]
    pub results: Vec<ChatResult>,
}

#[derive(Deserialize, Default, Debug, Clone)]
pub struct ChatResult {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub event: Option<ScrimEventWire>,
}

#[derive(Deserialize, Default, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScrimEventWire {
    #[serde(default, deserialize_with = "de_id")]
    pub id: u64,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "de_id")]
    pub requester_id: u64,
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default)]
    pub format: FormatWire,
    pub team_a: Option<EventSide>,
    pub team_b: Option<EventSide>,
}

#[derive(Deserialize, Default, Debug, Clone)]
pub struct FormatWire {
    #[serde(rename = "bestOf", default)]
    pub best_of: String,
}

#[derive(Deserialize, Default, Debug, Clone)]
pub struct EventSide {
    pub team: TeamWire,
}

// ---------------------------------------------------------------------------
// events/public/{team}
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PublicEvents {
    #[serde(default)]
    pub lfs_events: Vec<LfsEvent>,
}

#[derive(Deserialize, Default, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LfsEvent {
    #[serde(default, deserialize_with = "de_id")]
    pub id: u64,
    #[serde(default)]
    pub status: String,
    pub start_time: i64,
    #[serde(default)]
    pub format: FormatWire,
}

// ---------------------------------------------------------------------------
// teams
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default, Debug, Clone)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Deserialize, Default, Debug, Clone)]
pub struct SearchResult {
    pub team: TeamWire,
}

#[derive(Deserialize, Default, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TeamWire {
    #[serde(default, deserialize_with = "de_id")]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "de_code")]
    pub lol_rank: Option<u32>,
    pub lol_server: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub lol_roster: Vec<RosterEntry>,
    pub opgg_link: Option<String>,
    pub created_at: Option<i64>,
    pub reputation: Option<ReputationWire>,
    pub logo: Option<String>,
}

#[derive(Deserialize, Default, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub player_data: PlayerWire,
    #[serde(default)]
    pub is_sub: bool,
}

#[derive(Deserialize, Default, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReputationWire {
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub pos_total_count: u32,
    #[serde(default)]
    pub neg_total_count: u32,
    #[serde(default)]
    pub response_time_sec: u64,
    #[serde(default)]
    pub cancellation_rate: f64,
    #[serde(default)]
    pub response_rate: f64,
    #[serde(default)]
    pub feedback_communication_score: f64,
    #[serde(default)]
    pub feedback_behavior_score: f64,
    #[serde(default)]
    pub feedback_on_time_score: f64,
}

// ---------------------------------------------------------------------------
// lol/player/data/stats
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default, Debug, Clone)]
pub struct PlayerStatsResponse {
    pub player: PlayerWire,
}

#[derive(Deserialize, Default, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PlayerWire {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "de_code")]
    pub rank: Option<u32>,
    #[serde(default)]
    pub division: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub puuid: String,
    #[serde(default)]
    pub server: String,
    pub stats: Option<StatsWire>,
}

#[derive(Deserialize, Default, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StatsWire {
    #[serde(default)]
    pub champions: Vec<ChampionWire>,
    pub updated_at: Option<i64>,
}

#[derive(Deserialize, Default, Debug, Clone)]
pub struct ChampionWire {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub points: u64,
    #[serde(rename = "imageURL", default)]
    pub image_url: String,
}

// ---------------------------------------------------------------------------
// Mapping: wire types → domain types
// ---------------------------------------------------------------------------

impl TeamWire {
    pub fn into_team(self) -> Team {
        Team {
            number: self.id,
            name: self.name,
            rank: self.lol_rank.and_then(GanksterRank::from_code),
            region: self.lol_server.unwrap_or_default(),
            bio: self.bio.unwrap_or_default(),
            roster: self
                .lol_roster
                .into_iter()
                .map(|entry| entry.player_data.into_player(entry.is_sub))
                .collect(),
            opgg_link: self.opgg_link.unwrap_or_default(),
            created: self.created_at.and_then(datetime_from_millis),
            reputation: self.reputation.map(ReputationWire::into_reputation),
            logo_url: self.logo.unwrap_or_default(),
        }
    }
}

impl ReputationWire {
    fn into_reputation(self) -> Reputation {
        Reputation {
            gank_rep: self.rating,
            likes: self.pos_total_count,
            dislikes: self.neg_total_count,
            response_time: ResponseTime(self.response_time_sec),
            response_rate: self.response_rate,
            cancellation_rate: self.cancellation_rate,
            communication: self.feedback_communication_score,
            behavior: self.feedback_behavior_score,
            on_time: self.feedback_on_time_score,
            reviews: Vec::new(),
        }
    }
}

impl PlayerWire {
    pub fn into_player(self, is_sub: bool) -> Player {
        let tier = self
            .rank
            .and_then(GanksterRank::from_code)
            .unwrap_or(GanksterRank::Unranked);
        let rank = format!("{} {}", tier.label(), self.division).trim_end().to_string();
        let (champions, last_updated) = match self.stats {
            Some(stats) => (
                stats.champions.into_iter().map(ChampionWire::into_champion).collect(),
                stats.updated_at.and_then(datetime_from_millis),
            ),
            None => (Vec::new(), None),
        };
        Player {
            name: self.name,
            rank,
            tag: self.tag,
            puuid: self.puuid,
            server: self.server,
            champions,
            is_sub,
            last_updated,
        }
    }
}

impl ChampionWire {
    fn into_champion(self) -> Champion {
        Champion {
            name: self.name,
            level: self.level,
            points: self.points,
            image_url: self.image_url,
        }
    }
}

fn parse_format(code: &str, id: u64) -> Option<ScrimFormat> {
    let format = ScrimFormat::from_gankster_code(code);
    if format.is_none() {
        warn!(code, id, "skipping event with unknown format");
    }
    format
}

/// Which side of a chat event is ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Requester,
    Responder,
}

fn scrim_from_event(event: ScrimEventWire, opponent_side: Role, open: bool) -> Option<Scrim> {
    let format = parse_format(&event.format.best_of, event.id)?;
    let time = datetime_from_millis(event.start_time)?;
    // The requester is always team A.
    let side = match opponent_side {
        Role::Requester => event.team_a,
        Role::Responder => event.team_b,
    };
    let opponent = side
        .map(|side| Opponent::from_team(side.team.into_team()))
        .unwrap_or(Opponent::Wildcard);
    let scrim = if open {
        Scrim::request(time, format, opponent)
    } else {
        Scrim::booked(time, format, opponent)
    };
    Some(scrim.with_gankster_id(event.id))
}

/// Scrim chat events that have not ended yet.
fn live_events(
    chats: ChatsResponse,
    now: NaiveDateTime,
) -> impl Iterator<Item = ScrimEventWire> {
    chats
        .results
        .into_iter()
        .filter(|result| result.kind == CHAT_KIND_SCRIM)
        .filter_map(|result| result.event)
        .filter(move |event| datetime_from_millis(event.end_time).is_some_and(|end| end > now))
}

/// Open requests other teams sent `us`; the opponent is the requester.
pub fn incoming_requests(chats: ChatsResponse, us: u64, now: NaiveDateTime) -> Vec<Scrim> {
    live_events(chats, now)
        .filter(|event| event.status == STATUS_REQUESTED && event.requester_id != us)
        .filter_map(|event| scrim_from_event(event, Role::Requester, true))
        .collect()
}

/// Open requests `us` sent; the opponent is the responder.
pub fn outgoing_requests(chats: ChatsResponse, us: u64, now: NaiveDateTime) -> Vec<Scrim> {
    live_events(chats, now)
        .filter(|event| event.status == STATUS_REQUESTED && event.requester_id == us)
        .filter_map(|event| scrim_from_event(event, Role::Responder, true))
        .collect()
}

/// Confirmed scrims; the opponent is whichever side is not `us`.
pub fn booked_scrims(chats: ChatsResponse, us: u64, now: NaiveDateTime) -> Vec<Scrim> {
    live_events(chats, now)
        .filter(|event| event.status == STATUS_CONFIRMED)
        .filter_map(|event| {
            let side = if event.requester_id == us {
                Role::Responder
            } else {
                Role::Requester
            };
            scrim_from_event(event, side, false)
        })
        .collect()
}

/// A team's public open and booked slots. Booked opponents are not part of
/// the public listing.
pub fn public_scrims(events: PublicEvents) -> Vec<Scrim> {
    events
        .lfs_events
        .into_iter()
        .filter_map(|event| {
            let open = match event.status.as_str() {
                STATUS_OPEN => true,
                STATUS_BOOKED => false,
                _ => return None,
            };
            let format = parse_format(&event.format.best_of, event.id)?;
            let time = datetime_from_millis(event.start_time)?;
            let scrim = if open {
                Scrim::open(time, format)
            } else {
                Scrim::booked(time, format, Opponent::Wildcard)
            };
            Some(scrim.with_gankster_id(event.id))
        })
        .collect()
}
