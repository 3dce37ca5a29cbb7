// Team descriptors and the opponent slot of a scrim.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::profile::{Player, Reputation};

// ---------------------------------------------------------------------------
// GanksterRank
// ---------------------------------------------------------------------------

/// Team rank bands as reported by the scheduling service. The numeric code
/// steps by 5 from Unranked (0) to Challenger (100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GanksterRank {
    Unranked,
    Iron,
    IronBronze,
    Bronze,
    BronzeSilver,
    Silver,
    SilverGold,
    Gold,
    GoldPlatinum,
    Platinum,
    PlatinumEmerald,
    Emerald,
    EmeraldDiamond,
    Diamond,
    DiamondMaster,
    Master,
    MasterGrandmaster,
    Grandmaster,
    GrandmasterChallenger,
    Challenger,
}

impl GanksterRank {
    pub const ALL: [GanksterRank; 20] = [
        GanksterRank::Unranked,
        GanksterRank::Iron,
        GanksterRank::IronBronze,
        GanksterRank::Bronze,
        GanksterRank::BronzeSilver,
        GanksterRank::Silver,
        GanksterRank::SilverGold,
        GanksterRank::Gold,
        GanksterRank::GoldPlatinum,
        GanksterRank::Platinum,
        GanksterRank::PlatinumEmerald,
        GanksterRank::Emerald,
        GanksterRank::EmeraldDiamond,
        GanksterRank::Diamond,
        GanksterRank::DiamondMaster,
        GanksterRank::Master,
        GanksterRank::MasterGrandmaster,
        GanksterRank::Grandmaster,
        GanksterRank::GrandmasterChallenger,
        GanksterRank::Challenger,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GanksterRank::Unranked => "Unranked",
            GanksterRank::Iron => "Iron",
            GanksterRank::IronBronze => "Iron/Bronze",
            GanksterRank::Bronze => "Bronze",
            GanksterRank::BronzeSilver => "Bronze/Silver",
            GanksterRank::Silver => "Silver",
            GanksterRank::SilverGold => "Silver/Gold",
            GanksterRank::Gold => "Gold",
            GanksterRank::GoldPlatinum => "Gold/Platinum",
            GanksterRank::Platinum => "Platinum",
            GanksterRank::PlatinumEmerald => "Platinum/Emerald",
            GanksterRank::Emerald => "Emerald",
            GanksterRank::EmeraldDiamond => "Emerald/Diamond",
            GanksterRank::Diamond => "Diamond",
            GanksterRank::DiamondMaster => "Diamond/Master",
            GanksterRank::Master => "Master",
            GanksterRank::MasterGrandmaster => "Master/Grandmaster",
            GanksterRank::Grandmaster => "Grandmaster",
            GanksterRank::GrandmasterChallenger => "Grandmaster/Challenger",
            GanksterRank::Challenger => "Challenger",
        }
    }

    pub fn code(self) -> u32 {
        match self {
            GanksterRank::Unranked => 0,
            // Iron is 10, every band above it steps by 5.
            other => {
                let index = Self::ALL.iter().position(|r| *r == other).unwrap_or(0) as u32;
                5 * (index + 1)
            }
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.code() == code)
    }
}

impl fmt::Display for GanksterRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// A competing team, identified by its service number and/or display name.
///
/// Equality is partial: two teams are equal when their numbers
/// match and are non-zero, or when their names match and are non-empty. A team
/// known only by name therefore compares equal to the fully-populated record.
/// The relation is not transitive, so `Team` is neither `Eq` nor `Hash`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Team {
    pub number: u64,
    pub name: String,
    pub rank: Option<GanksterRank>,
    pub region: String,
    pub bio: String,
    pub roster: Vec<Player>,
    pub opgg_link: String,
    pub created: Option<NaiveDateTime>,
    pub reputation: Option<Reputation>,
    pub logo_url: String,
}

impl Team {
    pub fn new(number: u64, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new(0, name)
    }

    pub fn numbered(number: u64) -> Self {
        Self::new(number, "")
    }

    /// True iff the team carries a non-zero number or a non-empty name.
    pub fn is_known(&self) -> bool {
        self.number != 0 || !self.name.is_empty()
    }
}

impl PartialEq for Team {
    fn eq(&self, other: &Self) -> bool {
        (self.number != 0 && self.number == other.number)
            || (!self.name.is_empty() && self.name == other.name)
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name.is_empty(), self.number) {
            (false, 0) => write!(f, "{}", self.name),
            (false, n) => write!(f, "{} (#{n})", self.name),
            (true, 0) => f.write_str("unknown team"),
            (true, n) => write!(f, "team #{n}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Opponent
// ---------------------------------------------------------------------------

/// Who occupies the other side of a scrim slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum Opponent {
    /// No team known yet; the normal state of an open request.
    #[default]
    Unknown,
    /// The slot is booked but the service has not told us against whom.
    Wildcard,
    Team(Team),
}

impl Opponent {
    /// Wrap `team`, collapsing an empty descriptor into [`Opponent::Unknown`].
    pub fn from_team(team: Team) -> Self {
        if team.is_known() {
            Opponent::Team(team)
        } else {
            Opponent::Unknown
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Opponent::Wildcard)
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Opponent::Team(_))
    }

    pub fn team(&self) -> Option<&Team> {
        match self {
            Opponent::Team(team) => Some(team),
            _ => None,
        }
    }

    /// Display name, or a placeholder when no concrete team is known.
    pub fn display_name(&self) -> String {
        match self {
            Opponent::Unknown => "TBD".to_string(),
            Opponent::Wildcard => "Wildcard".to_string(),
            Opponent::Team(team) => team.to_string(),
        }
    }
}

impl PartialEq for Opponent {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Opponent::Unknown, Opponent::Unknown) => true,
            (Opponent::Wildcard, Opponent::Wildcard) => true,
            (Opponent::Team(a), Opponent::Team(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Team> for Opponent {
    fn from(team: Team) -> Self {
        Opponent::from_team(team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teams_equal_by_number() {
        assert_eq!(Team::new(84830, "Cryobark"), Team::numbered(84830));
        assert_ne!(Team::numbered(1), Team::numbered(2));
    }

    #[test]
    fn teams_equal_by_name() {
        assert_eq!(Team::new(84830, "Cryobark"), Team::named("Cryobark"));
        assert_ne!(Team::named("Cryobark"), Team::named("Frostbite"));
    }

    #[test]
    fn empty_teams_are_never_equal() {
        assert_ne!(Team::default(), Team::default());
        assert_ne!(Team::numbered(0), Team::named(""));
    }

    #[test]
    fn number_mismatch_with_name_match_is_equal() {
        // Name match is sufficient even when numbers disagree.
        assert_eq!(Team::new(1, "Same"), Team::new(2, "Same"));
    }

    #[test]
    fn is_known() {
        assert!(!Team::default().is_known());
        assert!(Team::named("A").is_known());
        assert!(Team::numbered(3).is_known());
    }

    #[test]
    fn opponent_from_empty_team_is_unknown() {
        assert!(matches!(Opponent::from_team(Team::default()), Opponent::Unknown));
        assert!(Opponent::from_team(Team::named("A")).is_known());
    }

    #[test]
    fn opponent_equality() {
        assert_eq!(Opponent::Unknown, Opponent::Unknown);
        assert_eq!(Opponent::Wildcard, Opponent::Wildcard);
        assert_ne!(Opponent::Wildcard, Opponent::Unknown);
        assert_eq!(
            Opponent::Team(Team::new(5, "A")),
            Opponent::Team(Team::numbered(5))
        );
        assert_ne!(Opponent::Team(Team::named("A")), Opponent::Wildcard);
    }

    #[test]
    fn rank_codes_round_trip() {
        assert_eq!(GanksterRank::Unranked.code(), 0);
        assert_eq!(GanksterRank::Iron.code(), 10);
        assert_eq!(GanksterRank::IronBronze.code(), 15);
        assert_eq!(GanksterRank::GoldPlatinum.code(), 45);
        assert_eq!(GanksterRank::Challenger.code(), 100);
        assert_eq!(GanksterRank::from_code(70), Some(GanksterRank::Diamond));
        assert_eq!(GanksterRank::from_code(12), None);
    }

    #[test]
    fn team_display() {
        assert_eq!(Team::new(7, "Cryobark").to_string(), "Cryobark (#7)");
        assert_eq!(Team::numbered(7).to_string(), "team #7");
        assert_eq!(Team::default().to_string(), "unknown team");
    }
}
