//! Projection of raw match details into compact per-player records.
//!
//! The projector is pure: it never fails and never invents data. A stat the
//! upstream omitted stays `None` all the way into the cache.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::riot::types::{FetchedMatch, Objective, Objectives, Participant, Team};

/// Number of item slots on a participant.
pub const ITEM_SLOTS: usize = 7;

/// Normalized lane assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Top,
    Jungle,
    Mid,
    Adc,
    Support,
    Unknown,
}

impl Role {
    /// Normalize an upstream position string.
    pub fn from_position(position: &str) -> Self {
        match position.trim().to_ascii_uppercase().as_str() {
            "TOP" => Self::Top,
            "JUNGLE" => Self::Jungle,
            "MID" | "MIDDLE" => Self::Mid,
            "ADC" | "BOTTOM" | "BOT" | "CARRY" => Self::Adc,
            "SUPPORT" | "UTILITY" => Self::Support,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "TOP",
            Self::Jungle => "JUNGLE",
            Self::Mid => "MID",
            Self::Adc => "ADC",
            Self::Support => "SUPPORT",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Objective kills for one team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamObjectives {
    pub team_id: Option<i64>,
    pub win: Option<bool>,
    pub baron: Option<i64>,
    pub dragon: Option<i64>,
    pub herald: Option<i64>,
    pub tower: Option<i64>,
}

impl From<&Team> for TeamObjectives {
    fn from(team: &Team) -> Self {
        let objectives = team.objectives.as_ref();
        let kills = |pick: fn(&Objectives) -> Option<&Objective>| {
            objectives.and_then(pick).and_then(|o| o.kills)
        };

        Self {
            team_id: team.team_id,
            win: team.win,
            baron: kills(|o| o.baron.as_ref()),
            dragon: kills(|o| o.dragon.as_ref()),
            herald: kills(|o| o.rift_herald.as_ref()),
            tower: kills(|o| o.tower.as_ref()),
        }
    }
}

/// One match from the perspective of a single player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: String,
    /// Game end, epoch milliseconds.
    pub end_timestamp: Option<i64>,
    pub duration_seconds: Option<i64>,
    pub queue_id: Option<i64>,
    pub game_version: Option<String>,
    pub champion_name: Option<String>,
    pub win: Option<bool>,
    pub kills: Option<i64>,
    pub deaths: Option<i64>,
    pub assists: Option<i64>,
    pub gold_earned: Option<i64>,
    /// Damage dealt to champions.
    pub damage_dealt: Option<i64>,
    pub damage_taken: Option<i64>,
    pub vision_score: Option<i64>,
    /// Lane minions plus neutral monsters; missing counts are treated as 0.
    pub cs_count: i64,
    pub role: Option<Role>,
    pub items: [Option<i64>; ITEM_SLOTS],
    #[serde(default)]
    pub team_objectives: Vec<TeamObjectives>,
    /// The requesting player was not found among the participants.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub participant_fallback: bool,
}

/// Per-minute rates derived from a [`MatchRecord`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerMinute {
    pub cs_per_min: Option<f64>,
    pub gold_per_min: Option<f64>,
    pub vision_per_min: Option<f64>,
    pub damage_dealt_per_min: Option<f64>,
}

impl MatchRecord {
    /// Per-minute rates, or all `None` when the duration is unknown or not
    /// positive.
    pub fn per_minute(&self) -> PerMinute {
        let Some(minutes) = self
            .duration_seconds
            .filter(|d| *d > 0)
            .map(|d| d as f64 / 60.0)
        else {
            return PerMinute::default();
        };
        let rate = |v: Option<i64>| v.map(|v| v as f64 / minutes);

        PerMinute {
            cs_per_min: rate(Some(self.cs_count)),
            gold_per_min: rate(self.gold_earned),
            vision_per_min: rate(self.vision_score),
            damage_dealt_per_min: rate(self.damage_dealt),
        }
    }
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn role_of(p: &Participant) -> Option<Role> {
    non_empty(&p.team_position)
        .or_else(|| non_empty(&p.role))
        .or_else(|| non_empty(&p.lane))
        .map(Role::from_position)
}

/// Project a fetched match for `player_id`.
///
/// The player is located by index in `metadata.participants`. When they are
/// not found the first participant is used and `participant_fallback` is set;
/// with no participants at all every per-player field is `None`.
pub fn project_match(fetched: &FetchedMatch, player_id: &str) -> MatchRecord {
    let detail = &fetched.detail;
    let metadata = detail.metadata.as_ref();
    let info = detail.info.as_ref();
    let participants = info
        .and_then(|i| i.participants.as_deref())
        .unwrap_or_default();

    let index = metadata
        .and_then(|m| m.participants.as_ref())
        .and_then(|ids| ids.iter().position(|id| id == player_id));

    let (participant, fallback) = match index.and_then(|i| participants.get(i)) {
        Some(p) => (Some(p), false),
        None => (participants.first(), true),
    };
    let stat = |f: fn(&Participant) -> Option<i64>| participant.and_then(f);

    MatchRecord {
        id: metadata
            .and_then(|m| m.match_id.clone())
            .unwrap_or_else(|| fetched.match_id.clone()),
        end_timestamp: info.and_then(|i| i.game_end_timestamp),
        duration_seconds: info.and_then(|i| i.game_duration),
        queue_id: info.and_then(|i| i.queue_id),
        game_version: info.and_then(|i| i.game_version.clone()),
        champion_name: participant.and_then(|p| p.champion_name.clone()),
        win: participant.and_then(|p| p.win),
        kills: stat(|p| p.kills),
        deaths: stat(|p| p.deaths),
        assists: stat(|p| p.assists),
        gold_earned: stat(|p| p.gold_earned),
        damage_dealt: stat(|p| p.total_damage_dealt_to_champions),
        damage_taken: stat(|p| p.total_damage_taken),
        vision_score: stat(|p| p.vision_score),
        cs_count: stat(|p| p.total_minions_killed).unwrap_or(0)
            + stat(|p| p.neutral_minions_killed).unwrap_or(0),
        role: participant.and_then(role_of),
        items: participant.map(Participant::items).unwrap_or_default(),
        team_objectives: info
            .and_then(|i| i.teams.as_deref())
            .unwrap_or_default()
            .iter()
            .map(TeamObjectives::from)
            .collect(),
        participant_fallback: fallback,
    }
}

/// Newest first by end timestamp; records without one sort last.
pub fn newest_first(a: &MatchRecord, b: &MatchRecord) -> Ordering {
    match (a.end_timestamp, b.end_timestamp) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable newest-first sort.
pub fn sort_newest_first(records: &mut [MatchRecord]) {
    records.sort_by(newest_first);
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::riot::types::MatchDetail;

    fn fetched(id: &str, body: serde_json::Value) -> FetchedMatch {
        FetchedMatch {
            match_id: id.to_string(),
            detail: serde_json::from_value::<MatchDetail>(body).expect("detail"),
        }
    }

    fn full_match() -> FetchedMatch {
        fetched(
            "NA1_1",
            json!({
                "metadata": { "matchId": "NA1_1", "participants": ["other", "me"] },
                "info": {
                    "gameEndTimestamp": 1_700_000_000_000_i64,
                    "gameDuration": 1800,
                    "queueId": 420,
                    "gameVersion": "14.1.1",
                    "participants": [
                        { "championName": "Garen", "teamPosition": "TOP" },
                        {
                            "championName": "Jinx", "win": true,
                            "kills": 10, "deaths": 2, "assists": 7,
                            "goldEarned": 15000,
                            "totalDamageDealtToChampions": 30000,
                            "totalDamageTaken": 12000,
                            "visionScore": 30,
                            "totalMinionsKilled": 240, "neutralMinionsKilled": 30,
                            "teamPosition": "BOTTOM",
                            "item0": 3031, "item6": 3363
                        }
                    ],
                    "teams": [
                        { "teamId": 100, "win": true,
                          "objectives": { "baron": {"kills": 1}, "dragon": {"kills": 3},
                                          "riftHerald": {"kills": 1}, "tower": {"kills": 9} } },
                        { "teamId": 200, "win": false }
                    ]
                }
            }),
        )
    }

    #[test]
    fn projects_the_requesting_player() {
        let record = project_match(&full_match(), "me");
        assert_eq!(record.id, "NA1_1");
        assert_eq!(record.champion_name.as_deref(), Some("Jinx"));
        assert_eq!(record.kills, Some(10));
        assert_eq!(record.damage_dealt, Some(30000));
        assert_eq!(record.cs_count, 270);
        assert_eq!(record.role, Some(Role::Adc));
        assert_eq!(record.items[0], Some(3031));
        assert_eq!(record.items[1], None);
        assert_eq!(record.items[6], Some(3363));
        assert!(!record.participant_fallback);

        assert_eq!(record.team_objectives.len(), 2);
        assert_eq!(record.team_objectives[0].herald, Some(1));
        assert_eq!(record.team_objectives[0].tower, Some(9));
        assert_eq!(record.team_objectives[1].team_id, Some(200));
        assert_eq!(record.team_objectives[1].baron, None);
    }

    #[test]
    fn unknown_player_falls_back_to_first_participant() {
        let record = project_match(&full_match(), "stranger");
        assert_eq!(record.champion_name.as_deref(), Some("Garen"));
        assert_eq!(record.role, Some(Role::Top));
        assert!(record.participant_fallback);
        // Missing stats stay null; cs counts missing summands as zero.
        assert_eq!(record.kills, None);
        assert_eq!(record.cs_count, 0);
    }

    #[test]
    fn no_participants_yields_null_player_fields() {
        let record = project_match(
            &fetched("NA1_9", json!({ "info": { "gameDuration": 600 } })),
            "me",
        );
        assert_eq!(record.id, "NA1_9");
        assert_eq!(record.champion_name, None);
        assert_eq!(record.win, None);
        assert_eq!(record.role, None);
        assert_eq!(record.items, [None; ITEM_SLOTS]);
        assert!(record.team_objectives.is_empty());
        assert!(record.participant_fallback);
    }

    #[test]
    fn role_prefers_team_position_and_skips_empty_strings() {
        let record = project_match(
            &fetched(
                "M",
                json!({
                    "metadata": { "participants": ["me"] },
                    "info": { "participants": [
                        { "teamPosition": "", "role": "", "lane": "MIDDLE" }
                    ] }
                }),
            ),
            "me",
        );
        assert_eq!(record.role, Some(Role::Mid));

        assert_eq!(Role::from_position("UTILITY"), Role::Support);
        assert_eq!(Role::from_position("CARRY"), Role::Adc);
        assert_eq!(Role::from_position("JUNGLE"), Role::Jungle);
        assert_eq!(Role::from_position("NONE"), Role::Unknown);
    }

    #[test]
    fn serializes_camel_case_with_uppercase_role() {
        let value = serde_json::to_value(project_match(&full_match(), "me")).expect("json");
        assert_eq!(value["role"], "ADC");
        assert_eq!(value["endTimestamp"], 1_700_000_000_000_i64);
        assert_eq!(value["csCount"], 270);
        assert_eq!(value["teamObjectives"][0]["teamId"], 100);
        assert!(value.get("participantFallback").is_none());
        assert!(value["items"][1].is_null());
    }

    #[test]
    fn per_minute_rates() {
        let rates = project_match(&full_match(), "me").per_minute();
        assert_eq!(rates.cs_per_min, Some(9.0));
        assert_eq!(rates.gold_per_min, Some(500.0));
        assert_eq!(rates.vision_per_min, Some(1.0));
        assert_eq!(rates.damage_dealt_per_min, Some(1000.0));
    }

    #[test]
    fn per_minute_is_null_without_duration() {
        let mut record = project_match(&full_match(), "me");
        record.duration_seconds = None;
        assert_eq!(record.per_minute(), PerMinute::default());

        record.duration_seconds = Some(0);
        let rates = record.per_minute();
        assert!(rates.cs_per_min.is_none());
        assert!(rates.gold_per_min.is_none());
        assert!(rates.vision_per_min.is_none());
        assert!(rates.damage_dealt_per_min.is_none());
    }

    #[test]
    fn sort_is_newest_first_with_nulls_last_and_stable() {
        let a = project_match(&full_match(), "me");
        let mk = |id: &str, ts: Option<i64>| {
            let mut r = a.clone();
            r.id = id.to_string();
            r.end_timestamp = ts;
            r
        };
        let mut records = vec![
            mk("old", Some(1)),
            mk("null1", None),
            mk("new", Some(3)),
            mk("null2", None),
            mk("mid", Some(2)),
        ];
        sort_newest_first(&mut records);
        let order: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(order, vec!["new", "mid", "old", "null1", "null2"]);
    }
}
