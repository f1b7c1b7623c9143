//! Wire types for the match-v5 endpoints.
//!
//! Every field is optional: the upstream omits fields freely across game
//! versions, and the projector degrades missing values to `None`.

use serde::Deserialize;

/// Full match detail as returned by `/lol/match/v5/matches/{matchId}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MatchDetail {
    pub metadata: Option<MatchMetadata>,
    pub info: Option<MatchInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchMetadata {
    pub match_id: Option<String>,
    /// Player IDs, index-aligned with [`MatchInfo::participants`].
    pub participants: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchInfo {
    pub game_end_timestamp: Option<i64>,
    pub game_duration: Option<i64>,
    pub queue_id: Option<i64>,
    pub game_version: Option<String>,
    pub participants: Option<Vec<Participant>>,
    pub teams: Option<Vec<Team>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Participant {
    pub puuid: Option<String>,
    pub champion_name: Option<String>,
    pub win: Option<bool>,
    pub kills: Option<i64>,
    pub deaths: Option<i64>,
    pub assists: Option<i64>,
    pub gold_earned: Option<i64>,
    pub total_damage_dealt_to_champions: Option<i64>,
    pub total_damage_taken: Option<i64>,
    pub vision_score: Option<i64>,
    pub total_minions_killed: Option<i64>,
    pub neutral_minions_killed: Option<i64>,
    pub team_position: Option<String>,
    pub role: Option<String>,
    pub lane: Option<String>,
    pub item0: Option<i64>,
    pub item1: Option<i64>,
    pub item2: Option<i64>,
    pub item3: Option<i64>,
    pub item4: Option<i64>,
    pub item5: Option<i64>,
    pub item6: Option<i64>,
}

impl Participant {
    /// The seven item slots in display order.
    pub fn items(&self) -> [Option<i64>; 7] {
        [
            self.item0, self.item1, self.item2, self.item3, self.item4, self.item5, self.item6,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Team {
    pub team_id: Option<i64>,
    pub win: Option<bool>,
    pub objectives: Option<Objectives>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Objectives {
    pub baron: Option<Objective>,
    pub dragon: Option<Objective>,
    pub rift_herald: Option<Objective>,
    pub tower: Option<Objective>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Objective {
    pub kills: Option<i64>,
}

/// A match detail paired with the ID it was requested under.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedMatch {
    pub match_id: String,
    pub detail: MatchDetail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_sparse_and_null_payloads() {
        let detail: MatchDetail = serde_json::from_value(serde_json::json!({
            "metadata": { "matchId": "NA1_1", "participants": null },
            "info": {
                "gameDuration": 1800,
                "participants": [{ "championName": "Ahri", "kills": null, "item3": 3020 }],
                "teams": [{ "teamId": 100, "objectives": { "riftHerald": { "kills": 1 } } }]
            }
        }))
        .expect("sparse payload should decode");

        let meta = detail.metadata.expect("metadata");
        assert_eq!(meta.match_id.as_deref(), Some("NA1_1"));
        assert!(meta.participants.is_none());

        let info = detail.info.expect("info");
        assert_eq!(info.game_duration, Some(1800));
        assert_eq!(info.game_end_timestamp, None);
        let p = &info.participants.expect("participants")[0];
        assert_eq!(p.kills, None);
        assert_eq!(p.items()[3], Some(3020));
        assert_eq!(p.items()[0], None);

        let team = &info.teams.expect("teams")[0];
        let herald = team
            .objectives
            .as_ref()
            .and_then(|o| o.rift_herald.as_ref())
            .and_then(|o| o.kills);
        assert_eq!(herald, Some(1));
    }

    #[test]
    fn empty_object_decodes_to_default() {
        let detail: MatchDetail = serde_json::from_str("{}").expect("decode");
        assert_eq!(detail, MatchDetail::default());
    }
}
