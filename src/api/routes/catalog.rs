use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use serde::Serialize;

use crate::api::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub players: usize,
    pub battles: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        players: state.store.player_count().await,
        battles: state.store.battle_count().await,
    })
}

/// Card names for the front end's pickers.
pub async fn cards(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.queries.card_names().await)
}

pub async fn dates(State(state): State<AppState>) -> Json<Vec<NaiveDate>> {
    Json(state.queries.battle_dates().await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::build_router;
    use crate::api::routes::testing::get_json;
    use crate::api::state::AppState;
    use crate::models::{Battle, BattleSide, BattleTime, Card, Player};
    use crate::storage::DocumentStore;

    fn side(tag: &str, deck: &[&str], crowns: u8) -> BattleSide {
        BattleSide {
            player_id: None,
            tag: tag.to_string(),
            name: tag.to_string(),
            deck: deck.iter().map(|c| c.to_string()).collect(),
            crowns,
        }
    }

    async fn app() -> axum::Router {
        let store = Arc::new(DocumentStore::in_memory());
        store
            .upsert_player(
                Player::new("#2PP".to_string(), "Alice".to_string())
                    .with_deck(vec![Card::named("Knight"), Card::named("Archers")]),
            )
            .await
            .unwrap();
        for time in ["20240602T080000.000Z", "20240601T100000.000Z", "20240601T230000.000Z"] {
            store
                .upsert_battle(Battle {
                    battle_time: BattleTime::parse(time).unwrap(),
                    winner: side("#2PP", &["Knight"], 2),
                    loser: side("#8QQ", &["Golem"], 0),
                    main_player_tag: "#2PP".to_string(),
                })
                .await
                .unwrap();
        }
        build_router(AppState::new(store))
    }

    #[tokio::test]
    async fn test_health_counts() {
        let (status, json) = get_json(app().await, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["players"], 1);
        assert_eq!(json["battles"], 3);
    }

    #[tokio::test]
    async fn test_cards_sorted() {
        let (status, json) = get_json(app().await, "/api/cards").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!(["Archers", "Knight"]));
    }

    #[tokio::test]
    async fn test_dates_distinct_and_ordered() {
        let (status, json) = get_json(app().await, "/api/dates").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!(["2024-06-01", "2024-06-02"]));
    }

    #[tokio::test]
    async fn test_unknown_path_is_json_404() {
        let (status, json) = get_json(app().await, "/api/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }
}
