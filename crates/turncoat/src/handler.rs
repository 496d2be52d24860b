//! Per-connection handler: decode requests, call the room, encode replies.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! Every request gets exactly one response, in order. A connection is not
//! tied to a player: closing it does not leave the room.

use std::sync::Arc;

use turncoat_protocol::{Codec, JoinStatus, Request, Response};
use turncoat_room::{Placement, RoomError, RoomManager};

use crate::TurncoatError;
use crate::connection::Connection;
use crate::server::ServerState;

/// Handles a single connection from upgrade to close.
pub(crate) async fn handle_connection(
    mut conn: Connection,
    state: Arc<ServerState>,
) -> Result<(), TurncoatError> {
    let conn_id = conn.id();
    let peer = conn.peer();
    tracing::debug!(conn = conn_id, %peer, "handling new connection");

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(conn = conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(conn = conn_id, error = %e, "recv error");
                break;
            }
        };

        let response = match state.codec.decode::<Request>(&data) {
            Ok(request) => dispatch(&state.room, request).await,
            Err(e) => {
                tracing::debug!(conn = conn_id, error = %e, "failed to decode request");
                Response::error(400, format!("invalid request: {e}"))
            }
        };

        let bytes = state.codec.encode(&response)?;
        conn.send(bytes).await?;
    }

    conn.close().await;
    Ok(())
}

/// Runs one request against the room and builds its response.
pub(crate) async fn dispatch(room: &RoomManager, request: Request) -> Response {
    let result = match request {
        Request::Join { player_name } => join(room, &player_name).await,
        Request::Leave { player_id } => match player_id {
            Some(id) => room.leave(&id).await.map(|room_state| Response::Left {
                status: 200,
                success: true,
                room_state,
            }),
            None => Err(RoomError::InvalidArgument("playerId is required".into())),
        },
        Request::GetState => room.snapshot().map(|room_state| Response::State {
            status: 200,
            room_state,
        }),
        Request::GetLogs => {
            let page = room.logs().await;
            Ok(Response::Logs {
                status: 200,
                logs: page.logs,
                total_games: page.total_games,
            })
        }
    };

    result.unwrap_or_else(|e| {
        tracing::debug!(error = %e, status = e.status(), "request failed");
        Response::error(e.status(), e.to_string())
    })
}

async fn join(room: &RoomManager, name: &str) -> Result<Response, RoomError> {
    let outcome = room.join(name).await?;
    let join_status = match outcome.placement {
        Placement::Seated => JoinStatus::Seated,
        Placement::Queued { .. } => JoinStatus::Queued,
    };
    tracing::info!(
        player = %outcome.player.id,
        name = %outcome.player.name,
        status = ?join_status,
        "player joined"
    );
    Ok(Response::Joined {
        status: join_status.code(),
        join_status,
        waiting_position: outcome.waiting_position(),
        player: outcome.player,
        room_state: outcome.room_state,
    })
}

#[cfg(test)]
mod tests {
    use turncoat_protocol::{Phase, PlayerId};
    use turncoat_room::RoomConfig;

    use super::*;

    fn room() -> RoomManager {
        RoomManager::new(RoomConfig {
            seed: Some(7),
            ..RoomConfig::default()
        })
    }

    fn join_req(name: &str) -> Request {
        Request::Join {
            player_name: name.into(),
        }
    }

    #[tokio::test]
    async fn test_join_is_seated_with_200() {
        let room = room();
        match dispatch(&room, join_req("Alex")).await {
            Response::Joined {
                status,
                join_status,
                player,
                waiting_position,
                room_state,
            } => {
                assert_eq!(status, 200);
                assert_eq!(join_status, JoinStatus::Seated);
                assert_eq!(player.name, "Alex");
                assert_eq!(waiting_position, None);
                assert_eq!(room_state.player_count, 1);
            }
            other => panic!("expected Joined, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blank_join_is_400() {
        let room = room();
        let resp = dispatch(&room, join_req("   ")).await;
        assert_eq!(resp.status(), 400);
        assert!(matches!(resp, Response::Error { .. }));
    }

    #[tokio::test]
    async fn test_join_during_game_is_409() {
        let room = room();
        for i in 0..10 {
            dispatch(&room, join_req(&format!("P{i}"))).await;
        }
        let resp = dispatch(&room, join_req("Late")).await;
        assert_eq!(resp.status(), 409);
    }

    #[tokio::test]
    async fn test_queued_join_is_202() {
        let room = RoomManager::new(RoomConfig {
            queue_while_playing: true,
            ..RoomConfig::default()
        });
        for i in 0..10 {
            dispatch(&room, join_req(&format!("P{i}"))).await;
        }
        match dispatch(&room, join_req("Late")).await {
            Response::Joined {
                status,
                join_status,
                waiting_position,
                ..
            } => {
                assert_eq!(status, 202);
                assert_eq!(join_status, JoinStatus::Queued);
                assert_eq!(waiting_position, Some(1));
            }
            other => panic!("expected Joined, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_leave_without_id_is_400() {
        let room = room();
        let resp = dispatch(&room, Request::Leave { player_id: None }).await;
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn test_leave_unknown_id_succeeds() {
        let room = room();
        let resp = dispatch(
            &room,
            Request::Leave {
                player_id: Some(PlayerId::from("nobody")),
            },
        )
        .await;
        assert!(matches!(resp, Response::Left { status: 200, success: true, .. }));
    }

    #[tokio::test]
    async fn test_get_state_and_logs() {
        let room = room();
        for i in 0..10 {
            dispatch(&room, join_req(&format!("P{i}"))).await;
        }

        match dispatch(&room, Request::GetState).await {
            Response::State { status, room_state } => {
                assert_eq!(status, 200);
                assert_eq!(room_state.phase, Phase::Playing);
                assert_eq!(room_state.total_games, 1);
            }
            other => panic!("expected State, got {other:?}"),
        }

        match dispatch(&room, Request::GetLogs).await {
            Response::Logs {
                status,
                logs,
                total_games,
            } => {
                assert_eq!(status, 200);
                assert_eq!(total_games, 1);
                assert_eq!(logs[0].players.len(), 10);
            }
            other => panic!("expected Logs, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_requests_after_shutdown_are_503() {
        let room = room();
        room.shutdown().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(dispatch(&room, Request::GetState).await.status(), 503);
        assert_eq!(dispatch(&room, join_req("Alex")).await.status(), 503);
    }
}
