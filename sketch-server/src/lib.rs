use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use warp::Filter;

use crate::error::ServiceError;
use crate::registry::{NewRoom, RoomRegistry};
use crate::websocket::ConnectionManager;
use sketch_types::{PlayerId, RoomId};

pub mod bus;
pub mod config;
pub mod error;
pub mod registry;
pub mod room;
pub mod scheduler;
pub mod websocket;

#[derive(Serialize)]
struct CreatedRoom {
    room_id: RoomId,
    player_id: PlayerId,
}

pub fn create_routes(
    connection_manager: Arc<ConnectionManager>,
    registry: Arc<RoomRegistry>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let connection_manager_filter = warp::any().map({
        let connection_manager = connection_manager.clone();
        move || connection_manager.clone()
    });

    let registry_filter = warp::any().map({
        let registry = registry.clone();
        move || registry.clone()
    });

    // WebSocket endpoint
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(connection_manager_filter.clone())
        .and(registry_filter.clone())
        .map(|ws: warp::ws::Ws, conn_mgr, registry| {
            ws.on_upgrade(move |socket| websocket::handle_connection(socket, conn_mgr, registry))
        });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    let list_rooms = warp::path("rooms")
        .and(warp::path::end())
        .and(warp::get())
        .and(registry_filter.clone())
        .map(|registry: Arc<RoomRegistry>| warp::reply::json(&registry.list_active_rooms()));

    let create_room = warp::path("rooms")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(16 * 1024))
        .and(warp::body::json::<NewRoom>())
        .and(registry_filter.clone())
        .and_then(handle_create_room_request);

    // Room snapshot, word hidden
    let room_state = warp::path!("rooms" / String)
        .and(warp::get())
        .and(registry_filter.clone())
        .and_then(handle_room_state_request);

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST"]);

    websocket
        .or(health)
        .or(list_rooms)
        .or(create_room)
        .or(room_state)
        .with(cors)
        .with(warp::log("sketch_server"))
}

fn error_reply(error: &ServiceError) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(&error.to_body()), error.status_code())
}

async fn handle_create_room_request(
    request: NewRoom,
    registry: Arc<RoomRegistry>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match registry.create_room(request) {
        Ok((handle, host)) => Ok(warp::reply::with_status(
            warp::reply::json(&CreatedRoom {
                room_id: handle.id(),
                player_id: host.id,
            }),
            warp::http::StatusCode::CREATED,
        )),
        Err(e) => Ok(error_reply(&e)),
    }
}

async fn handle_room_state_request(
    room_id: String,
    registry: Arc<RoomRegistry>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let room_id = match Uuid::parse_str(&room_id) {
        Ok(uuid) => uuid,
        Err(_) => {
            return Ok(error_reply(&ServiceError::InvalidMessage(
                "invalid room id format".to_string(),
            )));
        }
    };

    match registry.get_room(room_id) {
        Ok(room) => Ok(warp::reply::with_status(
            warp::reply::json(&room),
            warp::http::StatusCode::OK,
        )),
        Err(e) => Ok(error_reply(&e)),
    }
}
