// HTTP API - request layer over the social repository
// Thin glue: dispatches to the repository and translates results to JSON

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        Path as AxumPath, State, WebSocketUpgrade,
    },
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::info;

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    models::{
        EntityId, FriendshipStatus, MessageWithSender, NewFriendship, NewMessage, NewNotification,
        NewPost, NewUser, NotificationKind, UserUpdate,
    },
    realtime::{ClientEvent, ServerEvent},
    session::AuthSession,
};

// Auth routes

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

fn session_cookie(token: &str) -> AppendHeaders<[(axum::http::HeaderName, String); 1]> {
    AppendHeaders([(
        SET_COOKIE,
        format!("session={}; Path=/; HttpOnly", token),
    )])
}

pub async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Response> {
    let user = state.repository.get_user_by_username(&req.username).await;
    let user = match user {
        Some(user) if user.password == req.password => user,
        _ => return Err(AppError::Unauthorized("Invalid credentials".to_string())),
    };

    let user = state
        .repository
        .update_user(
            user.id,
            UserUpdate {
                is_online: Some(true),
                last_seen: Some(chrono::Utc::now()),
                ..Default::default()
            },
        )
        .await
        .ok_or_else(|| AppError::Internal("user vanished during login".to_string()))?;

    let token = state.sessions.open(user.id).await;
    info!("login: User {} ({}) logged in", user.id, user.username);
    Ok((session_cookie(&token), Json(json!({ "user": user, "token": token }))).into_response())
}

pub async fn register_handler(
    State(state): State<AppState>,
    Json(req): Json<NewUser>,
) -> AppResult<Response> {
    // Uniqueness is enforced here, not in the store
    if state
        .repository
        .get_user_by_username(&req.username)
        .await
        .is_some()
    {
        return Err(AppError::BadRequest("Username already exists".to_string()));
    }

    let user = state.repository.create_user(req).await?;
    let token = state.sessions.open(user.id).await;
    Ok((session_cookie(&token), Json(json!({ "user": user, "token": token }))).into_response())
}

pub async fn logout_handler(
    State(state): State<AppState>,
    session: AuthSession,
) -> AppResult<Json<Value>> {
    state
        .repository
        .update_user(
            session.user.id,
            UserUpdate {
                is_online: Some(false),
                last_seen: Some(chrono::Utc::now()),
                ..Default::default()
            },
        )
        .await;
    state.sessions.revoke(&session.token).await;
    Ok(Json(json!({ "success": true })))
}

pub async fn me_handler(session: AuthSession) -> Json<Value> {
    Json(json!({ "user": session.user }))
}

// User routes

pub async fn list_users_handler(
    State(state): State<AppState>,
    _session: AuthSession,
) -> Json<Value> {
    let users = state.repository.get_all_users().await;
    Json(json!(users))
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    _session: AuthSession,
    AxumPath(id): AxumPath<EntityId>,
) -> AppResult<Json<Value>> {
    let user = state
        .repository
        .get_user(id)
        .await
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(json!(user)))
}

// Post routes

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

pub async fn feed_handler(State(state): State<AppState>, _session: AuthSession) -> Json<Value> {
    let feed = state.repository.get_feed_posts().await;
    Json(json!(feed))
}

pub async fn user_posts_handler(
    State(state): State<AppState>,
    _session: AuthSession,
    AxumPath(user_id): AxumPath<EntityId>,
) -> Json<Value> {
    let posts = state.repository.get_user_posts(user_id).await;
    Json(json!(posts))
}

pub async fn create_post_handler(
    State(state): State<AppState>,
    session: AuthSession,
    Json(req): Json<CreatePostRequest>,
) -> AppResult<Json<Value>> {
    let post = state
        .repository
        .create_post(NewPost {
            user_id: session.user.id,
            content: req.content,
            image_url: req.image_url,
            video_url: req.video_url,
        })
        .await?;
    Ok(Json(json!({ "post": post, "user": session.user })))
}

pub async fn like_post_handler(
    State(state): State<AppState>,
    _session: AuthSession,
    AxumPath(id): AxumPath<EntityId>,
) -> AppResult<Json<Value>> {
    let post = state
        .repository
        .like_post(id)
        .await
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
    Ok(Json(json!(post)))
}

// Message routes

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub receiver_id: Option<EntityId>,
    pub content: String,
}

pub async fn conversations_handler(
    State(state): State<AppState>,
    session: AuthSession,
) -> Json<Value> {
    let conversations = state.repository.get_user_conversations(session.user.id).await;
    Json(json!(conversations))
}

pub async fn thread_handler(
    State(state): State<AppState>,
    session: AuthSession,
    AxumPath(other_id): AxumPath<EntityId>,
) -> Json<Value> {
    let messages = state
        .repository
        .get_messages(session.user.id, Some(other_id))
        .await;
    Json(json!(messages))
}

pub async fn send_message_handler(
    State(state): State<AppState>,
    session: AuthSession,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<Json<Value>> {
    let message = state
        .repository
        .create_message(NewMessage {
            sender_id: session.user.id,
            receiver_id: req.receiver_id,
            content: req.content,
            is_ai: false,
        })
        .await?;

    let with_sender = MessageWithSender {
        message,
        sender: session.user,
    };

    // Fire-and-forget: delivery never blocks the HTTP response
    let hub = state.realtime.clone();
    let outbound = with_sender.clone();
    tokio::spawn(async move {
        hub.publish_message(&outbound).await;
    });

    Ok(Json(json!(with_sender)))
}

// AI chat route

#[derive(Deserialize)]
pub struct AiChatRequest {
    pub message: String,
}

pub async fn ai_chat_handler(
    State(state): State<AppState>,
    session: AuthSession,
    Json(req): Json<AiChatRequest>,
) -> AppResult<Json<Value>> {
    let reply = state.responder.reply(&req.message).await;

    // The reply is persisted as a machine-generated message with no receiver,
    // keeping it out of conversation derivation
    let message = state
        .repository
        .create_message(NewMessage {
            sender_id: session.user.id,
            receiver_id: None,
            content: reply,
            is_ai: true,
        })
        .await?;

    Ok(Json(json!({ "response": message.content })))
}

// Friend routes

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    pub friend_id: EntityId,
}

#[derive(Deserialize)]
pub struct FriendshipStatusBody {
    pub status: FriendshipStatus,
}

pub async fn friends_handler(State(state): State<AppState>, session: AuthSession) -> Json<Value> {
    let friends = state.repository.get_friendships(session.user.id).await;
    Json(json!(friends))
}

pub async fn friend_requests_handler(
    State(state): State<AppState>,
    session: AuthSession,
) -> Json<Value> {
    let requests = state.repository.get_friend_requests(session.user.id).await;
    Json(json!(requests))
}

pub async fn send_friend_request_handler(
    State(state): State<AppState>,
    session: AuthSession,
    Json(req): Json<FriendRequestBody>,
) -> AppResult<Json<Value>> {
    let friendship = state
        .repository
        .create_friendship(NewFriendship {
            user_id: session.user.id,
            friend_id: req.friend_id,
            status: FriendshipStatus::Pending,
        })
        .await?;

    // Second, independent write; not atomic with the friendship itself
    state
        .repository
        .create_notification(NewNotification {
            user_id: req.friend_id,
            kind: NotificationKind::FriendRequest,
            content: format!("{} sent you a friend request", session.user.username),
            from_user_id: Some(session.user.id),
        })
        .await;

    Ok(Json(json!(friendship)))
}

pub async fn update_friend_request_handler(
    State(state): State<AppState>,
    _session: AuthSession,
    AxumPath(id): AxumPath<EntityId>,
    Json(req): Json<FriendshipStatusBody>,
) -> AppResult<Json<Value>> {
    let friendship = state
        .repository
        .update_friendship_status(id, req.status)
        .await
        .ok_or_else(|| AppError::NotFound("Friend request not found".to_string()))?;
    Ok(Json(json!(friendship)))
}

// Notification routes

pub async fn notifications_handler(
    State(state): State<AppState>,
    session: AuthSession,
) -> Json<Value> {
    let notifications = state.repository.get_user_notifications(session.user.id).await;
    Json(json!(notifications))
}

pub async fn mark_notification_read_handler(
    State(state): State<AppState>,
    _session: AuthSession,
    AxumPath(id): AxumPath<EntityId>,
) -> AppResult<Json<Value>> {
    let notification = state
        .repository
        .mark_notification_read(id)
        .await
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;
    Ok(Json(json!(notification)))
}

// Realtime websocket

pub async fn websocket_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    // Writer task: forward channel events to the socket as JSON text frames
    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if sink.send(WsMessage::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let mut joined: Option<EntityId> = None;
    while let Some(Ok(frame)) = stream.next().await {
        let WsMessage::Text(text) = frame else {
            continue;
        };
        match serde_json::from_str::<ClientEvent>(&text) {
            Ok(ClientEvent::JoinRoom { user_id }) => {
                state.realtime.connect(user_id, tx.clone()).await;
                joined = Some(user_id);
            }
            Ok(ClientEvent::SendMessage {
                sender_id,
                receiver_id,
                content,
            }) => {
                let created = state
                    .repository
                    .create_message(NewMessage {
                        sender_id,
                        receiver_id,
                        content,
                        is_ai: false,
                    })
                    .await;
                match created {
                    Ok(message) => {
                        let Some(sender) = state.repository.get_user(message.sender_id).await
                        else {
                            continue;
                        };
                        let with_sender = MessageWithSender { message, sender };
                        // Ack the sender, then fan out to the receiver
                        let _ = tx.send(ServerEvent::MessageSent(with_sender.clone()));
                        state.realtime.publish_message(&with_sender).await;
                    }
                    Err(err) => {
                        let _ = tx.send(ServerEvent::Error {
                            message: err.to_string(),
                        });
                    }
                }
            }
            Err(_) => {
                let _ = tx.send(ServerEvent::Error {
                    message: "Unrecognized event".to_string(),
                });
            }
        }
    }

    if let Some(user_id) = joined {
        state.realtime.disconnect(user_id).await;
    }
    writer.abort();
}

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Auth
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/auth/me", get(me_handler))
        // Users
        .route("/api/users", get(list_users_handler))
        .route("/api/users/{id}", get(get_user_handler))
        // Posts
        .route("/api/posts/feed", get(feed_handler))
        .route("/api/posts", post(create_post_handler))
        .route("/api/posts/{id}/like", post(like_post_handler))
        .route("/api/users/{id}/posts", get(user_posts_handler))
        // Messages
        .route("/api/messages/conversations", get(conversations_handler))
        .route("/api/messages/{user_id}", get(thread_handler))
        .route("/api/messages", post(send_message_handler))
        // AI chat
        .route("/api/ai/chat", post(ai_chat_handler))
        // Friends
        .route("/api/friends", get(friends_handler))
        .route("/api/friends/requests", get(friend_requests_handler))
        .route("/api/friends/request", post(send_friend_request_handler))
        .route("/api/friends/request/{id}", put(update_friend_request_handler))
        // Notifications
        .route("/api/notifications", get(notifications_handler))
        .route("/api/notifications/{id}/read", put(mark_notification_read_handler))
        // Realtime
        .route("/ws", get(websocket_handler))
        .with_state(state)
}
