use crate::signaling::{JoinError, Session, SignalingService};
use crate::transport::{CloseReason, ParticipantChannel};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use meetwire_core::{MeetingCode, ParticipantId, SignalMessage};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    pub display_name: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path((meeting_code, user_id)): Path<(String, String)>,
    Query(params): Query<ConnectParams>,
    State(service): State<SignalingService>,
) -> Response {
    let meeting_code = MeetingCode::from(meeting_code);
    let participant_id = ParticipantId::from(user_id);

    if let Err(e) = service.authorize(&meeting_code, &participant_id).await {
        warn!(
            "Rejected connection for user {:?} in meeting {:?}: {}",
            participant_id.as_str(),
            meeting_code.as_str(),
            e
        );
        return (rejection_status(&e), e.to_string()).into_response();
    }

    let display_name = params.display_name.filter(|name| !name.trim().is_empty());
    let max_bytes = service.config().max_message_bytes;

    ws.max_message_size(max_bytes)
        .max_frame_size(max_bytes)
        .on_upgrade(move |socket| {
            handle_socket(socket, service, meeting_code, participant_id, display_name)
        })
        .into_response()
}

fn rejection_status(e: &JoinError) -> StatusCode {
    match e {
        JoinError::BlankMeetingCode | JoinError::BlankParticipantId => StatusCode::BAD_REQUEST,
        JoinError::MeetingUnavailable(_) => StatusCode::NOT_FOUND,
        JoinError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn handle_socket(
    socket: WebSocket,
    service: SignalingService,
    meeting_code: MeetingCode,
    participant_id: ParticipantId,
    display_name: Option<String>,
) {
    info!(
        "New WebSocket connection: user {} in meeting {}",
        participant_id, meeting_code
    );

    let (session, rx) = match service
        .register(meeting_code.clone(), participant_id.clone(), display_name)
        .await
    {
        Ok(opened) => opened,
        Err(e) => {
            warn!(
                "Could not open session for user {} in meeting {}: {}",
                participant_id, meeting_code, e
            );
            return;
        }
    };

    let config = service.config().clone();
    let (sender, receiver) = socket.split();

    let mut send_task = tokio::spawn(write_loop(
        sender,
        rx,
        session.channel().clone(),
        config.send_timeout,
        config.ping_interval,
    ));

    let reason = read_loop(&session, receiver, config.idle_timeout).await;
    session.close(reason).await;

    if tokio::time::timeout(config.send_timeout, &mut send_task)
        .await
        .is_err()
    {
        send_task.abort();
    }

    info!(
        "WebSocket disconnected: user {} in meeting {} ({})",
        participant_id, meeting_code, reason
    );
}

async fn read_loop(
    session: &Session,
    mut receiver: SplitStream<WebSocket>,
    idle_timeout: Duration,
) -> CloseReason {
    let channel = session.channel().clone();

    loop {
        let frame = tokio::select! {
            _ = channel.closed() => {
                return channel.close_reason().unwrap_or(CloseReason::TransportError);
            }
            frame = tokio::time::timeout(idle_timeout, receiver.next()) => frame,
        };

        let msg = match frame {
            Err(_) => {
                warn!(
                    "No traffic from user {} in meeting {} for {:?}, closing",
                    session.participant_id(),
                    session.meeting_code(),
                    idle_timeout
                );
                return CloseReason::IdleTimeout;
            }
            Ok(None) => return CloseReason::ClientClosed,
            Ok(Some(Err(e))) => {
                error!(
                    "WebSocket transport error for user {} in meeting {}: {}",
                    session.participant_id(),
                    session.meeting_code(),
                    e
                );
                return CloseReason::TransportError;
            }
            Ok(Some(Ok(msg))) => msg,
        };

        match msg {
            Message::Text(text) => session.handle_text(text.as_str()).await,
            Message::Binary(data) => warn!(
                "Ignoring {}-byte binary frame from user {} in meeting {}",
                data.len(),
                session.participant_id(),
                session.meeting_code()
            ),
            Message::Close(_) => return CloseReason::ClientClosed,
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }
}

async fn write_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<SignalMessage>,
    channel: ParticipantChannel,
    send_timeout: Duration,
    ping_interval: Duration,
) {
    let mut ping = tokio::time::interval(ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ping.tick().await;

    loop {
        let frame = tokio::select! {
            biased;

            _ = channel.closed() => break,

            msg = rx.recv() => match msg {
                Some(msg) => match meetwire_core::encode(&msg) {
                    Ok(json) => Message::Text(json.into()),
                    Err(e) => {
                        error!("Failed to serialize signal message: {}", e);
                        continue;
                    }
                },
                None => break,
            },

            _ = ping.tick() => Message::Ping(Bytes::new()),
        };

        match tokio::time::timeout(send_timeout, sender.send(frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(
                    "Failed to write to user {} in meeting {}: {}",
                    channel.participant_id(),
                    channel.meeting_code(),
                    e
                );
                channel.close(CloseReason::TransportError);
                return;
            }
            Err(_) => {
                warn!(
                    "Timed out writing to user {} in meeting {} after {:?}",
                    channel.participant_id(),
                    channel.meeting_code(),
                    send_timeout
                );
                channel.close(CloseReason::SendFailed);
                return;
            }
        }
    }

    let _ = tokio::time::timeout(send_timeout, sender.send(Message::Close(None))).await;
}
