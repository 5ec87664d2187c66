//! Per-connection websocket actor forwarding the authenticated user's match
//! feed.

use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use time::OffsetDateTime;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::extractors::current_user::CurrentUser;
use crate::feed::MatchChange;
use crate::repos::matches;
use crate::state::app_state::AppState;
use crate::ws::protocol::{ClientMsg, ErrorCode, ServerMsg, PROTOCOL_VERSION};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

/// Terminal rows older than this are left out of the snapshot.
const SNAPSHOT_TERMINAL_VISIBILITY: time::Duration = time::Duration::hours(24);

pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    current_user: CurrentUser,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session = WsSession::new(current_user, app_state);
    ws::start(session, &req, stream)
}

pub struct WsSession {
    conn_id: Uuid,
    user_id: i64,
    app_state: web::Data<AppState>,
    last_heartbeat: Instant,
    hello_done: bool,
    subscribed: bool,
}

impl WsSession {
    fn new(current_user: CurrentUser, app_state: web::Data<AppState>) -> Self {
        Self {
            conn_id: Uuid::new_v4(),
            user_id: current_user.id,
            app_state,
            last_heartbeat: Instant::now(),
            hello_done: false,
            subscribed: false,
        }
    }

    fn send_json(ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMsg) {
        match serde_json::to_string(msg) {
            Ok(payload) => ctx.text(payload),
            Err(err) => warn!(error = %err, "failed to serialize outbound ws message"),
        }
    }

    fn reject(&self, ctx: &mut ws::WebsocketContext<Self>, code: ErrorCode, message: &str) {
        Self::send_json(
            ctx,
            &ServerMsg::Error {
                code,
                message: message.to_string(),
            },
        );
        ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
        ctx.stop();
    }

    fn start_heartbeat(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if actor.last_heartbeat.elapsed() > CLIENT_TIMEOUT {
                warn!(
                    conn_id = %actor.conn_id,
                    user_id = actor.user_id,
                    "ws heartbeat timed out"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
    }

    fn dispatch(&mut self, cmd: ClientMsg, ctx: &mut ws::WebsocketContext<Self>) {
        match cmd {
            ClientMsg::Hello { protocol } => {
                if protocol != PROTOCOL_VERSION {
                    self.reject(ctx, ErrorCode::BadProtocol, "Unsupported protocol version");
                    return;
                }
                self.hello_done = true;
                Self::send_json(
                    ctx,
                    &ServerMsg::HelloAck {
                        protocol: PROTOCOL_VERSION,
                        user_id: self.user_id,
                    },
                );
            }
            ClientMsg::Subscribe if !self.hello_done => {
                self.reject(ctx, ErrorCode::BadRequest, "Must send hello first");
            }
            // Idempotent resubscribe: acknowledge without a second stream.
            ClientMsg::Subscribe if self.subscribed => {
                Self::send_json(
                    ctx,
                    &ServerMsg::Ack {
                        message: "already subscribed".to_string(),
                    },
                );
            }
            ClientMsg::Subscribe => self.handle_subscribe(ctx),
        }
    }

    /// Snapshot-then-stream: the feed receiver is registered before the
    /// snapshot query runs, so a transition landing in between is delivered
    /// as an incremental change on top of the snapshot rather than lost.
    fn handle_subscribe(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let rx = self.app_state.feed.subscribe(self.user_id);
        let app_state = self.app_state.clone();
        let user_id = self.user_id;

        ctx.spawn(
            async move {
                let since = OffsetDateTime::now_utc() - SNAPSHOT_TERMINAL_VISIBILITY;
                matches::list_for_user(&app_state.db, user_id, since).await
            }
            .into_actor(self)
            .map(move |res, actor, ctx| match res {
                Ok(rows) => {
                    actor.subscribed = true;
                    Self::send_json(
                        ctx,
                        &ServerMsg::Ack {
                            message: "subscribed".to_string(),
                        },
                    );
                    Self::send_json(ctx, &ServerMsg::Snapshot { matches: rows });
                    ctx.add_stream(BroadcastStream::new(rx));
                }
                Err(err) => {
                    warn!(user_id, %err, "ws snapshot query failed");
                    ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                    ctx.stop();
                }
            }),
        );
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(conn_id = %self.conn_id, user_id = self.user_id, "ws session started");
        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!(conn_id = %self.conn_id, user_id = self.user_id, "ws session stopped");
    }
}

/// Feed changes arrive as a broadcast stream; a lag means dropped rows and
/// the client is told to re-fetch.
impl StreamHandler<Result<MatchChange, BroadcastStreamRecvError>> for WsSession {
    fn handle(
        &mut self,
        item: Result<MatchChange, BroadcastStreamRecvError>,
        ctx: &mut Self::Context,
    ) {
        match item {
            Ok(change) => Self::send_json(ctx, &ServerMsg::MatchChanged { change }),
            Err(BroadcastStreamRecvError::Lagged(missed)) => {
                warn!(
                    conn_id = %self.conn_id,
                    user_id = self.user_id,
                    missed,
                    "ws feed lagged"
                );
                Self::send_json(ctx, &ServerMsg::Lagged);
            }
        }
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(cmd) => self.dispatch(cmd, ctx),
                    Err(_) => self.reject(ctx, ErrorCode::BadRequest, "Malformed JSON"),
                }
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(_) => {}
            Err(err) => {
                warn!(conn_id = %self.conn_id, %err, "ws protocol error");
                ctx.stop();
            }
        }
    }
}
