//! WebSocket session actor.
//!
//! One actor per connected observer. The session registers itself in the
//! observer registry on start and removes itself on stop, so the
//! registry always reflects live connections. There is no client to
//! server protocol; inbound text and binary frames are ignored.

use crate::registry::{ObserverRegistry, OutboundEvent};
use actix::{Actor, ActorContext, AsyncContext, Handler, Running, StreamHandler};
use actix_web_actors::ws;
use logsift_commons::ConnectionId;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How often heartbeat pings are sent.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// How long before lack of client response causes a timeout.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// A live observer connection.
pub struct WsSession {
    connection_id: ConnectionId,
    registry: Arc<ObserverRegistry>,
    /// Last heartbeat response from the client.
    hb: Instant,
}

impl WsSession {
    pub fn new(registry: Arc<ObserverRegistry>) -> Self {
        Self {
            connection_id: ConnectionId::generate(),
            registry,
            hb: Instant::now(),
        }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                log::warn!(
                    "Observer {} heartbeat timed out, disconnecting",
                    act.connection_id
                );
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.start_heartbeat(ctx);
        self.registry
            .register(self.connection_id.clone(), ctx.address().recipient());
    }

    fn stopping(&mut self, _ctx: &mut Self::Context) -> Running {
        self.registry.unregister(&self.connection_id);
        Running::Stop
    }
}

impl Handler<OutboundEvent> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: OutboundEvent, ctx: &mut Self::Context) {
        match serde_json::to_string(&msg.0) {
            Ok(text) => ctx.text(text),
            Err(e) => log::error!(
                "Dropping undeliverable event for {}: {}",
                self.connection_id,
                e
            ),
        }
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.hb = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Close(reason)) => {
                log::debug!("Observer {} closed: {:?}", self.connection_id, reason);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Text(_)) | Ok(ws::Message::Binary(_)) => {
                // No inbound protocol; ignore.
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!("Observer {} protocol error: {}", self.connection_id, e);
                ctx.stop();
            }
        }
    }
}
