use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::Message;
use chrono::Utc;
use futures_util::StreamExt;
use sqlx::MySqlPool;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::api::attendance::in_office_employees;
use crate::broadcast::{AttendanceEvent, Broadcaster};
use crate::config::Config;

/// WebSocket observer stream. Each connection gets its own broadcast
/// receiver (per-observer FIFO), an initial snapshot, and is pruned as soon
/// as a send fails. No replay for late joiners beyond the snapshot.
pub async fn attendance_events(
    req: HttpRequest,
    stream: web::Payload,
    pool: web::Data<MySqlPool>,
    broadcaster: web::Data<Broadcaster>,
    config: web::Data<Config>,
) -> actix_web::Result<HttpResponse> {
    let (response, mut session, mut msg_stream) = actix_ws::handle(&req, stream)?;

    let mut rx = broadcaster.subscribe();
    let pool = pool.get_ref().clone();
    let today = config.scan_policy().bucket_date(Utc::now());

    info!("New dashboard observer connected");

    actix_web::rt::spawn(async move {
        let in_office = match in_office_employees(&pool, today).await {
            Ok(employees) => employees,
            Err(e) => {
                warn!(error = %e, "Snapshot query failed, sending empty snapshot");
                Vec::new()
            }
        };

        let snapshot = AttendanceEvent::Connection {
            message: "Connected to attendance system".to_string(),
            in_office,
        };
        match serde_json::to_string(&snapshot) {
            Ok(json) => {
                if session.text(json).await.is_err() {
                    return;
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize snapshot"),
        }

        loop {
            tokio::select! {
                msg = msg_stream.next() => match msg {
                    Some(Ok(Message::Ping(bytes))) => {
                        if session.pong(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(error = %e, "WebSocket protocol error");
                        break;
                    }
                },

                event = rx.recv() => match event {
                    Ok(event) => match serde_json::to_string(&event) {
                        Ok(json) => {
                            if session.text(json).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!(error = %e, "Failed to serialize event"),
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Observer lagged, events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }

        let _ = session.close(None).await;
        info!("Dashboard observer disconnected");
    });

    Ok(response)
}
