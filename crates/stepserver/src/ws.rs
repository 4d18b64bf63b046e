use crate::error::ApiError;
use crate::routes::SinceQuery;
use crate::AppState;
use actix_web::{get, web, HttpRequest, HttpResponse, Result as ActixResult};
use actix_ws::Message;
use tracing::{error, info};
use uuid::Uuid;

/// WebSocket endpoint for live updates of one execution.
///
/// Replays logged updates after `?since=N`, then forwards live ones. The
/// socket is closed after the execution's terminal update.
#[get("/api/executions/{id}/events")]
pub(crate) async fn execution_events(
    req: HttpRequest,
    stream: web::Payload,
    path: web::Path<Uuid>,
    query: web::Query<SinceQuery>,
    data: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let execution_id = path.into_inner();

    if !data.runtime.store().contains(execution_id) {
        return Err(ApiError::ExecutionNotFound(execution_id).into());
    }

    let (res, mut session, mut msg_stream) = actix_ws::handle(&req, stream)?;

    let emitter = data.runtime.emitter().clone();
    let mut subscription = emitter.subscribe(execution_id, query.since);

    // Evicted between the lookup and the subscription: nothing will follow
    if !data.runtime.store().contains(execution_id) {
        drop(subscription);
        emitter.release(execution_id);
        let _ = session.close(None).await;
        return Ok(res);
    }

    info!(%execution_id, since = query.since, "WebSocket client connected");

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                event = subscription.next() => {
                    let Some(event) = event else { break };
                    let terminal = event.is_terminal();
                    match serde_json::to_string(&event) {
                        Ok(json) => {
                            if session.text(json).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => error!(%execution_id, "Failed to serialize update: {}", e),
                    }
                    if terminal {
                        break;
                    }
                }

                // Handle incoming WebSocket messages (ping/pong)
                msg = msg_stream.recv() => {
                    match msg {
                        Some(Ok(Message::Ping(bytes))) => {
                            if session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    }
                }
            }
        }

        drop(subscription);
        emitter.release(execution_id);
        info!(%execution_id, "WebSocket client disconnected");
        let _ = session.close(None).await;
    });

    Ok(res)
}
