// http_server.rs - Control API over the single-threaded simulation tick
//
// Handlers never touch the simulation. Every request is queued to the tick
// task, which owns the `Simulation` and answers on a oneshot channel.

use anyhow::{Context, Result};
use log::{error, info, warn};
use serde::Serialize;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection, Reply};

use crate::config::{MazeConfig, SimulationConfig};
use crate::error_handling::MazeError;
use crate::lidar::LidarReport;
use crate::navigation::{CommandOutcome, NavCommand};
use crate::simulation::{MazeSummary, Simulation, SimulationStatus};

const QUEUE_DEPTH: usize = 64;
const MAX_BODY_BYTES: u64 = 64 * 1024;

// ============= Queue Messages =============

#[derive(Debug)]
pub enum HostRequest {
    Command(NavCommand),
    Restart,
    Regenerate(Option<MazeConfig>),
    Status,
    Lidar,
}

#[derive(Debug)]
pub enum HostReply {
    Outcome(CommandOutcome),
    Status(Box<SimulationStatus>),
    Lidar(LidarReport),
    Regenerated(MazeSummary),
    NotReady,
}

struct Envelope {
    request: HostRequest,
    reply: oneshot::Sender<Result<HostReply, MazeError>>,
}

// ============= Tick Task =============

/// Owner of the simulation inside the tick task. Holds `None` until a maze
/// has been built successfully.
pub struct SimulationHost {
    config: SimulationConfig,
    simulation: Option<Simulation>,
}

impl SimulationHost {
    pub fn new(config: SimulationConfig) -> Self {
        let simulation = match Simulation::new(config.clone()) {
            Ok(sim) => Some(sim),
            Err(e) => {
                error!("Initial maze generation failed: {}", e);
                None
            }
        };
        Self { config, simulation }
    }

    pub fn is_ready(&self) -> bool {
        self.simulation.is_some()
    }

    pub fn tick(&mut self, dt: Duration) {
        if let Some(sim) = self.simulation.as_mut() {
            sim.advance(dt);
        }
    }

    fn ready(&mut self) -> Result<&mut Simulation, MazeError> {
        self.simulation.as_mut().ok_or(MazeError::NotReady("no maze has been generated"))
    }

    fn regenerate(&mut self, maze: Option<MazeConfig>) -> Result<HostReply, MazeError> {
        let next = match &self.simulation {
            Some(sim) => sim.regenerate(maze)?,
            None => {
                let mut config = self.config.clone();
                if let Some(maze) = maze {
                    config.maze = maze;
                }
                Simulation::new(config)?
            }
        };
        let summary = next.summary();
        self.simulation = Some(next);
        Ok(HostReply::Regenerated(summary))
    }

    pub fn handle(&mut self, request: HostRequest) -> Result<HostReply, MazeError> {
        if !self.is_ready() && !matches!(request, HostRequest::Regenerate(_)) {
            warn!("{:?} received before the maze is ready", request);
            return Ok(match request {
                HostRequest::Command(_) | HostRequest::Restart => HostReply::Outcome(CommandOutcome::NotReady),
                _ => HostReply::NotReady,
            });
        }

        match request {
            HostRequest::Regenerate(maze) => self.regenerate(maze),
            HostRequest::Command(command) => self.ready()?.execute(command).map(HostReply::Outcome),
            HostRequest::Restart => {
                self.ready()?.restart()?;
                Ok(HostReply::Outcome(CommandOutcome::Accepted))
            }
            HostRequest::Status => Ok(HostReply::Status(Box::new(self.ready()?.status()))),
            HostRequest::Lidar => {
                let sim = self.ready()?;
                sim.scan_lidar()?;
                Ok(HostReply::Lidar(sim.lidar_report()))
            }
        }
    }
}

/// Drive `host` at `period` and serve queued requests between ticks. Ends
/// when every queue handle is dropped.
async fn run_tick_loop(mut host: SimulationHost, mut rx: mpsc::Receiver<Envelope>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = Instant::now();
                host.tick(now - last);
                last = now;
            }
            message = rx.recv() => {
                let Some(envelope) = message else { break };
                let result = host.handle(envelope.request);
                if envelope.reply.send(result).is_err() {
                    warn!("Requester went away before the reply");
                }
            }
        }
    }
    info!("Tick loop stopped");
}

/// Cloneable handle used by the HTTP handlers.
#[derive(Clone)]
pub struct CommandQueue {
    tx: mpsc::Sender<Envelope>,
}

impl CommandQueue {
    /// Spawn the tick task for `host` and return its queue.
    pub fn spawn(host: SimulationHost, period: Duration) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        tokio::spawn(run_tick_loop(host, rx, period));
        Self { tx }
    }

    pub async fn send(&self, request: HostRequest) -> Result<HostReply, MazeError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Envelope { request, reply })
            .await
            .map_err(|_| MazeError::QueueClosed)?;
        response.await.map_err(|_| MazeError::QueueClosed)?
    }
}

// ============= Custom Error Handling =============

#[derive(Debug)]
struct ServiceError {
    message: String,
    status_code: StatusCode,
}

impl warp::reject::Reject for ServiceError {}

impl From<MazeError> for ServiceError {
    fn from(err: MazeError) -> Self {
        let status_code = match &err {
            MazeError::InvalidConfig { .. } => StatusCode::BAD_REQUEST,
            MazeError::QueueClosed => StatusCode::SERVICE_UNAVAILABLE,
            MazeError::Raycast(_) => StatusCode::BAD_GATEWAY,
            MazeError::UnexpectedReply(_) => {
                error!("{}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            e if e.is_consistency_defect() => {
                error!("Consistency defect: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { message: err.to_string(), status_code }
    }
}

fn reject(err: MazeError) -> Rejection {
    warp::reject::custom(ServiceError::from(err))
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, std::convert::Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = StatusCode::NOT_FOUND;
        message = "Endpoint not found";
    } else if let Some(service_err) = err.find::<ServiceError>() {
        code = service_err.status_code;
        message = &service_err.message;
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed";
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        code = StatusCode::PAYLOAD_TOO_LARGE;
        message = "Payload too large";
    } else {
        error!("unhandled rejection: {:?}", err);
        code = StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error";
    }

    let json = warp::reply::json(&serde_json::json!({
        "status": "error",
        "message": message,
        "status_code": code.as_u16(),
    }));

    Ok(warp::reply::with_status(json, code))
}

// ============= Response Models =============

#[derive(Debug, Serialize)]
struct CommandResponse {
    status: &'static str,
    action: &'static str,
}

// ============= CORS Configuration =============

fn with_cors() -> warp::cors::Builder {
    warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["Accept", "Content-Type"])
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .max_age(3600)
}

// ============= Middleware & Filters =============

fn with_queue(queue: CommandQueue) -> impl Filter<Extract = (CommandQueue,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || queue.clone())
}

fn payload_too_large() -> Rejection {
    warp::reject::custom(ServiceError {
        message: format!("Body exceeds {MAX_BODY_BYTES} bytes"),
        status_code: StatusCode::PAYLOAD_TOO_LARGE,
    })
}

// A bodiless POST carries no Content-Length, so the limit is checked against
// the header when present and against the bytes read otherwise.
fn optional_body() -> impl Filter<Extract = (Bytes,), Error = Rejection> + Clone {
    warp::header::optional::<u64>("content-length")
        .and_then(|length: Option<u64>| async move {
            match length {
                Some(length) if length > MAX_BODY_BYTES => Err(payload_too_large()),
                _ => Ok(()),
            }
        })
        .untuple_one()
        .and(warp::body::bytes())
        .and_then(|body: Bytes| async move {
            if body.len() as u64 > MAX_BODY_BYTES {
                return Err(payload_too_large());
            }
            Ok(body)
        })
}

// ============= Request Handlers =============

async fn handle_health() -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&serde_json::json!({
        "status": "healthy",
        "service": "maze-car-sim",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}

async fn handle_command(
    action: &'static str,
    request: HostRequest,
    queue: CommandQueue,
) -> Result<warp::reply::Json, Rejection> {
    match queue.send(request).await.map_err(reject)? {
        HostReply::Outcome(outcome) => Ok(warp::reply::json(&CommandResponse {
            status: outcome.as_str(),
            action,
        })),
        other => {
            error!("Unexpected reply to {}: {:?}", action, other);
            Err(reject(MazeError::UnexpectedReply(action)))
        }
    }
}

async fn handle_status(queue: CommandQueue) -> Result<warp::reply::Json, Rejection> {
    match queue.send(HostRequest::Status).await.map_err(reject)? {
        HostReply::Status(status) => Ok(warp::reply::json(&serde_json::json!({
            "status": "running",
            "position": {
                "chunk": status.car.chunk,
                "cell": status.car.cell,
                "direction": status.car.direction,
            },
            "car": status.car,
            "maze": status.maze,
        }))),
        _ => Ok(warp::reply::json(&serde_json::json!({ "status": "not_ready" }))),
    }
}

async fn handle_lidar(queue: CommandQueue) -> Result<warp::reply::Json, Rejection> {
    match queue.send(HostRequest::Lidar).await.map_err(reject)? {
        HostReply::Lidar(report) => Ok(warp::reply::json(&report)),
        _ => Ok(warp::reply::json(&serde_json::json!({ "status": "not_ready" }))),
    }
}

async fn handle_regenerate(body: Bytes, queue: CommandQueue) -> Result<warp::reply::Json, Rejection> {
    let maze = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        let config: MazeConfig = serde_json::from_slice(&body).map_err(|e| {
            warp::reject::custom(ServiceError {
                message: format!("Invalid maze config: {e}"),
                status_code: StatusCode::BAD_REQUEST,
            })
        })?;
        Some(config)
    };

    match queue.send(HostRequest::Regenerate(maze)).await.map_err(reject)? {
        HostReply::Regenerated(summary) => Ok(warp::reply::json(&serde_json::json!({
            "status": "success",
            "action": "regenerate",
            "maze": summary,
        }))),
        other => {
            error!("Unexpected reply to regenerate: {:?}", other);
            Err(reject(MazeError::UnexpectedReply("regenerate")))
        }
    }
}

// ============= Routes =============

fn command_route(
    path: &'static str,
    verb: &'static str,
    action: &'static str,
    request: fn() -> HostRequest,
    queue: CommandQueue,
) -> impl Filter<Extract = (warp::reply::Json,), Error = Rejection> + Clone {
    warp::path(path)
        .and(warp::path(verb))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_queue(queue))
        .and_then(move |queue| handle_command(action, request(), queue))
}

pub fn routes(queue: CommandQueue) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let turn_left = command_route("turn", "left", "turn_left", || HostRequest::Command(NavCommand::TurnLeft), queue.clone());
    let turn_right = command_route("turn", "right", "turn_right", || HostRequest::Command(NavCommand::TurnRight), queue.clone());
    let forward = command_route("move", "forward", "move_forward", || HostRequest::Command(NavCommand::MoveForward), queue.clone());
    let backward = command_route("move", "backward", "move_backward", || HostRequest::Command(NavCommand::MoveBackward), queue.clone());

    let restart = warp::path("restart")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_queue(queue.clone()))
        .and_then(|queue| handle_command("restart", HostRequest::Restart, queue));

    let regenerate = warp::path("regenerate")
        .and(warp::path::end())
        .and(warp::post())
        .and(optional_body())
        .and(with_queue(queue.clone()))
        .and_then(handle_regenerate);

    let status = warp::path("status")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_queue(queue.clone()))
        .and_then(handle_status);

    let lidar = warp::path("lidar")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_queue(queue))
        .and_then(handle_lidar);

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handle_health);

    turn_left
        .or(turn_right)
        .or(forward)
        .or(backward)
        .or(restart)
        .or(regenerate)
        .or(status)
        .or(lidar)
        .or(health)
        .recover(handle_rejection)
        .with(with_cors())
        .with(warp::log("maze_car_sim"))
}

// ============= Server Initialization =============

/// Port from `PORT` if set and valid, otherwise `default`.
pub fn port_from_env(default: u16) -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(default)
}

/// Bind the control API on `addr`, trying once more after `retry_delay`.
async fn bind_with_retry(
    queue: CommandQueue,
    addr: SocketAddr,
    retry_delay: Duration,
) -> Result<(SocketAddr, impl std::future::Future<Output = ()> + 'static)> {
    match warp::serve(routes(queue.clone())).try_bind_ephemeral(addr) {
        Ok(bound) => Ok(bound),
        Err(first) => {
            warn!("Bind to {} failed ({}), retrying in {:?}", addr, first, retry_delay);
            tokio::time::sleep(retry_delay).await;
            let bound = warp::serve(routes(queue))
                .try_bind_ephemeral(addr)
                .map_err(|e| MazeError::Bind { addr: addr.to_string(), message: e.to_string() })
                .context("control API could not start")?;
            Ok(bound)
        }
    }
}

pub async fn start_server(config: SimulationConfig) -> Result<()> {
    let port = port_from_env(config.server.port);
    let retry_delay = Duration::from_millis(config.server.bind_retry_delay_ms);
    let period = config.server.tick_period();

    let queue = CommandQueue::spawn(SimulationHost::new(config), period);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let (bound, server) = bind_with_retry(queue, addr, retry_delay).await?;

    info!("Car control API listening on {}", bound);
    info!("  POST /turn/left  /turn/right  /move/forward  /move/backward");
    info!("  POST /restart  /regenerate");
    info!("  GET  /status  /lidar  /health");

    server.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CarConfig, MotionProfile};
    use crate::types::GridPos;

    fn config() -> SimulationConfig {
        SimulationConfig {
            maze: MazeConfig { chunk_size: 3, size_in_chunks: GridPos::new(2, 2), seed: Some(17), ..MazeConfig::default() },
            car: CarConfig { motion: MotionProfile::Fixed { duration_ms: 10_000 }, rotation_duration_ms: 10_000, ..CarConfig::default() },
            ..SimulationConfig::default()
        }
    }

    fn queue() -> CommandQueue {
        CommandQueue::spawn(SimulationHost::new(config()), Duration::from_millis(10))
    }

    fn json(response: warp::http::Response<Bytes>) -> serde_json::Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[tokio::test]
    async fn test_turn_then_busy() {
        let api = routes(queue());

        let res = warp::test::request().method("POST").path("/turn/left").reply(&api).await;
        assert_eq!(res.status(), 200);
        let body = json(res);
        assert_eq!(body["status"], "accepted");
        assert_eq!(body["action"], "turn_left");

        // The rotation lasts ten seconds, so the next command is rejected
        let res = warp::test::request().method("POST").path("/move/forward").reply(&api).await;
        assert_eq!(res.status(), 200);
        assert_eq!(json(res)["status"], "busy");
    }

    #[tokio::test]
    async fn test_status_shape() {
        let api = routes(queue());
        let res = warp::test::request().method("GET").path("/status").reply(&api).await;
        assert_eq!(res.status(), 200);
        let body = json(res);
        assert_eq!(body["status"], "running");
        assert_eq!(body["position"]["direction"], "forward");
        assert_eq!(body["position"]["chunk"]["x"], 1);
        assert_eq!(body["car"]["state"], "idle");
    }

    #[tokio::test]
    async fn test_restart_and_regenerate() {
        let api = routes(queue());

        let res = warp::test::request().method("POST").path("/restart").reply(&api).await;
        assert_eq!(json(res)["status"], "accepted");

        let res = warp::test::request()
            .method("POST")
            .path("/regenerate")
            .body(r#"{ "chunk_size": 2, "size_in_chunks": { "x": 1, "z": 1 }, "seed": 3 }"#)
            .reply(&api)
            .await;
        assert_eq!(res.status(), 200);
        let body = json(res);
        assert_eq!(body["maze"]["total_cells_x"], 2);

        let res = warp::test::request().method("POST").path("/regenerate").reply(&api).await;
        assert_eq!(res.status(), 200);

        let res = warp::test::request()
            .method("POST")
            .path("/regenerate")
            .body(r#"{ "chunk_size": 1 }"#)
            .reply(&api)
            .await;
        assert_eq!(res.status(), 400);
    }

    #[tokio::test]
    async fn test_lidar_report() {
        let api = routes(queue());
        let res = warp::test::request().method("GET").path("/lidar").reply(&api).await;
        assert_eq!(res.status(), 200);
        let body = json(res);
        assert_eq!(body["point_count"], 1);
        assert!(body["global_min_distance"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_oversized_regenerate_is_rejected_and_host_survives() {
        let api = routes(queue());

        let res = warp::test::request()
            .method("POST")
            .path("/regenerate")
            .body(r#"{ "chunk_size": 2, "size_in_chunks": { "x": 2147483647, "z": 1 } }"#)
            .reply(&api)
            .await;
        assert_eq!(res.status(), 400);

        let res = warp::test::request().method("GET").path("/status").reply(&api).await;
        assert_eq!(res.status(), 200);
        assert_eq!(json(res)["status"], "running");
    }

    #[tokio::test]
    async fn test_regenerate_body_limit() {
        let api = routes(queue());
        let padding = " ".repeat(MAX_BODY_BYTES as usize + 1);
        let res = warp::test::request().method("POST").path("/regenerate").body(padding).reply(&api).await;
        assert_eq!(res.status(), 413);
        assert_eq!(json(res)["status"], "error");
    }

    #[test]
    fn test_unexpected_reply_is_internal_error() {
        let err = ServiceError::from(MazeError::UnexpectedReply("turn_left"));
        assert_eq!(err.status_code, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message.contains("turn_left"));
        assert_eq!(ServiceError::from(MazeError::QueueClosed).status_code, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_bind_failure_after_retry_is_reported() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap();

        let err = match bind_with_retry(queue(), addr, Duration::from_millis(20)).await {
            Ok(_) => panic!("bound to a port that is in use"),
            Err(err) => err,
        };
        assert!(matches!(err.root_cause().downcast_ref::<MazeError>(), Some(MazeError::Bind { .. })));
        drop(taken);
    }

    #[tokio::test]
    async fn test_bind_retry_succeeds_once_port_frees() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            drop(taken);
        });

        let (bound, _server) = bind_with_retry(queue(), addr, Duration::from_millis(300)).await.unwrap();
        assert_eq!(bound, addr);
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let api = routes(queue());
        let res = warp::test::request().method("GET").path("/fly").reply(&api).await;
        assert_eq!(res.status(), 404);
        assert_eq!(json(res)["status"], "error");
    }

    #[tokio::test]
    async fn test_not_ready_host() {
        let mut bad = config();
        bad.maze.chunk_size = 0;
        let host = SimulationHost::new(bad);
        assert!(!host.is_ready());

        let api = routes(CommandQueue::spawn(host, Duration::from_millis(10)));
        let res = warp::test::request().method("POST").path("/turn/right").reply(&api).await;
        assert_eq!(json(res)["status"], "not_ready");

        let res = warp::test::request().method("GET").path("/status").reply(&api).await;
        assert_eq!(json(res)["status"], "not_ready");
    }
}
