//! finbot-supervisor - launches the chat server and wraps it in a page
//!
//! Spawns the `finbot` chat server as a child process in its own session,
//! serves a single page embedding the chat server's address in an inline
//! frame, and on shutdown walks the lifecycle state machine: graceful
//! termination of the child's process group first, forceful kill if the
//! grace period expires. Shutdown failures are logged, never re-raised,
//! so supervisor shutdown always completes.

use axum::{response::Html, routing::get, Router};
use finbot::config;
use finbot::supervisor::{step, SupervisorAction, SupervisorEvent, SupervisorState};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long the child gets to exit after SIGTERM
const GRACE_PERIOD: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finbot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let chat_port = config::chat_port();
    let supervisor_port = config::supervisor_port();

    let mut state = SupervisorState::NotStarted;
    let mut child: Option<Child> = None;

    let transition = step(state, SupervisorEvent::Start);
    for action in &transition.actions {
        if *action == SupervisorAction::SpawnChild {
            child = Some(spawn_chat_server(chat_port)?);
        }
    }
    state = transition.next;

    let mut child = child.ok_or("state machine did not request a child spawn")?;
    tracing::info!(
        pid = child.id(),
        port = chat_port,
        "chat server child started"
    );

    // Wrapper page in the background; its lifetime is the supervisor's.
    let addr = SocketAddr::from(([0, 0, 0, 0], supervisor_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("supervisor wrapper page listening on {}", addr);

    let app = Router::new().route("/", get(move || async move { wrapper_page(chat_port) }));
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "wrapper page server exited");
        }
    });

    // Wait for either a shutdown request or the child exiting on its own
    let event = tokio::select! {
        status = child.wait() => {
            tracing::warn!(status = ?status, "chat server exited on its own");
            SupervisorEvent::ChildExited
        }
        () = shutdown_signal() => SupervisorEvent::ShutdownRequested,
    };

    state = apply(state, event, &mut child).await;

    if state == SupervisorState::Stopping {
        // Grace period: wait for the child, then escalate
        let event = tokio::select! {
            _ = child.wait() => SupervisorEvent::ChildExited,
            () = tokio::time::sleep(GRACE_PERIOD) => SupervisorEvent::GraceExpired,
        };
        state = apply(state, event, &mut child).await;
    }

    tracing::info!(state = ?state, "supervisor shutdown complete");
    Ok(())
}

/// Apply one event to the state machine and carry out its actions
async fn apply(
    state: SupervisorState,
    event: SupervisorEvent,
    child: &mut Child,
) -> SupervisorState {
    let transition = step(state, event);
    for action in &transition.actions {
        match action {
            SupervisorAction::SpawnChild => {
                // Only emitted from NotStarted, which main handles directly
                tracing::error!("unexpected spawn request during shutdown");
            }
            SupervisorAction::SignalTerm => signal_child_group(child, Signal::SIGTERM),
            SupervisorAction::SignalKill => {
                signal_child_group(child, Signal::SIGKILL);
                // Reap the killed child so it does not linger as a zombie
                if let Err(e) = child.wait().await {
                    tracing::error!(error = %e, "failed to reap child after kill");
                }
            }
            SupervisorAction::Finish => {}
        }
    }
    transition.next
}

/// Launch the chat server headless, in its own session so the whole
/// process group can be signaled at shutdown.
fn spawn_chat_server(port: u16) -> std::io::Result<Child> {
    let binary = chat_server_binary();

    let mut cmd = Command::new(binary);
    cmd.env("FINBOT_PORT", port.to_string());
    // New session: the child becomes its own process group leader
    unsafe {
        cmd.pre_exec(|| {
            nix::unistd::setsid()
                .map(|_| ())
                .map_err(std::io::Error::other)
        });
    }
    cmd.spawn()
}

/// The `finbot` binary next to this executable, falling back to PATH
fn chat_server_binary() -> std::path::PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("finbot");
            if sibling.exists() {
                return sibling;
            }
        }
    }
    std::path::PathBuf::from("finbot")
}

/// Send a signal to the child's process group, logging failures only
fn signal_child_group(child: &Child, signal: Signal) {
    let Some(pid) = child.id() else {
        tracing::debug!("child already reaped, nothing to signal");
        return;
    };

    // The child called setsid, so its pgid equals its pid
    match killpg(Pid::from_raw(pid as i32), signal) {
        Ok(()) => tracing::info!(pid, signal = %signal, "signaled chat server process group"),
        Err(e) => tracing::error!(pid, signal = %signal, error = %e, "failed to signal child"),
    }
}

fn wrapper_page(chat_port: u16) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>AI Finance Assistant</title>
  <style>
    html, body {{ margin: 0; height: 100%; }}
    iframe {{ border: none; width: 100%; height: 100%; }}
  </style>
</head>
<body>
  <iframe src="http://localhost:{chat_port}" title="AI Finance Assistant"></iframe>
</body>
</html>
"#
    ))
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("Failed to install SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM - stopping chat server");
        }
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT - stopping chat server");
        }
    }
}
