//! Headless runners - one event loop per CLI mode
//!
//! Each runner drives the same [`Engine`]; they differ only in what they do
//! with the messages: `run_list` stops after the first summary fetch,
//! `run_monitor` keeps printing dashboard refreshes, and `run_attached`
//! opens a console view and mirrors it on stdio.

use tokio::sync::mpsc;

use cwarden_app::config::Settings;
use cwarden_app::{Engine, Message, ViewId};
use cwarden_core::prelude::*;
use cwarden_core::types::InstanceSummary;

/// Fetch the instance list once, print it, and exit.
pub async fn run_list(settings: Settings) -> Result<()> {
    let mut engine = Engine::connect(settings).await?;
    engine.bootstrap();
    wait_for_instances(&mut engine).await?;

    let result = match engine.state.instances_error.clone() {
        Some(error) => Err(Error::remote(error)),
        None => {
            print_instance_table(&engine.state.instances);
            Ok(())
        }
    };

    engine.shutdown().await;
    result
}

/// Follow the backend passively, reprinting the dashboard on every refresh.
pub async fn run_monitor(settings: Settings) -> Result<()> {
    let mut engine = Engine::connect(settings).await?;
    eprintln!(
        "Watching backend at {} (Ctrl+C to quit)",
        engine.backend_address()
    );
    engine.bootstrap();

    loop {
        if engine.should_quit() {
            break;
        }
        let Some(msg) = engine.msg_rx.recv().await else {
            break;
        };
        let print_after = matches!(msg, Message::InstancesLoaded { .. });
        engine.process_message(msg);
        if print_after {
            print_instance_table(&engine.state.instances);
        }
    }

    engine.shutdown().await;
    Ok(())
}

/// Open a console view for one instance and mirror it on stdio.
///
/// Stdin lines are submitted as server commands; console output, including
/// the backlog, is printed as it lands in the view's buffer. Ctrl+D detaches.
pub async fn run_attached(settings: Settings, target: String) -> Result<()> {
    let mut engine = Engine::connect(settings).await?;
    engine.bootstrap();
    wait_for_instances(&mut engine).await?;

    let Some(instance) = resolve_target(&engine.state.instances, &target) else {
        engine.shutdown().await;
        return Err(Error::validation(format!("No instance named '{}'", target)));
    };
    let instance_id = instance.id.clone();
    eprintln!(
        "Attached to '{}'. Type commands, Ctrl+D to detach.",
        instance.name
    );

    engine.process_message(Message::OpenConsole {
        instance_id: instance_id.clone(),
    });
    let Some(view_id) = engine.state.session_manager.find_by_instance(&instance_id) else {
        engine.shutdown().await;
        return Err(Error::session("Console view did not open"));
    };

    let stdin_tx = engine.msg_sender();
    std::thread::spawn(move || stdin_reader_blocking(stdin_tx, view_id));

    let mut printed = 0usize;
    loop {
        if engine.should_quit() {
            break;
        }
        let Some(msg) = engine.msg_rx.recv().await else {
            break;
        };
        print_console_event(&msg, view_id);
        engine.process_message(msg);

        let Some(handle) = engine.state.session_manager.get(view_id) else {
            eprintln!("Console closed.");
            break;
        };
        let lines = handle.session.logs.lines();
        for line in &lines[printed.min(lines.len())..] {
            println!("{line}");
        }
        printed = lines.len();
    }

    engine.shutdown().await;
    Ok(())
}

/// Drive the engine until the first summary fetch settles.
async fn wait_for_instances(engine: &mut Engine) -> Result<()> {
    loop {
        let Some(msg) = engine.msg_rx.recv().await else {
            return Err(Error::session("Message channel closed during startup"));
        };
        let done = matches!(
            msg,
            Message::InstancesLoaded { .. } | Message::InstancesLoadFailed { .. }
        );
        engine.process_message(msg);
        if done {
            return Ok(());
        }
        if engine.should_quit() {
            return Err(Error::session("Interrupted during startup"));
        }
    }
}

/// Match an instance by id first, then by name.
fn resolve_target<'a>(
    instances: &'a [InstanceSummary],
    target: &str,
) -> Option<&'a InstanceSummary> {
    instances
        .iter()
        .find(|i| i.id == target)
        .or_else(|| instances.iter().find(|i| i.name == target))
}

fn print_instance_table(instances: &[InstanceSummary]) {
    if instances.is_empty() {
        println!("No instances configured.");
        return;
    }
    println!("{:<8} {:<24} {:<20} {}", "STATE", "NAME", "SOFTWARE", "ID");
    for instance in instances {
        let state = if instance.running { "running" } else { "stopped" };
        let software = format!("{} {}", instance.software, instance.version);
        println!(
            "{:<8} {:<24} {:<20} {}",
            state, instance.name, software, instance.id
        );
    }
}

/// Surface console failures on stderr before the handlers absorb them.
fn print_console_event(msg: &Message, view_id: ViewId) {
    match msg {
        Message::CommandRejected { view_id: v, error } if *v == view_id => {
            eprintln!("! command failed: {error}");
        }
        Message::BacklogLoadFailed { view_id: v, .. } if *v == view_id => {
            eprintln!("! could not load console history");
        }
        Message::LogsSubscribeFailed { view_id: v, .. } if *v == view_id => {
            eprintln!("! live log stream unavailable");
        }
        _ => {}
    }
}

/// Forward stdin lines as console commands (blocking; runs on its own thread)
fn stdin_reader_blocking(msg_tx: mpsc::Sender<Message>, view_id: ViewId) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    let reader = stdin.lock();

    for line in reader.lines() {
        match line {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                if msg_tx
                    .blocking_send(Message::InputChanged {
                        view_id,
                        text: line,
                    })
                    .is_err()
                {
                    return;
                }
                if msg_tx
                    .blocking_send(Message::SubmitCommand { view_id })
                    .is_err()
                {
                    return;
                }
            }
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }

    info!("Stdin closed, detaching");
    let _ = msg_tx.blocking_send(Message::Quit);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, name: &str) -> InstanceSummary {
        InstanceSummary {
            id: id.to_string(),
            name: name.to_string(),
            software: "paper".to_string(),
            version: "1.21.4".to_string(),
            running: false,
            tunnel_enabled: false,
        }
    }

    #[test]
    fn test_resolve_target_prefers_id_over_name() {
        // One instance's name collides with another's id
        let instances = vec![summary("lobby", "survival"), summary("abc", "lobby")];

        let hit = resolve_target(&instances, "lobby").unwrap();
        assert_eq!(hit.id, "lobby");

        let by_name = resolve_target(&instances, "survival").unwrap();
        assert_eq!(by_name.id, "lobby");

        assert!(resolve_target(&instances, "creative").is_none());
    }
}
