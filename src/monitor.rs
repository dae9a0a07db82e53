use crate::config::TimeUnit;
use crate::counter::{Counter, CounterSnapshot};
use crate::customer::CustomerId;
use std::sync::Arc;
use tokio::task::JoinHandle;

fn queue_line(name: &str, ids: &[CustomerId]) -> String {
    let list = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    format!("{}({}): {}", name, ids.len(), list)
}

// Renders a snapshot the way the periodic dump shows it: the elapsed time,
// then one line per structure, e.g. `serviceq[1](2): 4 7`.
pub fn render(snapshot: &CounterSnapshot, unit: TimeUnit) -> Vec<String> {
    let mut lines = vec![format!("[{}]", unit.format(snapshot.elapsed))];
    lines.push(queue_line("arriving", &snapshot.arriving));
    for queue in &snapshot.queues {
        lines.push(queue_line(
            &format!("serviceq[{}]", queue.class),
            &queue.customers,
        ));
    }
    lines.push(queue_line("leaving", &snapshot.leaving));
    lines
}

fn log_snapshot(counter: &Counter) {
    let config = counter.config();
    let snapshot = counter.snapshot();
    if config.json {
        match serde_json::to_string(&snapshot) {
            Ok(json) => log::info!("{}", json),
            Err(e) => log::warn!("[MONITOR] Error serializing snapshot: {}", e),
        }
    } else {
        for line in render(&snapshot, config.time_unit) {
            log::info!("{}", line);
        }
    }
}

// Spawns the periodic dump of every queue. Runs until the handle is aborted.
pub fn spawn_monitor(counter: Arc<Counter>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(counter.config().log_interval());
        loop {
            interval.tick().await;
            log_snapshot(&counter);
        }
    })
}
