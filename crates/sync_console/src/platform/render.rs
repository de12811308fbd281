use sync_core::{ConnectionStatus, SyncViewModel};

/// One line summarising the caches and the connection.
pub(crate) fn status_line(view: &SyncViewModel, timestamp: &str) -> String {
    let connection = match view.connection {
        ConnectionStatus::Connected => format!("connected (attempt {})", view.attempt),
        ConnectionStatus::Connecting => format!("connecting (attempt {})", view.attempt),
        ConnectionStatus::Disconnected if view.reconnect_pending => format!(
            "disconnected, retrying in {} ms",
            view.retry_delay.as_millis()
        ),
        ConnectionStatus::Disconnected => "disconnected".to_string(),
    };

    let in_progress = view
        .documents
        .iter()
        .filter(|doc| matches!(doc.progress_percent, Some(percent) if percent < 100))
        .count();

    let mut line = format!(
        "[{timestamp}] {connection} | connectors {} | documents {} ({in_progress} in progress) | workers {}/{}",
        view.connectors.len(),
        view.documents.len(),
        view.workers_alive,
        view.workers_total,
    );
    if let Some(stats) = &view.dashboard {
        line.push_str(&format!(
            " | dashboard {} active, {} failed",
            stats.active_connectors, stats.failed_documents
        ));
    }
    line.push_str(&format!(
        " | frames {} dropped {} throttled {}",
        view.stats.frames_received, view.stats.frames_dropped, view.stats.throttled
    ));
    if !view.active_families.is_empty() {
        let active: Vec<_> = view.active_families.iter().map(|f| f.as_str()).collect();
        line.push_str(&format!(" | updating: {}", active.join(", ")));
    }
    line
}
