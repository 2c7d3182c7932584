//! The `altomatic logs` command: recent audit entries.

use altomatic_core::audit::DEFAULT_LOG_LIMIT;
use altomatic_core::LogEntry;
use clap::Args;

use super::context::Context;

/// Arguments for the `logs` command.
#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Number of entries to show, newest first
    #[arg(short, long, default_value_t = DEFAULT_LOG_LIMIT)]
    pub limit: usize,

    /// Print entries as a JSON array
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: LogsArgs, ctx: Context) -> anyhow::Result<()> {
    let audit = ctx.audit()?;
    let entries = audit.recent_logs(args.limit)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        eprintln!("No audit entries yet.");
        return Ok(());
    }
    for entry in &entries {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

fn format_entry(entry: &LogEntry) -> String {
    let user = match (&entry.username, entry.user_id) {
        (Some(name), _) => name.clone(),
        (None, Some(id)) => format!("#{id}"),
        (None, None) => "-".to_string(),
    };
    let asset = entry
        .asset_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    let count = entry
        .count
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string());

    let mut line = format!(
        "{:>6}  {}  {:<16} asset={:<8} count={:<6} user={}",
        entry.id, entry.created_at, entry.action, asset, count, user
    );
    if let Some(notes) = &entry.notes {
        line.push_str(&format!("  ({notes})"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_entry() {
        let entry = LogEntry {
            id: 12,
            user_id: Some(1),
            action: "queue-all".into(),
            asset_id: None,
            count: Some(412),
            notes: None,
            created_at: "2024-01-15 12:30:45".into(),
            username: Some("admin".into()),
            email: None,
        };
        let line = format_entry(&entry);
        assert!(line.contains("queue-all"));
        assert!(line.contains("asset=-"));
        assert!(line.contains("count=412"));
        assert!(line.ends_with("user=admin"));

        let noted = LogEntry {
            notes: Some("3 batch job(s)".into()),
            ..entry
        };
        assert!(format_entry(&noted).ends_with("user=admin  (3 batch job(s))"));
    }
}
