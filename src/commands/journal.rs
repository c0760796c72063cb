use chrono::Local;
use colored::Colorize;
use std::path::Path;
use crate::commands::split_command;
use crate::session::UserStore;

const USAGE: &str = "Usage: /journal add <title> | <entry> [| <attachment>] | /journal list | /journal rm <n>";

pub async fn handle_command(input: &str, store: &mut UserStore) -> Result<(), String> {
    let (action, rest) = split_command(input);

    match action {
        "" | "list" => {
            list(store);
            Ok(())
        }
        "add" => {
            let mut parts = rest.splitn(3, '|').map(str::trim);
            let title = parts.next().unwrap_or_default();
            let entry = parts.next().ok_or_else(|| USAGE.to_string())?;
            let attachment = parts.next().filter(|a| !a.is_empty()).map(Path::new);

            let now = Local::now().naive_local();
            let saved = store
                .add_journal_entry(title, entry, now.date(), attachment, now)
                .await
                .map_err(|e| e.to_string())?;
            println!("{} Journal entry saved: {}", "✅".green(), saved.title.cyan());
            if let Some(attachment) = &saved.attachment {
                println!("📎 Attached {}", attachment.filename);
            }
            Ok(())
        }
        "rm" | "delete" => {
            let position = rest
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .ok_or_else(|| format!("No journal entry number {}", rest))?;
            let removed = store
                .remove_journal_entry(position)
                .await
                .map_err(|e| e.to_string())?;
            println!("🗑️ Deleted journal entry: {}", removed.title);
            Ok(())
        }
        _ => Err(USAGE.to_string()),
    }
}

fn list(store: &UserStore) {
    let entries = store.journal();
    if entries.is_empty() {
        println!("No journal entries yet.");
        return;
    }
    println!("\n📔 Health Journal:");
    for (i, entry) in entries.iter().enumerate() {
        println!("  {}. {} {}", i + 1, entry.date.cyan(), entry.title.bold());
        println!("     {}", entry.entry);
        if let Some(attachment) = &entry.attachment {
            println!("     📎 {}", attachment.filename);
        }
    }
    println!();
}
