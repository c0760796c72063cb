use colored::Colorize;
use crate::commands::split_command;
use crate::session::UserStore;

const USAGE: &str = "Usage: /remind add <YYYY-MM-DD> <text> | /remind list | /remind rm <n> | /remind clear";

pub async fn handle_command(input: &str, store: &mut UserStore) -> Result<(), String> {
    let (action, rest) = split_command(input);

    match action {
        "" | "list" => {
            list(store);
            Ok(())
        }
        "add" => {
            let (date, text) = split_command(rest);
            if date.is_empty() {
                return Err(USAGE.to_string());
            }
            let reminder = store
                .add_reminder(text, date)
                .await
                .map_err(|e| e.to_string())?;
            println!("{} Reminder set for {}: {}", "✅".green(), reminder.date.cyan(), reminder.text);
            Ok(())
        }
        "rm" | "remove" => {
            let position = rest
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .ok_or_else(|| format!("Invalid reminder number: {}", rest))?;
            let removed = store
                .remove_reminder(position)
                .await
                .map_err(|e| e.to_string())?;
            println!("🗑️ Removed reminder: {}", removed.text);
            Ok(())
        }
        "clear" => {
            store.clear_reminders().await.map_err(|e| e.to_string())?;
            println!("🗑️ All reminders cleared.");
            Ok(())
        }
        _ => Err(USAGE.to_string()),
    }
}

fn list(store: &UserStore) {
    let reminders = store.reminders();
    if reminders.is_empty() {
        println!("No reminders set.");
        return;
    }
    println!("\n⏰ Your Reminders:");
    for (i, reminder) in reminders.iter().enumerate() {
        println!("  {}. {} - {}", i + 1, reminder.date.cyan(), reminder.text);
    }
    println!();
}
