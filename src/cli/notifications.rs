use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::notifications::{build_notifications, NotificationSources, ReadState};

use super::open_store;

pub fn run(mark_read: &[String], all_read: bool) -> Result<()> {
    let store = open_store()?;
    let snapshot = store.load_snapshot()?;
    let sources = NotificationSources {
        casting_applications: &snapshot.casting_applications,
        booking_requests: &snapshot.booking_requests,
        contact_messages: &snapshot.contact_messages,
        fashion_day_reservations: &snapshot.fashion_day_reservations,
    };

    let mut read = ReadState::new();
    let mut feed = build_notifications(&sources, &read);
    if all_read {
        read.mark_all_as_read(&feed);
    }
    for id in mark_read {
        read.mark_as_read(id);
    }
    if all_read || !mark_read.is_empty() {
        feed = build_notifications(&sources, &read);
    }

    if feed.is_empty() {
        println!("No notifications.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["", "ID", "Type", "Date", "Title", "Details", "Link"]);
    for n in &feed {
        let marker = if n.read { " ".to_string() } else { "●".cyan().to_string() };
        table.add_row(vec![
            Cell::new(marker),
            Cell::new(&n.id),
            Cell::new(n.kind.key()),
            Cell::new(&n.date),
            Cell::new(&n.title),
            Cell::new(&n.description),
            Cell::new(&n.link),
        ]);
    }
    println!("Notifications\n{table}");
    println!("{} unread", read.unread_count(&feed));
    if all_read || !mark_read.is_empty() {
        println!("{}", "Read state lasts for this session only.".dimmed());
    }
    Ok(())
}
