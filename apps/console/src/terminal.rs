//! Plain-text rendering of console output for a terminal.

use client_core::render::{
    DialogSpec, DialogSurface, Icon, Indicator, Notification, NotificationLevel, Region,
    RenderSink, TableView, TagDisplay,
};
use shared::domain::{EntityKey, SessionId};

#[derive(Debug, Default)]
pub struct TerminalSink;

fn region_heading(region: Region) -> &'static str {
    match region {
        Region::AccountRoster => "users",
        Region::ServerRoster => "servers",
        Region::AccountDetail => "user detail",
        Region::ServerDetail => "server detail",
    }
}

pub fn format_table(region: Region, table: &TableView) -> String {
    let mut out = format!(
        "== {} [{}] ({})\n",
        table.title,
        table.badge,
        region_heading(region)
    );

    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.len()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.len());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}", width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };
    out.push_str(&line(table.columns.clone()));
    out.push('\n');
    for row in &table.rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }

    if let Some(controls) = &table.pagination {
        let prev = controls
            .previous()
            .map_or_else(|| "-".to_string(), |q| format!("page {}", q.page));
        let next = controls
            .next()
            .map_or_else(|| "-".to_string(), |q| format!("page {}", q.page));
        out.push_str(&format!(
            "page {} of {}  prev: {prev}  next: {next}\n",
            controls.window.current_page,
            controls.window.last_page()
        ));
    }
    out
}

impl RenderSink for TerminalSink {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => println!("ok: {}", notification.message),
            NotificationLevel::Failure => eprintln!("error: {}", notification.message),
        }
    }

    fn clear_notifications(&self) {}

    fn render_table(&self, region: Region, table: TableView) {
        print!("{}", format_table(region, &table));
    }

    fn render_empty(&self, region: Region, message: String) {
        println!("== {message} ({})", region_heading(region));
    }

    fn show_tag(&self, key: EntityKey, display: TagDisplay) {
        let icon = match display.icon {
            Icon::Ok => "[ok]",
            Icon::Remove => "[x]",
        };
        println!("{icon} {} (id {})", display.label, key.id);
    }

    fn show_tunnel_destination(&self, session: SessionId, destination: &str) {
        println!("session {session} tunnel destination: {destination}");
    }

    fn open_dialog(&self, spec: DialogSpec) -> Box<dyn DialogSurface> {
        println!("-- {} ({})", spec.title, spec.action);
        Box::new(TerminalDialog { title: spec.title })
    }
}

struct TerminalDialog {
    title: &'static str,
}

impl DialogSurface for TerminalDialog {
    fn set_indicator(&mut self, indicator: Indicator) {
        match indicator {
            Indicator::Idle => {}
            Indicator::Busy => println!("   {}: looking up...", self.title),
            Indicator::Found => println!("   {}: found", self.title),
        }
    }

    fn show_error(&mut self, message: &str) {
        eprintln!("   {}: {message}", self.title);
    }

    fn clear_error(&mut self) {}

    fn reselect_input(&mut self) {}

    fn close(&mut self) {
        println!("-- {} closed", self.title);
    }
}
