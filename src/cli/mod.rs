//! Terminal rendering for the `helpdesk` binary.

use serde::Serialize;
use serde_json::Value;
use terminal_size::{terminal_size, Height, Width};

use crate::api::Ticket;
use crate::error::{AppResult, Outcome};
use crate::identity::Principal;

/// `HELPDESK_OUTPUT=json` switches every command to `Outcome` JSON.
pub fn json_output() -> bool {
    std::env::var("HELPDESK_OUTPUT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false)
}

pub fn print_outcome<T: Serialize>(res: AppResult<T>) -> bool {
    let ok = res.is_ok();
    let out: Outcome<T> = res.into();
    match serde_json::to_string_pretty(&out) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("failed to encode output: {}", e),
    }
    ok
}

pub fn print_principal(p: &Principal) {
    println!("{} <{}>", p.display_name(), p.email);
    println!("id: {}, role: {}", p.id, p.role.as_str());
    if let Some(d) = &p.department_id {
        println!("department: {}", d);
    }
}

pub fn ticket_rows(tickets: &[Ticket]) -> (Vec<String>, Vec<Vec<String>>) {
    let cols = ["id", "title", "status", "level", "priority", "owner", "assignee", "updated"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let rows = tickets
        .iter()
        .map(|t| {
            vec![
                t.id.clone(),
                t.title.clone(),
                t.status.as_str().to_string(),
                t.support_level.as_str().to_string(),
                t.priority.as_str().to_string(),
                t.created_by_id.clone(),
                t.assigned_to_id.clone().unwrap_or_else(|| "-".to_string()),
                t.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();
    (cols, rows)
}

pub fn print_tickets(tickets: &[Ticket]) {
    if tickets.is_empty() {
        println!("no tickets");
        return;
    }
    let (cols, rows) = ticket_rows(tickets);
    for line in render_table(&cols, &rows, terminal_width()) {
        println!("{}", line);
    }
    println!("tickets: {}", tickets.len());
}

/// Flatten a stats object into `key: value` lines, nested keys joined with '.'.
pub fn stats_lines(v: &Value) -> Vec<String> {
    fn walk(prefix: &str, v: &Value, out: &mut Vec<String>) {
        match v {
            Value::Object(map) => {
                for (k, inner) in map {
                    let key = if prefix.is_empty() { k.clone() } else { format!("{}.{}", prefix, k) };
                    walk(&key, inner, out);
                }
            }
            Value::Array(items) => {
                for (i, inner) in items.iter().enumerate() {
                    walk(&format!("{}[{}]", prefix, i), inner, out);
                }
            }
            Value::String(s) => out.push(format!("{}: {}", prefix, s)),
            other => out.push(format!("{}: {}", prefix, other)),
        }
    }
    let mut out = Vec::new();
    walk("", v, &mut out);
    out
}

pub fn render_table(cols: &[String], rows: &[Vec<String>], max_width: usize) -> Vec<String> {
    let mut widths: Vec<usize> = cols.iter().map(|c| display_len(c)).collect();
    for r in rows {
        for (i, cell) in r.iter().enumerate().take(cols.len()) {
            widths[i] = widths[i].max(display_len(cell));
        }
    }
    shrink_to_fit(&mut widths, max_width);
    let sep = build_separator(&widths);
    let mut out = vec![sep.clone(), build_row(cols, &widths), sep.clone()];
    out.extend(rows.iter().map(|r| build_row(r, &widths)));
    out.push(sep);
    out
}

// Take width from the widest column until the table fits; columns keep at least 4 chars.
fn shrink_to_fit(widths: &mut [usize], max_width: usize) {
    let total = |w: &[usize]| w.iter().map(|x| x + 3).sum::<usize>() + 1;
    while total(widths) > max_width {
        let Some((idx, widest)) = widths.iter().copied().enumerate().max_by_key(|(_, w)| *w) else { return; };
        if widest <= 4 {
            return;
        }
        widths[idx] = widest - 1;
    }
}

fn display_len(s: &str) -> usize { s.chars().count() }

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::from("+");
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::from("|");
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        let text = truncate(cell, *w);
        s.push(' ');
        s.push_str(&text);
        s.push_str(&" ".repeat(w.saturating_sub(display_len(&text))));
        s.push_str(" |");
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    if display_len(s) <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    s.chars().take(max - 1).collect::<String>() + "…"
}

fn terminal_width() -> usize {
    match terminal_size() {
        Some((Width(w), Height(_))) if w > 20 => (w - 4) as usize,
        _ => 120,
    }
}
