use super::load_config;
use crate::output::print_json;
use gerai_core::clock::{Clock, SystemClock};
use gerai_core::render::format_timestamp;
use std::path::Path;

pub fn run(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let gate = config.gate();
    let now = SystemClock::new(config.utc_offset()?).now();
    let next_close = gate.window.next_end_after(now);
    let open_now = gate.is_open(now);

    if json {
        return print_json(&serde_json::json!({
            "window": gate.window,
            "label": gate.window.label(),
            "force_open": gate.force_open,
            "now": now,
            "open_now": open_now,
            "next_auto_close": next_close,
        }));
    }

    println!("Operating hours: {}", gate.window.label());
    println!("Now:             {}", format_timestamp(&now));
    println!(
        "Updates:         {}",
        if open_now { "accepted" } else { "rejected (outside hours)" }
    );
    if gate.force_open {
        println!("                 force_open is set");
    }
    println!("Next auto-close: {}", format_timestamp(&next_close));
    Ok(())
}
