use super::load_config;
use crate::output::print_json;
use anyhow::bail;
use clap::Subcommand;
use gerai_core::render::{render_subscribe, render_unsubscribe};
use gerai_core::subscribers::{FileSubscribers, SubscriberStore};
use std::path::Path;

#[derive(Subcommand)]
pub enum SubscribersSubcommand {
    /// List subscriber ids
    List,
    /// Add a subscriber id (chat id or @channel)
    Add { recipient: String },
    /// Remove a subscriber id
    Remove { recipient: String },
}

fn open_store(config_path: &Path) -> anyhow::Result<FileSubscribers> {
    let config = load_config(config_path)?;
    let Some(path) = config.subscribers_path else {
        bail!(
            "subscribers_path is not set in {}; subscribers are kept in memory",
            config_path.display()
        );
    };
    Ok(FileSubscribers::open(path)?)
}

pub fn run(config_path: &Path, subcmd: SubscribersSubcommand, json: bool) -> anyhow::Result<()> {
    let store = open_store(config_path)?;
    match subcmd {
        SubscribersSubcommand::List => {
            let list = store.list()?;
            if json {
                print_json(&list)?;
            } else if list.is_empty() {
                println!("No subscribers.");
            } else {
                for r in list {
                    println!("{r}");
                }
            }
        }
        SubscribersSubcommand::Add { recipient } => {
            let outcome = store.add(&recipient)?;
            if json {
                print_json(&serde_json::json!({
                    "recipient": recipient.trim(),
                    "result": outcome,
                }))?;
            } else {
                println!("{}", render_subscribe(outcome));
            }
        }
        SubscribersSubcommand::Remove { recipient } => {
            let outcome = store.remove(&recipient)?;
            if json {
                print_json(&serde_json::json!({
                    "recipient": recipient.trim(),
                    "result": outcome,
                }))?;
            } else {
                println!("{}", render_unsubscribe(outcome));
            }
        }
    }
    Ok(())
}
