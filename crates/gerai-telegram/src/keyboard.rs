use crate::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use gerai_core::notify::NotifyOption;
use gerai_core::registry::Registry;
use gerai_core::service::{CHECK_STATUS_ACTION, CHECK_STATUS_LABEL};

pub const SHOW_UPDATE_OPTIONS: &str = "show_update_options";
pub const BACK_TO_MAIN: &str = "back_to_main";
pub const SUBSCRIBE: &str = "subscribe";
pub const UNSUBSCRIBE: &str = "unsubscribe";
pub const UPDATE_PREFIX: &str = "update_";

const STALLS_PER_ROW: usize = 2;

pub fn main_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![InlineKeyboardButton::callback(
                "Update Gerai Status 🔄",
                SHOW_UPDATE_OPTIONS,
            )],
            vec![InlineKeyboardButton::callback(
                CHECK_STATUS_LABEL,
                CHECK_STATUS_ACTION,
            )],
            vec![
                InlineKeyboardButton::callback("🔔 Subscribe", SUBSCRIBE),
                InlineKeyboardButton::callback("🔕 Unsubscribe", UNSUBSCRIBE),
            ],
        ],
    }
}

/// Short button label: the part of the display name before ` - `.
fn button_label(display_name: &str) -> &str {
    display_name
        .split(" - ")
        .next()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(display_name)
}

pub fn stall_menu(registry: &Registry) -> InlineKeyboardMarkup {
    let buttons: Vec<InlineKeyboardButton> = registry
        .stalls()
        .iter()
        .map(|s| {
            InlineKeyboardButton::callback(
                button_label(&s.display_name),
                format!("{UPDATE_PREFIX}{}", s.id),
            )
        })
        .collect();
    let mut rows: Vec<Vec<InlineKeyboardButton>> =
        buttons.chunks(STALLS_PER_ROW).map(<[_]>::to_vec).collect();
    rows.push(vec![InlineKeyboardButton::callback(
        "🔙 Back to Main Menu",
        BACK_TO_MAIN,
    )]);
    InlineKeyboardMarkup {
        inline_keyboard: rows,
    }
}

/// One button per notification option, each on its own row.
pub fn options_keyboard(options: &[NotifyOption]) -> Option<InlineKeyboardMarkup> {
    if options.is_empty() {
        return None;
    }
    Some(InlineKeyboardMarkup {
        inline_keyboard: options
            .iter()
            .map(|o| vec![InlineKeyboardButton::callback(&o.label, &o.action)])
            .collect(),
    })
}
