// File: streambot-core/src/services/discord/components.rs
//
// Message components for the stream picker, and the custom-id scheme that
// routes component interactions back to their session.

use twilight_model::channel::message::component::{
    ActionRow, Button, ButtonStyle, Component, SelectMenu, SelectMenuOption, SelectMenuType,
};

use crate::services::selection::{Navigation, PageView};

pub const CUSTOM_ID_PREFIX: &str = "stream";
const EXPIRED_ID: &str = "stream:expired";

pub const EXPIRED_HINT: &str = "This stream picker has closed. Run /stream again to pick a stream.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamComponent {
    Menu { session_id: u64, menu: usize },
    Navigate { session_id: u64, direction: Navigation },
    Expired,
}

pub fn menu_id(session_id: u64, menu: usize) -> String {
    format!("{CUSTOM_ID_PREFIX}:{session_id}:menu:{menu}")
}

pub fn nav_id(session_id: u64, direction: Navigation) -> String {
    let suffix = match direction {
        Navigation::Previous => "prev",
        Navigation::Next => "next",
    };
    format!("{CUSTOM_ID_PREFIX}:{session_id}:{suffix}")
}

pub fn is_stream_component(custom_id: &str) -> bool {
    custom_id
        .split(':')
        .next()
        .is_some_and(|prefix| prefix == CUSTOM_ID_PREFIX)
}

pub fn parse_custom_id(custom_id: &str) -> Option<StreamComponent> {
    if custom_id == EXPIRED_ID {
        return Some(StreamComponent::Expired);
    }
    let parts: Vec<&str> = custom_id.split(':').collect();
    match parts.as_slice() {
        [CUSTOM_ID_PREFIX, id, "menu", n] => Some(StreamComponent::Menu {
            session_id: id.parse().ok()?,
            menu: n.parse().ok()?,
        }),
        [CUSTOM_ID_PREFIX, id, "prev"] => Some(StreamComponent::Navigate {
            session_id: id.parse().ok()?,
            direction: Navigation::Previous,
        }),
        [CUSTOM_ID_PREFIX, id, "next"] => Some(StreamComponent::Navigate {
            session_id: id.parse().ok()?,
            direction: Navigation::Next,
        }),
        _ => None,
    }
}

fn select_menu(custom_id: String, placeholder: String, options: Vec<SelectMenuOption>, disabled: bool) -> Component {
    Component::SelectMenu(SelectMenu {
        channel_types: None,
        custom_id,
        default_values: None,
        disabled,
        kind: SelectMenuType::Text,
        max_values: Some(1),
        min_values: Some(1),
        options: Some(options),
        placeholder: Some(placeholder),
    })
}

fn nav_button(custom_id: String, label: &str, disabled: bool) -> Component {
    Component::Button(Button {
        custom_id: Some(custom_id),
        disabled,
        emoji: None,
        label: Some(label.to_string()),
        style: ButtonStyle::Secondary,
        url: None,
        sku_id: None,
    })
}

fn row(components: Vec<Component>) -> Component {
    Component::ActionRow(ActionRow { components })
}

/// One action row per menu, then a prev/next row disabled at the edges.
pub fn page_components(session_id: u64, view: &PageView) -> Vec<Component> {
    let menu_count = view.menus.len();
    let mut rows: Vec<Component> = view
        .menus
        .iter()
        .enumerate()
        .map(|(n, options)| {
            let placeholder = if menu_count > 1 {
                format!("Choose a stream ({}/{})", n + 1, menu_count)
            } else {
                "Choose a stream".to_string()
            };
            let options = options
                .iter()
                .map(|opt| SelectMenuOption {
                    default: false,
                    description: None,
                    emoji: None,
                    label: opt.label.clone(),
                    value: opt.token.clone(),
                })
                .collect();
            row(vec![select_menu(menu_id(session_id, n), placeholder, options, false)])
        })
        .collect();

    rows.push(row(vec![
        nav_button(nav_id(session_id, Navigation::Previous), "Previous", !view.has_previous),
        nav_button(nav_id(session_id, Navigation::Next), "Next", !view.has_next),
    ]));
    rows
}

/// Disabled stand-in shown once a session times out.
pub fn expired_components() -> Vec<Component> {
    let placeholder_option = SelectMenuOption {
        default: false,
        description: None,
        emoji: None,
        label: "Expired".to_string(),
        value: "expired".to_string(),
    };
    vec![row(vec![select_menu(
        EXPIRED_ID.to_string(),
        "Selection expired".to_string(),
        vec![placeholder_option],
        true,
    )])]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::selection::MenuOption;

    fn view(menus: Vec<usize>, has_previous: bool, has_next: bool) -> PageView {
        let mut index = 0;
        let menus = menus
            .into_iter()
            .map(|n| {
                (0..n)
                    .map(|_| {
                        index += 1;
                        MenuOption { label: format!("S{index}"), token: index.to_string() }
                    })
                    .collect()
            })
            .collect();
        PageView {
            page_index: 0,
            total_pages: 2,
            total_candidates: 30,
            menus,
            has_previous,
            has_next,
        }
    }

    #[test]
    fn custom_ids_round_trip() {
        assert_eq!(
            parse_custom_id(&menu_id(77, 2)),
            Some(StreamComponent::Menu { session_id: 77, menu: 2 })
        );
        assert_eq!(
            parse_custom_id(&nav_id(77, Navigation::Next)),
            Some(StreamComponent::Navigate { session_id: 77, direction: Navigation::Next })
        );
        assert_eq!(parse_custom_id("stream:expired"), Some(StreamComponent::Expired));
    }

    #[test]
    fn foreign_or_garbled_ids_are_rejected() {
        assert_eq!(parse_custom_id("ping"), None);
        assert_eq!(parse_custom_id("stream:abc:next"), None);
        assert_eq!(parse_custom_id("stream:1:menu:x"), None);
        assert!(!is_stream_component("streams:1:next"));
        assert!(is_stream_component("stream:1:next"));
    }

    #[test]
    fn first_page_has_disabled_previous() {
        let rows = page_components(5, &view(vec![25], false, true));
        assert_eq!(rows.len(), 2);

        let Component::ActionRow(nav) = &rows[1] else { panic!("expected action row") };
        let disabled: Vec<bool> = nav
            .components
            .iter()
            .filter_map(|c| match c {
                Component::Button(b) => Some(b.disabled),
                _ => None,
            })
            .collect();
        assert_eq!(disabled, vec![true, false]);
    }

    #[test]
    fn each_menu_gets_its_own_row() {
        let rows = page_components(5, &view(vec![25, 25, 10], true, false));
        assert_eq!(rows.len(), 4);

        let Component::ActionRow(third) = &rows[2] else { panic!("expected action row") };
        let Component::SelectMenu(menu) = &third.components[0] else { panic!("expected menu") };
        assert_eq!(menu.custom_id, "stream:5:menu:2");
        assert_eq!(menu.options.as_ref().map(Vec::len), Some(10));
        assert_eq!(menu.options.as_ref().unwrap()[0].value, "51");
    }

    #[test]
    fn expired_placeholder_is_disabled() {
        let rows = expired_components();
        let Component::ActionRow(only) = &rows[0] else { panic!("expected action row") };
        let Component::SelectMenu(menu) = &only.components[0] else { panic!("expected menu") };
        assert!(menu.disabled);
    }
}
