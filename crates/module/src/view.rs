//! Render-ready description of the mounted tree.

use serde::Serialize;

use microapp_core::MountId;

use crate::router::{Route, Section};

/// One frame handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppView {
    pub mount_id: MountId,
    pub base_path: String,
    pub location: String,
    pub route: Route,
    /// Module-drawn layout; absent when the shell supplies the chrome.
    pub chrome: Option<Chrome>,
    pub authenticated: bool,
    /// Revision of the auth snapshot this frame was built from.
    pub auth_revision: u64,
    /// `true` once the shell has injected at least one HTTP function.
    pub api_ready: bool,
}

impl AppView {
    pub fn greeting(&self) -> Option<&str> {
        self.chrome.as_ref().and_then(|c| c.greeting.as_deref())
    }
}

/// Header and side menu drawn in standalone-style mounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chrome {
    pub title: String,
    pub collapsed: bool,
    pub menu: Vec<MenuItem>,
    /// "Welcome, {name}" when a user is known.
    pub greeting: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub section: Section,
    pub label: String,
    pub href: String,
    pub selected: bool,
}

impl Chrome {
    pub(crate) fn build(
        title: &str,
        collapsed: bool,
        active: Option<Section>,
        href: impl Fn(&str) -> String,
        user_name: Option<&str>,
    ) -> Self {
        let menu = Section::ALL
            .into_iter()
            .map(|section| MenuItem {
                section,
                label: section.label().to_string(),
                href: href(section.slug()),
                selected: active == Some(section),
            })
            .collect();

        Self {
            title: title.to_string(),
            collapsed,
            menu,
            greeting: user_name.map(|name| format!("Welcome, {name}")),
        }
    }

    pub fn selected(&self) -> Option<Section> {
        self.menu.iter().find(|m| m.selected).map(|m| m.section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_marks_active_section() {
        let chrome = Chrome::build(
            "Micro App Demo",
            false,
            Some(Section::Contracts),
            |slug| format!("/base/{slug}"),
            Some("Ada"),
        );

        assert_eq!(chrome.menu.len(), 4);
        assert_eq!(chrome.selected(), Some(Section::Contracts));
        assert_eq!(chrome.menu[0].href, "/base/products");
        assert_eq!(chrome.greeting.as_deref(), Some("Welcome, Ada"));
    }

    #[test]
    fn no_greeting_without_a_user() {
        let chrome = Chrome::build("t", true, None, |s| s.to_string(), None);
        assert!(chrome.greeting.is_none());
        assert!(chrome.selected().is_none());
        assert!(chrome.collapsed);
    }
}
