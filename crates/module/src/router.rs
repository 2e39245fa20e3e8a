//! In-module routing under the shell-assigned base path.

use serde::Serialize;

/// Where `/` (and an empty path) lands.
pub const DEFAULT_PATH: &str = "/products";

/// Top-level areas of the admin module.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Products,
    Customers,
    Contracts,
    Projects,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Products,
        Section::Customers,
        Section::Contracts,
        Section::Projects,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Section::Products => "products",
            Section::Customers => "customers",
            Section::Contracts => "contracts",
            Section::Projects => "projects",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Section::Products => "Products",
            Section::Customers => "Customers",
            Section::Contracts => "Contracts",
            Section::Projects => "Projects",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Section> {
        Section::ALL.into_iter().find(|s| s.slug() == slug)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "page", content = "id", rename_all = "snake_case")]
pub enum Page {
    List,
    New,
    Edit(String),
    Detail(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Route {
    Screen { section: Section, page: Page },
    NotFound { path: String },
}

impl Route {
    /// Resolve a module-relative path (no base prefix).
    pub fn resolve(path: &str) -> Route {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let not_found = || Route::NotFound {
            path: path.to_string(),
        };

        let Some(section) = segments.first().and_then(|s| Section::from_slug(s)) else {
            return not_found();
        };
        let page = match segments[1..] {
            [] => Page::List,
            ["new"] => Page::New,
            ["edit", id] => Page::Edit(id.to_string()),
            [id] if id != "edit" => Page::Detail(id.to_string()),
            _ => return not_found(),
        };
        Route::Screen { section, page }
    }

    /// Canonical module-relative path of this route.
    pub fn path(&self) -> String {
        match self {
            Route::Screen { section, page } => match page {
                Page::List => format!("/{}", section.slug()),
                Page::New => format!("/{}/new", section.slug()),
                Page::Edit(id) => format!("/{}/edit/{id}", section.slug()),
                Page::Detail(id) => format!("/{}/{id}", section.slug()),
            },
            Route::NotFound { path } => path.clone(),
        }
    }

    pub fn section(&self) -> Option<Section> {
        match self {
            Route::Screen { section, .. } => Some(*section),
            Route::NotFound { .. } => None,
        }
    }
}

/// Current location of the mounted tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Router {
    base_path: String,
    location: String,
    route: Route,
}

impl Router {
    pub fn new(base_path: &str, initial_path: &str) -> Self {
        let base_path = normalize_base(base_path);
        let location = relative_location(&base_path, initial_path);
        let route = Route::resolve(&location);
        Self {
            base_path,
            location,
            route,
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Module-relative location, e.g. `/customers/c-1`.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Location including the base path, as the shell's address bar shows it.
    pub fn full_path(&self) -> String {
        format!("{}{}", self.base_path, self.location)
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Move to `path` (module-relative or prefixed with the base path).
    ///
    /// Returns `false` when the location did not change.
    pub fn navigate(&mut self, path: &str) -> bool {
        let location = relative_location(&self.base_path, path);
        if location == self.location {
            return false;
        }
        self.route = Route::resolve(&location);
        self.location = location;
        true
    }

    /// Href for a module-relative path, for links rendered by the module.
    pub fn href(&self, path: &str) -> String {
        format!("{}{}", self.base_path, normalize_path(path))
    }
}

fn normalize_base(base: &str) -> String {
    let trimmed = base.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn normalize_path(path: &str) -> String {
    let path = path.trim();
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let joined = path
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{joined}")
}

fn relative_location(base: &str, path: &str) -> String {
    let path = normalize_path(path);
    let stripped = if base.is_empty() {
        path
    } else if path == base {
        "/".to_string()
    } else if let Some(rest) = path.strip_prefix(base).filter(|rest| rest.starts_with('/')) {
        rest.to_string()
    } else {
        path
    };

    if stripped == "/" {
        DEFAULT_PATH.to_string()
    } else {
        stripped
    }
}
