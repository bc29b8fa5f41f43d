//! Runtime configuration: which activity to load and where assets live.
//!
//! On the web the activity is selected with the `activity` query parameter of
//! the page URL (`index.html?activity=10`). Natively the same value is read from
//! the `FLOW_ACTIVITY` environment variable or from the command line
//! (`activity=10` or `--activity 10`).

use std::fmt::Display;

/// Name of the query parameter selecting the activity.
pub const ACTIVITY_PARAM: &str = "activity";

/// Prioritized list of typeface font locations tried by the text activity.
pub const DEFAULT_FONT_URLS: [&str; 4] = [
    "fonts/helvetiker_regular.typeface.json",
    "static/fonts/helvetiker_regular.typeface.json",
    "https://threejs.org/examples/fonts/helvetiker_regular.typeface.json",
    "https://cdn.jsdelivr.net/npm/three@0.160.0/examples/fonts/helvetiker_regular.typeface.json",
];

/// The tutorial activities shipped with this crate.
///
/// The numbering matches the lesson numbers used in the page links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActivityId {
    #[default]
    Animation,
    Camera,
    Geometries,
    Textures,
    Materials,
    Text,
}

impl ActivityId {
    pub const ALL: [ActivityId; 6] = [
        ActivityId::Animation,
        ActivityId::Camera,
        ActivityId::Geometries,
        ActivityId::Textures,
        ActivityId::Materials,
        ActivityId::Text,
    ];

    pub fn number(&self) -> u8 {
        match self {
            ActivityId::Animation => 6,
            ActivityId::Camera => 7,
            ActivityId::Geometries => 8,
            ActivityId::Textures => 9,
            ActivityId::Materials => 10,
            ActivityId::Text => 11,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.number() == number)
    }

    pub fn title(&self) -> &'static str {
        match self {
            ActivityId::Animation => "Animations",
            ActivityId::Camera => "Cameras & resizing",
            ActivityId::Geometries => "Geometries",
            ActivityId::Textures => "Textures",
            ActivityId::Materials => "Materials",
            ActivityId::Text => "3D Text",
        }
    }

    /// Reads the `activity` parameter from a URL query string.
    ///
    /// Anything that is not one of the known lesson numbers selects the default
    /// activity.
    pub fn from_query(query: &str) -> Self {
        match query_param(query, ACTIVITY_PARAM) {
            None => Self::default(),
            Some(raw) => match raw.trim().parse::<u8>().ok().and_then(Self::from_number) {
                Some(id) => id,
                None => {
                    log::warn!(
                        "Unknown activity {:?}, falling back to activity {}",
                        raw,
                        Self::default().number()
                    );
                    Self::default()
                }
            },
        }
    }
}

impl Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.number(), self.title())
    }
}

/// Returns the first value of `key` in a `a=b&c=d` query string.
///
/// The leading `?` is optional. Keys without `=` yield an empty value.
pub fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

#[derive(Debug, Clone)]
pub struct Config {
    pub activity: ActivityId,
    /// Directory (native) or path below the page origin (web) holding the assets.
    pub asset_root: String,
    pub font_urls: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            activity: ActivityId::default(),
            asset_root: default_asset_root(),
            font_urls: DEFAULT_FONT_URLS.iter().map(|u| u.to_string()).collect(),
        }
    }
}

/// `assets` below the page origin on the web. Natively `./assets` when present,
/// otherwise the copy made at build time.
fn default_asset_root() -> String {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if !std::path::Path::new("assets").is_dir() {
            return env!("FLOW_BUNDLED_ASSETS").to_string();
        }
    }
    "assets".to_string()
}

impl Config {
    pub fn from_query(query: &str) -> Self {
        Self {
            activity: ActivityId::from_query(query),
            ..Default::default()
        }
    }

    /// Reads the configuration from the page URL.
    #[cfg(target_arch = "wasm32")]
    pub fn from_env() -> Self {
        let search = web_sys::window()
            .and_then(|window| window.location().search().ok())
            .unwrap_or_default();
        Self::from_query(&search)
    }

    /// Reads the configuration from `FLOW_ACTIVITY`/`FLOW_ASSETS` and the command line.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let query = query_from_args(&args)
            .or_else(|| {
                std::env::var("FLOW_ACTIVITY")
                    .ok()
                    .map(|value| format!("{ACTIVITY_PARAM}={value}"))
            })
            .unwrap_or_default();
        let mut config = Self::from_query(&query);
        if let Ok(root) = std::env::var("FLOW_ASSETS") {
            config.asset_root = root;
        }
        config
    }
}

/// Turns `activity=9`, `--activity 9`, `--activity=9` or `?activity=9` into a query string.
pub fn query_from_args(args: &[String]) -> Option<String> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let arg = arg.trim_start_matches('-');
        if arg == ACTIVITY_PARAM {
            return iter.next().map(|value| format!("{ACTIVITY_PARAM}={value}"));
        }
        if query_param(arg, ACTIVITY_PARAM).is_some() {
            return Some(arg.to_string());
        }
    }
    None
}

/// Installs the logger for the current platform. Safe to call more than once.
pub fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Could not initialize logger: {}", e).into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_select_every_known_activity() {
        for id in ActivityId::ALL {
            let query = format!("?activity={}", id.number());
            assert_eq!(ActivityId::from_query(&query), id);
        }
    }

    #[test]
    fn should_fall_back_to_default_activity() {
        assert_eq!(ActivityId::from_query(""), ActivityId::Animation);
        assert_eq!(ActivityId::from_query("?activity=5"), ActivityId::Animation);
        assert_eq!(ActivityId::from_query("?activity=12"), ActivityId::Animation);
        assert_eq!(ActivityId::from_query("?activity=abc"), ActivityId::Animation);
        assert_eq!(ActivityId::from_query("?activity"), ActivityId::Animation);
    }

    #[test]
    fn should_read_first_matching_param() {
        let query = "?foo=1&activity=9&activity=10";
        assert_eq!(query_param(query, "activity"), Some("9"));
        assert_eq!(query_param(query, "foo"), Some("1"));
        assert_eq!(query_param(query, "bar"), None);
        assert_eq!(query_param("a&&activity=11", "activity"), Some("11"));
    }

    #[test]
    fn should_parse_command_line_forms() {
        let args = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(
            query_from_args(&args(&["--activity", "8"])).as_deref(),
            Some("activity=8")
        );
        assert_eq!(
            query_from_args(&args(&["activity=10"])).as_deref(),
            Some("activity=10")
        );
        assert_eq!(
            query_from_args(&args(&["--activity=11"])).as_deref(),
            Some("activity=11")
        );
        assert_eq!(query_from_args(&args(&["--verbose"])), None);
    }
}
