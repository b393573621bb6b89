use once_cell::sync::Lazy;
use regex::Regex;

/// Config versions are packed as `major << 8 | minor`.
pub const VERSION_LEGACY: u16 = 0x0201;
pub const VERSION_CURRENT: u16 = 0x0308;

/// Parse a `"major.minor"` version string into packed form.
pub fn parse_version_string(s: &str) -> Option<u16> {
    static RE_VERSION: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^(\d+)\.(\d+)$").expect("could not compile RE_VERSION regexp")
    });
    let caps = RE_VERSION.captures(s)?;
    let major: u16 = caps[1].parse().ok()?;
    let minor: u16 = caps[2].parse().ok()?;
    if major > 0xff || minor > 0xff {
        return None;
    }
    Some(major << 8 | minor)
}

/// Render a packed version as `"major.minor"`.
pub fn format_version(v: u16) -> String {
    format!("{}.{}", v >> 8, v & 0xff)
}

/// The piece of daemon configuration state the lexer needs: which config
/// format version is in effect. `version` is the established version;
/// `parsed_version` is what a version pragma declared but which has not
/// been promoted yet. Both zero means nothing has been decided.
///
/// The lexer does not reach for process-global state; the caller shares
/// one `Config` between the lexer and the grammar.
#[derive(Debug, Default)]
pub struct Config {
    pub version: u16,
    pub parsed_version: u16,
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    /// Whether a keyword gated on `req` may be used. Before a version is
    /// established every keyword is allowed.
    pub fn version_allows(&self, req: u16) -> bool {
        req == 0 || self.version == 0 || req <= self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_string() {
        assert_eq!(parse_version_string("3.8"), Some(0x0308));
        assert_eq!(parse_version_string("2.1"), Some(VERSION_LEGACY));
        assert_eq!(parse_version_string("3"), None);
        assert_eq!(parse_version_string("3.8.1"), None);
        assert_eq!(parse_version_string("a.b"), None);
        assert_eq!(parse_version_string("300.8"), None);
    }

    #[test]
    fn test_format_version() {
        assert_eq!(format_version(0x0308), "3.8");
        assert_eq!(format_version(VERSION_LEGACY), "2.1");
    }

    #[test]
    fn test_version_allows() {
        let mut config = Config::new();
        assert!(config.version_allows(0x0308));
        config.version = 0x0302;
        assert!(config.version_allows(0x0301));
        assert!(config.version_allows(0x0302));
        assert!(!config.version_allows(0x0308));
        assert!(config.version_allows(0));
    }
}
