use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PLATFORM_PACKAGE: Regex =
        Regex::new(r"(?i)^(?:php(?:-64bit|-ipv6|-zts|-debug)?|hhvm|(?:ext|lib)-[^/]+)$").unwrap();
}

/// Check if a package name refers to a platform package (php, extensions, system libraries).
pub fn is_platform_package(name: &str) -> bool {
    PLATFORM_PACKAGE.is_match(name)
}

/// Build a case-insensitive regex from a package name pattern where `*` matches anything.
pub fn package_name_to_regex(pattern: &str) -> Regex {
    let escaped = regex::escape(pattern).replace(r"\*", ".*");
    // an escaped pattern is always a valid regex
    Regex::new(&format!("(?i)^{}$", escaped)).unwrap_or_else(|_| Regex::new("^$").unwrap())
}

/// Check if a package name matches a pattern (case-insensitive, `*` wildcard).
pub fn matches_package_pattern(name: &str, pattern: &str) -> bool {
    package_name_to_regex(pattern).is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_packages() {
        assert!(is_platform_package("php"));
        assert!(is_platform_package("php-64bit"));
        assert!(is_platform_package("ext-json"));
        assert!(is_platform_package("EXT-mbstring"));
        assert!(is_platform_package("lib-icu"));
        assert!(is_platform_package("hhvm"));
        assert!(!is_platform_package("vendor/package"));
        assert!(!is_platform_package("ext-foo/bar"));
        assert!(!is_platform_package("phpunit/phpunit"));
    }

    #[test]
    fn test_package_pattern() {
        assert!(matches_package_pattern("symfony/console", "symfony/*"));
        assert!(matches_package_pattern("Symfony/Console", "symfony/console"));
        assert!(matches_package_pattern("monolog/monolog", "*"));
        assert!(!matches_package_pattern("symfony/console", "symfony/cons"));
        assert!(!matches_package_pattern("vendor/a.b", "vendor/a*c"));
        assert!(matches_package_pattern("vendor/a.b", "vendor/a.b"));
        assert!(!matches_package_pattern("vendor/axb", "vendor/a.b"));
    }
}
