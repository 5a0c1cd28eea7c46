//! Parsing of version strings and constraint expressions.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use thiserror::Error;

use crate::constraint::{Constraint, MultiConstraint, Operator, VersionConstraint};
use crate::stability::Stability;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid version string \"{0}\"")]
    InvalidVersion(String),
    #[error("Could not parse version constraint {0}")]
    InvalidConstraint(String),
}

const MODIFIER: &str = r"[._-]?(?:(stable|beta|b|RC|alpha|a|patch|pl|p)((?:[.-]?\d+)*)?)?([.-]?dev)?";
const VERSION: &str = r"v?(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:\.(\d+))?";

lazy_static! {
    static ref ALIAS: Regex = Regex::new(r"^([^,\s]+) +as +([^,\s]+)$").unwrap();
    static ref BUILD_METADATA: Regex = Regex::new(r"^([^,\s+]+)\+[^\s]+$").unwrap();
    static ref MASTER_LIKE: Regex = Regex::new(r"(?i)^(?:dev-)?(?:master|trunk|default)$").unwrap();
    static ref CLASSICAL: Regex =
        Regex::new(&format!(r"(?i)^v?(\d{{1,5}})(\.\d+)?(\.\d+)?(\.\d+)?{}$", MODIFIER)).unwrap();
    static ref DATE_BASED: Regex = Regex::new(&format!(
        r"(?i)^v?(\d{{4}}(?:[.:-]?\d{{2}}){{1,6}}(?:[.:-]?\d{{1,3}})?){}$",
        MODIFIER
    ))
    .unwrap();
    static ref DEV_SUFFIX: Regex = Regex::new(r"(?i)^(.*?)[.-]?dev$").unwrap();
    static ref NUMERIC_BRANCH: Regex =
        Regex::new(r"(?i)^v?(\d+)(\.(?:\d+|[x*]))?(\.(?:\d+|[x*]))?(\.(?:\d+|[x*]))?$").unwrap();
    static ref STABILITY_SUFFIX: Regex =
        Regex::new(&format!(r"(?i){}(?:\+.*)?$", MODIFIER)).unwrap();
    static ref STABILITY_FLAG: Regex =
        Regex::new(r"(?i)^([^,\s]*?)@(stable|RC|beta|alpha|dev)$").unwrap();
    static ref BRANCH_REFERENCE: Regex =
        Regex::new(r"(?i)^(dev-[^,\s@]+?|[^,\s@]+?\.x-dev)#.+$").unwrap();
    static ref OR_SPLIT: Regex = Regex::new(r"\s*\|\|?\s*").unwrap();
    static ref OPERATOR_ONLY: Regex = Regex::new(r"^(<>|!=|>=?|<=?|==?)$").unwrap();
    static ref MATCH_ALL: Regex = Regex::new(r"(?i)^v?[x*](\.[x*])*$").unwrap();
    static ref TILDE: Regex = Regex::new(&format!(r"(?i)^~>?{}{}$", VERSION, MODIFIER)).unwrap();
    static ref CARET: Regex = Regex::new(&format!(r"(?i)^\^{}{}$", VERSION, MODIFIER)).unwrap();
    static ref WILDCARD: Regex =
        Regex::new(r"(?i)^v?(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:\.[x*])+$").unwrap();
    static ref HYPHEN: Regex = Regex::new(&format!(
        r"(?i)^({v}{m}) +- +({v}{m})$",
        v = VERSION,
        m = MODIFIER
    ))
    .unwrap();
    static ref BASIC: Regex = Regex::new(r"^(<>|!=|>=?|<=?|==?)?\s*(.*)$").unwrap();
    static ref HAS_MODIFIER: Regex = Regex::new(&format!(r"(?i)-{}$", MODIFIER)).unwrap();
}

/// Parser for version strings and constraint expressions.
#[derive(Debug, Clone, Default)]
pub struct VersionParser;

impl VersionParser {
    pub fn new() -> Self {
        VersionParser
    }

    /// Normalize a version string to the `x.y.z.w[-suffix]` form.
    pub fn normalize(&self, version: &str) -> Result<String, ParseError> {
        let original = version.trim();
        let mut version = original;

        if let Some(caps) = ALIAS.captures(version) {
            version = caps.get(1).map_or(version, |m| m.as_str());
        }

        if let Some(caps) = BUILD_METADATA.captures(version) {
            version = caps.get(1).map_or(version, |m| m.as_str());
        }

        if MASTER_LIKE.is_match(version) {
            return Ok("9999999-dev".to_string());
        }

        if version.get(..4).is_some_and(|prefix| prefix.eq_ignore_ascii_case("dev-")) {
            return Ok(format!("dev-{}", &version[4..]));
        }

        let matched = if let Some(caps) = CLASSICAL.captures(version) {
            let normalized = format!(
                "{}{}{}{}",
                &caps[1],
                caps.get(2).map_or(".0", |m| m.as_str()),
                caps.get(3).map_or(".0", |m| m.as_str()),
                caps.get(4).map_or(".0", |m| m.as_str()),
            );
            Some((normalized, caps, 5))
        } else if let Some(caps) = DATE_BASED.captures(version) {
            let normalized: String = caps[1]
                .chars()
                .map(|c| if c.is_ascii_digit() { c } else { '.' })
                .collect();
            Some((normalized, caps, 2))
        } else {
            None
        };

        if let Some((mut normalized, caps, index)) = matched {
            if let Some(stability) = caps.get(index) {
                if stability.as_str().eq_ignore_ascii_case("stable") {
                    return Ok(normalized);
                }
                normalized.push('-');
                normalized.push_str(&expand_stability(stability.as_str()));
                if let Some(number) = caps.get(index + 1) {
                    normalized.push_str(number.as_str().trim_start_matches(['.', '-']));
                }
            }
            if caps.get(index + 2).is_some() {
                normalized.push_str("-dev");
            }
            return Ok(normalized);
        }

        if let Some(caps) = DEV_SUFFIX.captures(version) {
            return Ok(self.normalize_branch(&caps[1]));
        }

        Err(ParseError::InvalidVersion(original.to_string()))
    }

    /// Normalize a branch name (`1.x`, `feature`) to its dev version.
    pub fn normalize_branch(&self, name: &str) -> String {
        let name = name.trim();

        if matches!(name, "master" | "trunk" | "default") {
            return "9999999-dev".to_string();
        }

        if let Some(caps) = NUMERIC_BRANCH.captures(name) {
            let mut version = caps[1].to_string();
            for i in 2..5 {
                match caps.get(i) {
                    Some(part) => version.push_str(&part.as_str().replace(['*', 'X'], "x")),
                    None => version.push_str(".x"),
                }
            }
            return format!("{}-dev", version.replace('x', "9999999"));
        }

        format!("dev-{}", name)
    }

    /// Detect the stability tier of a version string.
    pub fn parse_stability(version: &str) -> Stability {
        let version = version.split('#').next().unwrap_or(version);

        if version.starts_with("dev-") || version.ends_with("-dev") {
            return Stability::Dev;
        }

        let lower = version.to_lowercase();
        if let Some(caps) = STABILITY_SUFFIX.captures(&lower) {
            if caps.get(3).is_some() {
                return Stability::Dev;
            }
            if let Some(stability) = caps.get(1) {
                return match stability.as_str() {
                    "beta" | "b" => Stability::Beta,
                    "alpha" | "a" => Stability::Alpha,
                    "rc" => Stability::RC,
                    _ => Stability::Stable,
                };
            }
        }

        Stability::Stable
    }

    /// Parse a full constraint expression.
    pub fn parse_constraints(&self, constraints: &str) -> Result<VersionConstraint, ParseError> {
        let pretty = constraints.to_string();
        let mut constraints = constraints.trim().to_string();

        let without_flag = STABILITY_FLAG
            .captures(&constraints)
            .map(|caps| if caps[1].is_empty() { "*".to_string() } else { caps[1].to_string() });
        if let Some(stripped) = without_flag {
            constraints = stripped;
        }

        let without_reference = BRANCH_REFERENCE
            .captures(&constraints)
            .map(|caps| caps[1].to_string());
        if let Some(stripped) = without_reference {
            constraints = stripped;
        }

        let mut or_groups = Vec::new();
        for group in OR_SPLIT.split(constraints.trim()) {
            let mut parsed = Vec::new();
            for part in split_conjunction(group) {
                parsed.extend(self.parse_constraint(&part)?);
            }

            let constraint = match parsed.len() {
                0 => VersionConstraint::any(),
                1 => parsed.remove(0),
                _ => VersionConstraint::Multi(MultiConstraint::new(parsed, true)),
            };
            or_groups.push(constraint);
        }

        let mut constraint = if or_groups.len() == 1 {
            or_groups.remove(0)
        } else {
            VersionConstraint::Multi(MultiConstraint::new(or_groups, false))
        };

        constraint.set_pretty_string(pretty);
        Ok(constraint)
    }

    fn parse_constraint(&self, constraint: &str) -> Result<Vec<VersionConstraint>, ParseError> {
        let mut constraint = constraint.to_string();
        let mut stability_modifier: Option<String> = None;

        let flagged = STABILITY_FLAG
            .captures(&constraint)
            .map(|caps| (caps[1].to_string(), caps[2].to_string()));
        if let Some((base, flag)) = flagged {
            if !flag.eq_ignore_ascii_case("stable") {
                stability_modifier = Some(flag);
            }
            constraint = if base.is_empty() { "*".to_string() } else { base };
        }

        if MATCH_ALL.is_match(&constraint) {
            return Ok(vec![VersionConstraint::any()]);
        }

        if let Some(caps) = TILDE.captures(&constraint) {
            let position = if caps.get(4).is_some() {
                4
            } else if caps.get(3).is_some() {
                3
            } else if caps.get(2).is_some() {
                2
            } else {
                1
            };

            let mut suffix = String::new();
            if let Some(stability) = caps.get(5) {
                suffix.push('-');
                suffix.push_str(&expand_stability(stability.as_str()));
                if let Some(number) = caps.get(6) {
                    suffix.push_str(number.as_str());
                }
            }
            if caps.get(7).is_some() {
                suffix.push_str("-dev");
            }
            if suffix.is_empty() {
                suffix.push_str("-dev");
            }

            let low = manipulate_version_string(&version_parts(&caps, 1), position, 0)
                .ok_or_else(|| ParseError::InvalidConstraint(constraint.clone()))?;
            let high = manipulate_version_string(&version_parts(&caps, 1), position.max(2) - 1, 1)
                .ok_or_else(|| ParseError::InvalidConstraint(constraint.clone()))?;

            return Ok(vec![
                single(Operator::GreaterThanOrEqual, format!("{}{}", low, suffix)),
                single(Operator::LessThan, format!("{}-dev", high)),
            ]);
        }

        if let Some(caps) = CARET.captures(&constraint) {
            let major = &caps[1];
            let position = if major != "0" || caps.get(2).is_none() {
                1
            } else if caps.get(2).map_or("", |m| m.as_str()) != "0" || caps.get(3).is_none() {
                2
            } else {
                3
            };

            let mut low_input = constraint[1..].to_string();
            if caps.get(5).is_none() && caps.get(7).is_none() {
                low_input.push_str("-dev");
            }
            let low = self.normalize(&low_input)?;
            let high = manipulate_version_string(&version_parts(&caps, 1), position, 1)
                .ok_or_else(|| ParseError::InvalidConstraint(constraint.clone()))?;

            return Ok(vec![
                single(Operator::GreaterThanOrEqual, low),
                single(Operator::LessThan, format!("{}-dev", high)),
            ]);
        }

        if let Some(caps) = WILDCARD.captures(&constraint) {
            let position = if caps.get(3).is_some() {
                3
            } else if caps.get(2).is_some() {
                2
            } else {
                1
            };
            let parts = version_parts(&caps, 1);
            let low = manipulate_version_string(&parts, position, 0)
                .ok_or_else(|| ParseError::InvalidConstraint(constraint.clone()))?;
            let high = manipulate_version_string(&parts, position, 1)
                .ok_or_else(|| ParseError::InvalidConstraint(constraint.clone()))?;

            if low == "0.0.0.0" {
                return Ok(vec![single(Operator::LessThan, format!("{}-dev", high))]);
            }
            return Ok(vec![
                single(Operator::GreaterThanOrEqual, format!("{}-dev", low)),
                single(Operator::LessThan, format!("{}-dev", high)),
            ]);
        }

        if let Some(caps) = HYPHEN.captures(&constraint) {
            let mut low = self.normalize(&caps[1])?;
            if caps.get(6).is_none() && caps.get(8).is_none() {
                low.push_str("-dev");
            }

            let has_minor_and_patch = caps.get(11).is_some() && caps.get(12).is_some();
            let upper = if has_minor_and_patch || caps.get(14).is_some() || caps.get(16).is_some() {
                single(Operator::LessThanOrEqual, self.normalize(&caps[9])?)
            } else {
                let position = if caps.get(11).is_none() { 1 } else { 2 };
                let high = manipulate_version_string(&version_parts(&caps, 10), position, 1)
                    .ok_or_else(|| ParseError::InvalidConstraint(constraint.clone()))?;
                single(Operator::LessThan, format!("{}-dev", high))
            };

            return Ok(vec![single(Operator::GreaterThanOrEqual, low), upper]);
        }

        if let Some(caps) = BASIC.captures(&constraint) {
            let op = caps.get(1).map_or("=", |m| m.as_str());
            let raw = &caps[2];
            if let Ok(mut version) = self.normalize(raw) {
                if let Some(modifier) = &stability_modifier {
                    if Self::parse_stability(&version) == Stability::Stable {
                        version.push('-');
                        version.push_str(modifier);
                    }
                } else if (op == "<" || op == ">=")
                    && !HAS_MODIFIER.is_match(&raw.to_lowercase())
                    && !raw.starts_with("dev-")
                {
                    version.push_str("-dev");
                }

                let parsed = Constraint::from_str(op, version)
                    .map_err(|_| ParseError::InvalidConstraint(constraint.clone()))?;
                return Ok(vec![VersionConstraint::Single(parsed)]);
            }
        }

        Err(ParseError::InvalidConstraint(constraint))
    }
}

fn single(operator: Operator, version: String) -> VersionConstraint {
    VersionConstraint::Single(Constraint::new(operator, version))
}

fn expand_stability(stability: &str) -> String {
    let lower = stability.to_lowercase();
    match lower.as_str() {
        "a" => "alpha".to_string(),
        "b" => "beta".to_string(),
        "p" | "pl" => "patch".to_string(),
        "rc" => "RC".to_string(),
        _ => lower,
    }
}

/// Split an AND group on commas and whitespace, keeping `>= 1.0`, `1.0 - 2.0`
/// and `x as y` together.
fn split_conjunction(group: &str) -> Vec<String> {
    let tokens: Vec<&str> = group
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();

    let mut parts: Vec<String> = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];

        if OPERATOR_ONLY.is_match(token) && i + 1 < tokens.len() {
            parts.push(format!("{}{}", token, tokens[i + 1]));
            i += 2;
            continue;
        }

        if token == "-" && i + 1 < tokens.len() {
            if let Some(previous) = parts.pop() {
                parts.push(format!("{} - {}", previous, tokens[i + 1]));
                i += 2;
                continue;
            }
        }

        if token.eq_ignore_ascii_case("as") && i + 1 < tokens.len() {
            i += 2;
            continue;
        }

        parts.push(token.to_string());
        i += 1;
    }

    parts
}

fn version_parts(caps: &Captures<'_>, first: usize) -> [u64; 4] {
    let mut parts = [0u64; 4];
    for (offset, part) in parts.iter_mut().enumerate() {
        *part = caps
            .get(first + offset)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
    }
    parts
}

/// Zero out everything right of `position` and bump `position` by `increment`.
fn manipulate_version_string(parts: &[u64; 4], position: usize, increment: u64) -> Option<String> {
    let mut parts = *parts;
    for i in (1..=4).rev() {
        if i > position {
            parts[i - 1] = 0;
        } else if i == position && increment > 0 {
            parts[i - 1] = parts[i - 1].checked_add(increment)?;
        }
    }
    Some(format!("{}.{}.{}.{}", parts[0], parts[1], parts[2], parts[3]))
}
