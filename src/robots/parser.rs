//! Robots.txt parser implementation
//!
//! Path matching is delegated to the robotstxt crate; Crawl-delay is not part of
//! that crate's matcher, so it is read here by grouping directives per agent.

use robotstxt::DefaultMatcher;
use std::time::Duration;

/// Parsed robots.txt policy for one host
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content
    content: String,
    /// True when the host has no usable policy (missing, 4xx, unreachable)
    allow_all: bool,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive policy that allows everything
    ///
    /// Used when robots.txt is missing or cannot be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Returns true if this policy permits every path
    pub fn is_allow_all(&self) -> bool {
        self.allow_all || self.content.trim().is_empty()
    }

    /// Checks if a URL (or bare path) is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL or path to check (e.g. "/private/x")
    /// * `user_agent` - The product token of the crawler
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.is_allow_all() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Gets the Crawl-delay that applies to a user agent
    ///
    /// A group naming the agent wins over the `*` group.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        if self.is_allow_all() {
            return None;
        }

        let agent = user_agent.to_lowercase();
        let mut group: Vec<String> = Vec::new();
        let mut group_open = false;
        let mut for_agent: Option<f64> = None;
        let mut for_wildcard: Option<f64> = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            if key == "user-agent" {
                // A user-agent line after any rule starts a new group
                if !group_open {
                    group.clear();
                    group_open = true;
                }
                group.push(value.to_lowercase());
                continue;
            }
            group_open = false;

            if key != "crawl-delay" {
                continue;
            }
            let Ok(delay) = value.parse::<f64>() else {
                continue;
            };
            if !delay.is_finite() || delay < 0.0 {
                continue;
            }

            if group.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                for_agent = Some(delay);
            } else if group.iter().any(|ua| ua == "*") {
                for_wildcard = Some(delay);
            }
        }

        for_agent.or(for_wildcard).map(Duration::from_secs_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        let robots = ParsedRobots::allow_all();
        assert!(robots.is_allow_all());
        assert!(robots.is_allowed("/any/path", "LeadBot"));
        assert!(robots.is_allowed("/admin", "LeadBot"));
    }

    #[test]
    fn test_disallow_everything() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /");
        assert!(!robots.is_allowed("/", "LeadBot"));
        assert!(!robots.is_allowed("/page", "LeadBot"));
    }

    #[test]
    fn test_disallow_private_prefix() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /private/");
        assert!(robots.is_allowed("https://ex.com/", "LeadBot"));
        assert!(robots.is_allowed("https://ex.com/about", "LeadBot"));
        assert!(!robots.is_allowed("https://ex.com/private/x", "LeadBot"));
    }

    #[test]
    fn test_allow_overrides_disallow() {
        let content = "User-agent: *\nDisallow: /private\nAllow: /private/public";
        let robots = ParsedRobots::from_content(content);
        assert!(!robots.is_allowed("/private", "LeadBot"));
        assert!(robots.is_allowed("/private/public", "LeadBot"));
    }

    #[test]
    fn test_specific_user_agent_group() {
        let content = "User-agent: BadBot\nDisallow: /\n\nUser-agent: *\nAllow: /";
        let robots = ParsedRobots::from_content(content);
        assert!(robots.is_allowed("/page", "LeadBot"));
        assert!(!robots.is_allowed("/page", "BadBot"));
    }

    #[test]
    fn test_garbage_and_empty_content_allow() {
        let robots = ParsedRobots::from_content("This is not robots.txt {{{");
        assert!(robots.is_allowed("/any/path", "LeadBot"));

        let robots = ParsedRobots::from_content("");
        assert!(robots.is_allow_all());
    }

    #[test]
    fn test_crawl_delay_wildcard() {
        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: 10\nDisallow: /admin");
        assert_eq!(robots.crawl_delay("LeadBot"), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_crawl_delay_specific_agent_wins() {
        let content = "User-agent: LeadBot\nCrawl-delay: 5\n\nUser-agent: *\nCrawl-delay: 10";
        let robots = ParsedRobots::from_content(content);
        assert_eq!(robots.crawl_delay("LeadBot"), Some(Duration::from_secs(5)));
        assert_eq!(robots.crawl_delay("OtherBot"), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_crawl_delay_does_not_leak_across_groups() {
        let content = "User-agent: LeadBot\nDisallow: /x\n\nUser-agent: OtherBot\nCrawl-delay: 5";
        let robots = ParsedRobots::from_content(content);
        assert_eq!(robots.crawl_delay("LeadBot"), None);
        assert_eq!(robots.crawl_delay("OtherBot"), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_crawl_delay_shared_group() {
        let robots = ParsedRobots::from_content("User-agent: BotA\nUser-agent: BotB\nCrawl-delay: 3");
        assert_eq!(robots.crawl_delay("BotA"), Some(Duration::from_secs(3)));
        assert_eq!(robots.crawl_delay("BotB"), Some(Duration::from_secs(3)));
        assert_eq!(robots.crawl_delay("BotC"), None);
    }

    #[test]
    fn test_crawl_delay_decimal_and_case() {
        let robots = ParsedRobots::from_content("user-agent: *\ncrawl-delay: 2.5");
        assert_eq!(robots.crawl_delay("LeadBot"), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_crawl_delay_absent() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /admin");
        assert_eq!(robots.crawl_delay("LeadBot"), None);
        assert_eq!(ParsedRobots::allow_all().crawl_delay("LeadBot"), None);
    }
}
