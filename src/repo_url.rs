use regex::Regex;
use std::sync::OnceLock;

struct HostPattern {
    regex: Regex,
    // Host to clone from; `None` means take it from the first capture group.
    host: Option<&'static str>,
}

fn patterns() -> &'static [HostPattern] {
    static PATTERNS: OnceLock<Vec<HostPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            HostPattern {
                regex: Regex::new(r"github\.com/([-\w]+)/([-\w]+)").unwrap(),
                host: Some("github.com"),
            },
            HostPattern {
                regex: Regex::new(r"gitlab\.com/([-\w]+)/([-\w]+)").unwrap(),
                host: Some("gitlab.com"),
            },
            HostPattern {
                regex: Regex::new(r"(bitbucket\.(?:org|com))/([-\w]+)/([-\w]+)").unwrap(),
                host: None,
            },
        ]
    })
}

/// Turn a free-form "source repository" string into a clone URL.
///
/// Only GitHub, GitLab and Bitbucket web URLs are recognized; anything else
/// returns `None` and the entry is fetched as an archive.
pub fn normalize_repo_url(source_repo: &str) -> Option<String> {
    for pattern in patterns() {
        let Some(caps) = pattern.regex.captures(source_repo) else {
            continue;
        };
        let url = match pattern.host {
            Some(host) => format!("https://{host}/{}/{}.git", &caps[1], &caps[2]),
            None => format!("https://{}/{}/{}.git", &caps[1], &caps[2], &caps[3]),
        };
        return Some(url);
    }
    None
}
