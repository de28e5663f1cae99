//! Repository browser URL helpers
//!
//! Browser URLs look like `[/reponame]/trunk|tags|branches/...` optionally
//! followed by a revision, either as a `?rev=N` query or an `@N` suffix.

use once_cell::sync::Lazy;
use regex::Regex;
use url::{Url, form_urlencoded};

static REPO_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:/(\w+))?(/(?:trunk|tags|branches))(/.+)").expect("valid regex")
});
static REPO_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/(?:(\w+)/)?(?:trunk|tags|branches)(?:/.*)?").expect("valid regex")
});
static BROWSER_TRUNK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/browser/(?:[^/]+/)?(trunk)(/.*)?$").expect("valid regex"));
static BROWSER_BRANCH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/browser/(?:[^/]+/)?(branches)/(B\d+)").expect("valid regex"));
static BROWSER_TAGS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/browser/(?:[^/]+/)?(tags)/(versions|milestones)/").expect("valid regex")
});
static BROWSER_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/tracs/\w+/browser(/[^?#]*)?").expect("valid regex"));
static BRANCH_IN_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/branches/(B\d+)/").expect("valid regex"));
static BRANCH_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"B\d+").expect("valid regex"));

/// `url` without its revision (query string or `@rev` suffix)
pub fn strip_revision(url: &str) -> String {
    if let Some(index) = url.rfind('?') {
        url[..index].to_string()
    } else if let Some(index) = url.rfind('@') {
        url[..index].to_string()
    } else {
        url.to_string()
    }
}

/// Revision carried by `url`, empty when none (HEAD)
pub fn revision(url: &str) -> String {
    if let Some(index) = url.rfind('?') {
        query_arg(&url[index + 1..], "rev").unwrap_or_default()
    } else if let Some(index) = url.rfind('@') {
        url[index + 1..].to_string()
    } else {
        String::new()
    }
}

/// Value of `name` in a query string
pub fn query_arg(query: &str, name: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Path inside the repository, without the repository name
///
/// `/repo/trunk/doc/x` → `/trunk/doc/x`; `None` outside trunk/tags/branches.
pub fn repo_path(url: &str) -> Option<String> {
    REPO_PATH
        .captures(url)
        .map(|c| format!("{}{}", &c[2], &c[3]))
}

/// Repository name of a multi-repository URL, `None` for the default repository
pub fn repository_name(url: &str) -> Option<String> {
    REPO_NAME
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Where a browser request points: `trunk` (+ sub path), a branch, or tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserLocation {
    pub root: String,
    pub detail: Option<String>,
}

/// Classify a browser `path_info`
pub fn browser_path(path_info: &str) -> Option<BrowserLocation> {
    [&*BROWSER_TRUNK, &*BROWSER_BRANCH, &*BROWSER_TAGS]
        .iter()
        .find_map(|re| re.captures(path_info))
        .map(|c| BrowserLocation {
            root: c[1].to_string(),
            detail: c.get(2).map(|m| m.as_str().to_string()),
        })
}

/// Repository path of a browser link, `/` for the browser root
pub fn repo_href(href: &str) -> String {
    BROWSER_HREF
        .captures(href)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|path| !path.is_empty())
        .unwrap_or("/")
        .to_string()
}

/// Branch (`B<n>`) an URL lives on, `trunk` otherwise, `None` for no URL
pub fn branch_of(url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }
    Some(
        BRANCH_IN_URL
            .captures(url)
            .map_or_else(|| "trunk".to_string(), |c| c[1].to_string()),
    )
}

pub fn is_branch_name(name: &str) -> bool {
    BRANCH_NAME.is_match(name)
}

/// Append non-empty query parameters to `url`
pub fn add_params(url: &str, params: &[(&str, &str)]) -> String {
    let mut out = url.to_string();
    if out.is_empty() {
        return out;
    }
    for (name, value) in params.iter().filter(|(_, value)| !value.is_empty()) {
        out.push(if out.contains('?') { '&' } else { '?' });
        out.push_str(name);
        out.push('=');
        out.push_str(value);
    }
    out
}

/// Browser URL for `url` (repository root when `None`)
///
/// The query string of `url` is kept; `caller` is form-encoded.
pub fn browser_url(
    base_url: &str,
    url: Option<&str>,
    caller: Option<&str>,
    admin_branch: Option<&str>,
) -> String {
    let mut out = format!("{base_url}/browser{}", url.unwrap_or(""));
    if let Some(caller) = caller {
        let encoded: String = form_urlencoded::byte_serialize(caller.as_bytes()).collect();
        out = add_params(&out, &[("caller", &encoded)]);
    }
    if let Some(branch) = admin_branch {
        out = add_params(&out, &[("admin_branch", branch)]);
    }
    out
}

/// Raw content URL of `url` at `revision`
pub fn raw_browser_url(base_url: &str, url: &str, revision: &str) -> String {
    format!("{base_url}/browser{url}?format=raw&rev={revision}")
}

/// Revision of the form document linked from a ticket description
pub fn revision_from_description(summary: &str, description: &str) -> String {
    if description.is_empty() {
        return String::new();
    }
    let pattern = format!(r".+{}\?rev=(\d+) ", regex::escape(summary));
    Regex::new(&pattern)
        .ok()
        .and_then(|re| re.captures(description).map(|c| c[1].to_string()))
        .unwrap_or_default()
}

pub fn path_to_linux(path: &str) -> String {
    path.replace('\\', "/").trim_matches('/').to_string()
}

pub fn path_to_windows(path: &str) -> String {
    path.replace('/', "\\").trim_matches('\\').to_string()
}

/// Names derived from the environment base URL
///
/// `https://host/tracs/E05058SB` → env `E05058SB`, program `E05058`.
/// Sandbox (`SB`) and `FF` environments share their program's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramData {
    pub base_path: String,
    pub env_name: String,
    pub program_name: String,
}

impl ProgramData {
    pub fn from_base_url(base_url: &str) -> Self {
        let env_name = base_url
            .rfind('/')
            .map_or(base_url, |index| &base_url[index + 1..])
            .to_string();
        let program_name = if (env_name != "SB" && env_name.ends_with("SB")) || env_name.ends_with("FF")
        {
            env_name[..env_name.len() - 2].to_string()
        } else {
            env_name.clone()
        };
        Self {
            base_path: base_url.to_string(),
            env_name,
            program_name,
        }
    }
}

/// Host (and port, if any) of `base_url`, `None` unless it uses `scheme`
pub fn hostname(scheme: &str, base_url: &str) -> Option<String> {
    let url = Url::parse(base_url).ok().filter(|url| url.scheme() == scheme)?;
    let host = url.host_str()?;
    Some(url.port().map_or_else(|| host.to_string(), |port| format!("{host}:{port}")))
}

/// Full repository URL of a browser path
///
/// Multi-repository paths (`has_reponame`) already carry the repository
/// name, which replaces the environment name of the base URL.
pub fn repository_url(base_url: &str, url: &str, has_reponame: bool) -> String {
    let mut base = base_url.replacen("/tracs", "", 1);
    if has_reponame {
        if let Some(index) = base.rfind('/') {
            base.truncate(index);
        }
    }
    format!("{base}{url}")
}

/// `file://` URL of a browser path in a local repository directory
pub fn local_repository_url(repository_dir: &str, url: &str) -> String {
    format!("file://{repository_dir}{url}")
}

/// Every repository path from the base (`/trunk`) down to `url` itself
pub fn ancestor_paths(url: &str) -> Vec<String> {
    let mut paths = Vec::new();
    let mut path = url;
    while REPO_NAME.is_match(path) {
        paths.push(path.to_string());
        match path.rfind('/') {
            Some(index) => path = &path[..index],
            None => break,
        }
    }
    paths.reverse();
    paths
}
