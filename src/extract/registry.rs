//! Registry link derivation for dependency rows.

/// Builds a link to the package on its registry.
///
/// Rules by datasource:
/// - `npm`: `<base>/<name>`
/// - `github-tags` / `github-releases`: the base when it already names the
///   package, else `https://github.com/<name>`
/// - `node-version`: the base unchanged
/// - anything else: the base when it already names the package, else
///   `<base>/<name>`
///
/// No base or no name means no link.
pub fn package_url(base: Option<&str>, name: &str, datasource: &str) -> Option<String> {
    let base = base.filter(|b| !b.is_empty())?;
    if name.is_empty() {
        return None;
    }

    let url = match datasource {
        "npm" => format!("{base}/{name}"),
        "github-tags" | "github-releases" => {
            if base.contains(name) {
                base.to_string()
            } else {
                format!("https://github.com/{name}")
            }
        }
        "node-version" => base.to_string(),
        _ => {
            if base.contains(name) {
                base.to_string()
            } else {
                format!("{base}/{name}")
            }
        }
    };
    Some(url)
}
