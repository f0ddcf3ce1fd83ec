use std::sync::OnceLock;

use regex::{Captures, Regex};

/// A single `{{ env.VAR }}` or `{{ env.VAR | default("x") }}` occurrence
struct Placeholder<'a> {
    key: &'a str,
    default: Option<&'a str>,
}

impl<'a> Placeholder<'a> {
    fn from_captures(captures: &Captures<'a>) -> Option<Self> {
        Some(Self {
            key: captures.get(1)?.as_str(),
            default: captures.get(2).map(|m| m.as_str()),
        })
    }

    fn resolve(&self) -> Result<String, String> {
        let Some(var_name) = self.key.strip_prefix("env.").filter(|name| !name.contains('.')) else {
            return Err(format!("only variables scoped with 'env.' are supported: `{}`", self.key));
        };

        match (std::env::var(var_name), self.default) {
            (Ok(value), _) => Ok(value),
            (Err(_), Some(default)) => Ok(default.to_owned()),
            (Err(_), None) => Err(format!("environment variable not found: `{var_name}`")),
        }
    }
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r#"\{\{\s*([a-zA-Z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#).expect("must be valid regex")
    })
}

/// Expand `{{ env.VAR }}` placeholders in raw TOML text
///
/// `{{ env.VAR | default("fallback") }}` substitutes the fallback when the
/// variable is unset. Comment lines are copied through untouched so a
/// commented-out secret never has to exist in the environment.
pub fn expand_env(input: &str) -> Result<String, String> {
    let mut output = String::with_capacity(input.len());

    for line in input.split_inclusive('\n') {
        if line.trim_start().starts_with('#') {
            output.push_str(line);
            continue;
        }

        let mut last_end = 0;
        for captures in placeholder_re().captures_iter(line) {
            let Some(whole) = captures.get(0) else { continue };
            let Some(placeholder) = Placeholder::from_captures(&captures) else {
                continue;
            };

            output.push_str(&line[last_end..whole.start()]);
            output.push_str(&placeholder.resolve()?);
            last_end = whole.end();
        }
        output.push_str(&line[last_end..]);
    }

    Ok(output)
}
