//! Additive Content-Security-Policy builder.

use indexmap::IndexMap;
use std::fmt;

/// Directive name -> source expressions, in discovery order.
///
/// Sources are only ever appended; nothing is removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    directives: IndexMap<String, Vec<String>>,
}

impl Policy {
    /// Parse a policy string such as `default-src 'self'; img-src *`.
    ///
    /// Directive names are lower-cased. A repeated directive merges into the
    /// first occurrence.
    pub fn parse(policy: &str) -> Self {
        let mut parsed = Self::default();
        for directive in policy.split(';') {
            let mut tokens = directive.split_whitespace();
            let Some(name) = tokens.next() else {
                continue;
            };
            parsed.directives.entry(name.to_ascii_lowercase()).or_default();
            for source in tokens {
                parsed.add(name, source);
            }
        }
        parsed
    }

    /// Append `source` to `directive` unless it is already listed.
    ///
    /// Returns `true` when the policy changed.
    pub fn add(&mut self, directive: &str, source: &str) -> bool {
        let sources = self
            .directives
            .entry(directive.to_ascii_lowercase())
            .or_default();
        if sources.iter().any(|s| s == source) {
            return false;
        }
        sources.push(source.to_string());
        true
    }

    pub fn sources(&self, directive: &str) -> &[String] {
        self.directives
            .get(&directive.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn directives(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.directives
            .iter()
            .map(|(name, sources)| (name.as_str(), sources.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (name, sources)) in self.directives.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            f.write_str(name)?;
            for source in sources {
                write!(f, " {source}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_and_display() {
        let policy = Policy::parse("default-src 'self' data: gap:; style-src 'self' 'unsafe-inline';");
        assert_eq!(policy.sources("default-src"), ["'self'", "data:", "gap:"]);
        assert_eq!(
            policy.to_string(),
            "default-src 'self' data: gap:; style-src 'self' 'unsafe-inline'"
        );
    }

    #[test]
    fn test_add_appends_new_directive_last() {
        let mut policy = Policy::parse("default-src 'self'");
        assert!(policy.add("script-src", "'self'"));
        assert!(policy.add("default-src", "ws:"));
        assert!(!policy.add("default-src", "ws:"));
        assert_eq!(
            policy.to_string(),
            "default-src 'self' ws:; script-src 'self'"
        );
    }

    #[test]
    fn test_empty_policy() {
        let policy = Policy::parse("");
        assert!(policy.is_empty());
        assert_eq!(policy.to_string(), "");
    }

    #[test]
    fn test_case_insensitive_directive_names() {
        let mut policy = Policy::parse("Script-Src 'self'");
        policy.add("script-src", "http://localhost:3000");
        assert_eq!(policy.to_string(), "script-src 'self' http://localhost:3000");
    }

    #[test]
    fn test_valueless_directive() {
        let policy = Policy::parse("upgrade-insecure-requests; default-src *");
        assert_eq!(policy.sources("upgrade-insecure-requests"), [] as [&str; 0]);
        assert_eq!(policy.to_string(), "upgrade-insecure-requests; default-src *");
    }

    fn directive() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["default-src", "script-src", "style-src", "img-src"])
            .prop_map(str::to_string)
    }

    fn source() -> impl Strategy<Value = String> {
        "[a-z:'*.]{1,12}".prop_filter("no separators", |s| !s.contains(';'))
    }

    proptest! {
        #[test]
        fn prop_add_never_removes(
            initial in prop::collection::vec((directive(), prop::collection::vec(source(), 0..4)), 0..4),
            additions in prop::collection::vec((directive(), source()), 0..8),
        ) {
            let text = initial
                .iter()
                .map(|(d, s)| format!("{d} {}", s.join(" ")))
                .collect::<Vec<_>>()
                .join("; ");
            let before = Policy::parse(&text);
            let mut after = before.clone();
            for (d, s) in &additions {
                after.add(d, s);
            }
            // A second round of the same additions changes nothing
            let mut again = Policy::parse(&after.to_string());
            for (d, s) in &additions {
                prop_assert!(!again.add(d, s));
            }

            for (name, sources) in before.directives() {
                for s in sources {
                    prop_assert!(after.sources(name).contains(s));
                }
            }
            prop_assert_eq!(again, after);
        }
    }
}
