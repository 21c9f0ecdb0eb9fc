use std::collections::HashSet;

/// Paths the gate always passes through.
///
/// A pattern ending in `*` matches every path starting with the text before
/// it; any other pattern matches only that exact path.
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    exact: HashSet<String>,
    prefixes: Vec<String>,
}

impl IgnoreList {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            match pattern.strip_suffix('*') {
                Some(prefix) => list.prefixes.push(prefix.to_string()),
                None => {
                    list.exact.insert(pattern.to_string());
                }
            }
        }
        list
    }

    pub fn matches(&self, path: &str) -> bool {
        self.exact.contains(path) || self.prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_prefix_patterns() {
        let list = IgnoreList::new(["/status", "/static/*"]);

        assert!(list.matches("/status"));
        assert!(!list.matches("/status/extra"));
        assert!(list.matches("/static/app.css"));
        assert!(list.matches("/static/"));
        assert!(!list.matches("/api/items"));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_lone_star_matches_everything() {
        let list = IgnoreList::new(["*"]);
        assert!(list.matches("/anything"));
    }
}
