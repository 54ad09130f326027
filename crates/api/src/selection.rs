use std::sync::Mutex;

/// Query keys used while a report metric is drilled into.
pub const REPORT_TYPE_KEY: &str = "reportType";
pub const REPORT_DATE_KEY: &str = "reportDate";

/// Navigable state (a URL query in a browser) mirroring the current selection,
/// e.g. `?user=<id>`.
pub trait SelectionMirror: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    /// `None` removes the key.
    fn set(&self, key: &str, value: Option<&str>);
}

/// In-memory query string.
#[derive(Debug, Default)]
pub struct QuerySelection {
    pairs: Mutex<Vec<(String, String)>>,
}

impl QuerySelection {
    pub fn new() -> Self { Self::default() }

    /// Parse `a=1&b=2` (a leading `?` is ignored). Later keys win.
    pub fn parse(query: &str) -> Self {
        let q = Self::new();
        for part in query.trim_start_matches('?').split('&').filter(|p| !p.is_empty()) {
            let (k, v) = part.split_once('=').unwrap_or((part, ""));
            q.set(k, Some(v));
        }
        q
    }

    pub fn to_query(&self) -> String {
        self.pairs
            .lock()
            .map(|p| p.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&"))
            .unwrap_or_default()
    }
}

impl SelectionMirror for QuerySelection {
    fn get(&self, key: &str) -> Option<String> {
        let pairs = self.pairs.lock().ok()?;
        pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    fn set(&self, key: &str, value: Option<&str>) {
        let Ok(mut pairs) = self.pairs.lock() else { return };
        match (pairs.iter().position(|(k, _)| k == key), value) {
            (Some(i), Some(v)) => pairs[i].1 = v.to_string(),
            (None, Some(v)) => pairs.push((key.to_string(), v.to_string())),
            (Some(i), None) => {
                pairs.remove(i);
            }
            (None, None) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_round_trip() {
        let q = QuerySelection::parse("?tab=users&user=2");
        assert_eq!(q.get("user").as_deref(), Some("2"));
        q.set("user", None);
        q.set("ticket", Some("T1"));
        assert_eq!(q.to_query(), "tab=users&ticket=T1");
    }
}
