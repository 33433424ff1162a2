//! Category names, short tab labels, and the legacy query-parameter aliases.

use serde::Deserialize;

pub const ALL: &str = "All";

/// Canonical categories in tab order, with their short labels.
pub const CATEGORIES: [(&str, &str); 5] = [
    ("All", "All"),
    ("Awards", "Awards"),
    ("Team Futures", "Futures"),
    ("Stat Leaders", "Leaders"),
    ("Props", "Props"),
];

pub const DEFAULT_SPORTS: [&str; 5] = ["NFL", "NBA", "MLB", "PGA", "CFL"];

pub fn short_label(category: &str) -> &str {
    CATEGORIES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, short)| *short)
        .unwrap_or(category)
}

/// `/futures` query. `group`, `type`, and `tabLabel` are older names for `category`;
/// `subtype` is the older name for `market`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ViewQuery {
    pub sport: Option<String>,
    pub category: Option<String>,
    pub group: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(rename = "tabLabel")]
    pub tab_label: Option<String>,
    pub market: Option<String>,
    pub subtype: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub sport: String,
    pub category: String,
    pub market: String,
}

fn first_non_empty<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .filter_map(|c| c.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
}

pub fn coerce_sport(raw: Option<&str>) -> String {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.to_uppercase(),
        None => "NFL".to_string(),
    }
}

/// Case-insensitive match against the canonical names and short labels; anything
/// else is `All`.
pub fn coerce_category(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return ALL.to_string();
    };
    CATEGORIES
        .iter()
        .find(|(name, short)| name.eq_ignore_ascii_case(raw) || short.eq_ignore_ascii_case(raw))
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| ALL.to_string())
}

impl ViewQuery {
    pub fn view(&self) -> View {
        View {
            sport: coerce_sport(self.sport.as_deref()),
            category: coerce_category(first_non_empty(&[
                &self.category,
                &self.group,
                &self.kind,
                &self.tab_label,
            ])),
            market: first_non_empty(&[&self.market, &self.subtype])
                .unwrap_or_default()
                .to_string(),
        }
    }
}

impl View {
    pub fn new(sport: &str, category: &str, market: &str) -> Self {
        Self {
            sport: coerce_sport(Some(sport)),
            category: coerce_category(Some(category)),
            market: market.trim().to_string(),
        }
    }

    /// `/futures?...` path for this view; the market is omitted when empty.
    pub fn page_path(&self) -> String {
        let mut pairs = vec![("sport", self.sport.as_str()), ("category", self.category.as_str())];
        if !self.market.is_empty() {
            pairs.push(("market", self.market.as_str()));
        }
        let qs: Vec<String> = pairs
            .into_iter()
            .map(|(k, v)| format!("{k}={}", encode_component(v)))
            .collect();
        format!("/futures?{}", qs.join("&"))
    }

    /// Element that holds this view once the page has rendered it.
    pub fn modal_selector(&self) -> String {
        format!("#futures-modal[data-active-category=\"{}\"]", self.category)
    }
}

/// Percent-encode everything outside the URL-safe set.
pub fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_and_defaults() {
        let q = ViewQuery {
            kind: Some("stat leaders".into()),
            subtype: Some("Passing Yards".into()),
            ..Default::default()
        };
        assert_eq!(
            q.view(),
            View { sport: "NFL".into(), category: "Stat Leaders".into(), market: "Passing Yards".into() }
        );

        let q = ViewQuery { sport: Some("nba".into()), category: Some("Futures".into()), ..Default::default() };
        assert_eq!(q.view().category, "Team Futures");
        assert_eq!(q.view().sport, "NBA");

        assert_eq!(coerce_category(Some("Parlays")), "All");
        assert_eq!(short_label("Stat Leaders"), "Leaders");
    }

    #[test]
    fn page_path_and_selector() {
        let v = View::new("NFL", "Team Futures", "");
        assert_eq!(v.page_path(), "/futures?sport=NFL&category=Team%20Futures");
        assert_eq!(v.modal_selector(), "#futures-modal[data-active-category=\"Team Futures\"]");

        let v = View::new("nfl", "awards", "MVP & OPOY");
        assert_eq!(v.page_path(), "/futures?sport=NFL&category=Awards&market=MVP%20%26%20OPOY");
    }
}
