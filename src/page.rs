//! Server-rendered futures page: sport and category tabs, the `#futures-modal`
//! capture target, bet rows, the add-bet form, and the share button.

use std::collections::{BTreeMap, BTreeSet};

use bet_store::{Bet, BetBook};

use crate::logos::team_logo;
use crate::naming::{short_label, View, ALL, CATEGORIES, DEFAULT_SPORTS};

const PAGE_STYLE: &str = "<style>:root{--bg:#0b0d10;--card:#15181d;--ink:#f2f4f7;--muted:#8b949e;--line:rgba(255,255,255,.08);--accent:#f5c542}*{box-sizing:border-box}body{margin:0;background:var(--bg);color:var(--ink);font-family:\"Inter\",\"Segoe UI\",sans-serif;min-height:100vh}.shell{max-width:640px;margin:0 auto;padding:24px 14px}.tabs{display:flex;flex-wrap:wrap;gap:6px;justify-content:center;margin-bottom:12px}.tab{padding:5px 12px;border-radius:999px;border:1px solid rgba(255,255,255,.2);color:var(--ink);text-decoration:none;font-size:.82rem}.tab.active{background:#fff;color:#000;border-color:#fff}#futures-modal{background:var(--card);border:1px solid var(--line);border-radius:18px;padding:18px;box-shadow:0 12px 34px rgba(0,0,0,.45)}.modal-head{display:flex;justify-content:space-between;align-items:baseline;margin-bottom:10px}.modal-head h1{font-size:1.1rem;margin:0}.modal-head span{color:var(--muted);font-size:.78rem}.group h2{font-size:.72rem;letter-spacing:.06em;text-transform:uppercase;color:var(--muted);margin:14px 0 6px}.row{display:flex;align-items:center;gap:10px;padding:7px 8px;border-radius:8px}.row:hover{background:rgba(255,255,255,.04)}.row.logo{position:relative;overflow:hidden;background-size:cover;background-repeat:no-repeat}.row.logo::before{content:\"\";position:absolute;inset:0;background:rgba(21,24,29,.9)}.row.logo>*{position:relative}.row img{width:32px;height:32px;border-radius:6px;object-fit:cover}.who{flex:1;min-width:0}.who b{display:block;font-size:.9rem;white-space:nowrap;overflow:hidden;text-overflow:ellipsis}.who small{color:var(--muted);font-size:.72rem}.odds{font-weight:700;color:var(--accent);font-size:.9rem}.book{color:var(--muted);font-size:.72rem;min-width:28px;text-align:right}.del{background:none;border:none;color:var(--muted);cursor:pointer;font-size:.9rem}.empty{color:var(--muted);text-align:center;padding:24px 0;font-size:.85rem}.panel{margin-top:16px;background:var(--card);border:1px solid var(--line);border-radius:14px;padding:14px}.panel form{display:grid;grid-template-columns:repeat(2,1fr);gap:8px}.panel input,.panel select{background:#0f1115;border:1px solid var(--line);color:var(--ink);border-radius:8px;padding:7px 9px;font-size:.82rem}.panel button{grid-column:1/-1;padding:8px;border-radius:8px;border:none;background:var(--accent);color:#000;font-weight:700;cursor:pointer}.actions{display:flex;gap:10px;align-items:center;margin-top:12px}.actions button{padding:7px 14px;border-radius:8px;border:1px solid rgba(255,255,255,.2);background:#1f242b;color:var(--ink);cursor:pointer}#status{font-size:.8rem;color:var(--muted)}</style>";

const PAGE_SCRIPT: &str = r#"<script>
(function () {
  const status = document.getElementById('status');
  function say(msg) { if (status) status.textContent = msg; }

  const form = document.getElementById('add-bet');
  if (form) {
    form.addEventListener('submit', async function (ev) {
      ev.preventDefault();
      const body = {};
      new FormData(form).forEach(function (v, k) { if (String(v).trim() !== '') body[k] = v; });
      try {
        const res = await fetch('/api/bets', {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify(body)
        });
        if (!res.ok) throw new Error(String(res.status));
        window.location.reload();
      } catch (e) {
        say('Error saving bet');
      }
    });
  }

  document.querySelectorAll('button.del').forEach(function (btn) {
    btn.addEventListener('click', async function () {
      const path = ['/api/bets', btn.dataset.sport, btn.dataset.category, btn.dataset.id]
        .map(function (p, i) { return i === 0 ? p : encodeURIComponent(p); })
        .join('/');
      try {
        const res = await fetch(path, { method: 'DELETE' });
        if (!res.ok) throw new Error(String(res.status));
        const row = btn.closest('.row');
        if (row) row.remove();
      } catch (e) {
        say('Error deleting bet');
      }
    });
  });

  const share = document.getElementById('share');
  if (share) {
    share.addEventListener('click', async function () {
      share.disabled = true;
      say('Sharing…');
      try {
        const res = await fetch('/api/share', {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify({
            sport: share.dataset.sport,
            category: share.dataset.category,
            market: share.dataset.market || undefined
          })
        });
        if (!res.ok) throw new Error(String(res.status));
        say('Shared to Discord');
      } catch (e) {
        say('Share failed');
      } finally {
        share.disabled = false;
      }
    });
  }
})();
</script>"#;

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn view_href(sport: &str, category: &str, market: &str) -> String {
    View {
        sport: sport.to_string(),
        category: category.to_string(),
        market: market.to_string(),
    }
    .page_path()
}

/// `(category, bets)` groups visible in `view`, canonical categories first.
pub fn visible_groups<'a>(book: &'a BetBook, view: &View) -> Vec<(&'a str, Vec<&'a Bet>)> {
    let Some(categories) = book.0.get(&view.sport) else {
        return Vec::new();
    };

    let mut names: Vec<&'a str> = categories.keys().map(String::as_str).collect();
    names.sort_by_key(|name| {
        CATEGORIES
            .iter()
            .position(|(c, _)| c == name)
            .unwrap_or(CATEGORIES.len())
    });

    names
        .into_iter()
        .filter(|name| view.category == ALL || *name == view.category)
        .filter_map(|name| {
            let bets: Vec<&Bet> = categories[name]
                .iter()
                .filter(|b| view.market.is_empty() || b.market.eq_ignore_ascii_case(&view.market))
                .collect();
            (!bets.is_empty()).then_some((name, bets))
        })
        .collect()
}

fn render_row(out: &mut String, bet: &Bet, headshots: &BTreeMap<String, String>) {
    match team_logo(&bet.sport, &bet.selection) {
        Some(logo) => out.push_str(&format!(
            "<div class=\"row logo\" style=\"background-image:url('{}');background-position:center 50%\">",
            escape_html(&logo)
        )),
        None => out.push_str("<div class=\"row\">"),
    }
    if bet.is_player_bet() {
        if let Some(url) = headshots.get(&bet.selection) {
            out.push_str(&format!("<img src=\"{}\" alt=\"\">", escape_html(url)));
        }
    }

    let mut detail: Vec<String> = Vec::new();
    if !bet.market.is_empty() {
        detail.push(bet.market.clone());
    }
    if let Some(line) = bet.line {
        detail.push(format!("Line {line}"));
    }
    if !bet.notes.is_empty() {
        detail.push(bet.notes.clone());
    }

    out.push_str(&format!(
        "<div class=\"who\"><b>{}</b><small>{}</small></div>",
        escape_html(&bet.selection),
        escape_html(&detail.join(" · "))
    ));
    out.push_str(&format!("<span class=\"odds\">{}</span>", escape_html(&bet.odds_american)));
    out.push_str(&format!("<span class=\"book\">{}</span>", escape_html(&bet.book)));
    out.push_str(&format!(
        "<button class=\"del\" title=\"Delete\" data-sport=\"{}\" data-category=\"{}\" data-id=\"{}\">✕</button>",
        escape_html(&bet.sport),
        escape_html(&bet.category),
        escape_html(&bet.id)
    ));
    out.push_str("</div>\n");
}

fn render_add_form(out: &mut String, view: &View) {
    let category = if view.category == ALL { "Awards" } else { view.category.as_str() };

    out.push_str("<section class=\"panel\"><form id=\"add-bet\">");
    out.push_str(&format!(
        "<input name=\"sport\" placeholder=\"Sport\" value=\"{}\" required>",
        escape_html(&view.sport)
    ));
    out.push_str("<select name=\"category\">");
    for (name, _) in CATEGORIES.iter().skip(1) {
        let selected = if *name == category { " selected" } else { "" };
        out.push_str(&format!("<option value=\"{name}\"{selected}>{name}</option>"));
    }
    out.push_str("</select>");
    out.push_str(&format!(
        "<input name=\"market\" placeholder=\"Market\" value=\"{}\">",
        escape_html(&view.market)
    ));
    out.push_str("<input name=\"selection\" placeholder=\"Player or team\" required>");
    out.push_str("<input name=\"odds_american\" placeholder=\"Odds (+450)\" required>");
    out.push_str("<input name=\"line\" placeholder=\"Line\" inputmode=\"decimal\">");
    out.push_str("<input name=\"book\" placeholder=\"Book (FD, DK)\" required>");
    out.push_str("<input name=\"notes\" placeholder=\"Notes\">");
    out.push_str("<button type=\"submit\">Add bet</button>");
    out.push_str("</form></section>\n");
}

pub fn render_futures_page(view: &View, book: &BetBook, headshots: &BTreeMap<String, String>) -> String {
    let sports: BTreeSet<&str> = DEFAULT_SPORTS
        .iter()
        .copied()
        .chain(book.0.keys().map(String::as_str))
        .chain(std::iter::once(view.sport.as_str()))
        .collect();

    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str(&format!("<title>{} Futures</title>\n", escape_html(&view.sport)));
    out.push_str(PAGE_STYLE);
    out.push_str("\n</head><body><main class=\"shell\">\n");

    out.push_str("<nav class=\"tabs\" id=\"sport-tabs\">");
    for sport in &sports {
        let active = if *sport == view.sport { " active" } else { "" };
        out.push_str(&format!(
            "<a class=\"tab{active}\" href=\"{}\">{}</a>",
            escape_html(&view_href(sport, &view.category, "")),
            escape_html(sport)
        ));
    }
    out.push_str("</nav>\n<nav class=\"tabs\" id=\"category-tabs\">");
    for (name, _) in CATEGORIES {
        let active = if name == view.category { " active" } else { "" };
        out.push_str(&format!(
            "<a class=\"tab{active}\" href=\"{}\">{}</a>",
            escape_html(&view_href(&view.sport, name, "")),
            escape_html(short_label(name))
        ));
    }
    out.push_str("</nav>\n");

    out.push_str(&format!(
        "<section id=\"futures-modal\" data-active-category=\"{}\" data-sport=\"{}\">",
        escape_html(&view.category),
        escape_html(&view.sport)
    ));
    let title = if view.market.is_empty() {
        format!("{} {}", view.sport, short_label(&view.category))
    } else {
        format!("{} {} · {}", view.sport, short_label(&view.category), view.market)
    };
    let groups = visible_groups(book, view);
    let count: usize = groups.iter().map(|(_, bets)| bets.len()).sum();
    out.push_str(&format!(
        "<div class=\"modal-head\"><h1>{}</h1><span>{} bet{}</span></div>\n",
        escape_html(&title),
        count,
        if count == 1 { "" } else { "s" }
    ));

    if groups.is_empty() {
        out.push_str("<div class=\"empty\">No bets yet</div>\n");
    }
    for (category, bets) in &groups {
        out.push_str(&format!(
            "<div class=\"group\" data-category=\"{}\"><h2>{}</h2>\n",
            escape_html(category),
            escape_html(short_label(category))
        ));
        for bet in bets {
            render_row(&mut out, bet, headshots);
        }
        out.push_str("</div>\n");
    }
    out.push_str("</section>\n");

    out.push_str(&format!(
        "<div class=\"actions\"><button id=\"share\" data-sport=\"{}\" data-category=\"{}\" data-market=\"{}\">Share to Discord</button><span id=\"status\"></span></div>\n",
        escape_html(&view.sport),
        escape_html(&view.category),
        escape_html(&view.market)
    ));
    render_add_form(&mut out, view);

    out.push_str(PAGE_SCRIPT);
    out.push_str("</main></body></html>\n");
    out
}

/// Query-string-safe link to the page, used in logs and the share flow.
pub fn absolute_page_url(base: &str, view: &View) -> String {
    format!("{}{}", base.trim_end_matches('/'), view.page_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bet(id: &str, category: &str, selection: &str, market: &str) -> Bet {
        Bet {
            id: id.into(),
            sport: "NFL".into(),
            category: category.into(),
            market: market.into(),
            selection: selection.into(),
            odds_american: "+450".into(),
            line: None,
            book: "FD".into(),
            notes: String::new(),
            created_at: 1,
        }
    }

    fn book() -> BetBook {
        let mut b = BetBook::new();
        b.insert_newest(bet("a", "Awards", "Patrick Mahomes", "MVP"), 100);
        b.insert_newest(bet("b", "Awards", "Josh Allen", "OPOY"), 100);
        b.insert_newest(bet("c", "Team Futures", "Chiefs <KC>", "Super Bowl"), 100);
        b
    }

    #[test]
    fn modal_carries_active_category() {
        let view = View::new("NFL", "Awards", "");
        let html = render_futures_page(&view, &book(), &BTreeMap::new());
        assert!(html.contains("id=\"futures-modal\" data-active-category=\"Awards\""));
        assert!(html.contains("Patrick Mahomes"));
        assert!(!html.contains("Chiefs"));
    }

    #[test]
    fn all_view_groups_in_tab_order_and_escapes() {
        let view = View::new("NFL", "All", "");
        let b = book();
        let groups = visible_groups(&b, &view);
        assert_eq!(groups.iter().map(|(c, _)| *c).collect::<Vec<_>>(), vec!["Awards", "Team Futures"]);

        let html = render_futures_page(&view, &book(), &BTreeMap::new());
        assert!(html.contains("Chiefs &lt;KC&gt;"));
    }

    #[test]
    fn market_filter_and_headshots() {
        let view = View::new("NFL", "Awards", "mvp");
        let b = book();
        let groups = visible_groups(&b, &view);
        assert_eq!(groups[0].1.len(), 1);

        let mut shots = BTreeMap::new();
        shots.insert("Patrick Mahomes".to_string(), "https://img/pm.png".to_string());
        let html = render_futures_page(&view, &book(), &shots);
        assert!(html.contains("<img src=\"https://img/pm.png\""));
        assert!(!html.contains("Josh Allen"));
    }

    #[test]
    fn team_rows_get_logo_background() {
        let mut b = BetBook::new();
        b.insert_newest(bet("t", "Team Futures", "Kansas City Chiefs", "Super Bowl"), 100);
        b.insert_newest(bet("p", "Awards", "Patrick Mahomes", "MVP"), 100);
        let html = render_futures_page(&View::new("NFL", "All", ""), &b, &BTreeMap::new());

        assert!(html.contains(
            "<div class=\"row logo\" style=\"background-image:url('https://a.espncdn.com/i/teamlogos/nfl/500/kc.png');background-position:center 50%\">"
        ));
        assert_eq!(html.matches("class=\"row logo\"").count(), 1);
        assert!(html.contains(".row.logo::before"));
    }
}
