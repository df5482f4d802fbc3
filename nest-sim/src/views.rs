//! HTML rendering for the dashboard pages
//!
//! Pages are plain server-rendered HTML with a few lines of inline JS that
//! resubmit the simulation form whenever a field changes, so every edit
//! triggers a full recomputation on the server.

use nest_common::{Simulation, Tier};

use crate::session::Page;

const LOGO_URL: &str = "https://i.postimg.cc/85nTdNSr/Nest-Logo2.jpg";

const STYLE: &str = r#"
        * { box-sizing: border-box; }
        body {
            font-family: system-ui, -apple-system, sans-serif;
            max-width: 1100px;
            margin: 0 auto;
            padding: 20px;
            color: #222;
        }
        body.login { background: #000; color: #fff; }
        .logo { text-align: center; }
        h1 { text-align: center; }
        nav { display: flex; gap: 8px; margin: 20px 0; }
        nav form { flex: 1; }
        nav button, .button {
            width: 100%;
            padding: 10px;
            font-size: 16px;
            border-radius: 8px;
            background: #000;
            color: #fff;
            border: none;
            white-space: nowrap;
            cursor: pointer;
        }
        nav button:hover, .button:hover { background: #333; }
        nav button.active { background: #4a9eff; }
        .kpis {
            display: flex;
            justify-content: space-around;
            padding: 15px;
            background: #f0f2f6;
            border-radius: 10px;
            text-align: center;
        }
        .kpi-impressions { color: #2196F3; }
        .kpi-views { color: #FF9800; }
        .kpi-engagement { color: #E91E63; }
        .columns { display: flex; gap: 30px; margin-top: 20px; }
        .inputs { flex: 2; }
        .budget {
            flex: 1;
            background: #f0f2f6;
            padding: 20px;
            border-radius: 10px;
            text-align: center;
            align-self: flex-start;
        }
        .budget h1 { color: #4CAF50; }
        .tier-row { display: flex; gap: 10px; align-items: center; margin-bottom: 8px; }
        .tier-row label { width: 70px; font-weight: 600; }
        .tier-row input { flex: 3; padding: 8px; }
        .share {
            flex: 1;
            text-align: center;
            border: 1px solid #ddd;
            border-radius: 5px;
            padding: 8px;
            color: #555;
        }
        .error {
            background: #fdecea;
            color: #b71c1c;
            border: 1px solid #f5c6cb;
            border-radius: 8px;
            padding: 12px;
            margin: 15px 0;
        }
        .login-form { max-width: 400px; margin: 0 auto; }
        .login-form input { width: 100%; padding: 10px; margin-bottom: 15px; }
        .userbar { display: flex; justify-content: flex-end; gap: 10px; align-items: center; }
"#;

/// Escape text for HTML element and attribute content
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Whole number with thousands separators: 1234567.6 -> "1,234,568"
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rounded = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, digit) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if value < 0.0 && rounded != "0" {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Percentage with two decimals: 12.345 -> "12.35%"
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

/// Exact amount for a form field; `f64` Display round-trips through parsing
pub fn field_amount(value: f64) -> String {
    value.to_string()
}

/// Budget amount for display: whole numbers without decimals, otherwise two
/// decimals
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn document(title: &str, body_class: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{style}</style>
</head>
<body class="{body_class}">
{body}
</body>
</html>
"#,
        title = escape_html(title),
        style = STYLE,
        body_class = body_class,
        body = body,
    )
}

fn navigation(active: Page) -> String {
    let mut nav = String::from("<nav>\n");
    for page in Page::ALL {
        let class = if page == active { " class=\"active\"" } else { "" };
        nav.push_str(&format!(
            r#"    <form method="post" action="/navigate"><input type="hidden" name="page" value="{slug}"><button type="submit"{class}>{title}</button></form>
"#,
            slug = page.slug(),
            class = class,
            title = page.title(),
        ));
    }
    nav.push_str("</nav>\n");
    nav
}

/// Logo, user bar and navigation shared by every logged-in page
fn dashboard_document(active: Page, username: Option<&str>, content: &str) -> String {
    let body = format!(
        r#"<div class="userbar">
    <span>Signed in as <strong>{user}</strong></span>
    <form method="post" action="/logout"><button type="submit" class="button">Log out</button></form>
</div>
<div class="logo"><img src="{logo}" width="150" alt="Nest"></div>
<h3>Welcome To MBCS Optimize Tool</h3>
{nav}
<h1>{title}</h1>
{content}"#,
        user = escape_html(username.unwrap_or("")),
        logo = LOGO_URL,
        nav = navigation(active),
        title = active.title(),
        content = content,
    );
    document(&format!("{} - Nest", active.title()), "", &body)
}

/// Login form, optionally with an error banner
pub fn login_page(error: Option<&str>) -> String {
    let banner = error
        .map(|message| format!(r#"<div class="error">{}</div>"#, escape_html(message)))
        .unwrap_or_default();

    let body = format!(
        r#"<div class="logo"><img src="{logo}" width="200" alt="Nest"></div>
<h1>WELCOME TO NEST OPTIMIZED TOOL</h1>
<div class="login-form">
    {banner}
    <form method="post" action="/login">
        <h3><label for="username">Username</label></h3>
        <input id="username" name="username" type="text" autocomplete="username">
        <h3><label for="password">Password</label></h3>
        <input id="password" name="password" type="password" autocomplete="current-password">
        <button type="submit" class="button">Login</button>
    </form>
</div>"#,
        logo = LOGO_URL,
        banner = banner,
    );
    document("Login - Nest", "login", &body)
}

/// Simulation Budget page
pub fn simulation_page(
    simulation: &Simulation,
    categories: &[String],
    username: Option<&str>,
) -> String {
    let options: String = categories
        .iter()
        .map(|category| {
            let selected = if *category == simulation.category { " selected" } else { "" };
            format!(
                r#"<option value="{value}"{selected}>{value}</option>"#,
                value = escape_html(category),
                selected = selected,
            )
        })
        .collect();

    let rows: String = simulation
        .tiers
        .iter()
        .map(|share| {
            format!(
                r#"
            <div class="tier-row">
                <label for="tier-{name}">{name}</label>
                <input id="tier-{name}" name="{name}" type="number" min="0" step="any" value="{amount}">
                <div class="share">{percent}</div>
            </div>"#,
                name = share.tier.name(),
                amount = field_amount(share.amount),
                percent = format_percent(share.percent),
            )
        })
        .collect();

    let content = format!(
        r#"<form id="simulation" method="post" action="/simulation">
    <label for="category"><strong>Select Category:</strong></label>
    <select id="category" name="category">{options}</select>

    <div class="kpis">
        <div><h4>Total Impressions</h4><h2 class="kpi-impressions">{impressions}</h2></div>
        <div><h4>Total Views</h4><h2 class="kpi-views">{views}</h2></div>
        <div><h4>Total Engagement</h4><h2 class="kpi-engagement">{engagement}</h2></div>
    </div>

    <div class="columns">
        <div class="inputs">
            <h3>Enter Data</h3>{rows}
            <noscript><button type="submit" class="button">Update</button></noscript>
        </div>
        <div class="budget">
            <h3>Total Budget</h3>
            <h1 id="total-budget">{total}</h1>
        </div>
    </div>
</form>
<script>
    document.querySelectorAll('#simulation select, #simulation input').forEach(function (field) {{
        field.addEventListener('change', function () {{ field.form.submit(); }});
    }});
</script>"#,
        options = options,
        impressions = format_thousands(simulation.totals.impressions),
        views = format_thousands(simulation.totals.views),
        engagement = format_thousands(simulation.totals.engagement),
        rows = rows,
        total = format_amount(simulation.total_budget),
    );

    dashboard_document(Page::SimulationBudget, username, &content)
}

/// Pages without simulation logic of their own
pub fn placeholder_page(page: Page, username: Option<&str>) -> String {
    let content = format!(
        r#"<p>The {} view is not available yet. Use <strong>{}</strong> to plan budgets.</p>"#,
        page.title(),
        Page::SimulationBudget.title(),
    );
    dashboard_document(page, username, &content)
}

/// Visible, non-fatal error inside the dashboard frame
pub fn error_page(page: Page, username: Option<&str>, message: &str) -> String {
    let content = format!(
        r#"<div class="error"><strong>Unable to load data.</strong> {}</div>
<p>Reload the page to try again.</p>"#,
        escape_html(message)
    );
    dashboard_document(page, username, &content)
}

/// Field names the simulation form posts, one per tier
pub fn tier_field_names() -> impl Iterator<Item = &'static str> {
    Tier::ALL.into_iter().map(|tier| tier.name())
}
