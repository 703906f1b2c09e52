//! Server-side HTML for the city list page.

use std::fmt::Write;

use citytemp_core::City;

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>City temperatures</title>
<style>
body { font-family: sans-serif; margin: 2rem; }
table { border-collapse: collapse; }
th, td { padding: 0.3rem 0.8rem; border-bottom: 1px solid #ddd; text-align: left; }
form.inline { display: inline; }
</style>
</head>
<body>
<h1>City temperatures</h1>
<form class="inline" method="post" action="/cities/update"><button type="submit">Update weather</button></form>
<form class="inline" method="post" action="/cities/reset"><button type="submit">Reset to defaults</button></form>
"#;

const ADD_FORM: &str = r#"<h2>Add a city</h2>
<form method="post" action="/cities/add">
<input name="name" placeholder="Name" required>
<input name="lat" type="number" step="any" placeholder="Latitude" required>
<input name="lon" type="number" step="any" placeholder="Longitude" required>
<button type="submit">Add</button>
</form>
</body>
</html>
"#;

/// Render the list page. `cities` are shown in the order given.
pub fn index_page(cities: &[City]) -> String {
    let mut html = String::from(HEAD);

    html.push_str(
        "<table>\n<thead><tr><th>City</th><th>Latitude</th><th>Longitude</th>\
         <th>Temperature</th><th>Updated</th><th></th></tr></thead>\n<tbody>\n",
    );

    for city in cities {
        let temperature = city
            .temperature
            .map(|t| format!("{t:.1} &deg;C"))
            .unwrap_or_else(|| "-".to_string());
        let updated = city
            .updated_at
            .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "never".to_string());

        let _ = writeln!(
            html,
            "<tr><td>{name}</td><td>{lat}</td><td>{lon}</td><td>{temperature}</td><td>{updated}</td>\
             <td><form class=\"inline\" method=\"post\" action=\"/cities/remove/{id}\">\
             <button type=\"submit\">Remove</button></form></td></tr>",
            name = escape(&city.name),
            lat = city.latitude,
            lon = city.longitude,
            id = city.id,
        );
    }

    html.push_str("</tbody>\n</table>\n");
    html.push_str(ADD_FORM);
    html
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
