//! Output formatting for fortunes, jar statistics, and the web pages.
//!
//! Everything here is a pure function from data to a `String`; callers decide
//! where the text goes (stdout or an HTTP body).

use std::fmt::Write as _;

use crate::models::{Fortune, JarInfo};

/// Format of a rendered fortune.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Plain,
    /// `<pre>` block inside an `<article>`.
    HtmlPre,
    /// One `<br>`-terminated line per body line inside a `<p>`.
    Html,
    Json,
}

impl OutputFormat {
    /// Parse an `outputfmt` value. Unknown or missing names mean plain text.
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            Some("htmlpre") => OutputFormat::HtmlPre,
            Some("html") => OutputFormat::Html,
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Plain,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Plain => "text/plain; charset=utf-8",
            OutputFormat::HtmlPre | OutputFormat::Html => "text/html; charset=utf-8",
            OutputFormat::Json => "application/json",
        }
    }
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
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

/// Body with exactly one guaranteed trailing newline.
fn terminated(body: &str) -> String {
    if body.ends_with('\n') {
        body.to_string()
    } else {
        format!("{}\n", body)
    }
}

/// Render one fortune. `show_jar` prefixes the owning jar as `(<jar>)`; it is
/// ignored for JSON, which always carries the jar.
pub fn render_fortune(fortune: &Fortune, format: OutputFormat, show_jar: bool) -> String {
    let mut out = String::new();
    match format {
        OutputFormat::Plain => {
            if show_jar {
                let _ = writeln!(out, "({})", fortune.jar);
            }
            out.push_str(&terminated(&fortune.body));
        }
        OutputFormat::HtmlPre => {
            out.push_str("<article>\n<pre>\n");
            if show_jar {
                let _ = writeln!(out, "({})", escape_html(&fortune.jar));
            }
            out.push_str(&escape_html(&terminated(&fortune.body)));
            out.push_str("</pre>\n</article>\n");
        }
        OutputFormat::Html => {
            out.push_str("<article class=\"fortune\">\n<p>\n");
            if show_jar {
                let _ = writeln!(out, "({})<br>", escape_html(&fortune.jar));
            }
            for line in fortune.body.trim().lines() {
                let _ = writeln!(out, "{}<br>", escape_html(line));
            }
            out.push_str("</p>\n</article>\n");
        }
        OutputFormat::Json => {
            out = serde_json::to_string_pretty(fortune).unwrap_or_default();
            out.push('\n');
        }
    }
    out
}

/// One search hit: optional `(<jar>)` line, the body, then a `%` line that
/// always starts on its own line.
pub fn format_search_hit(fortune: &Fortune, show_jar: bool) -> String {
    let mut out = String::new();
    if show_jar {
        let _ = writeln!(out, "({})", fortune.jar);
    }
    out.push_str(&terminated(&fortune.body));
    out.push_str("%\n");
    out
}

/// Fixed-width statistics table.
pub fn format_jar_stats(infos: &[JarInfo]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<20}  {:>10}  {:>6}", "Fortune Jar", "# fortunes", "%");
    let _ = writeln!(
        out,
        "{:<20}  {:>10}  {:>6}",
        "-".repeat(20),
        "-".repeat(10),
        "-".repeat(6)
    );
    for info in infos {
        let _ = writeln!(
            out,
            "{:<20}  {:>10}  {:>6.2}",
            info.jar, info.num_fortunes, info.pct_total
        );
    }
    out
}

/// Pretty JSON array of jar statistics.
pub fn format_jar_stats_json(infos: &[JarInfo]) -> String {
    let mut out = serde_json::to_string_pretty(infos).unwrap_or_else(|_| "[]".to_string());
    out.push('\n');
    out
}

/// The `/fortuneweb/` browse page.
///
/// `selected_jar` and `selected_id` echo the request; a permalink is offered
/// only for fortunes that were drawn at random (no id requested).
pub fn render_fortune_page(
    fortune: Option<&Fortune>,
    jars: &[String],
    selected_jar: &str,
    selected_id: &str,
) -> String {
    let mut out = String::new();
    out.push_str(PAGE_HEAD);
    out.push_str("<h1>Get your Fortune</h1>\n");
    out.push_str("<form action=\"./\" method=\"get\">\n");
    out.push_str("<label for=\"jar\">Select a category</label><br>\n");

    let value = if selected_jar.is_empty() {
        "(random)".to_string()
    } else {
        escape_html(selected_jar)
    };
    let _ = writeln!(
        out,
        "<input id=\"jar\" name=\"jar\" list=\"jarslist\" value=\"{}\">",
        value
    );

    out.push_str("<datalist id=\"jarslist\">\n");
    out.push_str("   <option value=\"(random)\">\n");
    for jar in jars {
        let _ = writeln!(out, "<option value=\"{}\">", escape_html(jar));
    }
    out.push_str("</datalist>\n");
    out.push_str("<button id=\"get_fortune\">Get Fortune</button>\n");
    out.push_str("</form>\n");

    match fortune {
        Some(f) if !f.body.is_empty() => {
            out.push_str("<article class=\"fortune\">\n<p>\n");
            let _ = writeln!(out, "({})<br>", escape_html(&f.jar));
            for line in f.body.trim().lines() {
                let _ = writeln!(out, "{}<br>", escape_html(line));
            }
            out.push_str("</p>\n");
            if selected_id.is_empty() {
                let _ = writeln!(
                    out,
                    "<p><a href=\"/fortuneweb/?jar={}&amp;jarid={}\">permalink</a></p>",
                    escape_html(&f.jar),
                    f.id
                );
            }
            out.push_str("</article>\n");
        }
        _ => out.push_str("<p>No fortune exists.</p>\n"),
    }

    out.push_str(PAGE_TAIL);
    out
}

const PAGE_HEAD: &str = r#"<!DOCTYPE HTML>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>fortune2</title>
<style>
body { margin: 0 auto; width: 50% }
.fortune { padding: 20px; border: 1px dotted; margin: 1em 0; }
#get_fortune { margin: 20px 0; }
</style>
</head>
<body>
"#;

const PAGE_TAIL: &str = r##"<script>
let jar_entry = document.querySelector("#jar");
jar_entry.addEventListener("focus", function(e) {
    jar_entry.select();
});
</script>
</body>
</html>
"##;

/// Plain-text help served at `/`.
pub const HELP_TEXT: &str = r#"fortune2 - fortune cookie server

GET /fortune/                  random fortune from all jars (weighted by size)
GET /fortune/<jar>             random fortune from <jar>
GET /fortune/<jar>/<id>        fortune number <id> from <jar>
GET /info/                     fortune counts per jar
GET /fortuneweb/               browse fortunes in a web page
GET /health                    server status

Query parameters:
  jars=a,b,c     draw only from these jars (/fortune/ and /info/)
  sw=ec          e: pick jars uniformly, c: show the jar name
  outputfmt=...  plain (default), htmlpre, html, json

Example:
  curl 'http://localhost:8000/fortune/?jars=linux,science&sw=c'
"#;

/// HTML help served at `/?outputfmt=html`.
pub const HELP_HTML: &str = r#"<!DOCTYPE HTML>
<html>
<head>
<meta charset="utf-8">
<title>fortune2</title>
</head>
<body>
<h1>fortune2</h1>
<p>A fortune cookie server.</p>
<table>
<tr><td><code>GET /fortune/</code></td><td>random fortune from all jars (weighted by size)</td></tr>
<tr><td><code>GET /fortune/&lt;jar&gt;</code></td><td>random fortune from a jar</td></tr>
<tr><td><code>GET /fortune/&lt;jar&gt;/&lt;id&gt;</code></td><td>one fortune by id</td></tr>
<tr><td><code>GET /info/</code></td><td>fortune counts per jar</td></tr>
<tr><td><code>GET /fortuneweb/</code></td><td><a href="/fortuneweb/">browse fortunes</a></td></tr>
</table>
<h2>Query parameters</h2>
<ul>
<li><code>jars=a,b,c</code> draw only from these jars</li>
<li><code>sw=ec</code> <code>e</code>: pick jars uniformly, <code>c</code>: show the jar name</li>
<li><code>outputfmt=plain|htmlpre|html|json</code></li>
</ul>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn fortune(body: &str) -> Fortune {
        Fortune {
            jar: "test".to_string(),
            id: 3,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_format_names() {
        assert_eq!(OutputFormat::from_name(None), OutputFormat::Plain);
        assert_eq!(OutputFormat::from_name(Some("bogus")), OutputFormat::Plain);
        assert_eq!(OutputFormat::from_name(Some("htmlpre")), OutputFormat::HtmlPre);
        assert_eq!(OutputFormat::from_name(Some("html")), OutputFormat::Html);
        assert_eq!(OutputFormat::from_name(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::Json.content_type(), "application/json");
    }

    #[test]
    fn test_plain() {
        let f = fortune("Hello\n");
        assert_eq!(render_fortune(&f, OutputFormat::Plain, false), "Hello\n");
        assert_eq!(
            render_fortune(&f, OutputFormat::Plain, true),
            "(test)\nHello\n"
        );
        assert_eq!(
            render_fortune(&fortune("no newline"), OutputFormat::Plain, false),
            "no newline\n"
        );
    }

    #[test]
    fn test_html_escapes_and_breaks_lines() {
        let f = fortune("a < b\nc & d\n");
        assert_eq!(
            render_fortune(&f, OutputFormat::Html, true),
            "<article class=\"fortune\">\n<p>\n(test)<br>\na &lt; b<br>\nc &amp; d<br>\n</p>\n</article>\n"
        );
    }

    #[test]
    fn test_htmlpre() {
        let f = fortune("<tag>\n");
        assert_eq!(
            render_fortune(&f, OutputFormat::HtmlPre, false),
            "<article>\n<pre>\n&lt;tag&gt;\n</pre>\n</article>\n"
        );
    }

    #[test]
    fn test_json_fields() {
        let out = render_fortune(&fortune("Hello\n"), OutputFormat::Json, true);
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["jar"], "test");
        assert_eq!(v["id"], 3);
        assert_eq!(v["body"], "Hello\n");
    }

    #[test]
    fn test_search_hit_delimiter_on_own_line() {
        assert_eq!(format_search_hit(&fortune("x"), false), "x\n%\n");
        assert_eq!(format_search_hit(&fortune("x\n"), true), "(test)\nx\n%\n");
    }

    #[test]
    fn test_stats_table() {
        let infos = vec![JarInfo {
            jar: "test".to_string(),
            num_fortunes: 2,
            pct_total: 100.0,
        }];
        let table = format_jar_stats(&infos);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Fortune Jar"));
        assert!(lines[2].starts_with("test "));
        assert!(lines[2].contains(" 2 "));
        assert!(lines[2].ends_with("100.00"));
    }

    #[test]
    fn test_stats_json_names() {
        let infos = vec![JarInfo {
            jar: "a".to_string(),
            num_fortunes: 1,
            pct_total: 25.0,
        }];
        let v: serde_json::Value = serde_json::from_str(&format_jar_stats_json(&infos)).unwrap();
        assert_eq!(v[0]["jar"], "a");
        assert_eq!(v[0]["numfortunes"], 1);
        assert_eq!(v[0]["pcttotal"], 25.0);
    }

    #[test]
    fn test_page_with_and_without_fortune() {
        let jars = vec!["news".to_string(), "test".to_string()];
        let page = render_fortune_page(Some(&fortune("Hi\n")), &jars, "", "");
        assert!(page.contains("<option value=\"news\">"));
        assert!(page.contains("(test)<br>"));
        assert!(page.contains("jarid=3"));

        let pinned = render_fortune_page(Some(&fortune("Hi\n")), &jars, "test", "3");
        assert!(!pinned.contains("permalink"));
        assert!(pinned.contains("value=\"test\""));

        let empty = render_fortune_page(None, &jars, "", "");
        assert!(empty.contains("No fortune exists."));
    }

    #[test]
    fn test_page_ends_with_focus_script() {
        let page = render_fortune_page(None, &[], "", "");
        assert!(page.contains(r##"document.querySelector("#jar")"##));
        assert!(page.ends_with("</script>\n</body>\n</html>\n"));
    }
}
