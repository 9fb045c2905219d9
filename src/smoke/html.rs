//! CSS selector queries over rendered pages.

use scraper::{ElementRef, Html, Selector};

pub fn parse(body: &str) -> Html {
    Html::parse_document(body)
}

fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(err) => {
            tracing::warn!(%css, error = ?err, "invalid selector");
            None
        }
    }
}

/// Text of an element with whitespace collapsed
pub fn text_content(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first element matching `css`
pub fn first_text(doc: &Html, css: &str) -> Option<String> {
    let selector = selector(css)?;
    doc.select(&selector).next().map(text_content)
}

pub fn exists(doc: &Html, css: &str) -> bool {
    count(doc, css) > 0
}

/// Number of elements matching `css`
pub fn count(doc: &Html, css: &str) -> usize {
    selector(css)
        .map(|selector| doc.select(&selector).count())
        .unwrap_or(0)
}

/// Number of `<tag>` elements whose class list contains any of `classes`
pub fn count_with_class(doc: &Html, tag: &str, classes: &[&str]) -> usize {
    if classes.is_empty() {
        return 0;
    }
    let css = classes
        .iter()
        .map(|class| format!("{tag}.{class}"))
        .collect::<Vec<_>>()
        .join(", ");
    count(doc, &css)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
<h2>
  إدارة <small>المدفوعات</small>
</h2>
<div class="card stats-card border-success"><div class="card-body">1</div></div>
<div class="alert alert-info" role="alert">ok</div>
<table class="table" id="paymentsTable">
  <thead><tr><th>a</th></tr></thead>
  <tbody>
    <tr><td>1</td></tr>
    <tr class="odd"><td>2</td></tr>
  </tbody>
</table>
</body></html>"#;

    #[test]
    fn first_text_strips_markup() {
        let doc = parse(PAGE);
        assert_eq!(first_text(&doc, "h2").as_deref(), Some("إدارة المدفوعات"));
        assert_eq!(first_text(&doc, "h3"), None);
    }

    #[test]
    fn table_body_rows_are_counted() {
        let doc = parse(PAGE);
        assert_eq!(count(&doc, "table#paymentsTable tr"), 3);
        assert_eq!(count(&doc, "table#paymentsTable tbody tr"), 2);
    }

    #[test]
    fn missing_id_yields_nothing() {
        let doc = parse(PAGE);
        assert!(!exists(&doc, "table#customersTable"));
        assert_eq!(first_text(&doc, "table#customersTable"), None);
    }

    #[test]
    fn class_matching_uses_whole_words() {
        let doc = parse(PAGE);
        assert_eq!(count_with_class(&doc, "div", &["card"]), 1);
        assert_eq!(count_with_class(&doc, "div", &["stats-card"]), 1);
        assert_eq!(count_with_class(&doc, "div", &["card-body"]), 1);
        assert_eq!(count_with_class(&doc, "div", &["alert-danger"]), 0);
        assert_eq!(count_with_class(&doc, "div", &["alert-info", "card"]), 2);
        assert_eq!(count_with_class(&doc, "div", &[]), 0);
    }

    #[test]
    fn nested_tables_keep_their_own_rows() {
        let doc = parse(
            r#"<table id="outer"><tbody>
<tr><td data-note="a > b"><table id="inner"><tbody><tr><td>x</td></tr><tr><td>y</td></tr></tbody></table></td></tr>
</tbody></table>"#,
        );
        assert_eq!(count(&doc, "table#outer > tbody > tr"), 1);
        assert_eq!(count(&doc, "table#inner > tbody > tr"), 2);
        assert_eq!(count(&doc, "table#outer tr"), 3);
        assert_eq!(first_text(&doc, "table#inner td").as_deref(), Some("x"));
    }

    #[test]
    fn invalid_selector_matches_nothing() {
        let doc = parse(PAGE);
        assert_eq!(count(&doc, "div..card"), 0);
        assert_eq!(first_text(&doc, "h2["), None);
    }
}
