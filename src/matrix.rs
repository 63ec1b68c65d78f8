use crate::data::CourseMatrix;
use crate::svg::Element;
use tracing::warn;

pub const CONTAINER: &str = "vis-matrix";

const CORNER_BACKGROUND: &str = "#f2f2f2";

pub fn render(matrix: &CourseMatrix) -> Element {
    let header_style = |i: usize| {
        matrix
            .header_colors
            .get(i % matrix.header_colors.len().max(1))
            .map(|c| format!("background-color: {}", c))
    };

    let mut header_row = Element::new("tr").child(
        Element::new("th").attr("style", format!("background-color: {}", CORNER_BACKGROUND)),
    );
    for (i, header) in matrix.headers.iter().enumerate() {
        let mut th = Element::new("th").attr("class", "header-cell col-header");
        if let Some(style) = header_style(i) {
            th.set_attr("style", style);
        }
        header_row.push(th.text(header));
    }

    let mut body = Element::new("tbody");
    for (i, row) in matrix.rows.iter().enumerate() {
        if row.values.len() != matrix.headers.len() {
            warn!(
                "Skipping matrix row {}: {} values for {} columns",
                row.label,
                row.values.len(),
                matrix.headers.len()
            );
            continue;
        }
        let mut th = Element::new("th").attr("class", "header-cell row-header");
        if let Some(style) = header_style(i) {
            th.set_attr("style", style);
        }
        let mut tr = Element::new("tr").child(th.text(&row.label));
        for value in &row.values {
            let mut td = Element::new("td");
            if *value == 1 {
                td.set_attr("class", "highlight-one");
            }
            tr.push(td.text(value));
        }
        body.push(tr);
    }

    Element::new("table")
        .child(Element::new("thead").child(header_row))
        .child(body)
}
