use crate::format::format_number;
use crate::types::{AggregatedRecord, NATIONAL_CODE, VARIATION_YEARS, YEARS};
use crate::variation::year_over_year;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const PROVINCE_REPORT: &str = "variacion_provincias.html";
pub const COMMUNITY_REPORT: &str = "poblacion_ccaa.html";
pub const VARIATION_REPORT: &str = "variacion_ccaa.html";

const STYLE: &str = "\
        table { border-collapse: collapse; width: 95%; margin: 20px auto; font-family: Arial, sans-serif; }\n\
        th, td { border: 1px solid #ccc; padding: 6px; text-align: center; font-size: 12px; }\n\
        th { background-color: #f2f2f2; font-weight: bold; }\n\
        td.left { text-align: left; padding-left: 8px; font-weight: bold; }\n\
        h2, h3 { text-align: center; color: #333; }\n\
        .grafico { text-align: center; margin: 40px 0; }\n\
        img { max-width: 90%; border: 1px solid #ddd; }\n";

fn document_open(title: &str, heading: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>{}</title>\n<style>\n{}</style>\n</head>\n<body>\n<h2>{}</h2>\n",
        title, STYLE, heading
    )
}

/// Province table: one Abs / Rel (%) column pair per year, national row
/// first.
pub fn render_province_variation(records: &BTreeMap<String, AggregatedRecord>) -> String {
    let mut html = document_open(
        "Variación de Población por Provincias",
        "Variación de la Población por Provincias (2011-2017)",
    );

    html.push_str("<table>\n<thead>\n<tr>\n<th rowspan=\"2\">Provincia</th>\n");
    for year in VARIATION_YEARS {
        html.push_str(&format!("<th colspan=\"2\">{}</th>", year));
    }
    html.push_str("\n</tr>\n<tr>");
    for _ in VARIATION_YEARS {
        html.push_str("<th>Abs</th><th>Rel (%)</th>");
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for (code, record) in records {
        let display = if code == NATIONAL_CODE {
            record.name.clone()
        } else {
            format!("{} {}", code, record.name)
        };
        html.push_str(&format!("<tr><td class=\"left\">{}</td>", display));
        let variation = year_over_year(&record.total, &YEARS, &VARIATION_YEARS);
        for i in 0..VARIATION_YEARS.len() {
            html.push_str(&format!(
                "<td>{}</td><td>{}</td>",
                format_number(variation.absolute[i]),
                format_number(variation.relative[i])
            ));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}

/// Community population table: Total / Hombre / Mujer blocks of eight year
/// columns each, with the sex bar chart embedded below.
pub fn render_community_population(
    records: &BTreeMap<String, AggregatedRecord>,
    chart_href: &str,
) -> String {
    let mut html = document_open(
        "Población por Comunidades Autónomas",
        "Población por Comunidades Autónomas (2010-2017)",
    );

    html.push_str("<table>\n<thead>\n<tr>\n<th rowspan=\"2\">CCAA</th>\n");
    for group in ["Total", "Hombre", "Mujer"] {
        html.push_str(&format!("<th colspan=\"8\">{}</th>", group));
    }
    html.push_str("\n</tr>\n<tr>");
    for _ in 0..3 {
        for year in YEARS {
            html.push_str(&format!("<th>{}</th>", year));
        }
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for (code, record) in records {
        html.push_str(&format!(
            "<tr><td class=\"left\">{} {}</td>",
            code, record.name
        ));
        for series in [&record.total, &record.male, &record.female] {
            for value in series {
                html.push_str(&format!("<td>{}</td>", format_number(*value)));
            }
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n<hr>\n");
    html.push_str(&format!(
        "<div class=\"grafico\">\n<h3>Población por sexo en 2017 (Top 10 CCAA)</h3>\n\
         <img src=\"{}\" alt=\"Población por sexo en 2017\">\n</div>\n",
        chart_href
    ));
    html.push_str("</body>\n</html>\n");
    html
}

/// Community variation table by sex: absolute and relative blocks, each
/// split Hombres / Mujeres across the variation years. Only communities the
/// CSV actually touched appear.
pub fn render_community_variation(
    records: &BTreeMap<String, AggregatedRecord>,
    chart_href: &str,
) -> String {
    let mut html = document_open(
        "Variación Comunidades Autónomas",
        "Variación de población por Comunidades Autónomas (2011-2017)",
    );

    let span = VARIATION_YEARS.len();
    html.push_str("<table>\n<thead>\n<tr>\n<th rowspan=\"3\">CCAA</th>\n");
    html.push_str(&format!(
        "<th colspan=\"{}\">Variación Absoluta</th><th colspan=\"{}\">Variación Relativa (%)</th>\n",
        span * 2,
        span * 2
    ));
    html.push_str("</tr>\n<tr>");
    for _ in 0..2 {
        html.push_str(&format!(
            "<th colspan=\"{}\">Hombres</th><th colspan=\"{}\">Mujeres</th>",
            span, span
        ));
    }
    html.push_str("</tr>\n<tr>");
    for _ in 0..4 {
        for year in VARIATION_YEARS {
            html.push_str(&format!("<th>{}</th>", year));
        }
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for (code, record) in records {
        if !record.touched {
            continue;
        }
        let male = year_over_year(&record.male, &YEARS, &VARIATION_YEARS);
        let female = year_over_year(&record.female, &YEARS, &VARIATION_YEARS);
        html.push_str(&format!(
            "<tr><td class=\"left\">{} {}</td>",
            code, record.name
        ));
        for block in [
            &male.absolute,
            &female.absolute,
            &male.relative,
            &female.relative,
        ] {
            for value in block {
                html.push_str(&format!("<td>{}</td>", format_number(*value)));
            }
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n<hr>\n");
    html.push_str(&format!(
        "<div class=\"grafico\">\n<h3>Evolución de la Población Total (Top 10 CCAA)</h3>\n\
         <img src=\"{}\" alt=\"Evolución de la población total\">\n</div>\n",
        chart_href
    ));
    html.push_str("</body>\n</html>\n");
    html
}

pub fn write_report(dir: &Path, file_name: &str, contents: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create reports directory: {:?}", dir))?;
    let path = dir.join(file_name);
    fs::write(&path, contents).with_context(|| format!("Failed to write report: {:?}", path))?;
    Ok(path)
}

/// Href from the reports directory to a chart image, so the generated HTML
/// works wherever the output tree lands.
pub fn relative_href(reports_dir: &Path, image_path: &Path) -> String {
    let from: Vec<_> = reports_dir.components().map(|c| c.as_os_str()).collect();
    let to: Vec<_> = image_path.components().map(|c| c.as_os_str()).collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();
    let mut parts: Vec<String> = Vec::new();
    for _ in common..from.len() {
        parts.push("..".to_string());
    }
    for item in &to[common..] {
        parts.push(item.to_string_lossy().into_owned());
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimeSeries;

    fn record(name: &str, total: TimeSeries) -> AggregatedRecord {
        AggregatedRecord {
            name: name.to_string(),
            total,
            male: total,
            female: total,
            touched: true,
        }
    }

    fn sample() -> BTreeMap<String, AggregatedRecord> {
        let mut records = BTreeMap::new();
        records.insert(
            "00".to_string(),
            record("Total Nacional", [800.0, 790.0, 780.0, 770.0, 760.0, 750.0, 740.0, 730.0]),
        );
        records.insert(
            "01".to_string(),
            record("Araba/Álava", [100.0, 90.0, 80.0, 70.0, 60.0, 50.0, 40.0, 30.0]),
        );
        records
    }

    #[test]
    fn province_report_display_names() {
        let html = render_province_variation(&sample());
        // the national row is not prefixed with its synthetic code
        assert!(html.contains("<td class=\"left\">Total Nacional</td>"));
        assert!(html.contains("<td class=\"left\">01 Araba/Álava</td>"));
        // 2017 delta for the province: 100-90=10, 10/90*100=11.11
        assert!(html.contains("<td>10,00</td><td>11,11</td>"));
    }

    #[test]
    fn community_report_renders_all_series() {
        let html = render_community_population(&sample(), "../imagenes/chart.svg");
        assert!(html.contains("<th colspan=\"8\">Mujer</th>"));
        assert!(html.contains("src=\"../imagenes/chart.svg\""));
        // 3 series x 8 years of data cells per row
        let row = html
            .lines()
            .find(|line| line.contains("01 Araba/Álava"))
            .unwrap();
        assert_eq!(row.matches("<td>").count(), 24);
    }

    #[test]
    fn variation_report_skips_untouched_communities() {
        let mut records = sample();
        records.insert(
            "02".to_string(),
            AggregatedRecord::new("Sin datos"),
        );
        let html = render_community_variation(&records, "x.svg");
        assert!(html.contains("01 Araba/Álava"));
        assert!(!html.contains("Sin datos"));
        assert!(html.contains("<th colspan=\"14\">Variación Absoluta</th>"));
    }

    #[test]
    fn hrefs_are_relative_to_the_reports_dir() {
        assert_eq!(
            relative_href(
                Path::new("salida/resultados"),
                Path::new("salida/imagenes/chart.svg")
            ),
            "../imagenes/chart.svg"
        );
        assert_eq!(
            relative_href(Path::new("out"), Path::new("out/chart.svg")),
            "chart.svg"
        );
    }
}
