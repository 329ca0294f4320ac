use crate::types::{AggregatedRecord, TimeSeries, YEARS};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const SEX_CHART: &str = "poblacion_sexo_2017.svg";
pub const TREND_CHART: &str = "evolucion_poblacion.svg";

const MALE_COLOR: &str = "#1f77b4";
const FEMALE_COLOR: &str = "#d62728";

// one color per ranked community
const LINE_PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

#[derive(Debug, Clone)]
pub struct SexChartEntry {
    pub name: String,
    pub male: f64,
    pub female: f64,
}

#[derive(Debug, Clone)]
pub struct TrendEntry {
    pub name: String,
    /// Stored like the accumulator: descending chronological order.
    pub series: TimeSeries,
}

/// 2017 male/female values for the ranked communities.
pub fn sex_chart_entries(
    records: &BTreeMap<String, AggregatedRecord>,
    ranking: &[(String, f64)],
) -> Vec<SexChartEntry> {
    ranking
        .iter()
        .filter_map(|(code, _)| records.get(code))
        .map(|record| SexChartEntry {
            name: record.name.clone(),
            male: record.male[0],
            female: record.female[0],
        })
        .collect()
}

/// Total series for the ranked communities.
pub fn trend_entries(
    records: &BTreeMap<String, AggregatedRecord>,
    ranking: &[(String, f64)],
) -> Vec<TrendEntry> {
    ranking
        .iter()
        .filter_map(|(code, _)| records.get(code))
        .map(|record| TrendEntry {
            name: record.name.clone(),
            series: record.total,
        })
        .collect()
}

/// Grouped bar chart of the 2017 population by sex.
pub fn render_sex_bar_chart(entries: &[SexChartEntry]) -> String {
    let width = 1000.0;
    let height = 620.0;
    let (x0, y0) = (90.0, 60.0);
    let plot_w = width - x0 - 30.0;
    let plot_h = height - y0 - 170.0;

    let max = entries
        .iter()
        .flat_map(|e| [e.male, e.female])
        .fold(1.0_f64, f64::max);
    let y_max = max * 1.05;

    let mut svg = svg_open(width, height);
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"30\" text-anchor=\"middle\" font-size=\"18\" font-family=\"sans-serif\">Población por sexo en el año 2017 (CCAA)</text>\n",
        width / 2.0
    ));

    // horizontal gridlines and axis labels
    for i in 0..=5 {
        let value = y_max * i as f64 / 5.0;
        let y = y0 + plot_h - plot_h * i as f64 / 5.0;
        svg.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#ddd\"/>\n",
            x0, y, x0 + plot_w, y
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"11\" font-family=\"sans-serif\">{}</text>\n",
            x0 - 6.0, y + 4.0, format_axis(value)
        ));
    }

    let group_w = plot_w / entries.len().max(1) as f64;
    let bar_w = group_w * 0.35;
    for (i, entry) in entries.iter().enumerate() {
        let center = x0 + group_w * i as f64 + group_w / 2.0;
        for (value, color, offset) in [
            (entry.male, MALE_COLOR, -bar_w),
            (entry.female, FEMALE_COLOR, 0.0),
        ] {
            let bar_h = plot_h * value / y_max;
            svg.push_str(&format!(
                "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"/>\n",
                center + offset,
                y0 + plot_h - bar_h,
                bar_w,
                bar_h,
                color
            ));
        }
        let label_y = y0 + plot_h + 12.0;
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" transform=\"rotate(-90 {:.1} {:.1})\" text-anchor=\"end\" font-size=\"12\" font-family=\"sans-serif\">{}</text>\n",
            center + 4.0,
            label_y,
            center + 4.0,
            label_y,
            xml_escape(&entry.name)
        ));
    }

    // axes
    svg.push_str(&format!(
        "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#333\"/>\n",
        x0,
        y0 + plot_h,
        x0 + plot_w,
        y0 + plot_h
    ));
    svg.push_str(&format!(
        "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#333\"/>\n",
        x0, y0, x0, y0 + plot_h
    ));

    // legend
    for (i, (label, color)) in [("Hombres", MALE_COLOR), ("Mujeres", FEMALE_COLOR)]
        .iter()
        .enumerate()
    {
        let y = y0 + i as f64 * 20.0;
        svg.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"12\" height=\"12\" fill=\"{}\"/>\n",
            x0 + plot_w - 110.0,
            y,
            color
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\" font-family=\"sans-serif\">{}</text>\n",
            x0 + plot_w - 92.0,
            y + 10.0,
            label
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

/// Multi-line chart of each community's total population, years ascending
/// left to right with every year paired to its own value.
pub fn render_trend_line_chart(entries: &[TrendEntry]) -> String {
    let width = 1000.0;
    let height = 560.0;
    let (x0, y0) = (90.0, 60.0);
    let plot_w = width - x0 - 250.0; // room for the legend column
    let plot_h = height - y0 - 60.0;

    let mut years: Vec<i32> = YEARS.to_vec();
    years.reverse();

    let all: Vec<f64> = entries.iter().flat_map(|e| e.series).collect();
    let max = all.iter().copied().fold(1.0_f64, f64::max);
    let min = all.iter().copied().fold(max, f64::min);
    let y_max = max * 1.05;
    let y_min = (min * 0.95).max(0.0);
    let span = if y_max > y_min { y_max - y_min } else { 1.0 };

    let scale_y = |value: f64| y0 + plot_h - plot_h * (value - y_min) / span;
    let scale_x =
        |i: usize| x0 + plot_w * i as f64 / (years.len() - 1) as f64;

    let mut svg = svg_open(width, height);
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"30\" text-anchor=\"middle\" font-size=\"18\" font-family=\"sans-serif\">Población total en 2010-2017 (CCAA)</text>\n",
        (x0 + x0 + plot_w) / 2.0
    ));

    for i in 0..=5 {
        let value = y_min + span * i as f64 / 5.0;
        let y = scale_y(value);
        svg.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#ccc\" stroke-dasharray=\"4 3\"/>\n",
            x0, y, x0 + plot_w, y
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"11\" font-family=\"sans-serif\">{}</text>\n",
            x0 - 6.0, y + 4.0, format_axis(value)
        ));
    }

    for (i, year) in years.iter().enumerate() {
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"11\" font-family=\"sans-serif\">{}</text>\n",
            scale_x(i),
            y0 + plot_h + 18.0,
            year
        ));
    }

    for (i, entry) in entries.iter().enumerate() {
        let color = LINE_PALETTE[i % LINE_PALETTE.len()];
        // invert the stored series so index k lines up with years[k]
        let mut values: Vec<f64> = entry.series.to_vec();
        values.reverse();

        let points: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(k, value)| format!("{:.1},{:.1}", scale_x(k), scale_y(*value)))
            .collect();
        svg.push_str(&format!(
            "<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>\n",
            points.join(" "),
            color
        ));
        for (k, value) in values.iter().enumerate() {
            svg.push_str(&format!(
                "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"3\" fill=\"{}\"/>\n",
                scale_x(k),
                scale_y(*value),
                color
            ));
        }

        // legend row
        let ly = y0 + i as f64 * 22.0;
        svg.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"2\"/>\n",
            x0 + plot_w + 20.0,
            ly,
            x0 + plot_w + 44.0,
            ly,
            color
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\" font-family=\"sans-serif\">{}</text>\n",
            x0 + plot_w + 50.0,
            ly + 4.0,
            xml_escape(&entry.name)
        ));
    }

    // axes
    svg.push_str(&format!(
        "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#333\"/>\n",
        x0,
        y0 + plot_h,
        x0 + plot_w,
        y0 + plot_h
    ));
    svg.push_str(&format!(
        "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#333\"/>\n",
        x0, y0, x0, y0 + plot_h
    ));

    svg.push_str("</svg>\n");
    svg
}

pub fn write_chart(dir: &Path, file_name: &str, contents: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create images directory: {:?}", dir))?;
    let path = dir.join(file_name);
    fs::write(&path, contents).with_context(|| format!("Failed to write chart: {:?}", path))?;
    Ok(path)
}

fn svg_open(width: f64, height: f64) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{:.0}\" height=\"{:.0}\" viewBox=\"0 0 {:.0} {:.0}\">\n\
         <rect width=\"{:.0}\" height=\"{:.0}\" fill=\"white\"/>\n",
        width, height, width, height, width, height
    )
}

/// Axis labels: thousands-grouped integers, no decimals.
fn format_axis(value: f64) -> String {
    let n = value.round() as i64;
    let digits = n.abs().to_string();
    let bytes = digits.as_bytes();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*b as char);
    }
    if n < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<SexChartEntry> {
        vec![
            SexChartEntry {
                name: "Andalucía".to_string(),
                male: 4_000_000.0,
                female: 4_200_000.0,
            },
            SexChartEntry {
                name: "Cataluña".to_string(),
                male: 3_600_000.0,
                female: 3_800_000.0,
            },
        ]
    }

    #[test]
    fn bar_chart_draws_two_bars_per_entry() {
        let svg = render_sex_bar_chart(&entries());
        // 4 data bars + 2 legend swatches
        assert_eq!(svg.matches("<rect").count(), 1 + 4 + 2);
        assert!(svg.contains("Andalucía"));
        assert!(svg.contains(MALE_COLOR));
    }

    #[test]
    fn trend_chart_inverts_the_stored_series() {
        let entry = TrendEntry {
            name: "Andalucía".to_string(),
            series: [800.0, 700.0, 600.0, 500.0, 400.0, 300.0, 200.0, 100.0],
        };
        let svg = render_trend_line_chart(&[entry]);
        let polyline = svg
            .lines()
            .find(|line| line.starts_with("<polyline"))
            .unwrap();
        let points: Vec<&str> = polyline
            .split('"')
            .nth(1)
            .unwrap()
            .split(' ')
            .collect();
        assert_eq!(points.len(), 8);
        // leftmost point is 2010 (the smallest value, so the lowest y)
        let first_y: f64 = points[0].split(',').nth(1).unwrap().parse().unwrap();
        let last_y: f64 = points[7].split(',').nth(1).unwrap().parse().unwrap();
        assert!(first_y > last_y);
    }

    #[test]
    fn empty_input_still_produces_a_document() {
        let svg = render_sex_bar_chart(&[]);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn axis_labels_are_grouped_integers() {
        assert_eq!(format_axis(4200000.0), "4.200.000");
        assert_eq!(format_axis(0.0), "0");
        assert_eq!(format_axis(999.4), "999");
    }
}
