use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// Community code -> name, from the reference table. A row counts as data
/// only when its code cell is purely digits, which filters headers and
/// footers without relying on fixed row counts.
pub fn load_community_names(path: &Path) -> Result<BTreeMap<String, String>> {
    let html = read_with_fallback(path)?;
    let mut names = BTreeMap::new();
    for cells in table_rows(&html) {
        if cells.len() < 2 {
            continue;
        }
        let code = cells[0].trim();
        if !is_all_digits(code) {
            continue;
        }
        names.insert(code.to_string(), cells[1].trim().to_string());
    }
    Ok(names)
}

/// Province code -> owning community code. The relation table's fixed
/// layout is CODAUTO, community name, CPRO, province name.
pub fn load_province_to_community(path: &Path) -> Result<HashMap<String, String>> {
    let html = read_with_fallback(path)?;
    let mut map = HashMap::new();
    for cells in table_rows(&html) {
        if cells.len() < 3 {
            continue;
        }
        let province = cells[2].trim();
        if !is_all_digits(province) {
            continue;
        }
        map.insert(province.to_string(), cells[0].trim().to_string());
    }
    Ok(map)
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// The INE serves these files in UTF-8 or Latin-1 depending on vintage.
/// Latin-1 bytes map one-to-one onto code points, so the fallback is a
/// plain byte-to-char widening.
fn read_with_fallback(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read lookup table: {:?}", path))?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => Ok(err.into_bytes().iter().map(|&b| b as char).collect()),
    }
}

/// Cell texts of every `<tr>` in the document, markup stripped.
fn table_rows(html: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for row in blocks(html, "tr") {
        let cells: Vec<String> = blocks(row, "td").into_iter().map(cell_text).collect();
        if !cells.is_empty() {
            rows.push(cells);
        }
    }
    rows
}

/// Inner content of each `<tag ...>...</tag>` block, case-insensitive.
/// ASCII lowercasing keeps byte offsets aligned with the original text.
fn blocks<'a>(html: &'a str, tag: &str) -> Vec<&'a str> {
    let lower = html.to_ascii_lowercase();
    let open = format!("<{}", tag);
    let close = format!("</{}", tag);
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(found) = lower[pos..].find(&open) {
        let start = pos + found;
        // "<tr>" or "<tr ...>", not "<track>"
        match lower.as_bytes().get(start + open.len()) {
            Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {}
            _ => {
                pos = start + open.len();
                continue;
            }
        }
        let Some(open_end) = lower[start..].find('>') else {
            break;
        };
        let content_start = start + open_end + 1;
        let Some(content_len) = lower[content_start..].find(&close) else {
            break;
        };
        let content_end = content_start + content_len;
        out.push(&html[content_start..content_end]);
        pos = content_end + close.len();
    }
    out
}

fn cell_text(cell: &str) -> String {
    let mut text = String::with_capacity(cell.len());
    let mut in_tag = false;
    for ch in cell.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const COMMUNITIES: &str = r#"
<html><body><table>
  <tr><th>CODAUTO</th><th>Comunidad</th></tr>
  <TR><TD>01</TD><TD>Andalucía</TD></TR>
  <tr><td>16</td><td> País  Vasco </td></tr>
  <tr><td class="x"><b>08</b></td><td>Castilla - La Mancha</td></tr>
  <tr><td>Fuente</td><td>INE</td></tr>
</table></body></html>
"#;

    const RELATION: &str = r#"
<table>
  <tr><td>CODAUTO</td><td>Comunidad</td><td>CPRO</td><td>Provincia</td></tr>
  <tr><td>16</td><td>Pais Vasco</td><td>01</td><td>Araba</td></tr>
  <tr><td>08</td><td>Castilla - La Mancha</td><td>02</td><td>Albacete</td></tr>
</table>
"#;

    fn write_temp(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[test]
    fn community_names_skip_non_numeric_rows() {
        let file = write_temp(COMMUNITIES.as_bytes());
        let names = load_community_names(file.path()).unwrap();
        assert_eq!(names.len(), 3);
        assert_eq!(names["01"], "Andalucía");
        // nested markup stripped, whitespace collapsed
        assert_eq!(names["16"], "País Vasco");
        assert_eq!(names["08"], "Castilla - La Mancha");
        assert!(!names.contains_key("Fuente"));
    }

    #[test]
    fn relation_reads_cpro_column() {
        let file = write_temp(RELATION.as_bytes());
        let map = load_province_to_community(file.path()).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["01"], "16");
        assert_eq!(map["02"], "08");
    }

    #[test]
    fn latin1_fallback_decodes_accents() {
        // "Andalucía" with the í encoded as Latin-1 0xED
        let mut bytes = b"<table><tr><td>01</td><td>Andaluc".to_vec();
        bytes.push(0xED);
        bytes.extend_from_slice(b"a</td></tr></table>");
        let file = write_temp(&bytes);
        let names = load_community_names(file.path()).unwrap();
        assert_eq!(names["01"], "Andalucía");
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_community_names(Path::new("/no/such/file.htm")).is_err());
    }
}
