use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub population_csv: PathBuf,
    pub communities_table: PathBuf,
    pub provinces_table: PathBuf,
    /// Fixed number of header rows to skip. When absent the header is
    /// detected by content.
    pub header_rows: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub reports_dir: PathBuf,
    pub images_dir: PathBuf,
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_full_config() {
        let toml = r#"
[input]
population_csv = "entradas/poblacion.csv"
communities_table = "entradas/comunidades.htm"
provinces_table = "entradas/provincias.htm"
header_rows = 4

[output]
reports_dir = "salida/resultados"
images_dir = "salida/imagenes"
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(toml.as_bytes()).unwrap();
        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.input.header_rows, Some(4));
        assert_eq!(config.output.images_dir, PathBuf::from("salida/imagenes"));
    }

    #[test]
    fn header_rows_is_optional() {
        let toml = r#"
[input]
population_csv = "p.csv"
communities_table = "c.htm"
provinces_table = "r.htm"

[output]
reports_dir = "resultados"
images_dir = "imagenes"
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(toml.as_bytes()).unwrap();
        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.input.header_rows, None);
    }
}
