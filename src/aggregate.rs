use crate::numeric::{self, CleanPolicy};
use crate::types::{AggregatedRecord, Lookups, TimeSeries, NATIONAL_CODE, NATIONAL_NAME};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// Records keyed and named from the CSV rows themselves.
    Province,
    /// Rows vector-add into their owning community's accumulator.
    Community,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderPolicy {
    /// Skip rows until the first cell looks like data.
    Detect,
    /// Legacy fixed skip count, kept available through configuration.
    SkipRows(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellPolicy {
    /// One bad cell discards the whole row.
    SkipRow,
    /// Bad cells degrade to 0.0.
    Zero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Total,
    Male,
    Female,
}

/// One fixed 8-cell column window feeding a series slot.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub slot: Slot,
    pub start: usize,
    pub clean: CleanPolicy,
}

/// Everything the report variants used to disagree on, made explicit.
#[derive(Debug, Clone)]
pub struct AggregationSpec {
    pub grouping: Grouping,
    pub windows: Vec<Window>,
    pub include_national: bool,
    pub header: HeaderPolicy,
    pub cells: CellPolicy,
    /// Also try the zero-padded and zero-stripped forms of the province
    /// code against the lookup before dropping the row.
    pub fuzzy_codes: bool,
}

impl AggregationSpec {
    /// Per-province Total series, national row included.
    pub fn provinces() -> Self {
        AggregationSpec {
            grouping: Grouping::Province,
            windows: vec![Window {
                slot: Slot::Total,
                start: 1,
                clean: CleanPolicy::ThousandsOnly,
            }],
            include_national: true,
            header: HeaderPolicy::Detect,
            cells: CellPolicy::SkipRow,
            fuzzy_codes: false,
        }
    }

    /// Total + Male + Female summed into each community (the 24-column block).
    pub fn community_totals() -> Self {
        AggregationSpec {
            grouping: Grouping::Community,
            windows: vec![
                Window {
                    slot: Slot::Total,
                    start: 1,
                    clean: CleanPolicy::ThousandsOnly,
                },
                Window {
                    slot: Slot::Male,
                    start: 9,
                    clean: CleanPolicy::ThousandsOnly,
                },
                Window {
                    slot: Slot::Female,
                    start: 17,
                    clean: CleanPolicy::ThousandsOnly,
                },
            ],
            include_national: false,
            header: HeaderPolicy::Detect,
            cells: CellPolicy::SkipRow,
            fuzzy_codes: false,
        }
    }

    /// Male and Female series only, lenient cells, tolerant code matching.
    pub fn community_by_sex() -> Self {
        AggregationSpec {
            grouping: Grouping::Community,
            windows: vec![
                Window {
                    slot: Slot::Male,
                    start: 9,
                    clean: CleanPolicy::DecimalComma,
                },
                Window {
                    slot: Slot::Female,
                    start: 17,
                    clean: CleanPolicy::DecimalComma,
                },
            ],
            include_national: false,
            header: HeaderPolicy::Detect,
            cells: CellPolicy::Zero,
            fuzzy_codes: true,
        }
    }

    pub fn with_header(mut self, header: HeaderPolicy) -> Self {
        self.header = header;
        self
    }
}

pub fn aggregate(
    csv_path: &Path,
    spec: &AggregationSpec,
    lookups: &Lookups,
) -> Result<BTreeMap<String, AggregatedRecord>> {
    let file = File::open(csv_path)
        .with_context(|| format!("Failed to open population CSV: {:?}", csv_path))?;
    aggregate_reader(file, spec, lookups)
        .with_context(|| format!("Failed to process population CSV: {:?}", csv_path))
}

pub fn aggregate_reader<R: Read>(
    input: R,
    spec: &AggregationSpec,
    lookups: &Lookups,
) -> Result<BTreeMap<String, AggregatedRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    let mut records: BTreeMap<String, AggregatedRecord> = BTreeMap::new();
    if spec.grouping == Grouping::Community {
        // every known community starts from a zeroed accumulator
        for (code, name) in &lookups.community_names {
            records.insert(code.clone(), AggregatedRecord::new(name.clone()));
        }
    }

    let mut seen = 0usize;
    let mut in_header = true;
    let mut skipped = 0usize;

    for row in reader.records() {
        let row = row.context("Failed to read CSV row")?;
        seen += 1;

        let first = row.get(0).unwrap_or("");
        match spec.header {
            HeaderPolicy::SkipRows(n) if seen <= n => continue,
            HeaderPolicy::Detect if in_header => {
                if !is_data_row(first) {
                    continue;
                }
                in_header = false;
            }
            _ => {}
        }

        if row.len() < 2 || first.trim().is_empty() || first.contains("Notas") {
            continue;
        }

        let cell = first.trim();
        let (code, name) = if cell.contains(NATIONAL_NAME) {
            if !spec.include_national {
                continue;
            }
            (NATIONAL_CODE.to_string(), NATIONAL_NAME.to_string())
        } else {
            match cell.split_once(' ') {
                Some((code, name)) => (code.trim().to_string(), name.trim().to_string()),
                None => (cell.to_string(), cell.to_string()),
            }
        };

        let key = match spec.grouping {
            Grouping::Province => code.clone(),
            Grouping::Community => {
                match resolve_community(&code, lookups, spec.fuzzy_codes) {
                    Some(community) => community,
                    None => {
                        skipped += 1;
                        warn!(province = %code, "row dropped: no community mapping");
                        continue;
                    }
                }
            }
        };

        // parse every window before touching the accumulator, so a
        // discarded row contributes nothing
        let mut parsed: Vec<(Slot, TimeSeries)> = Vec::with_capacity(spec.windows.len());
        let mut malformed = false;
        for window in &spec.windows {
            match read_window(&row, window, spec.cells) {
                Some(values) => parsed.push((window.slot, values)),
                None => {
                    malformed = true;
                    break;
                }
            }
        }
        if malformed {
            skipped += 1;
            warn!(entity = %code, "row dropped: malformed numeric window");
            continue;
        }

        let record = match spec.grouping {
            Grouping::Community => match records.get_mut(&key) {
                Some(record) => record,
                None => {
                    // the relation table points at a community the names
                    // table does not know
                    skipped += 1;
                    warn!(community = %key, "row dropped: unknown community code");
                    continue;
                }
            },
            Grouping::Province => records
                .entry(key)
                .or_insert_with(|| AggregatedRecord::new(name.clone())),
        };

        for (slot, values) in parsed {
            let series = match slot {
                Slot::Total => &mut record.total,
                Slot::Male => &mut record.male,
                Slot::Female => &mut record.female,
            };
            for (acc, value) in series.iter_mut().zip(values) {
                *acc += value;
            }
        }
        record.touched = true;
    }

    if skipped > 0 {
        warn!("{} CSV rows discarded", skipped);
    }
    Ok(records)
}

/// Top `n` codes by mean of the Total series, descending; ties break on
/// ascending code so the ranking is deterministic.
pub fn top_by_mean_total(
    records: &BTreeMap<String, AggregatedRecord>,
    n: usize,
) -> Vec<(String, f64)> {
    let mut ranking: Vec<(String, f64)> = records
        .iter()
        .map(|(code, record)| {
            let mean = record.total.iter().sum::<f64>() / record.total.len() as f64;
            (code.clone(), mean)
        })
        .collect();
    ranking.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranking.truncate(n);
    ranking
}

fn is_data_row(first: &str) -> bool {
    let cell = first.trim_start();
    cell.chars()
        .next()
        .map(|c| c.is_ascii_digit())
        .unwrap_or(false)
        || cell.contains(NATIONAL_NAME)
}

fn resolve_community(code: &str, lookups: &Lookups, fuzzy: bool) -> Option<String> {
    let map = &lookups.province_to_community;
    if !fuzzy {
        return map.get(code).cloned();
    }
    let padded = format!("{:0>2}", code);
    if let Some(community) = map.get(padded.as_str()) {
        return Some(community.clone());
    }
    if let Some(community) = map.get(code) {
        return Some(community.clone());
    }
    map.get(code.trim_start_matches('0')).cloned()
}

fn read_window(row: &csv::StringRecord, window: &Window, cells: CellPolicy) -> Option<TimeSeries> {
    let mut values: TimeSeries = [0.0; 8];
    for (i, value) in values.iter_mut().enumerate() {
        let raw = row.get(window.start + i)?;
        *value = match cells {
            CellPolicy::Zero => numeric::parse_cell_or_zero(raw, window.clean),
            CellPolicy::SkipRow => match numeric::parse_cell(raw, window.clean) {
                Ok(parsed) => parsed,
                Err(_) => return None,
            },
        };
    }
    Some(values)
}
