use std::collections::{BTreeMap, HashMap};

/// Year axis as stored in the CSV: index 0 = 2017, index 7 = 2010.
pub const YEARS: [i32; 8] = [2017, 2016, 2015, 2014, 2013, 2012, 2011, 2010];

/// Years that have a predecessor inside the window (2011 is the earliest
/// year whose previous value is still in the CSV).
pub const VARIATION_YEARS: [i32; 7] = [2017, 2016, 2015, 2014, 2013, 2012, 2011];

/// Synthetic whole-country entity. Sorts before every real code.
pub const NATIONAL_CODE: &str = "00";
pub const NATIONAL_NAME: &str = "Total Nacional";

/// One value per year, in the CSV's descending chronological order.
pub type TimeSeries = [f64; 8];

#[derive(Debug, Clone, Default)]
pub struct AggregatedRecord {
    pub name: String,
    pub total: TimeSeries,
    pub male: TimeSeries,
    pub female: TimeSeries,
    /// True once at least one CSV row has contributed.
    pub touched: bool,
}

impl AggregatedRecord {
    pub fn new(name: impl Into<String>) -> Self {
        AggregatedRecord {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Lookups {
    /// Community code -> display name, in code order.
    pub community_names: BTreeMap<String, String>,
    /// Province code -> owning community code.
    pub province_to_community: HashMap<String, String>,
}
