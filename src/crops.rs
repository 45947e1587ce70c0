//! District → crop recommendation table.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::Result;

#[derive(Debug, Deserialize)]
struct Record {
    district: String,
    recommended_crop: String,
}

#[derive(Debug, Clone, Default)]
pub struct CropRecommender {
    by_district: HashMap<String, String>,
}

impl CropRecommender {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let recommender = Self::from_reader(std::fs::File::open(path)?)?;
        info!(
            path = %path.display(),
            districts = recommender.by_district.len(),
            "loaded crop recommendations"
        );
        Ok(recommender)
    }

    /// Reads `district,recommended_crop` rows. A district listed with
    /// several crops gets the most frequent one; ties go to the crop that
    /// sorts first.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut counts: HashMap<String, BTreeMap<String, usize>> = HashMap::new();

        for record in csv::Reader::from_reader(reader).deserialize::<Record>() {
            let Record {
                district,
                recommended_crop,
            } = record?;
            *counts
                .entry(normalize(&district))
                .or_default()
                .entry(recommended_crop.trim().to_string())
                .or_default() += 1;
        }

        let by_district = counts
            .into_iter()
            .filter_map(|(district, crops)| {
                let mut best: Option<(String, usize)> = None;
                for (crop, count) in crops {
                    if best.as_ref().map_or(true, |(_, top)| count > *top) {
                        best = Some((crop, count));
                    }
                }
                best.map(|(crop, _)| (district, crop))
            })
            .collect();

        Ok(Self { by_district })
    }

    pub fn recommend(&self, district: &str) -> Option<&str> {
        self.by_district.get(&normalize(district)).map(String::as_str)
    }
}

fn normalize(district: &str) -> String {
    district.trim().to_lowercase()
}
