pub mod visualization;

use serde::Serialize;

use crate::{CopyMoveReport, SorterParams};

#[derive(Serialize)]
pub struct JsonReport {
    pub image_width: u32,
    pub image_height: u32,
    pub params: SorterParams,
    pub hit_count: usize,
    pub hits: Vec<HitSection>,
}

#[derive(Serialize)]
pub struct HitSection {
    pub ranking: usize,
    pub dx: i32,
    pub dy: i32,
    pub pair_count: usize,
    pub centroid_x: u32,
    pub centroid_y: u32,
}

impl From<&CopyMoveReport> for JsonReport {
    fn from(report: &CopyMoveReport) -> Self {
        let (image_width, image_height) = report.images.from.dimensions();

        Self {
            image_width,
            image_height,
            params: report.params.clone(),
            hit_count: report.hits.len(),
            hits: report
                .hits
                .iter()
                .map(|hit| {
                    let centroid = hit.centroid();
                    HitSection {
                        ranking: hit.ranking(),
                        dx: hit.dx(),
                        dy: hit.dy(),
                        pair_count: hit.pairs().len(),
                        centroid_x: centroid.x,
                        centroid_y: centroid.y,
                    }
                })
                .collect(),
        }
    }
}

impl JsonReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
