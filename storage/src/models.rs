use bson::oid::ObjectId;
use terrain_core::{GenerationParams, HeightGrid};
use serde::{Deserialize, Serialize};

// Generation inputs as persisted alongside the grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredParams {
    pub detail_exponent: u32,
    pub max_initial_height: f32,
    pub roughness: f32,
}

impl From<GenerationParams> for StoredParams {
    fn from(p: GenerationParams) -> Self {
        Self {
            detail_exponent: p.detail_exponent,
            max_initial_height: p.max_initial_height,
            roughness: p.roughness,
        }
    }
}

impl From<StoredParams> for GenerationParams {
    fn from(p: StoredParams) -> Self {
        Self {
            detail_exponent: p.detail_exponent,
            max_initial_height: p.max_initial_height,
            roughness: p.roughness,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TerrainDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none", default)]
    pub id: Option<ObjectId>,
    pub name: String,
    pub seed: i64,
    pub params: StoredParams,
    // Flattened row-major: length = size×size
    pub height_map: Vec<f32>,
    pub size: u32,
}

impl TerrainDoc {
    // Snapshot a generated grid together with the inputs that produced it
    pub fn from_grid(name: &str, seed: u64, params: GenerationParams, grid: &HeightGrid) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            seed: seed as i64,
            params: params.into(),
            height_map: grid.as_slice().to_vec(),
            size: grid.size() as u32,
        }
    }

    // Rebuild the grid from the stored flat values
    pub fn into_grid(self) -> (GenerationParams, HeightGrid) {
        let grid = HeightGrid::from_raw(self.size as usize, self.height_map);
        (self.params.into(), grid)
    }
}
