use crate::grid::HeightGrid;

const GAMMA_CORRECTION: f32 = 1.2;
const WATER_THRESHOLD: f32 = 0.3;
const SAND_THRESHOLD: f32 = 0.4;
const GRASS_THRESHOLD: f32 = 0.6;
const ROCK_THRESHOLD: f32 = 0.8;

// Linearly interpolate between two RGB triples
fn lerp_color(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    [
        (a[0] as f32 + (b[0] as f32 - a[0] as f32) * t) as u8,
        (a[1] as f32 + (b[1] as f32 - a[1] as f32) * t) as u8,
        (a[2] as f32 + (b[2] as f32 - a[2] as f32) * t) as u8,
    ]
}

// Map a height in [0.0,1.0] to a realistic terrain color
fn height_to_rgb(h: f32) -> [u8; 3] {
    match h {
        x if x < WATER_THRESHOLD => {
            let t = x / WATER_THRESHOLD;
            lerp_color([0, 0, 128], [0, 128, 255], t) // deep to shallow water
        }
        x if x < SAND_THRESHOLD => {
            let t = (x - WATER_THRESHOLD) / (SAND_THRESHOLD - WATER_THRESHOLD);
            lerp_color([194, 178, 128], [220, 200, 160], t) // sand
        }
        x if x < GRASS_THRESHOLD => {
            let t = (x - SAND_THRESHOLD) / (GRASS_THRESHOLD - SAND_THRESHOLD);
            lerp_color([34, 139, 34], [50, 205, 50], t) // grass
        }
        x if x < ROCK_THRESHOLD => {
            let t = (x - GRASS_THRESHOLD) / (ROCK_THRESHOLD - GRASS_THRESHOLD);
            lerp_color([128, 128, 128], [192, 192, 192], t) // rock
        }
        x => {
            let t = (x - ROCK_THRESHOLD) / (1.0 - ROCK_THRESHOLD);
            lerp_color([220, 220, 220], [255, 255, 255], t) // snow
        }
    }
}

// Convert a normalized grid into an RGB byte buffer with terrain colors
pub fn to_terrain_image(grid: &HeightGrid) -> Vec<u8> {
    let mut buf = Vec::with_capacity(grid.len() * 3);
    for &h in grid.as_slice() {
        let [r, g, b] = height_to_rgb(h);
        buf.extend_from_slice(&[r, g, b]);
    }
    buf
}

// Grayscale variant of the same buffer, for the plain material option
pub fn to_gray_image(grid: &HeightGrid) -> Vec<u8> {
    let mut buf = Vec::with_capacity(grid.len() * 3);
    for &h in grid.as_slice() {
        let g = (h.clamp(0.0, 1.0) * 255.0) as u8;
        buf.extend_from_slice(&[g, g, g]);
    }
    buf
}

// Rescale heights into [0,1] for display; raw generator output is unbounded
pub fn normalize(grid: &mut HeightGrid) {
    let mut min = f32::MAX;
    let mut max = f32::MIN;

    for &val in grid.as_slice() {
        min = min.min(val);
        max = max.max(val);
    }

    let range = (max - min).max(0.001); // prevent zero-division
    for val in grid.as_mut_slice() {
        // normalize
        *val = (*val - min) / range;

        // Gamma curve for contrast boost
        *val = val.powf(GAMMA_CORRECTION);
    }
}
