use terrain_core::utils::normalize;
use terrain_core::{GenerationParams, HeightGrid, generate_seeded};
use image::{Rgb, RgbImage};
use palette::{Gradient, LinSrgb};
use std::path::Path;

// Compute simple hillshade for a height grid
// `z_scale` adjusts vertical exaggeration
fn hillshade(grid: &HeightGrid, z_scale: f32) -> Vec<f32> {
    let size = grid.size();
    let mut shade = vec![0.0; size * size];
    let azimuth = std::f32::consts::PI / 4.0; // 45°
    let altitude = std::f32::consts::PI / 4.0; // 45°
    let (sin_alt, cos_alt) = altitude.sin_cos();

    for row in 1..size - 1 {
        for col in 1..size - 1 {
            // 3×3 neighborhood finite differences
            let dzdx = ((grid.get(row, col + 1) - grid.get(row, col - 1)) / 2.0) * z_scale;
            let dzdy = ((grid.get(row + 1, col) - grid.get(row - 1, col)) / 2.0) * z_scale;
            // Surface normal
            let nx = -dzdx;
            let ny = -dzdy;
            let nz = 1.0;
            let len = (nx * nx + ny * ny + nz * nz).sqrt();
            let (nx, ny, nz) = (nx / len, ny / len, nz / len);
            // Light vector from azimuth/altitude
            let lx = azimuth.cos() * cos_alt;
            let ly = azimuth.sin() * cos_alt;
            let lz = sin_alt;
            // Lambertian dot
            shade[row * size + col] = (nx * lx + ny * ly + nz * lz).max(0.0);
        }
    }
    shade
}

fn main() {
    // Generate a large terrain
    let params = GenerationParams {
        detail_exponent: 9, // 2^9 + 1 = 513
        max_initial_height: 20.0,
        roughness: 30.0,
    };
    let mut terrain = generate_seeded(&params, 2025).expect("valid parameters");
    let size = terrain.size();

    // Normalize heights to 0.0..1.0 before shading and coloring
    normalize(&mut terrain);
    let shade = hillshade(&terrain, 40.0);

    // Color gradient - deep water to beach to grass to rock to snow
    let gradient = Gradient::with_domain(vec![
        (0.00, LinSrgb::new(0.0, 0.0, 0.5)), // deep blue
        (0.30, LinSrgb::new(0.8, 0.8, 0.5)), // sand
        (0.50, LinSrgb::new(0.1, 0.6, 0.2)), // green
        (0.75, LinSrgb::new(0.5, 0.4, 0.3)), // rock
        (1.00, LinSrgb::new(1.0, 1.0, 1.0)), // snow
    ]);

    // Build final image
    let mut img = RgbImage::new(size as u32, size as u32);
    for row in 0..size {
        for col in 0..size {
            // Base color from gradient
            let color: LinSrgb = gradient.get(terrain.get(row, col));
            let rgb = color.into_format::<u8>();
            // Apply hillshade
            let light = (shade[row * size + col] * 0.5 + 0.5).clamp(0.0, 1.0);
            let pixel = Rgb([
                (rgb.red as f32 * light) as u8,
                (rgb.green as f32 * light) as u8,
                (rgb.blue as f32 * light) as u8,
            ]);
            img.put_pixel(col as u32, row as u32, pixel);
        }
    }

    // Save
    let path = Path::new("terrain_final.png");
    img.save(path).expect("failed to write PNG");
    println!("Saved final terrain image to {:?}", path);
}
