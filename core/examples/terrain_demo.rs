use terrain_core::{GenerationParams, generate_seeded};

fn main() {
    // Generate a 129×129 terrain with seed 2025
    let params = GenerationParams {
        detail_exponent: 7,
        max_initial_height: 10.0,
        roughness: 8.0,
    };
    let grid = generate_seeded(&params, 2025).expect("valid parameters");

    // Print the top-left 16×16 corner of the grid
    for row in 0..16 {
        for col in 0..16 {
            print!("{:>7.3} ", grid.get(row, col));
        }
        println!();
    }
}
