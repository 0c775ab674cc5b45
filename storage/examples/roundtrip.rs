use terrain_core::{GenerationParams, generate_seeded};
use storage::TerrainStore;
use storage::models::TerrainDoc;

#[tokio::main]
async fn main() -> mongodb::error::Result<()> {
    // Generate a 257×257 terrain
    let params = GenerationParams {
        detail_exponent: 8,
        max_initial_height: 20.0,
        roughness: 16.0,
    };
    let grid = generate_seeded(&params, 2025).expect("valid parameters");
    let size = grid.size();

    // Build the document
    let doc = TerrainDoc::from_grid("demo-terrain", 2025, params, &grid);

    // Init storage
    let uri =
        std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let storage = TerrainStore::init(&uri, "terrain_db", "terrains").await?;

    // Insert & read back
    storage.create(doc).await?;
    if let Some(found) = storage.read_by_seed(2025).await? {
        println!(
            "Round-trip success: sample [128,128] = {}",
            found.height_map[128 * size + 128]
        );
    } else {
        println!("Document not found!");
    }

    // Clean up
    storage.delete_by_seed(2025).await?;
    Ok(())
}
