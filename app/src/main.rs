use std::time::Instant;

use terrain_core::utils::{normalize, to_gray_image, to_terrain_image};
use terrain_core::{GenerationParams, HeightGrid, generate_seeded};
use eframe::{App, Frame, NativeOptions, egui, run_native};
use egui::{ColorImage, TextureHandle};
use log::{info, warn};
use storage::TerrainStore;
use storage::models::TerrainDoc;

const DB_NAME: &str = "terrain_db";
const COLLECTION: &str = "terrains";

fn mongo_uri() -> String {
    std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
enum Material {
    Terrain,
    Grayscale,
}

impl Default for Material {
    fn default() -> Self {
        Material::Terrain
    }
}

struct TerrainApp {
    // parameters
    // slider is for n; size = 2^n + 1
    exp: u32,
    seed: u64,
    max_initial_height: f32,
    roughness: f32,

    // display options
    material: Material,
    height_scale: f32,

    // generated terrain
    raw_grid: Option<HeightGrid>,
    display_grid: Option<HeightGrid>, // normalized copy of raw_grid
    terrain_texture: Option<TextureHandle>,

    // timing & status
    last_duration: Option<f32>,
    status_message: String,
}

impl Default for TerrainApp {
    fn default() -> Self {
        Self {
            exp: 7, // 2^7 + 1 = 129
            seed: 2025,
            max_initial_height: 10.0,
            roughness: 8.0,
            material: Material::Terrain,
            height_scale: 60.0,
            raw_grid: None,
            display_grid: None,
            terrain_texture: None,
            last_duration: None,
            status_message: String::new(),
        }
    }
}

impl TerrainApp {
    fn params(&self) -> GenerationParams {
        GenerationParams {
            detail_exponent: self.exp,
            max_initial_height: self.max_initial_height,
            roughness: self.roughness,
        }
    }

    // RGB buffer for the current material option
    fn rgb_buffer(&self) -> Option<Vec<u8>> {
        let display = self.display_grid.as_ref()?;
        Some(match self.material {
            Material::Terrain => to_terrain_image(display),
            Material::Grayscale => to_gray_image(display),
        })
    }

    fn rebuild_texture(&mut self, ctx: &egui::Context) {
        let Some(display) = self.display_grid.as_ref() else {
            return;
        };
        let size = display.size();
        let rgb = match self.material {
            Material::Terrain => to_terrain_image(display),
            Material::Grayscale => to_gray_image(display),
        };
        let color_image = ColorImage::from_rgb([size, size], &rgb);
        self.terrain_texture =
            Some(ctx.load_texture("terrain", color_image, egui::TextureOptions::NEAREST));
    }

    // Install a freshly generated or loaded grid and refresh the texture
    fn apply_grid(&mut self, ctx: &egui::Context, grid: HeightGrid) {
        let mut display = grid.clone();
        normalize(&mut display);
        self.raw_grid = Some(grid);
        self.display_grid = Some(display);
        self.rebuild_texture(ctx);
    }

    fn save_png(&mut self) {
        let Some(display) = self.display_grid.as_ref() else {
            self.status_message = "Nothing to save yet".into();
            return;
        };
        let size = display.size() as u32;
        let Some(rgb) = self.rgb_buffer() else {
            return;
        };

        let picked = rfd::FileDialog::new()
            .add_filter("PNG image", &["png"])
            .set_file_name(format!("terrain_{}.png", self.seed))
            .save_file();

        if let Some(path) = picked {
            match image::save_buffer(&path, &rgb, size, size, image::ColorType::Rgb8) {
                Ok(()) => {
                    info!("saved terrain image to {:?}", path);
                    self.status_message = format!("Saved {}", path.display());
                }
                Err(e) => {
                    warn!("PNG save failed: {}", e);
                    self.status_message = format!("Save error: {}", e);
                }
            }
        }
    }

    fn save_to_db(&mut self) {
        let Some(grid) = self.raw_grid.as_ref() else {
            self.status_message = "Nothing to save yet".into();
            return;
        };
        let doc = TerrainDoc::from_grid(
            &format!("terrain-{}", self.seed),
            self.seed,
            self.params(),
            grid,
        );

        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                self.status_message = format!("Runtime error: {}", e);
                return;
            }
        };

        match rt.block_on(TerrainStore::init(&mongo_uri(), DB_NAME, COLLECTION)) {
            Ok(storage) => {
                self.status_message = match rt.block_on(storage.create(doc)) {
                    Ok(()) => {
                        info!("saved terrain (seed {}) to MongoDB", self.seed);
                        "Saved to MongoDB".into()
                    }
                    Err(e) => format!("DB error: {}", e),
                };
            }
            Err(e) => {
                self.status_message = format!("DB init error: {}", e);
            }
        }
    }

    fn load_from_db(&mut self, ctx: &egui::Context) {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                self.status_message = format!("Runtime error: {}", e);
                return;
            }
        };

        match rt.block_on(TerrainStore::init(&mongo_uri(), DB_NAME, COLLECTION)) {
            Ok(storage) => match rt.block_on(storage.read_by_seed(self.seed as i64)) {
                Ok(Some(doc)) => {
                    let (params, grid) = doc.into_grid();
                    // restore the parameter panel to match the stored terrain
                    self.exp = params.detail_exponent;
                    self.max_initial_height = params.max_initial_height;
                    self.roughness = params.roughness;
                    self.apply_grid(ctx, grid);
                    info!("loaded terrain (seed {}) from MongoDB", self.seed);
                    self.status_message = "Loaded from MongoDB".into();
                }
                Ok(None) => {
                    self.status_message = "No entry for this seed".into();
                }
                Err(e) => {
                    self.status_message = format!("DB error: {}", e);
                }
            },
            Err(e) => {
                self.status_message = format!("DB init error: {}", e);
            }
        }
        ctx.request_repaint();
    }

    // Oblique side-view mesh of the normalized grid, size×size vertices
    fn mesh_preview(&self, ui: &mut egui::Ui) {
        let Some(display) = self.display_grid.as_ref() else {
            ui.label("no data");
            return;
        };
        let size = display.size();
        let rect = ui.available_rect_before_wrap();
        let cell = (rect.width() / (size as f32 * 1.6)).max(0.5);
        let origin = egui::pos2(rect.left() + 10.0, rect.top() + self.height_scale + 10.0);

        let mut verts = Vec::new();
        let mut inds = Vec::new();
        for row in 0..size - 1 {
            for col in 0..size - 1 {
                let corners = [
                    (row, col),
                    (row, col + 1),
                    (row + 1, col),
                    (row + 1, col + 1),
                ];
                for &(r, c) in &corners {
                    let h = display.get(r, c);
                    // height lifts the vertex, depth pushes it right and down
                    let px = origin.x + c as f32 * cell + r as f32 * cell * 0.45;
                    let py = origin.y + r as f32 * cell * 0.25 - h * self.height_scale;
                    let shade = (h * 255.0) as u8;
                    verts.push(egui::epaint::Vertex {
                        pos: egui::pos2(px, py),
                        uv: egui::pos2(0.0, 0.0),
                        color: egui::Color32::from_gray(shade),
                    });
                }
                let base = verts.len() as u32 - 4;
                inds.extend_from_slice(&[base, base + 1, base + 2, base + 1, base + 3, base + 2]);
            }
        }
        let mesh = egui::epaint::Mesh {
            vertices: verts,
            indices: inds,
            texture_id: egui::TextureId::default(),
        };
        ui.painter().add(egui::epaint::Shape::mesh(mesh));
    }
}

impl App for TerrainApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        // compute real size
        let size = (1usize << self.exp) + 1;

        egui::SidePanel::left("controls").show(ctx, |ui| {
            ui.heading("Terrain Visualizer");
            ui.separator();

            // Resolution slider
            let prev_size = (1usize << self.exp) + 1;
            ui.horizontal(|ui| {
                ui.label("Resolution 2^n+1:");
                ui.add(
                    egui::Slider::new(&mut self.exp, 4..=9)
                        .text(format!("{}×{}", size, size))
                        .step_by(1.0),
                );
                if prev_size != (1usize << self.exp) + 1 {
                    self.terrain_texture = None; // reset preview on size change
                    self.raw_grid = None;
                    self.display_grid = None;
                    self.status_message = "Preview reset due to size change".into();
                }
            });

            // Seed
            ui.label("Seed");
            ui.add(egui::DragValue::new(&mut self.seed).speed(1.0));

            ui.label("Max Initial Height");
            ui.add(egui::Slider::new(&mut self.max_initial_height, 0.0..=50.0));

            ui.label("Roughness");
            ui.add(egui::Slider::new(&mut self.roughness, 0.0..=50.0));

            // Material selector
            ui.label("Material");
            let prev_material = self.material;
            egui::ComboBox::from_label("Palette")
                .selected_text(format!("{:?}", self.material))
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut self.material, Material::Terrain, "Terrain");
                    ui.selectable_value(&mut self.material, Material::Grayscale, "Grayscale");
                });
            if prev_material != self.material {
                self.rebuild_texture(ctx);
            }

            ui.label("Preview Height Scale");
            ui.add(egui::Slider::new(&mut self.height_scale, 10.0..=200.0));

            ui.separator();

            // Generate & measure
            if ui.button("Generate Terrain").clicked() {
                let start = Instant::now();
                match generate_seeded(&self.params(), self.seed) {
                    Ok(grid) => {
                        self.apply_grid(ctx, grid);
                        self.last_duration = Some(start.elapsed().as_secs_f32() * 1000.0);
                        info!(
                            "generated {}×{} terrain (seed {}) in {:.2} ms",
                            size,
                            size,
                            self.seed,
                            self.last_duration.unwrap_or(0.0)
                        );
                        self.status_message = format!(
                            "Generated in {:.2} ms (seed {})",
                            self.last_duration.unwrap_or(0.0),
                            self.seed
                        );
                    }
                    Err(e) => {
                        warn!("generation rejected: {}", e);
                        self.status_message = format!("Invalid parameters: {}", e);
                    }
                }
                ctx.request_repaint();
            }

            // Save to PNG
            if ui.button("Save PNG…").clicked() {
                self.save_png();
            }

            // Save to DB
            if ui.button("Save to DB…").clicked() {
                self.save_to_db();
            }

            // Load from DB
            if ui.button("Load from DB…").clicked() {
                self.load_from_db(ctx);
            }

            ui.separator();
            ui.label(&self.status_message);
        });

        // central display
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(tex) = &self.terrain_texture {
                let available = ui.available_size();
                let tex_size = egui::Vec2::splat(available.x.min(available.y * 0.55));
                ui.image((tex.id(), tex_size));
                ui.separator();
                ui.label("3D Preview:");
                self.mesh_preview(ui);
            } else {
                ui.centered_and_justified(|ui| {
                    ui.label("Click “Generate Terrain” to start");
                });
            }
        });
    }
}

fn main() {
    env_logger::init();

    let opts = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 640.0])
            .with_min_inner_size([400.0, 300.0]),
        ..Default::default()
    };
    run_native(
        "Fractal Terrain Visualizer",
        opts,
        Box::new(|_cc| Ok(Box::new(TerrainApp::default()))),
    )
    .expect("failed to start eframe");
}
