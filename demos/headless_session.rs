//! Drives an explorer session with a scripted drag and prints what a display
//! would draw. Pass an image path to load a file; otherwise a synthetic image is used.

use ndarray::{Array2, ArrayView1, ArrayView2};
use svd_explorer::{
    DisplaySink, ExplorerConfig, ExplorerSession, GrayscaleImage, PointerEvent, PointerPosition,
    ReconstructionFrame, TrackGeometry,
};

struct ConsoleSink;

impl DisplaySink for ConsoleSink {
    fn show_original(&mut self, name: &str, pixels: ArrayView2<'_, u8>) {
        println!("{} (original): {}x{}", name, pixels.nrows(), pixels.ncols());
    }

    fn show_explained_variance(&mut self, curve: ArrayView1<'_, f64>) {
        let preview: Vec<String> = curve.iter().take(8).map(|v| format!("{:.3}", v)).collect();
        println!("explained variance: [{}, ...] over {} ranks", preview.join(", "), curve.len());
    }

    fn show_reconstruction(&mut self, frame: ReconstructionFrame<'_>) {
        let mean = frame.pixels.iter().map(|&p| p as f64).sum::<f64>() / frame.pixels.len() as f64;
        println!(
            "{} singular values: explained variance {:.4}, mean intensity {:.1}",
            frame.rank, frame.explained_variance, mean
        );
    }
}

fn synthetic_image() -> GrayscaleImage {
    let pixels = Array2::from_shape_fn((96, 128), |(i, j)| {
        let ring = (((i as f64 - 48.0).powi(2) + (j as f64 - 64.0).powi(2)).sqrt() / 6.0).sin();
        (127.5 + 120.0 * ring) as u8
    });
    GrayscaleImage::new("rings", pixels).expect("synthetic image is not empty")
}

#[cfg(feature = "image-io")]
fn load_image(path: Option<String>) -> Result<GrayscaleImage, Box<dyn std::error::Error>> {
    use svd_explorer::{FileImageSource, ImageSource};
    match path {
        Some(path) => Ok(FileImageSource::new(path).load_grayscale()?),
        None => Ok(synthetic_image()),
    }
}

#[cfg(not(feature = "image-io"))]
fn load_image(_path: Option<String>) -> Result<GrayscaleImage, Box<dyn std::error::Error>> {
    Ok(synthetic_image())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let image = load_image(std::env::args().nth(1))?;
    let config = ExplorerConfig { max_singular_values: Some(30), ..ExplorerConfig::default() };
    let track = TrackGeometry::horizontal(30.0, 540.0).with_vertical_extent(520.0, 60.0);

    let mut session = ExplorerSession::load(image, track, &config)?;
    let mut sink = ConsoleSink;
    session.present(&mut sink)?;

    let y = 550.0;
    let mut events = vec![PointerEvent::Press(PointerPosition::new(30.0, y))];
    events.extend((0..=54).map(|step| PointerEvent::Move(PointerPosition::new(30.0 + step as f64 * 10.0, y))));
    events.push(PointerEvent::Release);

    let mut redraws = 0;
    for event in events.iter() {
        if session.handle_event(*event, &mut sink)? {
            redraws += 1;
        }
    }
    println!("{} events, {} reconstructions", events.len(), redraws);
    Ok(())
}
