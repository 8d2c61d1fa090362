// In tests/session_tests.rs

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use svd_explorer::{
    spawn_engine, DisplaySink, ExplorerConfig, ExplorerSession, GrayscaleImage, ImageSource,
    InMemoryImageSource, PointerEvent, PointerPosition, Precision, ReconstructionFrame,
    SessionError, TrackGeometry,
};

/// Display collaborator that records what it was asked to draw.
#[derive(Default)]
struct RecordingSink {
    originals: Vec<(String, Array2<u8>)>,
    curves: Vec<Array1<f64>>,
    frames: Vec<(usize, f64, Array2<u8>)>,
}

impl DisplaySink for RecordingSink {
    fn show_original(&mut self, name: &str, pixels: ArrayView2<'_, u8>) {
        self.originals.push((name.to_string(), pixels.to_owned()));
    }

    fn show_explained_variance(&mut self, curve: ArrayView1<'_, f64>) {
        self.curves.push(curve.to_owned());
    }

    fn show_reconstruction(&mut self, frame: ReconstructionFrame<'_>) {
        self.frames.push((frame.rank, frame.explained_variance, frame.pixels.to_owned()));
    }
}

/// Smooth image with a few independent components plus texture.
fn synthetic_image(name: &str, rows: usize, cols: usize) -> GrayscaleImage {
    let pixels = Array2::from_shape_fn((rows, cols), |(i, j)| {
        let x = j as f64 / cols as f64;
        let y = i as f64 / rows as f64;
        let value = 128.0
            + 60.0 * (6.0 * x).sin() * (4.0 * y).cos()
            + 40.0 * (11.0 * x * y).sin()
            + ((i * 7 + j * 13) % 17) as f64;
        value.clamp(0.0, 255.0) as u8
    });
    GrayscaleImage::new(name, pixels).unwrap()
}

fn track() -> TrackGeometry {
    TrackGeometry::horizontal(0.0, 100.0).with_vertical_extent(500.0, 20.0)
}

fn on_track(x: f64) -> PointerPosition {
    PointerPosition::new(x, 510.0)
}

#[test]
fn present_pushes_original_curve_and_initial_reconstruction() {
    let image = synthetic_image("waves.png", 24, 32);
    let session = ExplorerSession::load(image.clone(), track(), &ExplorerConfig::default()).unwrap();
    let mut sink = RecordingSink::default();
    session.present(&mut sink).unwrap();

    assert_eq!(sink.originals.len(), 1);
    assert_eq!(sink.originals[0].0, "waves.png");
    assert_eq!(&sink.originals[0].1, image.pixels());

    assert_eq!(sink.curves.len(), 1);
    assert_eq!(sink.curves[0].len(), 24);
    assert!((sink.curves[0][23] - 1.0).abs() < 1e-12);

    assert_eq!(sink.frames.len(), 1);
    let (rank, variance, pixels) = &sink.frames[0];
    assert_eq!(*rank, 3);
    assert_eq!(*variance, sink.curves[0][2]);
    assert_eq!(pixels.dim(), (24, 32));
}

#[test]
fn sink_is_only_called_on_genuine_rank_changes() {
    let config = ExplorerConfig { max_singular_values: Some(10), ..ExplorerConfig::default() };
    let mut session = ExplorerSession::load(synthetic_image("waves", 20, 20), track(), &config).unwrap();
    let mut sink = RecordingSink::default();

    let events = [
        PointerEvent::Move(on_track(90.0)),   // idle: ignored
        PointerEvent::Press(PointerPosition::new(50.0, 0.0)), // misses the track vertically
        PointerEvent::Move(on_track(90.0)),   // still idle
        PointerEvent::Press(on_track(20.0)),
        PointerEvent::Move(on_track(20.0)),   // 2.8 -> 3, unchanged
        PointerEvent::Move(on_track(100.0)),  // -> 10
        PointerEvent::Move(on_track(99.0)),   // 9.91 -> 10, unchanged
        PointerEvent::Move(on_track(0.0)),    // -> 1
        PointerEvent::Release,
        PointerEvent::Move(on_track(60.0)),   // idle again
    ];
    let changes: Vec<bool> = events
        .iter()
        .map(|event| session.handle_event(*event, &mut sink).unwrap())
        .collect();

    assert_eq!(
        changes,
        vec![false, false, false, false, false, true, false, true, false, false]
    );
    let ranks: Vec<usize> = sink.frames.iter().map(|(rank, _, _)| *rank).collect();
    assert_eq!(ranks, vec![10, 1]);
    assert_eq!(session.rank(), 1);
    assert_eq!(session.current_reconstruction(), &sink.frames[1].2);
}

#[test]
fn full_rank_slider_position_reproduces_image() {
    let image = synthetic_image("waves", 16, 12);
    let mut session = ExplorerSession::load(image.clone(), track(), &ExplorerConfig::default()).unwrap();
    let mut sink = RecordingSink::default();

    session.handle_event(PointerEvent::Press(on_track(100.0)), &mut sink).unwrap();
    assert!(session.handle_event(PointerEvent::Move(on_track(100.0)), &mut sink).unwrap());

    assert_eq!(session.rank(), 12);
    assert_eq!(session.current_reconstruction(), image.pixels());
    let (_, variance, _) = sink.frames.last().unwrap();
    assert!((variance - 1.0).abs() < 1e-12);
}

#[test]
fn replace_image_resets_engine_and_controller_but_keeps_geometry() {
    let config = ExplorerConfig::default();
    let mut session = ExplorerSession::load(synthetic_image("first", 18, 18), track(), &config).unwrap();
    let mut sink = RecordingSink::default();
    session.handle_event(PointerEvent::Press(on_track(0.0)), &mut sink).unwrap();
    session.handle_event(PointerEvent::Move(on_track(100.0)), &mut sink).unwrap();
    assert_eq!(session.rank(), 18);

    let frames_before = sink.frames.len();
    session.replace_image(synthetic_image("second", 10, 30), &config, &mut sink).unwrap();
    assert_eq!(session.name(), "second");
    assert_eq!(sink.originals.len(), 1);
    assert_eq!(sink.originals[0].0, "second");
    assert_eq!(sink.originals[0].1.dim(), (10, 30));
    assert_eq!(sink.curves.len(), 1);
    assert_eq!(sink.curves[0].len(), 10);
    assert_eq!(sink.frames.len(), frames_before + 1);
    assert_eq!(sink.frames.last().unwrap().0, config.initial_rank);
    assert_eq!(session.rank(), config.initial_rank);
    assert_eq!(session.engine().max_rank(), 10);
    assert!(!session.controller().is_dragging());
    assert_eq!(session.controller().geometry(), track());
    assert_eq!(session.current_reconstruction().dim(), (10, 30));
}

#[test]
fn failed_replace_keeps_previous_image() {
    let config = ExplorerConfig::default();
    let mut session = ExplorerSession::load(synthetic_image("keep", 8, 8), track(), &config).unwrap();

    // A single-row image has one singular value, which leaves no room for a slider.
    let mut sink = RecordingSink::default();
    let err = session.replace_image(synthetic_image("sliver", 1, 40), &config, &mut sink).unwrap_err();
    assert!(matches!(err, SessionError::Controller(_)));
    assert!(sink.originals.is_empty() && sink.curves.is_empty() && sink.frames.is_empty());
    assert_eq!(session.name(), "keep");
    assert_eq!(session.engine().max_rank(), 8);
}

#[test]
fn single_precision_session_matches_double_precision() {
    let image = synthetic_image("waves", 20, 26);
    let single_config = ExplorerConfig { precision: Precision::Single, ..ExplorerConfig::default() };
    let single = ExplorerSession::load(image.clone(), track(), &single_config).unwrap();
    let double = ExplorerSession::load(image, track(), &ExplorerConfig::default()).unwrap();

    assert_eq!(single.engine().precision(), Precision::Single);
    let max_pixel_difference = single
        .current_reconstruction()
        .iter()
        .zip(double.current_reconstruction().iter())
        .map(|(a, b)| (*a as i16 - *b as i16).abs())
        .max()
        .unwrap();
    assert!(max_pixel_difference <= 1, "difference {max_pixel_difference}");
}

#[test]
fn open_reads_through_image_source() {
    let source = InMemoryImageSource::new(synthetic_image("memory", 9, 9));
    let session = ExplorerSession::open(&source, track(), &ExplorerConfig::default()).unwrap();
    assert_eq!(session.name(), "memory");
    assert_eq!(session.image(), &source.load_grayscale().unwrap());
}

#[test]
fn background_engine_is_adopted_by_session() {
    let image = synthetic_image("async", 14, 21);
    let pending = spawn_engine(image.pixels().clone(), Precision::Double);
    let engine = pending.wait().unwrap();
    let session = ExplorerSession::from_engine(image, engine, track(), &ExplorerConfig::default()).unwrap();
    assert_eq!(session.rank(), 3);
}

#[test]
fn background_engine_for_another_image_is_rejected() {
    let engine = spawn_engine(Array2::from_elem((5, 5), 10u8), Precision::Single).wait().unwrap();
    let result = ExplorerSession::from_engine(
        synthetic_image("other", 6, 5),
        engine,
        track(),
        &ExplorerConfig::default(),
    );
    assert!(matches!(
        result,
        Err(SessionError::ShapeMismatch { image: (6, 5), engine: (5, 5) })
    ));
}

#[test]
fn invalid_geometry_is_reported_at_load() {
    let result = ExplorerSession::load(
        synthetic_image("waves", 8, 8),
        TrackGeometry::horizontal(0.0, -5.0),
        &ExplorerConfig::default(),
    );
    let err = result.unwrap_err();
    assert!(matches!(err, SessionError::Controller(_)));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn resize_remaps_pointer_to_new_track() {
    let config = ExplorerConfig { max_singular_values: Some(10), ..ExplorerConfig::default() };
    let mut session = ExplorerSession::load(synthetic_image("waves", 12, 12), track(), &config).unwrap();
    let mut sink = RecordingSink::default();

    session.set_geometry(TrackGeometry::horizontal(200.0, 400.0)).unwrap();
    session.handle_event(PointerEvent::Press(PointerPosition::new(400.0, 0.0)), &mut sink).unwrap();
    session.handle_event(PointerEvent::Move(PointerPosition::new(400.0, 0.0)), &mut sink).unwrap();
    // 1 + 0.5 * 9 = 5.5 -> 6
    assert_eq!(session.rank(), 6);
}
