use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use arsenic_detect::{
    ClassificationBasis, CorpusSource, DetectionService, Label, PredictionLog, ReloadSummary,
};
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use tempfile::TempDir;

fn uniform_png(v: u8) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 24, Rgb([v, v, v])))
        .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
        .unwrap();
    buf
}

fn service(root: &Path, infected: &[u8], healthy: &[u8]) -> DetectionService {
    let source = CorpusSource::from_training_root(root, 500);
    std::fs::create_dir_all(&source.infected_dir).unwrap();
    std::fs::create_dir_all(&source.not_infected_dir).unwrap();
    for (i, v) in infected.iter().enumerate() {
        std::fs::write(source.infected_dir.join(format!("inf_{i}.png")), uniform_png(*v)).unwrap();
    }
    for (i, v) in healthy.iter().enumerate() {
        std::fs::write(source.not_infected_dir.join(format!("ok_{i}.png")), uniform_png(*v)).unwrap();
    }
    DetectionService::new(source)
}

#[test]
fn empty_directories_give_placeholder_not_infected() {
    let root = TempDir::new().unwrap();
    let svc = service(root.path(), &[], &[]);
    assert_eq!(svc.reload_corpus().total_samples, 0);

    for _ in 0..20 {
        let r = svc.predict(&uniform_png(90)).unwrap();
        assert_eq!(r.label, Label::NotInfected);
        assert_eq!(r.basis, ClassificationBasis::NoReferenceData);
        assert!((0.50..=0.75).contains(&r.confidence), "confidence {}", r.confidence);
    }
}

#[test]
fn nearest_reference_decides_with_distance_confidence() {
    let root = TempDir::new().unwrap();
    let svc = service(root.path(), &[100], &[200]);
    svc.reload_corpus();

    // Uniform grey v extracts to (v, v, v, v, 0).
    let r = svc.predict(&uniform_png(102)).unwrap();
    assert_eq!(r.label, Label::Infected);
    assert_eq!(r.basis, ClassificationBasis::NearestNeighbor);
    assert!((r.confidence - (1.0 - 4.0 / 200.0)).abs() < 1e-6, "confidence {}", r.confidence);
}

#[test]
fn same_image_in_both_classes_is_infected_at_floor() {
    let root = TempDir::new().unwrap();
    let svc = service(root.path(), &[128], &[128]);
    svc.reload_corpus();

    let r = svc.predict(&uniform_png(128)).unwrap();
    assert_eq!(r.label, Label::Infected);
    assert!((r.confidence - 0.55).abs() < 1e-12);
}

#[test]
fn reload_is_repeatable() {
    let root = TempDir::new().unwrap();
    let svc = service(root.path(), &[10, 20], &[240]);
    let first = svc.reload_corpus();
    let second = svc.reload_corpus();
    assert_eq!(first, second);
    assert_eq!(second, ReloadSummary { infected_samples: 2, healthy_samples: 1, total_samples: 3, skipped_files: 0 });
}

#[test]
fn corrupt_reference_is_skipped_not_fatal() {
    let root = TempDir::new().unwrap();
    let svc = service(root.path(), &[10], &[240]);
    std::fs::write(svc.source().infected_dir.join("broken.png"), b"not a png at all").unwrap();
    std::fs::write(svc.source().infected_dir.join("notes.txt"), b"ignored").unwrap();

    let (report, summary) = svc.reload_corpus_with_report();
    assert_eq!(summary.infected_samples, 1);
    assert_eq!(summary.skipped_files, 1);
    assert_eq!(report.class(Label::Infected).skipped.len(), 1);
    assert!(report.class(Label::Infected).skipped[0].path.ends_with("broken.png"));
}

#[test]
fn predictions_during_reload_see_a_whole_corpus() {
    let root = TempDir::new().unwrap();
    let svc = Arc::new(service(root.path(), &[20, 30, 40], &[220, 230]));
    svc.reload_corpus();
    let log = Arc::new(PredictionLog::new());

    let mut handles = Vec::new();
    for t in 0..4 {
        let svc = Arc::clone(&svc);
        let log = Arc::clone(&log);
        handles.push(thread::spawn(move || {
            let query = uniform_png(25);
            for i in 0..5 {
                let r = svc.predict(&query).unwrap();
                assert_eq!(r.label, Label::Infected);
                assert!((0.0..=1.0).contains(&r.confidence));
                log.record(&format!("{t}_{i}.png"), &r, None);
            }
        }));
    }
    for _ in 0..3 {
        let s = svc.reload_corpus();
        assert_eq!(s.total_samples, 5);
    }
    for h in handles {
        h.join().unwrap();
    }

    let summary = log.summary();
    assert_eq!(summary.total_predictions, 20);
    assert_eq!(summary.infected_count, 20);
    assert_eq!(summary.infection_rate, 100.0);
}
