use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::corpus::label::Label;
use crate::corpus::reference_corpus::ReferenceCorpus;
use crate::error::ExtractionError;
use crate::features::{extract_features_from_path, FeatureVector};

/// File extensions recognised as reference images (compared case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Where reference images live and how many to take per class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusSource {
    pub infected_dir:     PathBuf,
    pub not_infected_dir: PathBuf,
    pub max_per_class:    usize,
}

impl CorpusSource {
    /// Uses `<root>/infected` and `<root>/not_infected`.
    pub fn from_training_root(root: &Path, max_per_class: usize) -> Self {
        CorpusSource {
            infected_dir:     root.join(Label::Infected.dir_name()),
            not_infected_dir: root.join(Label::NotInfected.dir_name()),
            max_per_class,
        }
    }

    pub fn dir(&self, label: Label) -> &Path {
        match label {
            Label::Infected    => &self.infected_dir,
            Label::NotInfected => &self.not_infected_dir,
        }
    }

    pub fn load(&self) -> CorpusLoad {
        load_corpus(&self.infected_dir, &self.not_infected_dir, self.max_per_class)
    }
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// A reference image that could not be turned into a feature vector.
#[derive(Debug)]
pub struct SkippedFile {
    pub path:  PathBuf,
    pub error: ExtractionError,
}

/// What happened while loading one class directory.
#[derive(Debug)]
pub struct ClassReport {
    pub label:   Label,
    /// Vectors successfully extracted and placed in the corpus.
    pub loaded:  usize,
    pub skipped: Vec<SkippedFile>,
    /// Recognised images beyond `max_per_class` that were not looked at.
    pub left_out: usize,
    /// The directory did not exist or could not be listed.
    pub directory_missing: bool,
}

#[derive(Debug)]
pub struct LoadReport {
    pub infected:     ClassReport,
    pub not_infected: ClassReport,
}

impl LoadReport {
    pub fn class(&self, label: Label) -> &ClassReport {
        match label {
            Label::Infected    => &self.infected,
            Label::NotInfected => &self.not_infected,
        }
    }

    pub fn skipped_count(&self) -> usize {
        self.infected.skipped.len() + self.not_infected.skipped.len()
    }
}

/// A freshly built corpus together with the report describing how it was built.
#[derive(Debug)]
pub struct CorpusLoad {
    pub corpus: ReferenceCorpus,
    pub report: LoadReport,
}

// ---------------------------------------------------------------------------
// Directory listing
// ---------------------------------------------------------------------------

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

/// Lists recognised image files directly inside `dir`, sorted by path so
/// that truncation and reload order are reproducible.
pub fn list_images(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "unreadable directory entry skipped");
                continue;
            }
        };
        if path.is_file() && is_image_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Number of recognised images in `dir`, ignoring any cap. A missing or
/// unreadable directory counts as empty.
pub fn count_images(dir: &Path) -> usize {
    list_images(dir).map(|paths| paths.len()).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Builds a new reference corpus from two labelled directories.
///
/// At most `max_per_class` images (in sorted order) are taken from each
/// directory. Files that fail extraction are skipped and reported; a missing
/// directory gives an empty class. Neither stops the rest of the load.
pub fn load_corpus(infected_dir: &Path, not_infected_dir: &Path, max_per_class: usize) -> CorpusLoad {
    let (infected, infected_report) = load_class(Label::Infected, infected_dir, max_per_class);
    let (not_infected, not_infected_report) =
        load_class(Label::NotInfected, not_infected_dir, max_per_class);

    CorpusLoad {
        corpus: ReferenceCorpus::new(infected, not_infected),
        report: LoadReport { infected: infected_report, not_infected: not_infected_report },
    }
}

/// Loads the reference vectors for one class directory.
pub fn load_class(label: Label, dir: &Path, max_per_class: usize) -> (Vec<FeatureVector>, ClassReport) {
    let mut report = ClassReport {
        label,
        loaded: 0,
        skipped: Vec::new(),
        left_out: 0,
        directory_missing: false,
    };

    let mut paths = match list_images(dir) {
        Ok(paths) => paths,
        Err(e) => {
            if e.kind() == io::ErrorKind::NotFound {
                warn!(label = %label, dir = %dir.display(), "reference directory missing; class left empty");
            } else {
                warn!(label = %label, dir = %dir.display(), error = %e, "cannot list reference directory; class left empty");
            }
            report.directory_missing = true;
            return (Vec::new(), report);
        }
    };

    if paths.len() > max_per_class {
        report.left_out = paths.len() - max_per_class;
        paths.truncate(max_per_class);
    }

    let mut vectors = Vec::new();
    for path in paths {
        match extract_features_from_path(&path) {
            Ok(vector) => vectors.push(vector),
            Err(error) => {
                warn!(label = %label, file = %path.display(), error = %error, "skipping reference image");
                report.skipped.push(SkippedFile { path, error });
            }
        }
    }
    report.loaded = vectors.len();

    info!(
        label = %label,
        loaded = report.loaded,
        skipped = report.skipped.len(),
        left_out = report.left_out,
        "reference class loaded"
    );
    (vectors, report)
}
