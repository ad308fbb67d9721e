use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use log::{info, warn};
use logging_timer::timer;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;
use crate::error::HazardPulseError;
use crate::text::clean_text;

pub const LABEL_DISASTER: u8 = 1;
pub const LABEL_OTHER: u8 = 0;

const SMOOTHING_ALPHA: f64 = 1.0;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"));

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    TOKEN_RE.find_iter(text).map(|m| m.as_str().to_lowercase())
}

/// One labeled training document
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledText {
    pub text: String,
    pub label: u8,
}

impl LabeledText {
    pub fn new(text: impl Into<String>, label: u8) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// TF-IDF weighted multinomial naive Bayes text classifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Classifier {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
    classes: Vec<u8>,
    class_log_prior: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,
}

impl Classifier {
    pub fn train(docs: &[LabeledText]) -> Result<Self, HazardPulseError> {
        let _tmr = timer!("TRAIN_CLASSIFIER");

        if docs.is_empty() {
            return Err(HazardPulseError::Error(
                "Cannot train classifier on an empty dataset".to_string(),
            ));
        }
        if let Some(bad) = docs.iter().find(|d| d.label > LABEL_DISASTER) {
            return Err(HazardPulseError::Error(format!(
                "Invalid label {} - expected 0 or 1",
                bad.label
            )));
        }

        let cleaned: Vec<Vec<String>> = docs
            .iter()
            .map(|d| tokenize(&clean_text(&d.text)).collect())
            .collect();

        let vocabulary: BTreeMap<String, usize> = cleaned
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<String>>()
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term, idx))
            .collect();
        let n_features = vocabulary.len();
        let n_docs = docs.len() as f64;

        let mut doc_freq = vec![0usize; n_features];
        for tokens in &cleaned {
            let distinct: BTreeSet<usize> = tokens.iter().map(|t| vocabulary[t]).collect();
            for idx in distinct {
                doc_freq[idx] += 1;
            }
        }
        let idf: Vec<f64> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let classes: Vec<u8> = docs
            .iter()
            .map(|d| d.label)
            .collect::<BTreeSet<u8>>()
            .into_iter()
            .collect();

        let mut class_counts = vec![0usize; classes.len()];
        let mut feature_weight = vec![vec![0.0f64; n_features]; classes.len()];

        for (doc, tokens) in docs.iter().zip(&cleaned) {
            let class_idx = classes
                .iter()
                .position(|&c| c == doc.label)
                .unwrap_or_default();
            class_counts[class_idx] += 1;
            for (idx, weight) in tfidf(tokens.iter().map(String::as_str), &vocabulary, &idf) {
                feature_weight[class_idx][idx] += weight;
            }
        }

        let class_log_prior = class_counts
            .iter()
            .map(|&count| (count as f64 / n_docs).ln())
            .collect();

        let feature_log_prob = feature_weight
            .iter()
            .map(|weights| {
                let total: f64 = weights.iter().sum::<f64>() + SMOOTHING_ALPHA * n_features as f64;
                weights
                    .iter()
                    .map(|w| ((w + SMOOTHING_ALPHA) / total).ln())
                    .collect()
            })
            .collect();

        info!(
            "Trained classifier on {} documents ({} terms, {} classes)",
            docs.len(),
            n_features,
            classes.len()
        );

        Ok(Classifier {
            vocabulary,
            idf,
            classes,
            class_log_prior,
            feature_log_prob,
        })
    }

    /// Predicts the label of already cleaned text. Unknown terms are ignored and
    /// ties resolve to the lower label.
    pub fn predict(&self, text: &str) -> u8 {
        let tokens: Vec<String> = tokenize(text).collect();
        let features = tfidf(tokens.iter().map(String::as_str), &self.vocabulary, &self.idf);

        let mut best: Option<(u8, f64)> = None;
        for (class_idx, &class) in self.classes.iter().enumerate() {
            let jll = self.class_log_prior[class_idx]
                + features
                    .iter()
                    .map(|&(idx, weight)| weight * self.feature_log_prob[class_idx][idx])
                    .sum::<f64>();
            match best {
                Some((_, best_jll)) if jll <= best_jll => {}
                _ => best = Some((class, jll)),
            }
        }

        best.map(|(class, _)| class).unwrap_or(LABEL_OTHER)
    }

    pub fn is_disaster(&self, text: &str) -> bool {
        self.predict(text) == LABEL_DISASTER
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn save(&self, path: &Path) -> Result<(), HazardPulseError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string(self)?)?;
        info!("Saved classifier model to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, HazardPulseError> {
        let json = fs::read_to_string(path)?;
        let model: Classifier = serde_json::from_str(&json)?;
        model.ensure_consistent()?;
        Ok(model)
    }

    /// Loads the saved model, or trains one from the configured dataset and
    /// saves it when no model exists yet.
    pub fn load_or_train(config: &ClassifierConfig) -> Result<Self, HazardPulseError> {
        let model_path = Path::new(&config.model_path);
        if model_path.exists() {
            match Self::load(model_path) {
                Ok(model) => {
                    info!("Loaded classifier model from {}", model_path.display());
                    return Ok(model);
                }
                Err(e) => warn!(
                    "Could not load model {} ({}), retraining",
                    model_path.display(),
                    e
                ),
            }
        }
        let dataset_path = Path::new(&config.dataset_path);
        if !dataset_path.exists() {
            return Err(HazardPulseError::Error(format!(
                "No saved model at {} and no training dataset at {}",
                model_path.display(),
                dataset_path.display()
            )));
        }
        Self::train_and_save(config, dataset_path)
    }

    pub fn train_and_save(
        config: &ClassifierConfig,
        dataset_path: &Path,
    ) -> Result<Self, HazardPulseError> {
        let docs = load_dataset(dataset_path)?;
        let model = Self::train(&docs)?;
        model.save(Path::new(&config.model_path))?;
        Ok(model)
    }

    fn ensure_consistent(&self) -> Result<(), HazardPulseError> {
        let n_features = self.vocabulary.len();
        let n_classes = self.classes.len();
        let consistent = self.idf.len() == n_features
            && n_classes > 0
            && self.class_log_prior.len() == n_classes
            && self.feature_log_prob.len() == n_classes
            && self.feature_log_prob.iter().all(|row| row.len() == n_features)
            && self.vocabulary.values().all(|&idx| idx < n_features);

        if consistent {
            Ok(())
        } else {
            Err(HazardPulseError::Error(
                "Classifier model file is inconsistent".to_string(),
            ))
        }
    }
}

/// L2-normalised tf-idf weights as sparse (feature index, weight) pairs
fn tfidf<'a>(
    tokens: impl Iterator<Item = &'a str>,
    vocabulary: &BTreeMap<String, usize>,
    idf: &[f64],
) -> Vec<(usize, f64)> {
    let mut counts: HashMap<usize, f64> = HashMap::new();
    for token in tokens {
        if let Some(&idx) = vocabulary.get(token) {
            *counts.entry(idx).or_insert(0.0) += 1.0;
        }
    }

    let mut weights: Vec<(usize, f64)> = counts
        .into_iter()
        .map(|(idx, count)| (idx, count * idf[idx]))
        .collect();

    let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for (_, w) in weights.iter_mut() {
            *w /= norm;
        }
    }
    weights
}

/// Reads a CSV training set with `text` and `label` columns.
pub fn load_dataset(path: &Path) -> Result<Vec<LabeledText>, HazardPulseError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                HazardPulseError::Error(format!(
                    "Dataset {} has no '{}' column",
                    path.display(),
                    name
                ))
            })
    };
    let text_col = column("text")?;
    let label_col = column("label")?;

    let mut docs = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        let text = record.get(text_col).unwrap_or_default();
        let raw_label = record.get(label_col).unwrap_or_default().trim();
        let label = match raw_label {
            "0" => LABEL_OTHER,
            "1" => LABEL_DISASTER,
            _ => {
                return Err(HazardPulseError::Error(format!(
                    "Dataset {} row {}: invalid label '{}'",
                    path.display(),
                    row_idx + 2,
                    raw_label
                )))
            }
        };
        docs.push(LabeledText::new(text, label));
    }

    info!("Loaded {} training documents from {}", docs.len(), path.display());
    Ok(docs)
}
