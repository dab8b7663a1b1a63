//! Command execution.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use cohort_core::{
    LoadOptions, Modality, ModalitySummary, StudyConfig, StudyLoad, load_config, load_study,
    merge_study,
};
use cohort_ingest::write_csv;

/// Everything the summary printer needs after a load run.
pub struct LoadResult {
    pub data_dir: PathBuf,
    pub summaries: Vec<ModalitySummary>,
    /// (rows, columns, path) of the merged output, when requested.
    pub merged: Option<(usize, usize, Option<PathBuf>)>,
}

/// Options for [`run_load`], decoupled from the clap surface.
pub struct LoadRequest {
    pub data_dir: PathBuf,
    pub modalities: Vec<String>,
    pub merge: bool,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub include_sources: Vec<String>,
    pub exclude_sources: Vec<String>,
    pub clean: bool,
    pub progress: bool,
}

fn resolve_modalities(requested: &[String]) -> anyhow::Result<Vec<Modality>> {
    if requested.is_empty() {
        return Ok(Modality::ALL.to_vec());
    }
    let mut modalities = Vec::new();
    for name in requested {
        match Modality::parse(name) {
            Some(modality) => {
                if !modalities.contains(&modality) {
                    modalities.push(modality);
                }
            }
            None => bail!(
                "unknown modality '{name}' (expected one of: {})",
                Modality::ALL.map(Modality::name).join(", ")
            ),
        }
    }
    Ok(modalities)
}

fn resolve_config(path: Option<&Path>) -> anyhow::Result<StudyConfig> {
    match path {
        Some(path) => {
            load_config(path).with_context(|| format!("load config {}", path.display()))
        }
        None => Ok(StudyConfig::default()),
    }
}

pub fn run_load(request: &LoadRequest) -> anyhow::Result<LoadResult> {
    let config = resolve_config(request.config.as_deref())?;
    let modalities = resolve_modalities(&request.modalities)?;

    let progress = if request.progress {
        let bar = ProgressBar::new(modalities.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg} [{bar:30}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(bar)
    } else {
        None
    };

    // Load one modality at a time so progress is visible; accumulate into a
    // single study load for merging.
    let mut load = StudyLoad {
        keys: config.keys.clone(),
        ..StudyLoad::default()
    };
    for modality in modalities {
        if let Some(bar) = &progress {
            bar.set_message(modality.name().to_string());
        }
        let options = LoadOptions {
            modalities: vec![modality],
            clean: request.clean,
            biospec_include: request.include_sources.clone(),
            biospec_exclude: request.exclude_sources.clone(),
        };
        let partial = load_study(&request.data_dir, &config, &options)
            .with_context(|| format!("load modality {modality}"))?;
        load.tables.extend(partial.tables);
        load.medical_history.extend(partial.medical_history);
        load.summaries.extend(partial.summaries);
        if let Some(bar) = &progress {
            bar.inc(1);
        }
    }
    if let Some(bar) = &progress {
        bar.finish_and_clear();
    }

    let merged = if request.merge {
        let merged = merge_study(&load).context("merge modalities")?;
        let path = match &request.output {
            Some(path) => {
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("create {}", parent.display()))?;
                }
                write_csv(&merged, path)
                    .with_context(|| format!("write merged csv {}", path.display()))?;
                info!(path = %path.display(), "wrote merged output");
                Some(path.clone())
            }
            None => None,
        };
        Some((merged.height(), merged.width(), path))
    } else {
        if let Some(dir) = &request.output {
            write_tables(&load, dir)?;
        }
        None
    };

    Ok(LoadResult {
        data_dir: request.data_dir.clone(),
        summaries: load.summaries,
        merged,
    })
}

/// Write each modality table (and each medical-history table) as its own CSV
/// under `dir`.
fn write_tables(load: &StudyLoad, dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    for (name, table) in &load.tables {
        if table.is_empty() {
            continue;
        }
        let path = dir.join(format!("{name}.csv"));
        write_csv(table, &path).with_context(|| format!("write {}", path.display()))?;
        info!(path = %path.display(), "wrote modality table");
    }
    if !load.medical_history.is_empty() {
        let history_dir = dir.join("medical_history");
        std::fs::create_dir_all(&history_dir)
            .with_context(|| format!("create {}", history_dir.display()))?;
        for (name, table) in &load.medical_history {
            if table.is_empty() {
                continue;
            }
            let path = history_dir.join(format!("{name}.csv"));
            write_csv(table, &path).with_context(|| format!("write {}", path.display()))?;
            info!(path = %path.display(), "wrote medical history table");
        }
    }
    Ok(())
}

/// List supported modalities with their folders and prefix counts.
pub fn run_modalities() -> anyhow::Result<()> {
    let config = StudyConfig::default();
    for modality in Modality::ALL {
        match modality {
            Modality::Biospecimen => {
                println!(
                    "{:<28} {}  ({} sources)",
                    modality.name(),
                    config.biospecimen.folder,
                    config.biospecimen.sources.len()
                );
            }
            other => {
                if let Some(mc) = config.modality(other) {
                    println!(
                        "{:<28} {}  ({} prefixes)",
                        other.name(),
                        mc.folder,
                        mc.prefixes.len()
                    );
                }
            }
        }
    }
    Ok(())
}
