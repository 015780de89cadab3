//! Subcommand implementations

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use ndarray::Array3;
use serde::Serialize;

use neurovis_core::{
    builtin_colormap_names, get_colormap, plot_brainrsa_glass, plot_brainrsa_montage,
    plot_brainrsa_regions, plot_brainrsa_rlts, plot_brainrsa_surface, plot_corrs_by_time,
    plot_corrs_hotmap, plot_nps_hotmap, plot_rdm, plot_rdm_with_value, Background, BrainOptions,
    Colormap, ExportFormat, Figure, HotmapOptions, NpsHotmapOptions, PlotConfig, RdmOptions,
    SliceSpec, TimecourseOptions,
};
use neurovis_io::{load_matrix, load_volume, Volume};
use neurovis_stats::{
    correct_by_threshold, count_active, data_mask, fdr_correct_with, fwe_correct, is_active,
    label_clusters, Connectivity, FdrMethod,
};

use crate::BrainView;

type CmdResult<T> = Result<T, Box<dyn Error>>;

fn save(fig: &Figure, output: &Path) -> CmdResult<()> {
    fig.save(output)?;
    tracing::info!(path = %output.display(), "wrote figure");
    Ok(())
}

/// Look up a colormap by name; `None` keeps each plot's default
pub fn colormap(name: Option<&str>) -> CmdResult<Option<Colormap>> {
    match name {
        None => Ok(None),
        Some(name) => get_colormap(name).map(Some).ok_or_else(|| {
            format!(
                "unknown colormap '{}' (available: {})",
                name,
                builtin_colormap_names().join(", ")
            )
            .into()
        }),
    }
}

pub fn rdm(fig: Figure, input: &Path, output: &Path, opts: &RdmOptions, values: bool) -> CmdResult<()> {
    let rdm = load_matrix(input)?;
    let fig = if values {
        plot_rdm_with_value(fig, rdm.view(), opts)?
    } else {
        plot_rdm(fig, rdm.view(), opts)?
    };
    save(&fig, output)
}

pub fn timecourse(
    fig: Figure,
    input: &Path,
    output: &Path,
    labels: Option<Vec<String>>,
    time_unit: (f64, f64),
) -> CmdResult<()> {
    let corrs = load_matrix(input)?;
    let opts = TimecourseOptions { labels, time_unit };
    let fig = plot_corrs_by_time(fig, corrs.view().into_dyn(), &opts)?;
    save(&fig, output)
}

/// `nps` carries the absolute-value flag when the input holds similarities
pub fn hotmap(
    fig: Figure,
    input: &Path,
    output: &Path,
    opts: HotmapOptions,
    nps: Option<bool>,
) -> CmdResult<()> {
    let data = load_matrix(input)?;
    let fig = match nps {
        Some(abs) => plot_nps_hotmap(fig, data.view(), &NpsHotmapOptions { hotmap: opts, abs })?,
        None => plot_corrs_hotmap(fig, data.view().into_dyn(), &opts)?,
    };
    save(&fig, output)
}

pub struct BrainRequest {
    pub view: BrainView,
    pub threshold: Option<usize>,
    pub background: Option<PathBuf>,
    pub cuts: [usize; 3],
    pub format: String,
}

/// File stem of a NIfTI path, without `.nii` / `.nii.gz`
fn volume_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "map".to_string());
    name.trim_end_matches(".gz").trim_end_matches(".nii").to_string()
}

pub fn brain(
    fig: Figure,
    config: &PlotConfig,
    input: &Path,
    out_dir: &Path,
    request: &BrainRequest,
) -> CmdResult<()> {
    let format = ExportFormat::from_path(Path::new("view").with_extension(&request.format))?;
    let img = load_volume(input)?;

    let mut opts = BrainOptions::from_config(config);
    opts.threshold = request.threshold;
    if let Some(path) = &request.background {
        opts = opts.with_background(Background::Volume(load_volume(path)?));
    }
    let [x, y, z] = request.cuts;
    let slices = SliceSpec::counts(x, y, z);

    let figures: Vec<(&str, Figure)> = match request.view {
        BrainView::Regions => vec![("regions", plot_brainrsa_regions(fig, &img, &opts)?)],
        BrainView::Montage => vec![("montage", plot_brainrsa_montage(fig, &img, &slices, &opts)?)],
        BrainView::Glass => vec![("glass", plot_brainrsa_glass(fig, &img, &opts)?)],
        BrainView::Surface => vec![("surface", plot_brainrsa_surface(fig, &img, &opts)?)],
        BrainView::All => {
            let mut names = vec!["regions", "montage"];
            if opts.background.is_none() {
                names.push("glass");
            }
            if opts.surface.is_configured() {
                names.push("surface");
            }
            names
                .into_iter()
                .zip(plot_brainrsa_rlts(&fig, &img, &slices, &opts)?)
                .collect()
        }
    };

    fs::create_dir_all(out_dir)?;
    let stem = volume_stem(input);
    for (name, fig) in &figures {
        let path = out_dir.join(format!("{}_{}.{}", stem, name, format.extension()));
        save(fig, &path)?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ClusterSummary {
    pub id: usize,
    pub size: usize,
    /// World coordinates (mm) of the most significant voxel
    pub peak_mm: [f64; 3],
    /// Uncorrected p-value at the peak
    pub peak_p: f64,
    pub centroid_mm: [f64; 3],
}

#[derive(Debug, Serialize)]
pub struct CorrectionSummary {
    pub input: PathBuf,
    pub shape: [usize; 3],
    pub alpha: f64,
    pub fdr_method: FdrMethod,
    pub active_voxels: usize,
    pub uncorrected_significant: usize,
    pub fwe_significant: usize,
    pub fdr_significant: usize,
    /// Connected clusters of FDR-significant voxels
    pub clusters: Vec<ClusterSummary>,
}

fn significant(map: &Array3<f64>, alpha: f64) -> usize {
    map.iter().filter(|&&v| is_active(v) && v < alpha).count()
}

/// Run FWE, FDR and cluster labeling over a p-value map
pub fn correct(
    input: &Path,
    alpha: f64,
    method: FdrMethod,
    threshold: Option<usize>,
    mask: Option<&Path>,
) -> CmdResult<CorrectionSummary> {
    if !(alpha > 0.0 && alpha <= 1.0) {
        return Err(format!("alpha must lie in (0, 1], got {}", alpha).into());
    }
    let volume = load_volume(input)?;
    let p = match mask {
        Some(mask) => data_mask(volume.data.view(), load_volume(mask)?.data.view())?,
        None => volume.data.clone(),
    };

    let fwe = fwe_correct(p.view());
    let fdr = fdr_correct_with(p.view(), method);

    // 1 - p so that cluster peaks sit on the smallest p-value
    let mut evidence = Array3::<f64>::zeros(p.raw_dim());
    ndarray::Zip::from(&mut evidence)
        .and(&p)
        .and(&fdr)
        .for_each(|e, &p, &q| {
            if is_active(q) && q < alpha {
                *e = 1.0 - p;
            }
        });
    if let Some(threshold) = threshold {
        evidence = correct_by_threshold(evidence.view(), threshold)?;
    }

    let clusters = cluster_summaries(&volume, &evidence);
    let (nx, ny, nz) = p.dim();
    Ok(CorrectionSummary {
        input: input.to_path_buf(),
        shape: [nx, ny, nz],
        alpha,
        fdr_method: method,
        active_voxels: count_active(p.view()),
        uncorrected_significant: significant(&p, alpha),
        fwe_significant: significant(&fwe, alpha),
        fdr_significant: significant(&fdr, alpha),
        clusters,
    })
}

fn cluster_summaries(volume: &Volume, evidence: &Array3<f64>) -> Vec<ClusterSummary> {
    let to_mm = |ijk: [f64; 3]| volume.affine.voxel_to_world(ijk);
    let mut clusters: Vec<ClusterSummary> = label_clusters(evidence.view(), Connectivity::default())
        .clusters
        .into_iter()
        .map(|c| ClusterSummary {
            id: c.id,
            size: c.size(),
            peak_mm: to_mm(c.peak.map(|i| i as f64)),
            peak_p: 1.0 - c.peak_value,
            centroid_mm: to_mm(c.centroid()),
        })
        .collect();
    clusters.sort_by(|a, b| b.size.cmp(&a.size));
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{LittleEndian, WriteBytesExt};
    use neurovis_io::Affine;
    use tempfile::TempDir;

    /// Uncompressed float32 NIfTI-1 with a 2 mm sform at the origin
    fn write_nifti(path: &Path, data: &Array3<f64>) {
        let (nx, ny, nz) = data.dim();
        let mut buf: Vec<u8> = Vec::new();
        buf.write_i32::<LittleEndian>(348).unwrap();
        buf.extend_from_slice(&[0u8; 36]);
        for d in [3i16, nx as i16, ny as i16, nz as i16, 1, 1, 1, 1] {
            buf.write_i16::<LittleEndian>(d).unwrap();
        }
        buf.extend_from_slice(&[0u8; 12]);
        for v in [0i16, 16, 32, 0] {
            // intent_code, datatype (float32), bitpix, slice_start
            buf.write_i16::<LittleEndian>(v).unwrap();
        }
        for p in [1.0f32, 2.0, 2.0, 2.0, 1.0, 1.0, 1.0, 1.0] {
            buf.write_f32::<LittleEndian>(p).unwrap();
        }
        for v in [352.0f32, 1.0, 0.0] {
            // vox_offset, scl_slope, scl_inter
            buf.write_f32::<LittleEndian>(v).unwrap();
        }
        buf.write_i16::<LittleEndian>(0).unwrap();
        buf.write_u8(0).unwrap();
        buf.write_u8(10).unwrap();
        buf.extend_from_slice(&[0u8; 24 + 80 + 24]);
        buf.write_i16::<LittleEndian>(0).unwrap();
        buf.write_i16::<LittleEndian>(1).unwrap();
        buf.extend_from_slice(&[0u8; 24]);
        for row in [[2.0f32, 0.0, 0.0, 0.0], [0.0, 2.0, 0.0, 0.0], [0.0, 0.0, 2.0, 0.0]] {
            for v in row {
                buf.write_f32::<LittleEndian>(v).unwrap();
            }
        }
        buf.extend_from_slice(&[0u8; 16]);
        buf.extend_from_slice(b"n+1\0");
        assert_eq!(buf.len(), 348);
        buf.extend_from_slice(&[0u8; 4]);
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    buf.write_f32::<LittleEndian>(data[[i, j, k]] as f32).unwrap();
                }
            }
        }
        fs::write(path, buf).unwrap();
    }

    /// 64 active voxels: a 4-voxel cluster and a lone voxel of small p,
    /// everything else at 0.9
    fn p_map(dir: &TempDir) -> PathBuf {
        let mut p = Array3::from_elem((4, 4, 4), 0.9);
        p[[1, 1, 1]] = 0.0001;
        p[[1, 2, 1]] = 0.0002;
        p[[2, 1, 1]] = 0.0003;
        p[[2, 2, 1]] = 0.0004;
        p[[3, 3, 3]] = 0.00025;
        let path = dir.path().join("p.nii");
        write_nifti(&path, &p);
        path
    }

    #[test]
    fn test_correct_summarizes_significant_clusters() {
        let dir = TempDir::new().unwrap();
        let path = p_map(&dir);

        let summary = correct(&path, 0.05, FdrMethod::HalfRank, None, None).unwrap();
        assert_eq!(summary.shape, [4, 4, 4]);
        assert_eq!(summary.active_voxels, 64);
        assert_eq!(summary.uncorrected_significant, 5);
        assert_eq!(summary.fwe_significant, 5);
        assert_eq!(summary.fdr_significant, 5);

        assert_eq!(summary.clusters.len(), 2);
        let largest = &summary.clusters[0];
        assert_eq!(largest.size, 4);
        assert!((largest.peak_p - 0.0001).abs() < 1e-9);
        assert_eq!(largest.peak_mm, [2.0, 2.0, 2.0]);
        assert_eq!(summary.clusters[1].size, 1);
        assert!((summary.clusters[1].peak_p - 0.00025).abs() < 1e-9);
    }

    #[test]
    fn test_correct_threshold_drops_lone_voxel() {
        let dir = TempDir::new().unwrap();
        let path = p_map(&dir);

        let summary = correct(&path, 0.05, FdrMethod::HalfRank, Some(2), None).unwrap();
        assert_eq!(summary.clusters.len(), 1);
        assert_eq!(summary.clusters[0].size, 4);
    }

    #[test]
    fn test_correct_rejects_bad_alpha() {
        let dir = TempDir::new().unwrap();
        let path = p_map(&dir);
        assert!(correct(&path, 0.0, FdrMethod::HalfRank, None, None).is_err());
        assert!(correct(&path, 1.5, FdrMethod::HalfRank, None, None).is_err());
    }

    #[test]
    fn test_colormap_lookup() {
        assert!(colormap(None).unwrap().is_none());
        assert_eq!(colormap(Some("jet_r")).unwrap().unwrap().name, "jet");
        assert!(colormap(Some("rainbow-ish")).is_err());
    }

    #[test]
    fn test_volume_stem() {
        assert_eq!(volume_stem(Path::new("out/rsa_result.nii.gz")), "rsa_result");
        assert_eq!(volume_stem(Path::new("p.nii")), "p");
    }

    #[test]
    fn test_cluster_summaries_sorted_by_size() {
        let mut evidence = Array3::<f64>::zeros((6, 6, 6));
        evidence[[0, 0, 0]] = 0.99;
        for i in 3..5 {
            for j in 3..5 {
                evidence[[i, j, 4]] = 0.98;
            }
        }
        evidence[[4, 4, 4]] = 0.999;
        let volume = Volume::new(evidence.clone(), Affine::scaling([2.0, 2.0, 2.0], [0.0, 0.0, 0.0]));

        let clusters = cluster_summaries(&volume, &evidence);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].size, 4);
        assert_eq!(clusters[0].peak_mm, [8.0, 8.0, 8.0]);
        assert!((clusters[0].peak_p - 0.001).abs() < 1e-9);
        assert_eq!(clusters[0].centroid_mm, [7.0, 7.0, 8.0]);
    }
}
