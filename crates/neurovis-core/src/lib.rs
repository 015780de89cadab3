//! neurovis-core - Figures for representational similarity analysis results
//!
//! This crate turns RSA results into figures:
//!
//! - **RDM**: dissimilarity matrices as heatmaps, optionally rescaled or
//!   annotated with their values
//! - **Time course**: smoothed similarity curves over time
//! - **Hotmap**: channel × time heatmaps with ordinal channel labels
//! - **Brain**: region cuts, montages, glass projections and cortical
//!   surface views of 3-D result maps
//!
//! # Figures
//!
//! There is no global "current figure". Every plotting function takes a
//! [`Figure`] by value and returns it filled in:
//!
//! ```no_run
//! use ndarray::array;
//! use neurovis_core::{plot_rdm, Figure, RdmOptions};
//!
//! let rdm = array![[0.0, 0.3, 0.8], [0.3, 0.0, 0.5], [0.8, 0.5, 0.0]];
//! let fig = plot_rdm(Figure::new(), rdm.view(), &RdmOptions::default())?;
//! fig.save("rdm.png")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! A figure is plain data (panels, layers, labels), so it can be inspected
//! before it is rendered to PNG or SVG.

pub mod axis;
pub mod brain;
pub mod colormap;
pub mod config;
pub mod error;
pub mod export;
pub mod figure;
pub mod fonts;
pub mod hotmap;
pub mod rdm;
mod render;
pub mod timecourse;

pub use axis::*;
pub use brain::*;
pub use colormap::*;
pub use config::*;
pub use error::*;
pub use export::*;
pub use figure::*;
pub use hotmap::*;
pub use rdm::*;
pub use timecourse::*;
