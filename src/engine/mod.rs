//! Conversion engine seam.
//!
//! The worker loop only knows the two capabilities defined here. The bundled
//! [`ObjTriangulator`] is one implementation; tests drive the loop with fakes.

mod obj;

pub use obj::ObjTriangulator;

use crate::error::Result;
use std::path::Path;

/// Converts one source file into one destination file.
pub trait Transform {
    fn transform(&mut self, source: &Path, destination: &Path) -> Result<TransformStats>;
}

/// Frees engine state accumulated by earlier transforms.
pub trait ReclaimResources {
    /// Release everything retained from previously imported items.
    ///
    /// Returns the number of data blocks freed. Calling it with nothing
    /// pending returns 0.
    fn reclaim(&mut self) -> usize;

    /// Number of data blocks currently retained.
    fn retained(&self) -> usize;
}

/// Per-item counters reported by a transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    pub faces_in: usize,
    pub triangles_out: usize,
}

/// Which optional attributes survive export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub keep_uvs: bool,
    pub keep_normals: bool,
    pub keep_materials: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            keep_uvs: true,
            keep_normals: false,
            keep_materials: false,
        }
    }
}
