//! Wavefront OBJ triangulation engine.
//!
//! Imports a mesh, splits every polygon with more than three corners into a
//! triangle fan, and exports it under the same filename. Imported meshes stay
//! resident as orphaned data blocks until [`ReclaimResources::reclaim`] runs.

use super::{ExportOptions, ReclaimResources, Transform, TransformStats};
use crate::error::{MeshBatchError, Result};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// One corner of a face: 1-based (or negative, relative) indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FaceVertex {
    position: i64,
    uv: Option<i64>,
    normal: Option<i64>,
}

impl FaceVertex {
    fn parse(token: &str, line: usize) -> Result<Self> {
        let mut parts = token.split('/');
        let position = parse_index(parts.next(), token, line)?.ok_or_else(|| {
            MeshBatchError::MeshParse {
                line,
                message: format!("missing position index in '{}'", token),
            }
        })?;
        let uv = parse_index(parts.next(), token, line)?;
        let normal = parse_index(parts.next(), token, line)?;
        if parts.next().is_some() {
            return Err(MeshBatchError::MeshParse {
                line,
                message: format!("too many components in '{}'", token),
            });
        }
        Ok(Self {
            position,
            uv,
            normal,
        })
    }

    fn write(&self, out: &mut impl Write, options: ExportOptions) -> io::Result<()> {
        let uv = self.uv.filter(|_| options.keep_uvs);
        let normal = self.normal.filter(|_| options.keep_normals);
        match (uv, normal) {
            (None, None) => write!(out, "{}", self.position),
            (Some(uv), None) => write!(out, "{}/{}", self.position, uv),
            (None, Some(normal)) => write!(out, "{}//{}", self.position, normal),
            (Some(uv), Some(normal)) => write!(out, "{}/{}/{}", self.position, uv, normal),
        }
    }
}

fn parse_index(part: Option<&str>, token: &str, line: usize) -> Result<Option<i64>> {
    let Some(raw) = part.filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<i64>() {
        Ok(0) => Err(MeshBatchError::MeshParse {
            line,
            message: format!("index 0 in '{}'", token),
        }),
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(MeshBatchError::MeshParse {
            line,
            message: format!("invalid index in '{}'", token),
        }),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Element {
    Position(String),
    TexCoord(String),
    Normal(String),
    Face(Vec<FaceVertex>),
    Material(String),
    Other(String),
}

/// An imported OBJ mesh, kept in source statement order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    elements: Vec<Element>,
}

impl Mesh {
    /// Parse OBJ text.
    pub fn parse(text: &str) -> Result<Self> {
        let mut elements = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let trimmed = raw.trim();
            let keyword = trimmed.split_whitespace().next().unwrap_or("");

            let element = match keyword {
                "v" => Element::Position(trimmed.to_string()),
                "vt" => Element::TexCoord(trimmed.to_string()),
                "vn" => Element::Normal(trimmed.to_string()),
                "f" => {
                    let corners = trimmed
                        .split_whitespace()
                        .skip(1)
                        .map(|token| FaceVertex::parse(token, line))
                        .collect::<Result<Vec<_>>>()?;
                    if corners.len() < 3 {
                        return Err(MeshBatchError::MeshParse {
                            line,
                            message: format!("face with {} vertices", corners.len()),
                        });
                    }
                    Element::Face(corners)
                }
                "mtllib" | "usemtl" => Element::Material(trimmed.to_string()),
                _ => Element::Other(raw.trim_end().to_string()),
            };
            elements.push(element);
        }

        Ok(Self { elements })
    }

    /// Number of faces, whatever their size.
    pub fn face_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| matches!(e, Element::Face(_)))
            .count()
    }

    /// Whether every face is already a triangle.
    pub fn is_triangulated(&self) -> bool {
        self.elements.iter().all(|e| match e {
            Element::Face(corners) => corners.len() == 3,
            _ => true,
        })
    }

    /// Fan-triangulate every polygon in place. Returns the resulting triangle count.
    ///
    /// Quads split along the 1-3 diagonal.
    pub fn triangulate(&mut self) -> usize {
        let mut elements = Vec::with_capacity(self.elements.len());
        let mut triangles = 0;

        for element in self.elements.drain(..) {
            match element {
                Element::Face(corners) => {
                    let anchor = corners[0];
                    for pair in corners[1..].windows(2) {
                        elements.push(Element::Face(vec![anchor, pair[0], pair[1]]));
                        triangles += 1;
                    }
                }
                other => elements.push(other),
            }
        }

        self.elements = elements;
        triangles
    }

    /// Write the mesh as OBJ text.
    pub fn write_obj(&self, out: &mut impl Write, options: ExportOptions) -> io::Result<()> {
        for element in &self.elements {
            match element {
                Element::Position(line) | Element::Other(line) => writeln!(out, "{}", line)?,
                Element::TexCoord(line) if options.keep_uvs => writeln!(out, "{}", line)?,
                Element::Normal(line) if options.keep_normals => writeln!(out, "{}", line)?,
                Element::Material(line) if options.keep_materials => writeln!(out, "{}", line)?,
                Element::TexCoord(_) | Element::Normal(_) | Element::Material(_) => {}
                Element::Face(corners) => {
                    out.write_all(b"f")?;
                    for corner in corners {
                        out.write_all(b" ")?;
                        corner.write(out, options)?;
                    }
                    out.write_all(b"\n")?;
                }
            }
        }
        Ok(())
    }
}

/// The bundled engine: OBJ in, triangulated OBJ out.
#[derive(Debug, Default)]
pub struct ObjTriangulator {
    options: ExportOptions,
    orphans: Vec<Mesh>,
    buffer: String,
}

impl ObjTriangulator {
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            orphans: Vec::new(),
            buffer: String::new(),
        }
    }
}

impl Transform for ObjTriangulator {
    fn transform(&mut self, source: &Path, destination: &Path) -> Result<TransformStats> {
        self.buffer.clear();
        File::open(source)?.read_to_string(&mut self.buffer)?;

        let mut mesh = Mesh::parse(&self.buffer)?;
        let faces_in = mesh.face_count();
        let triangles_out = if mesh.is_triangulated() {
            faces_in
        } else {
            mesh.triangulate()
        };

        write_replacing(destination, |out| mesh.write_obj(out, self.options))?;

        // The exported mesh is no longer referenced but stays allocated until reclaimed.
        self.orphans.push(mesh);

        Ok(TransformStats {
            faces_in,
            triangles_out,
        })
    }
}

impl ReclaimResources for ObjTriangulator {
    fn reclaim(&mut self) -> usize {
        let freed = self.orphans.len();
        self.orphans = Vec::new();
        self.buffer = String::new();
        freed
    }

    fn retained(&self) -> usize {
        self.orphans.len()
    }
}

/// Write through a sibling `.partial` file and rename it into place, so an
/// interrupted write never leaves a truncated destination behind.
fn write_replacing<F>(destination: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let partial = partial_path(destination);

    let result = File::create(&partial).and_then(|file| {
        let mut out = BufWriter::new(file);
        write(&mut out)?;
        out.flush()
    });

    match result {
        Ok(()) => {
            std::fs::rename(&partial, destination)?;
            Ok(())
        }
        Err(e) => {
            let _ = std::fs::remove_file(&partial);
            Err(e.into())
        }
    }
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    destination.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const QUAD: &str = "\
# unit quad
mtllib quad.mtl
o Quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl Default
s off
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    fn export(mesh: &Mesh, options: ExportOptions) -> String {
        let mut out = Vec::new();
        mesh.write_obj(&mut out, options).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_quad_splits_along_first_diagonal() {
        let mut mesh = Mesh::parse(QUAD).unwrap();
        assert_eq!(mesh.face_count(), 1);
        assert!(!mesh.is_triangulated());

        assert_eq!(mesh.triangulate(), 2);
        assert!(mesh.is_triangulated());

        let text = export(&mesh, ExportOptions::default());
        assert!(text.contains("f 1/1 2/2 3/3\n"));
        assert!(text.contains("f 1/1 3/3 4/4\n"));
    }

    #[test]
    fn test_ngon_fans_from_first_corner() {
        let mut mesh = Mesh::parse("v 0 0 0\nf 1 2 3 4 5 6\n").unwrap();
        assert_eq!(mesh.triangulate(), 4);
        let text = export(&mesh, ExportOptions::default());
        assert_eq!(
            text,
            "v 0 0 0\nf 1 2 3\nf 1 3 4\nf 1 4 5\nf 1 5 6\n"
        );
    }

    #[test]
    fn test_triangles_pass_through() {
        let mut mesh = Mesh::parse("f 1 2 3\nf -3 -2 -1\n").unwrap();
        assert_eq!(mesh.triangulate(), 2);
        assert_eq!(
            export(&mesh, ExportOptions::default()),
            "f 1 2 3\nf -3 -2 -1\n"
        );
    }

    #[test]
    fn test_default_export_drops_normals_and_materials() {
        let mut mesh = Mesh::parse(QUAD).unwrap();
        mesh.triangulate();
        let text = export(&mesh, ExportOptions::default());
        assert!(!text.contains("vn "));
        assert!(!text.contains("mtllib"));
        assert!(!text.contains("usemtl"));
        assert!(text.contains("vt 1 1"));
        assert!(text.contains("# unit quad"));
        assert!(text.contains("o Quad"));
    }

    #[test]
    fn test_export_can_keep_everything() {
        let mut mesh = Mesh::parse(QUAD).unwrap();
        mesh.triangulate();
        let options = ExportOptions {
            keep_uvs: true,
            keep_normals: true,
            keep_materials: true,
        };
        let text = export(&mesh, options);
        assert!(text.contains("vn 0 0 1"));
        assert!(text.contains("usemtl Default"));
        assert!(text.contains("f 1/1/1 2/2/1 3/3/1\n"));
    }

    #[test]
    fn test_export_normals_without_uvs() {
        let mesh = Mesh::parse("f 1/1/1 2/2/2 3/3/3\n").unwrap();
        let options = ExportOptions {
            keep_uvs: false,
            keep_normals: true,
            keep_materials: false,
        };
        assert_eq!(export(&mesh, options), "f 1//1 2//2 3//3\n");
    }

    #[test]
    fn test_degenerate_face_is_rejected() {
        let err = Mesh::parse("v 0 0 0\nf 1 2\n").unwrap_err();
        match err {
            MeshBatchError::MeshParse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("2 vertices"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_and_garbage_indices_are_rejected() {
        assert!(Mesh::parse("f 0 1 2\n").is_err());
        assert!(Mesh::parse("f a b c\n").is_err());
        assert!(Mesh::parse("f 1/2/3/4 2 3\n").is_err());
        assert!(Mesh::parse("f /1 2 3\n").is_err());
    }

    #[test]
    fn test_transform_writes_same_name_and_retains_mesh() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("quad.obj");
        let out_dir = dir.path().join("out");
        std::fs::create_dir(&out_dir).unwrap();
        std::fs::write(&src, QUAD).unwrap();

        let mut engine = ObjTriangulator::default();
        let dest = out_dir.join("quad.obj");
        let stats = engine.transform(&src, &dest).unwrap();

        assert_eq!(stats.faces_in, 1);
        assert_eq!(stats.triangles_out, 2);
        assert!(dest.exists());
        assert!(!partial_path(&dest).exists());
        assert_eq!(engine.retained(), 1);
    }

    #[test]
    fn test_failed_import_leaves_no_output() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("broken.obj");
        std::fs::write(&src, "f 1 2\n").unwrap();
        let dest = dir.path().join("broken-out.obj");

        let mut engine = ObjTriangulator::default();
        assert!(engine.transform(&src, &dest).is_err());
        assert!(!dest.exists());
        assert_eq!(engine.retained(), 0);
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let dir = tempdir().unwrap();
        let mut engine = ObjTriangulator::default();
        let err = engine
            .transform(&dir.path().join("nope.obj"), &dir.path().join("x.obj"))
            .unwrap_err();
        assert!(matches!(err, MeshBatchError::Io(_)));
    }

    #[test]
    fn test_reclaim_frees_everything_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("tri.obj");
        std::fs::write(&src, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let mut engine = ObjTriangulator::new(ExportOptions::default());
        for i in 0..3 {
            let dest = dir.path().join(format!("tri-{i}.obj"));
            engine.transform(&src, &dest).unwrap();
        }

        assert_eq!(engine.retained(), 3);
        assert_eq!(engine.reclaim(), 3);
        assert_eq!(engine.retained(), 0);
        assert_eq!(engine.reclaim(), 0);
    }

    #[test]
    fn test_partial_path_is_a_sibling() {
        assert_eq!(
            partial_path(Path::new("/out/cube.obj")),
            PathBuf::from("/out/cube.obj.partial")
        );
    }
}
