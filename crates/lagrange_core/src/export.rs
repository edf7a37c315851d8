//! JSON trajectory documents consumed by the browser animation.
//!
//! Layout: `{"points": [{"x": [..], "y": [..], "z": [..]?}, ..], "t": [..],
//! "y0": {"<coordinate>": value, ..}}`. Field order is alphabetical at every
//! level, so the struct fields below are declared in that order and `y0` is
//! a sorted map.
//!
//! Writes are not transactional: a crash mid-write can leave a truncated file.

use crate::cartesian::CartesianPointSeries;
use crate::error::{SimResult, SimulationError};
use crate::traits::{CoordinateTransform, DynamicalSystem};
use crate::trajectory::Trajectory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryDocument {
    points: Vec<CartesianPointSeries>,
    t: Vec<f64>,
    y0: BTreeMap<String, f64>,
}

impl TrajectoryDocument {
    pub fn points(&self) -> &[CartesianPointSeries] {
        &self.points
    }

    pub fn times(&self) -> &[f64] {
        &self.t
    }

    pub fn initial_condition(&self) -> &BTreeMap<String, f64> {
        &self.y0
    }

    pub fn from_json_str(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Builds trajectory documents and stores them as pretty-printed JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrajectoryExporter {
    pub indent: usize,
}

impl Default for TrajectoryExporter {
    fn default() -> Self {
        Self { indent: 4 }
    }
}

impl TrajectoryExporter {
    /// Combines a trajectory, the labels of its state components and the
    /// Cartesian series derived from it. The labeled initial condition is the
    /// trajectory's first state.
    pub fn build(
        &self,
        trajectory: &Trajectory,
        labels: &[&str],
        points: Vec<CartesianPointSeries>,
    ) -> SimResult<TrajectoryDocument> {
        let y0 = trajectory.initial_state();
        if labels.len() != y0.len() {
            return Err(SimulationError::DimensionMismatch {
                expected: y0.len(),
                got: labels.len(),
            });
        }
        for series in &points {
            if !series.is_consistent() || series.len() != trajectory.len() {
                return Err(SimulationError::DimensionMismatch {
                    expected: trajectory.len(),
                    got: series.len(),
                });
            }
        }

        Ok(TrajectoryDocument {
            points,
            t: trajectory.times().to_vec(),
            y0: labels
                .iter()
                .map(|label| label.to_string())
                .zip(y0.iter().copied())
                .collect(),
        })
    }

    /// Labels and transform both come from `system`.
    pub fn build_for<S>(&self, system: &S, trajectory: &Trajectory) -> SimResult<TrajectoryDocument>
    where
        S: DynamicalSystem + CoordinateTransform,
    {
        self.build(
            trajectory,
            system.coordinate_names(),
            system.to_cartesian(trajectory),
        )
    }

    pub fn to_json_string(&self, document: &TrajectoryDocument) -> SimResult<String> {
        let mut buffer = Vec::new();
        self.serialize_into(document, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Serializes `document` to `path`, replacing any existing file.
    pub fn write(&self, document: &TrajectoryDocument, path: &Path) -> SimResult<()> {
        let storage = |source: std::io::Error| SimulationError::Storage {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(storage)?;
        let mut writer = BufWriter::new(file);
        self.serialize_into(document, &mut writer)
            .map_err(|err| storage(err.into()))?;
        writer.write_all(b"\n").map_err(storage)?;
        writer.flush().map_err(storage)?;

        info!(
            path = %path.display(),
            samples = document.t.len(),
            bodies = document.points.len(),
            "wrote trajectory document"
        );
        Ok(())
    }

    fn serialize_into<W: Write>(
        &self,
        document: &TrajectoryDocument,
        writer: W,
    ) -> Result<(), serde_json::Error> {
        let indent = vec![b' '; self.indent];
        let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
        let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
        document.serialize(&mut serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::{solve_on_grid, SolverSettings};
    use crate::systems::{BallInCone, DoublePendulum, SimplePendulum};
    use crate::trajectory::TimeGrid;
    use tempfile::NamedTempFile;

    fn simple_document() -> TrajectoryDocument {
        let pendulum = SimplePendulum::default();
        let grid = TimeGrid::linspace(0.0, 1.0, 11).expect("grid");
        let trajectory = solve_on_grid(&pendulum, &[0.2, 0.0], &grid, &SolverSettings::default())
            .expect("solve should succeed");
        TrajectoryExporter::default()
            .build_for(&pendulum, &trajectory)
            .expect("document")
    }

    #[test]
    fn round_trip_preserves_grid_series_and_labels() {
        let exporter = TrajectoryExporter::default();
        let pendulum = DoublePendulum::default();
        let grid = TimeGrid::linspace(0.0, 2.0, 25).expect("grid");
        let trajectory = solve_on_grid(
            &pendulum,
            &[std::f64::consts::FRAC_PI_2, 0.1, 0.0, 0.0],
            &grid,
            &SolverSettings::default(),
        )
        .expect("solve should succeed");
        let document = exporter.build_for(&pendulum, &trajectory).expect("document");

        let json = exporter.to_json_string(&document).expect("serialize");
        let parsed = TrajectoryDocument::from_json_str(&json).expect("parse");

        assert_eq!(parsed.times().len(), 25);
        assert_eq!(parsed.points().len(), 2);
        assert_eq!(parsed.initial_condition(), document.initial_condition());
        assert_eq!(parsed, document);
    }

    #[test]
    fn keys_are_sorted_and_indented_by_four_spaces() {
        let json = TrajectoryExporter::default()
            .to_json_string(&simple_document())
            .expect("serialize");
        let points = json.find("\"points\"").expect("points key");
        let t = json.find("\"t\"").expect("t key");
        let y0 = json.find("\"y0\"").expect("y0 key");
        assert!(points < t && t < y0);
        assert!(json.contains("\n    \"points\": ["));
        let dphi = json.find("\"d/dt phi\"").expect("d/dt phi label");
        let phi = json.find("\"phi\"").expect("phi label");
        assert!(dphi < phi);
        assert!(!json.contains("\"z\""));
    }

    #[test]
    fn spatial_systems_export_z() {
        let cone = BallInCone::default();
        let grid = TimeGrid::linspace(0.0, 0.5, 5).expect("grid");
        let trajectory = solve_on_grid(&cone, &[1.0, 0.0, 0.0, 3.0], &grid, &SolverSettings::default())
            .expect("solve should succeed");
        let exporter = TrajectoryExporter::default();
        let document = exporter.build_for(&cone, &trajectory).expect("document");
        let json = exporter.to_json_string(&document).expect("serialize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("json");
        assert_eq!(value["points"][0]["z"].as_array().map(|z| z.len()), Some(5));
    }

    #[test]
    fn full_precision_survives_serialization() {
        let document = simple_document();
        let json = TrajectoryExporter::default()
            .to_json_string(&document)
            .expect("serialize");
        let parsed = TrajectoryDocument::from_json_str(&json).expect("parse");
        for (a, b) in parsed.points()[0].x.iter().zip(&document.points()[0].x) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn build_rejects_mismatched_labels_and_series() {
        let document = simple_document();
        let pendulum = SimplePendulum::default();
        let grid = TimeGrid::linspace(0.0, 1.0, 3).expect("grid");
        let trajectory = solve_on_grid(&pendulum, &[0.2, 0.0], &grid, &SolverSettings::default())
            .expect("solve should succeed");
        let exporter = TrajectoryExporter::default();

        let result = exporter.build(&trajectory, &["phi"], pendulum.to_cartesian(&trajectory));
        assert!(matches!(
            result,
            Err(SimulationError::DimensionMismatch { expected: 2, got: 1 })
        ));

        let result = exporter.build(
            &trajectory,
            pendulum.coordinate_names(),
            document.points().to_vec(),
        );
        assert!(matches!(
            result,
            Err(SimulationError::DimensionMismatch { expected: 3, got: 11 })
        ));
    }

    #[test]
    fn write_overwrites_existing_file() {
        let tmp = NamedTempFile::new().expect("temp file");
        std::fs::write(tmp.path(), "stale contents that are longer than nothing").expect("seed");
        let exporter = TrajectoryExporter::default();
        let document = simple_document();
        exporter.write(&document, tmp.path()).expect("write");

        let contents = std::fs::read_to_string(tmp.path()).expect("read back");
        assert!(contents.ends_with("}\n"));
        let parsed = TrajectoryDocument::from_json_str(&contents).expect("parse");
        assert_eq!(parsed, document);
    }

    #[test]
    fn write_failure_is_a_storage_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("missing").join("out.js");
        let err = TrajectoryExporter::default()
            .write(&simple_document(), &path)
            .expect_err("parent directory does not exist");
        match err {
            SimulationError::Storage { path: failed, .. } => assert_eq!(failed, path),
            other => panic!("expected storage error, got {other:?}"),
        }
    }
}
