use ibvs_core::{rxyz_from_rotation, Iso3, Real, Vec6};
use nalgebra::DVector;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Telemetry of one TRACKING cycle.
#[derive(Debug, Clone)]
pub struct CycleRecord {
    /// Commanded camera twist.
    pub velocity: Vec6,
    /// Measured joint velocities.
    pub joint_velocity: Vec6,
    /// Measured joint positions.
    pub joint_position: Vec6,
    /// Task error `s - s*` (2N).
    pub error: DVector<Real>,
    /// Pose estimate `T_C_O` used for this cycle's depths.
    pub pose: Iso3,
}

impl CycleRecord {
    /// Number of fields written per line for `n` features.
    pub const fn field_count(n: usize) -> usize {
        6 + 6 + 6 + 2 * n + 6
    }

    /// Fields in log order: twist, joint velocities, joint positions, error,
    /// then `tx ty tz rx ry rz`.
    pub fn fields(&self) -> Vec<Real> {
        let t = self.pose.translation.vector;
        let r = rxyz_from_rotation(&self.pose.rotation);
        let mut out = Vec::with_capacity(18 + self.error.len() + 6);
        out.extend(self.velocity.iter());
        out.extend(self.joint_velocity.iter());
        out.extend(self.joint_position.iter());
        out.extend(self.error.iter());
        out.extend([t.x, t.y, t.z, r.rx, r.ry, r.rz]);
        out
    }
}

/// Space-separated session log, one line per cycle.
#[derive(Debug)]
pub struct SessionLog<W: Write> {
    writer: W,
    lines: usize,
}

impl SessionLog<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> SessionLog<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, lines: 0 }
    }

    pub fn write_record(&mut self, record: &CycleRecord) -> io::Result<()> {
        let line = record
            .fields()
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(self.writer, "{line}")?;
        self.lines += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
