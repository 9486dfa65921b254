//! Trajectory and benchmark files
//!
//! Both writers create missing parent directories and truncate any file left
//! by a previous run.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::sim::Particle;

fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

/// Periodic frames: a time line, then `x y v radius` per pedestrian
pub struct TrajectoryWriter<W: Write> {
    out: W,
    frames: u64,
}

impl TrajectoryWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::new(create(path)?))
    }
}

impl<W: Write> TrajectoryWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, frames: 0 }
    }

    pub fn write_frame(&mut self, time: f64, particles: &[Particle]) -> Result<()> {
        writeln!(self.out, "{time:.6}")?;
        for p in particles {
            writeln!(
                self.out,
                "{:.6} {:.6} {:.6} {:.6}",
                p.pos.x, p.pos.y, p.speed, p.radius
            )?;
        }
        self.frames += 1;
        Ok(())
    }

    /// Frames written so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// One `time cumulative_exited` line per step
pub struct BenchmarkWriter<W: Write> {
    out: W,
}

impl BenchmarkWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::new(create(path)?))
    }
}

impl<W: Write> BenchmarkWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_step(&mut self, time: f64, exited: u64) -> Result<()> {
        writeln!(self.out, "{time:.6} {exited}")?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;

    #[test]
    fn test_frame_format() {
        let mut p = Particle::new(0, DVec2::new(1.0, 2.5), 0.25);
        p.speed = 1.125;
        let mut writer = TrajectoryWriter::new(Vec::new());
        writer.write_frame(0.05, &[p]).unwrap();
        assert_eq!(writer.frames(), 1);

        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(text, "0.050000\n1.000000 2.500000 1.125000 0.250000\n");
    }

    #[test]
    fn test_benchmark_format() {
        let mut writer = BenchmarkWriter::new(Vec::new());
        writer.write_step(0.025, 0).unwrap();
        writer.write_step(0.05, 3).unwrap();
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(text, "0.025000 0\n0.050000 3\n");
    }

    #[test]
    fn test_create_makes_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/bench.txt");
        let mut writer = BenchmarkWriter::create(&path).unwrap();
        writer.write_step(1.0, 1).unwrap();
        writer.finish().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "1.000000 1\n");
    }
}
