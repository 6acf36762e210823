//! CSV export of kinematic series.

use std::io::Write;

use kinetrace_kinematics::{Quantity, TrajectoryKinematics};

/// Write one row per sample: the timestamp, then every computed quantity in
/// a fixed order. Undefined values are left empty.
pub fn write_csv<W: Write>(kinematics: &TrajectoryKinematics, mut out: W) -> std::io::Result<()> {
    let columns: Vec<Quantity> = Quantity::ALL
        .iter()
        .copied()
        .filter(|&q| kinematics.series.contains(q))
        .collect();

    write!(out, "time")?;
    for q in &columns {
        write!(out, ",{}", q.name())?;
    }
    writeln!(out)?;

    for (i, t) in kinematics.series.times().iter().enumerate() {
        write!(out, "{}", t.ticks())?;
        for &q in &columns {
            match kinematics.value(q, i) {
                Some(v) if v.is_finite() => write!(out, ",{}", v)?,
                _ => write!(out, ",")?,
            }
        }
        writeln!(out)?;
    }
    Ok(())
}
