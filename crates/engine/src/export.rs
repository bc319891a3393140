//! Text exporters

use std::io::{self, Write};

use contracts::Pose;

/// Keyframe as stored by the mapping thread
#[derive(Debug, Clone)]
pub struct KeyFrame {
    pub id: u64,
    pub timestamp: f64,
    /// World from camera
    pub pose: Pose,
    pub width: u32,
    pub height: u32,
}

impl KeyFrame {
    /// Image name used in the image index
    pub fn image_name(&self) -> String {
        format!("{:.6}.png", self.timestamp)
    }
}

/// Keyframe trajectory, one `timestamp tx ty tz qx qy qz qw` line per keyframe
pub fn write_trajectory_tum<W: Write>(out: &mut W, keyframes: &[KeyFrame]) -> io::Result<()> {
    for kf in keyframes {
        let t = kf.pose.translation.vector;
        let q = kf.pose.rotation;
        writeln!(
            out,
            "{:.6} {:.7} {:.7} {:.7} {:.7} {:.7} {:.7} {:.7}",
            kf.timestamp, t.x, t.y, t.z, q.i, q.j, q.k, q.w
        )?;
    }
    Ok(())
}

/// Image index: one pose line (camera from world) plus an empty observation
/// line per keyframe
pub fn write_images<W: Write>(out: &mut W, keyframes: &[KeyFrame]) -> io::Result<()> {
    writeln!(out, "# Image list with two lines of data per image:")?;
    writeln!(out, "#   IMAGE_ID, QW, QX, QY, QZ, TX, TY, TZ, CAMERA_ID, NAME")?;
    writeln!(out, "#   POINTS2D[] as (X, Y, POINT3D_ID)")?;
    writeln!(out, "# Number of images: {}", keyframes.len())?;
    for kf in keyframes {
        let cw = kf.pose.inverse();
        let t = cw.translation.vector;
        let q = cw.rotation;
        writeln!(
            out,
            "{} {:.7} {:.7} {:.7} {:.7} {:.7} {:.7} {:.7} 1 {}",
            kf.id + 1,
            q.w,
            q.i,
            q.j,
            q.k,
            t.x,
            t.y,
            t.z,
            kf.image_name()
        )?;
        writeln!(out)?;
    }
    Ok(())
}

/// Point cloud. The recording engine triangulates nothing, so only the header
/// is written.
pub fn write_points3d<W: Write>(out: &mut W, points: usize) -> io::Result<()> {
    writeln!(out, "# 3D point list with one line of data per point:")?;
    writeln!(
        out,
        "#   POINT3D_ID, X, Y, Z, R, G, B, ERROR, TRACK[] as (IMAGE_ID, POINT2D_IDX)"
    )?;
    writeln!(out, "# Number of points: {}", points)?;
    Ok(())
}
