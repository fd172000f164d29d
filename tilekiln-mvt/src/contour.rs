use serde::{Deserialize, Serialize};

use crate::error::MvtError;
use crate::geometry::{Command, CommandReader};
use crate::Point;

/// Sequence of points produced by one `MoveTo` followed by `LineTo` commands.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MvtContour {
    /// Vertices of the contour. For closed contours the first point is not repeated.
    pub points: Vec<Point>,
    /// Set by a `ClosePath` command.
    pub is_closed: bool,
}

impl MvtContour {
    /// Signed area by the surveyor's formula in tile coordinates (y axis down).
    ///
    /// Exterior polygon rings have positive area, holes have negative area.
    pub fn signed_area(&self) -> f32 {
        let count = self.points.len();
        if count < 3 {
            return 0.0;
        }

        let mut sum = 0.0;
        for i in 0..count {
            let a = self.points[i];
            let b = self.points[(i + 1) % count];
            sum += a.x * b.y - b.x * a.y;
        }

        sum / 2.0
    }
}

/// Polygon with an exterior ring and zero or more holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MvtPolygon {
    /// Outer ring.
    pub exterior: MvtContour,
    /// Holes.
    pub interiors: Vec<MvtContour>,
}

impl MvtPolygon {
    pub(crate) fn read(commands: &[u32], extent: u32) -> Result<Vec<MvtPolygon>, MvtError> {
        let contours = read_contours(commands, extent)?;

        if contours.iter().any(|c| !c.is_closed) {
            return Err(MvtError::Generic(String::from(
                "polygon cannot contain open contours",
            )));
        }

        let mut polygons: Vec<MvtPolygon> = vec![];
        for contour in contours {
            let area = contour.signed_area();
            if area > 0.0 {
                polygons.push(MvtPolygon {
                    exterior: contour,
                    interiors: vec![],
                });
            } else if area < 0.0 {
                match polygons.last_mut() {
                    Some(polygon) => polygon.interiors.push(contour),
                    None => log::debug!("Skipping polygon hole without an exterior ring"),
                }
            }
        }

        Ok(polygons)
    }
}

pub(crate) fn read_contours(commands: &[u32], extent: u32) -> Result<Vec<MvtContour>, MvtError> {
    let mut contours: Vec<MvtContour> = vec![];
    let mut open = false;
    for command in CommandReader::new(commands, extent) {
        match command? {
            Command::MoveTo(point) => {
                contours.push(MvtContour {
                    points: vec![point],
                    is_closed: false,
                });
                open = true;
            }
            Command::LineTo(point) => match contours.last_mut() {
                Some(contour) if open => contour.points.push(point),
                _ => return Err(MvtError::Generic("LineTo without a current point".into())),
            },
            Command::ClosePath => {
                if let Some(contour) = contours.last_mut().filter(|_| open) {
                    contour.is_closed = true;
                }
                open = false;
            }
        }
    }

    Ok(contours)
}
