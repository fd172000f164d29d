//! Reader of the feature geometry command stream.

use crate::error::MvtError;
use crate::Point;

const MOVE_TO: u32 = 1;
const LINE_TO: u32 = 2;
const CLOSE_PATH: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Command {
    MoveTo(Point),
    LineTo(Point),
    ClosePath,
}

/// Walks the command integers of one feature, keeping the cursor between commands.
///
/// Yields at most one error, after which the reader is exhausted.
pub(crate) struct CommandReader<'a> {
    data: &'a [u32],
    position: usize,
    extent: f32,
    cursor: (i64, i64),
    // id of the current command and the number of repetitions still to read
    pending: Option<(u32, u32)>,
    failed: bool,
}

impl<'a> CommandReader<'a> {
    pub(crate) fn new(data: &'a [u32], extent: u32) -> Self {
        Self {
            data,
            position: 0,
            extent: extent as f32,
            cursor: (0, 0),
            pending: None,
            failed: false,
        }
    }

    fn take(&mut self) -> Option<u32> {
        let value = self.data.get(self.position).copied()?;
        self.position += 1;
        Some(value)
    }

    fn read_header(&mut self) -> Result<Option<(u32, u32)>, MvtError> {
        let Some(header) = self.take() else {
            return Ok(None);
        };

        let (id, count) = (header & 0x7, header >> 3);
        match (id, count) {
            (_, 0) => Err(MvtError::Generic(format!(
                "command {id} at {} has zero count",
                self.position - 1
            ))),
            (CLOSE_PATH, 1) | (MOVE_TO | LINE_TO, _) => Ok(Some((id, count))),
            (CLOSE_PATH, _) => Err(MvtError::Generic(format!(
                "ClosePath must have count 1, found {count}"
            ))),
            _ => Err(MvtError::Generic(format!("unknown command id {id}"))),
        }
    }

    fn read_point(&mut self) -> Result<Point, MvtError> {
        let (Some(dx), Some(dy)) = (self.take(), self.take()) else {
            return Err(MvtError::Generic(
                "geometry ends in the middle of a point".into(),
            ));
        };

        self.cursor.0 += i64::from(zigzag_decode(dx));
        self.cursor.1 += i64::from(zigzag_decode(dy));

        Ok(Point::new(
            self.cursor.0 as f32 / self.extent,
            self.cursor.1 as f32 / self.extent,
        ))
    }

    fn read_command(&mut self) -> Result<Option<Command>, MvtError> {
        let (id, remaining) = match self.pending.take() {
            Some(pending) => pending,
            None => match self.read_header()? {
                Some(header) => header,
                None => return Ok(None),
            },
        };

        if remaining > 1 {
            self.pending = Some((id, remaining - 1));
        }

        let command = match id {
            MOVE_TO => Command::MoveTo(self.read_point()?),
            LINE_TO => Command::LineTo(self.read_point()?),
            _ => Command::ClosePath,
        };

        Ok(Some(command))
    }
}

impl Iterator for CommandReader<'_> {
    type Item = Result<Command, MvtError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let item = self.read_command().transpose();
        self.failed = matches!(item, Some(Err(_)));
        item
    }
}

/// Decodes a zig-zag encoded parameter integer.
pub(crate) fn zigzag_decode(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Reads a point geometry: one or more `MoveTo` commands and nothing else.
pub(crate) fn read_points(data: &[u32], extent: u32) -> Result<Vec<Point>, MvtError> {
    CommandReader::new(data, extent)
        .map(|command| match command? {
            Command::MoveTo(point) => Ok(point),
            other => Err(MvtError::Generic(format!(
                "point geometry cannot contain {other:?}"
            ))),
        })
        .collect()
}
