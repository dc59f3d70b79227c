//! Search progress, its filename grammar and the selection of the best
//! file to restart from.

use super::base::Base;
use super::codec;
use super::error::Result;
use super::grid::Cell;
use super::stream::{self, BinaryWriter, DEFAULT_BLOCK};
use log::info;
use regex::Regex;
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// How far an enumeration went: a base and the number of cells filled so
/// far. Serialises as the `h{HH}l{WW}m{MM}[-p{PP}]` filename stem, the
/// stage suffix being dropped for completed enumerations.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Progress {
    /// Number of rows.
    pub height: u8,
    /// Number of columns.
    pub width: u8,
    /// Highest cell value.
    pub maximum: u8,
    /// Number of filled cells, in `0..=height · width`.
    pub stage: usize,
}

static STEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"h(\d+)l(\d+)m(\d+)(?:-p(\d+))?").unwrap());

impl Progress {
    /// Progress of an enumeration of `base` grids stopped at `stage`.
    #[must_use]
    pub const fn new(base: Base, stage: usize) -> Self {
        Self {
            height: base.height,
            width: base.width,
            maximum: base.maximum,
            stage,
        }
    }

    /// Progress of a completed enumeration of `base` grids.
    #[must_use]
    pub const fn terminal(base: Base) -> Self {
        Self::new(base, base.cells())
    }

    /// Parses the first stem found in `name`, usually a file name. The
    /// stage defaults to the number of cells.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let captures = STEM.captures(name)?;

        let height: u8 = captures[1].parse().ok()?;
        let width: u8 = captures[2].parse().ok()?;
        let maximum: u8 = captures[3].parse().ok()?;
        let stage = match captures.get(4) {
            Some(stage) => stage.as_str().parse().ok()?,
            None => height as usize * width as usize,
        };

        Some(Self {
            height,
            width,
            maximum,
            stage,
        })
    }

    /// Returns the base of the enumeration.
    ///
    /// # Errors
    ///
    /// A stem parsed from an arbitrary file name may describe an
    /// out-of-domain base.
    pub const fn base(&self) -> Result<Base> {
        Base::new(self.height, self.width, self.maximum)
    }

    /// Returns the number of cells of the enumerated grids.
    #[must_use]
    pub const fn cells(&self) -> usize {
        self.height as usize * self.width as usize
    }
}

impl Display for Progress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "h{:02}l{:02}m{:02}", self.height, self.width, self.maximum)?;
        if self.stage != self.cells() {
            write!(f, "-p{:02}", self.stage)?;
        }
        Ok(())
    }
}

/// Scans `directory` for the best file to start an enumeration of `base`
/// grids from, creating the directory when it does not exist. Returns the
/// progress of the chosen file, or a stage-0 progress and no path when no
/// file qualifies.
///
/// A file qualifies when its codes can be migrated to `base`: same width
/// and height, or a stage small enough that every filled cell survives the
/// reshaping; its maximum must cover the requested one. With `strict`, only
/// exact base matches qualify.
///
/// Among qualifying files the ranking prefers the highest stage, then the
/// lowest maximum, then an unchanged cell count; when the cell count must
/// change, growing beats shrinking.
///
/// # Errors
///
/// Forwards directory traversal errors.
pub fn best_start(directory: &Path, base: Base, strict: bool) -> Result<(Progress, Option<PathBuf>)> {
    if !directory.is_dir() {
        fs::create_dir_all(directory)?;
        return Ok((Progress::new(base, 0), None));
    }

    let mut best: Option<(Progress, PathBuf)> = None;
    let mut best_growth = 0_i64;

    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(found) = Progress::from_name(&name.to_string_lossy()) else {
            continue;
        };
        if found.base().is_err() {
            continue;
        }

        let eligible = if strict {
            found.height == base.height
                && found.width == base.width
                && found.maximum == base.maximum
        } else if found.maximum >= base.maximum {
            if found.width == base.width {
                found.height == base.height
                    || found.stage
                        <= (found.height.min(base.height) as usize - 1) * found.width as usize + 1
            } else {
                found.stage < found.width.min(base.width) as usize
            }
        } else {
            false
        };
        if !eligible {
            continue;
        }

        // moving to another cell count means decoding and re-encoding every
        // code; if unavoidable, favour loading times: add as many cells as
        // possible, or remove as few as possible
        let growth = i64::try_from(base.cells()).unwrap() - i64::try_from(found.cells()).unwrap();
        let better = match &best {
            None => true,
            Some((leader, _)) => {
                found.stage > leader.stage
                    || (found.stage == leader.stage
                        && (found.maximum < leader.maximum
                            || (found.maximum == leader.maximum
                                && (growth == 0 || (best_growth != 0 && growth > best_growth)))))
            }
        };
        if better {
            best = Some((found, entry.path()));
            best_growth = growth;
        }
    }

    Ok(match best {
        Some((found, path)) => (found, Some(path)),
        None => (Progress::new(base, 0), None),
    })
}

/// Rewrites the stream at `path` for an enumeration of `base` grids: codes
/// are decoded, dropped when a filled cell exceeds the new maximum, resized
/// to the new cell count and re-encoded into a fresh stream named after the
/// migrated progress.
///
/// # Errors
///
/// Forwards stream and codec errors.
pub fn migrate(
    directory: &Path,
    progress: Progress,
    path: &Path,
    base: Base,
) -> Result<(Progress, PathBuf)> {
    info!("converting from \u{ab}{}\u{bb}", path.display());

    let reader = stream::open(path)?;
    let filter_values = progress.maximum != base.maximum;

    let migrated = Progress::new(base, progress.stage);
    let migrated_path = directory.join(format!("{migrated}.log"));
    let mut writer = BinaryWriter::create(&migrated_path, base, DEFAULT_BLOCK)?;

    for code in reader {
        let mut grid = codec::decode(&code?)?;

        if filter_values
            && grid.cells[..progress.stage]
                .iter()
                .any(|cell| cell.value > base.maximum)
        {
            continue;
        }

        grid.base = base;
        grid.cells.resize(base.cells(), Cell::default());
        writer.add(&codec::encode(&grid)?)?;
    }
    writer.close()?;

    Ok((migrated, migrated_path))
}
