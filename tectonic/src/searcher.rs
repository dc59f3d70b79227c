//! Drivers walking an enumeration stage by stage.
//!
//! Two semantically equivalent drivers exist. The depth-first one keeps a
//! stack of successor iterators, writes complete grids only and can
//! checkpoint itself on a cooperative stop signal. The breadth-first one
//! materialises every stage frontier into its own file, which lets it
//! restart from whatever file a previous run left behind, at the price of
//! storing frontiers that grow with the base.

use super::base::Base;
use super::codec;
use super::error::{Error, Result};
use super::grid::Grid;
use super::producer::Producer;
use super::progress::{self, Progress};
use super::region::Regions;
use super::stream::{self, BinaryWriter, DEFAULT_BLOCK};
use itertools::Itertools;
use log::{info, warn};
use num_bigint::BigUint;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// What a depth-first run achieved.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Outcome {
    /// Number of complete grids appended by this run.
    pub emitted: u32,
    /// Whether the run stopped on the cooperative signal, leaving a
    /// checkpoint behind.
    pub interrupted: bool,
}

/// Returns whether a terminal code deserves to be kept: no region may be
/// anomalous, and under `canonical` the grid must also be the canonical
/// representative of its symmetry orbit.
fn validates(code: &BigUint, canonical: bool) -> Result<bool> {
    let grid = codec::decode(code)?;
    if canonical && !grid.is_canonical() {
        return Ok(false);
    }
    Ok(!Regions::survey(&grid).any_anomalous())
}

/// One stage of the depth-first exploration: the codes still to consume
/// and the index of the last one consumed.
struct Level {
    codes: std::vec::IntoIter<BigUint>,
    index: i64,
}

impl Level {
    fn new(codes: Vec<BigUint>) -> Self {
        Self {
            codes: codes.into_iter(),
            index: -1,
        }
    }

    fn next(&mut self) -> Option<BigUint> {
        let code = self.codes.next();
        if code.is_some() {
            self.index += 1;
        }
        code
    }
}

fn fresh_levels(cells: usize, seed: &BigUint) -> Vec<Level> {
    let mut levels = Vec::with_capacity(cells + 1);
    levels.push(Level::new(vec![seed.clone()]));
    levels.extend((0..cells).map(|_| Level::new(Vec::new())));
    levels
}

/// Depth-first driver. Complete grids are appended to the terminal stage
/// file in the lexicographic order of the per-stage production order, a
/// total order that checkpoint and resume reproduce exactly.
pub struct DepthSearcher {
    base: Base,
    directory: PathBuf,
    /// Keep only canonical representatives of the symmetry group.
    pub canonical: bool,
    stop: Arc<AtomicBool>,
}

impl DepthSearcher {
    /// Constructor. `stop` is polled cooperatively: once it turns `true`,
    /// the driver finishes the in-flight terminal code, checkpoints and
    /// returns.
    #[must_use]
    pub fn new(base: Base, directory: &Path, stop: Arc<AtomicBool>) -> Self {
        Self {
            base,
            directory: directory.to_path_buf(),
            canonical: false,
            stop,
        }
    }

    /// Runs the exploration to completion or to the first stop request,
    /// resuming from a checkpoint when one is found.
    ///
    /// # Errors
    ///
    /// Forwards codec, producer and stream errors; I/O failures close the
    /// run.
    pub fn run(&self) -> Result<Outcome> {
        fs::create_dir_all(&self.directory)?;

        let cells = self.base.cells();
        let terminal = Progress::terminal(self.base);
        let log_path = self.directory.join(format!("{terminal}.log"));
        let checkpoint_path = self.directory.join(format!("{terminal}.prg"));

        let seed = codec::encode(&Grid::new(self.base))?;
        let mut levels = fresh_levels(cells, &seed);
        let mut depth = 0_usize;
        let mut resumed = false;

        if checkpoint_path.exists() {
            let line = fs::read_to_string(&checkpoint_path)?;
            match self.replay(line.trim(), &seed) {
                Ok(replayed) => {
                    info!("resuming from \u{ab}{}\u{bb}", checkpoint_path.display());
                    levels = replayed;
                    depth = cells;
                    resumed = true;
                }
                Err(error) => warn!("{error}; starting over"),
            }
            fs::remove_file(&checkpoint_path)?;
        }

        let mut writer = if resumed {
            BinaryWriter::append(&log_path, self.base, DEFAULT_BLOCK)?
        } else {
            BinaryWriter::create(&log_path, self.base, DEFAULT_BLOCK)?
        };

        let mut emitted = 0_u32;
        let mut interrupted = false;

        loop {
            if let Some(code) = levels[depth].next() {
                if depth < cells {
                    let successors = Producer::new(depth).successors(&code)?;
                    depth += 1;
                    levels[depth] = Level::new(successors);
                } else if validates(&code, self.canonical)? {
                    writer.add(&code)?;
                    emitted += 1;

                    // searches only stop on the production of a complete
                    // grid, so that no partial work is lost
                    if self.stop.load(Ordering::Relaxed) {
                        self.checkpoint(&levels, &checkpoint_path)?;
                        info!(
                            "search interrupted, checkpoint \u{ab}{}\u{bb} written",
                            checkpoint_path.display()
                        );
                        interrupted = true;
                        break;
                    }
                }
            } else if depth == 0 {
                break;
            } else {
                depth -= 1;
            }
        }

        let total = writer.nb_codes();
        writer.close()?;
        info!(
            "{emitted} complete grids appended, {total} in \u{ab}{}\u{bb}",
            log_path.display()
        );

        Ok(Outcome {
            emitted,
            interrupted,
        })
    }

    fn checkpoint(&self, levels: &[Level], path: &Path) -> Result<()> {
        let line = levels.iter().map(|level| level.index.to_string()).join(",");
        let temporary = self.directory.join(".prg.tmp");
        fs::write(&temporary, line)?;
        fs::rename(&temporary, path)?;
        Ok(())
    }

    /// Rebuilds the level stack from a checkpoint line by advancing every
    /// stage iterator to its recorded index. The terminal stage keeps the
    /// codes its producer had not yielded yet, so the resumed run picks up
    /// exactly where the interrupted one stopped.
    fn replay(&self, line: &str, seed: &BigUint) -> Result<Vec<Level>> {
        let cells = self.base.cells();

        let indices: Vec<i64> = line
            .split(',')
            .map(str::parse)
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| Error::ResumeMismatch(format!("unreadable checkpoint {line:?}")))?;
        if indices.len() != cells + 1 {
            return Err(Error::ResumeMismatch(format!(
                "{} indices where {} were expected",
                indices.len(),
                cells + 1
            )));
        }

        let mut levels = vec![Level::new(vec![seed.clone()])];
        for (stage, &target) in indices.iter().enumerate() {
            if target < 0 {
                return Err(Error::ResumeMismatch(format!(
                    "negative index at stage {stage}"
                )));
            }

            let mut code = None;
            while levels[stage].index < target {
                code = levels[stage].next();
                if code.is_none() {
                    return Err(Error::ResumeMismatch(format!(
                        "stage {stage} exhausted before index {target}"
                    )));
                }
            }
            let code = code.unwrap();

            if stage < cells {
                levels.push(Level::new(Producer::new(stage).successors(&code)?));
            }
        }

        Ok(levels)
    }
}

/// Breadth-first driver: the whole stage-k frontier is written to a file,
/// then read back to produce stage k+1. Use on small bases only, since
/// intermediate frontiers are fully materialised.
pub struct BreadthSearcher {
    base: Base,
    directory: PathBuf,
    /// Keep only canonical representatives of the symmetry group.
    pub canonical: bool,
    /// Stop after producing a single stage.
    pub single_stage: bool,
    /// Do not enumerate past this stage.
    pub max_stage: Option<usize>,
    /// Only restart from files of the exact same base.
    pub strict: bool,
}

impl BreadthSearcher {
    /// Constructor with the default behaviour: enumerate every stage,
    /// restarting from any migratable file of `directory`.
    #[must_use]
    pub fn new(base: Base, directory: &Path) -> Self {
        Self {
            base,
            directory: directory.to_path_buf(),
            canonical: false,
            single_stage: false,
            max_stage: None,
            strict: false,
        }
    }

    /// Runs the enumeration up to the requested stage and returns the
    /// progress reached.
    ///
    /// # Errors
    ///
    /// Forwards codec, producer and stream errors.
    pub fn run(&self) -> Result<Progress> {
        let cells = self.base.cells();
        let limit = self.max_stage.unwrap_or(cells).min(cells);

        let (mut progress, mut file) =
            progress::best_start(&self.directory, self.base, self.strict)?;
        if let Some(path) = &file {
            if progress.base()? != self.base {
                let (migrated, migrated_path) =
                    progress::migrate(&self.directory, progress, path, self.base)?;
                progress = migrated;
                file = Some(migrated_path);
            }
        }

        let mut announced = false;
        while progress.stage < limit {
            let codes: Box<dyn Iterator<Item = Result<BigUint>>> = match &file {
                None => {
                    if !announced {
                        info!("initialising the context");
                        announced = true;
                    }
                    Box::new(std::iter::once(codec::encode(&Grid::new(self.base))))
                }
                Some(path) => {
                    let reader = stream::open(path)?;
                    if !announced {
                        info!(
                            "resuming from \u{ab}{}\u{bb}: {} grids",
                            path.display(),
                            reader.nb_codes()
                        );
                        announced = true;
                    }
                    Box::new(reader)
                }
            };

            let next_progress = Progress::new(self.base, progress.stage + 1);
            let next_path = self.directory.join(format!("{next_progress}.log"));
            let mut writer = BinaryWriter::create(&next_path, self.base, DEFAULT_BLOCK)?;

            let producer = Producer::new(progress.stage);
            let mut consumed = 0_u64;
            let mut barren = 0_u64;
            for code in codes {
                let code = code?;
                consumed += 1;

                let successors = producer.successors(&code)?;
                if successors.is_empty() {
                    barren += 1;
                }
                for next in &successors {
                    if progress.stage != cells - 1 || validates(next, self.canonical)? {
                        writer.add(next)?;
                    }
                }
            }

            let produced = writer.nb_codes();
            writer.close()?;

            progress = next_progress;
            file = Some(next_path);
            info!(
                "stage {} reached: {} grids (\u{d7}{:.2}, {:.2}% barren)",
                progress.stage,
                produced,
                f64::from(produced) / consumed as f64,
                100.0 * barren as f64 / consumed as f64,
            );

            if self.single_stage {
                break;
            }
        }

        Ok(progress)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::grid::Cell;
    use assert_fs::TempDir;

    fn depth_run(base: Base, directory: &Path) -> Outcome {
        let stop = Arc::new(AtomicBool::new(false));
        DepthSearcher::new(base, directory, stop).run().unwrap()
    }

    fn terminal_codes(base: Base, directory: &Path) -> Vec<BigUint> {
        let path = directory.join(format!("{}.log", Progress::terminal(base)));
        stream::open(&path)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap()
    }

    #[test]
    fn single_cell_base_keeps_only_the_value_one() {
        // a complete region of one cell must hold exactly {1}
        let directory = TempDir::new().unwrap();
        let base = Base::new(1, 1, 3).unwrap();

        let outcome = depth_run(base, directory.path());

        assert_eq!(
            outcome,
            Outcome {
                emitted: 1,
                interrupted: false
            }
        );

        let codes = terminal_codes(base, directory.path());
        let grid = codec::decode(&codes[0]).unwrap();
        assert_eq!(grid.cells[0].value, 1);
        assert_eq!(grid.cells[0].region, 0);
    }

    #[test]
    fn two_cell_base_emits_both_orderings_of_one_region() {
        let directory = TempDir::new().unwrap();
        let base = Base::new(1, 2, 3).unwrap();

        let outcome = depth_run(base, directory.path());
        assert_eq!(outcome.emitted, 2);

        let values: Vec<Vec<u8>> = terminal_codes(base, directory.path())
            .iter()
            .map(|code| {
                let grid = codec::decode(code).unwrap();
                assert_eq!(grid.nb_regions(), 1);
                grid.cells.iter().map(|cell| cell.value).collect()
            })
            .collect();

        assert_eq!(values, [[1, 2], [2, 1]]);
    }

    #[test]
    fn terminal_codes_decode_to_sound_complete_grids() {
        let directory = TempDir::new().unwrap();
        let base = Base::new(2, 2, 4).unwrap();

        let outcome = depth_run(base, directory.path());
        let codes = terminal_codes(base, directory.path());
        assert_eq!(codes.len(), outcome.emitted as usize);

        // the four cells are mutually king-adjacent, so every complete grid
        // is one region holding a permutation of {1, 2, 3, 4}
        assert_eq!(codes.len(), 24);

        for code in &codes {
            let grid = codec::decode(code).unwrap();
            assert_eq!(grid.base, base);
            assert!(grid.is_complete());
            assert!(grid.is_normal());
            assert!(!Regions::survey(&grid).any_anomalous());

            // king-move distinctness over the full grid
            for row in 0..2_usize {
                for col in 0..2_usize {
                    for (next_row, next_col) in [(row, col + 1), (row + 1, col + 1), (row + 1, col)]
                    {
                        if next_row < 2 && next_col < 2 {
                            assert_ne!(
                                grid[(row, col)].value,
                                grid[(next_row, next_col)].value,
                                "{grid}"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn partial_stages_respect_the_stage_invariant() {
        let directory = TempDir::new().unwrap();
        let base = Base::new(2, 2, 3).unwrap();

        let searcher = BreadthSearcher::new(base, directory.path());
        searcher.run().unwrap();

        for stage in 1..base.cells() {
            let path = directory
                .path()
                .join(format!("{}.log", Progress::new(base, stage)));
            for code in stream::open(&path).unwrap() {
                let grid = codec::decode(&code.unwrap()).unwrap();
                assert!(grid.cells[..stage].iter().all(Cell::is_filled));
                assert!(grid.cells[stage..].iter().all(|cell| !cell.is_filled()));
            }
        }
    }

    #[test]
    fn both_drivers_agree() {
        let base = Base::new(2, 2, 4).unwrap();

        let deep = TempDir::new().unwrap();
        depth_run(base, deep.path());

        let broad = TempDir::new().unwrap();
        BreadthSearcher::new(base, broad.path()).run().unwrap();

        assert_eq!(
            terminal_codes(base, deep.path()),
            terminal_codes(base, broad.path())
        );
    }

    #[test]
    fn breadth_runs_resume_from_the_deepest_file() {
        let base = Base::new(2, 2, 4).unwrap();

        let reference = TempDir::new().unwrap();
        BreadthSearcher::new(base, reference.path()).run().unwrap();

        let split = TempDir::new().unwrap();
        let mut searcher = BreadthSearcher::new(base, split.path());
        searcher.max_stage = Some(3);
        assert_eq!(searcher.run().unwrap(), Progress::new(base, 3));

        let mut searcher = BreadthSearcher::new(base, split.path());
        searcher.max_stage = None;
        assert_eq!(searcher.run().unwrap(), Progress::terminal(base));

        assert_eq!(
            terminal_codes(base, reference.path()),
            terminal_codes(base, split.path())
        );
    }

    #[test]
    fn single_stage_mode_stops_early() {
        let directory = TempDir::new().unwrap();
        let base = Base::new(2, 2, 3).unwrap();

        let mut searcher = BreadthSearcher::new(base, directory.path());
        searcher.single_stage = true;

        assert_eq!(searcher.run().unwrap(), Progress::new(base, 1));
        assert!(
            directory
                .path()
                .join(format!("{}.log", Progress::new(base, 1)))
                .is_file()
        );
    }

    #[test]
    fn checkpointed_run_resumes_into_the_same_output() {
        let base = Base::new(2, 2, 4).unwrap();

        let reference = TempDir::new().unwrap();
        let uninterrupted = depth_run(base, reference.path());

        // a stop flag armed from the start interrupts the search right
        // after the first complete grid
        let directory = TempDir::new().unwrap();
        let stop = Arc::new(AtomicBool::new(true));
        let searcher = DepthSearcher::new(base, directory.path(), Arc::clone(&stop));
        let first = searcher.run().unwrap();
        assert_eq!(
            first,
            Outcome {
                emitted: 1,
                interrupted: true
            }
        );
        let checkpoint = directory
            .path()
            .join(format!("{}.prg", Progress::terminal(base)));
        assert!(checkpoint.is_file());

        stop.store(false, Ordering::Relaxed);
        let second = searcher.run().unwrap();
        assert_eq!(second.emitted, uninterrupted.emitted - 1);
        assert!(!second.interrupted);
        assert!(!checkpoint.exists());

        assert_eq!(
            terminal_codes(base, reference.path()),
            terminal_codes(base, directory.path())
        );
    }

    #[test]
    fn unreadable_checkpoint_restarts_from_scratch() {
        let base = Base::new(2, 2, 4).unwrap();

        let reference = TempDir::new().unwrap();
        let uninterrupted = depth_run(base, reference.path());

        let directory = TempDir::new().unwrap();
        let checkpoint = directory
            .path()
            .join(format!("{}.prg", Progress::terminal(base)));
        fs::write(&checkpoint, "0,0,999,0,0").unwrap();

        let outcome = depth_run(base, directory.path());

        assert_eq!(outcome.emitted, uninterrupted.emitted);
        assert!(!checkpoint.exists());
        assert_eq!(
            terminal_codes(base, reference.path()),
            terminal_codes(base, directory.path())
        );
    }
}
