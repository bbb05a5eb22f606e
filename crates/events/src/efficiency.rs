use crate::columns::{boolean_column, column, StringColumn};
use crate::config::ColumnNames;
use arrow::array::{Array, RecordBatch};
use std::collections::BTreeMap;
use tnp_lumi::{as_u32_array, RunNumber};


#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Counts {
    pub total: u64,
    pub passed: u64
}


impl Counts {
    #[inline]
    fn add(&mut self, passed: bool) {
        self.total += 1;
        self.passed += passed as u64;
    }

    fn merge(&mut self, other: &Counts) {
        self.total += other.total;
        self.passed += other.passed;
    }

    /// Fraction of passed probes, `None` when nothing was probed.
    pub fn efficiency(&self) -> Option<f64> {
        (self.total > 0).then(|| self.passed as f64 / self.total as f64)
    }
}


/// Tag-and-probe tallies of fiducial probes (total) and matched fiducial probes (passed).
///
/// A table made with [`EfficiencyTable::new`] grows a key for every observed roll and run.
/// A table made with [`EfficiencyTable::with_axes`] has fixed category axes instead:
/// all keys exist up front and hits off an axis are not counted along it.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct EfficiencyTable {
    pub by_roll: BTreeMap<String, Counts>,
    pub by_run: BTreeMap<RunNumber, Counts>,
    pub by_roll_run: BTreeMap<(String, RunNumber), Counts>,
    fixed_axes: bool
}


impl EfficiencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_axes<R, S>(rolls: R, runs: impl IntoIterator<Item = RunNumber>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>
    {
        let by_roll: BTreeMap<String, Counts> = rolls.into_iter()
            .map(|roll| (roll.into(), Counts::default()))
            .collect();
        let by_run: BTreeMap<RunNumber, Counts> = runs.into_iter()
            .map(|run| (run, Counts::default()))
            .collect();
        let by_roll_run = by_roll.keys()
            .flat_map(|roll| by_run.keys().map(move |run| ((roll.clone(), *run), Counts::default())))
            .collect();
        Self {
            by_roll,
            by_run,
            by_roll_run,
            fixed_axes: true
        }
    }

    pub fn has_fixed_axes(&self) -> bool {
        self.fixed_axes
    }

    /// Accumulates a batch of hits. Hits with null roll, run or fiducial flag are skipped.
    pub fn fill(&mut self, hits: &RecordBatch, columns: &ColumnNames) -> anyhow::Result<()> {
        let roll = StringColumn::new(&columns.roll_name, column(hits, &columns.roll_name)?)?;
        let run = as_u32_array(&columns.run, column(hits, &columns.run)?)?;
        let fiducial = boolean_column(hits, &columns.is_fiducial)?;
        let matched = boolean_column(hits, &columns.is_matched)?;

        for i in 0..hits.num_rows() {
            if !fiducial.is_valid(i) || !fiducial.value(i) {
                continue
            }
            let (Some(roll_name), true) = (roll.get(i), run.is_valid(i)) else {
                continue
            };
            let run_number = run.value(i);
            let passed = matched.is_valid(i) && matched.value(i);

            if self.fixed_axes {
                self.fill_fixed(roll_name, run_number, passed);
                continue
            }

            self.by_run.entry(run_number).or_default().add(passed);
            if let Some(counts) = self.by_roll.get_mut(roll_name) {
                counts.add(passed)
            } else {
                self.by_roll.entry(roll_name.to_string()).or_default().add(passed)
            }
            self.by_roll_run.entry((roll_name.to_string(), run_number)).or_default().add(passed);
        }
        Ok(())
    }

    fn fill_fixed(&mut self, roll_name: &str, run_number: RunNumber, passed: bool) {
        let on_roll_axis = match self.by_roll.get_mut(roll_name) {
            Some(counts) => {
                counts.add(passed);
                true
            },
            None => false
        };
        let on_run_axis = match self.by_run.get_mut(&run_number) {
            Some(counts) => {
                counts.add(passed);
                true
            },
            None => false
        };
        if on_roll_axis && on_run_axis {
            if let Some(counts) = self.by_roll_run.get_mut(&(roll_name.to_string(), run_number)) {
                counts.add(passed)
            }
        }
    }

    /// Adds up the tallies of `other`. Keys missing from a table with fixed axes are skipped.
    pub fn merge(&mut self, other: &EfficiencyTable) {
        if self.fixed_axes {
            for (roll, counts) in other.by_roll.iter() {
                if let Some(own) = self.by_roll.get_mut(roll) {
                    own.merge(counts)
                }
            }
            for (run, counts) in other.by_run.iter() {
                if let Some(own) = self.by_run.get_mut(run) {
                    own.merge(counts)
                }
            }
            for (key, counts) in other.by_roll_run.iter() {
                if let Some(own) = self.by_roll_run.get_mut(key) {
                    own.merge(counts)
                }
            }
            return
        }
        for (roll, counts) in other.by_roll.iter() {
            self.by_roll.entry(roll.clone()).or_default().merge(counts);
        }
        for (run, counts) in other.by_run.iter() {
            self.by_run.entry(*run).or_default().merge(counts);
        }
        for (key, counts) in other.by_roll_run.iter() {
            self.by_roll_run.entry(key.clone()).or_default().merge(counts);
        }
    }

    pub fn total(&self) -> Counts {
        let mut total = Counts::default();
        for counts in self.by_run.values() {
            total.merge(counts);
        }
        total
    }
}
