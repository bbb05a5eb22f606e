use crate::blacklist::Blacklist;
use crate::filter::EventFilter;
use crate::predicate::{BlacklistPredicate, CertifiedLumiPredicate, EventPredicateRef, ExcludePrefixPredicate};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tnp_lumi::LumiMask;


#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnNames {
    pub run: String,
    pub lumi: String,
    pub event: String,
    pub size: String,
    pub roll_name: String,
    pub is_fiducial: String,
    pub is_matched: String
}


impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            run: "run".to_string(),
            lumi: "luminosityBlock".to_string(),
            event: "event".to_string(),
            size: "size".to_string(),
            roll_name: "roll_name".to_string(),
            is_fiducial: "is_fiducial".to_string(),
            is_matched: "is_matched".to_string()
        }
    }
}


/// Rolls excluded unless the config lists its own `excludedRolls`.
pub const DEFAULT_EXCLUDED_ROLLS: [&str; 4] = [
    "RE+4_R1_CH15_A",
    "RE+4_R1_CH16_A",
    "RE+3_R1_CH15_A",
    "RE+3_R1_CH16_A"
];


fn default_excluded_rolls() -> Vec<String> {
    DEFAULT_EXCLUDED_ROLLS.iter().map(|roll| roll.to_string()).collect()
}


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FilterConfig {
    pub cert_path: PathBuf,
    pub run_blacklist_path: Option<PathBuf>,
    pub roll_blacklist_path: Option<PathBuf>,
    #[serde(default = "default_excluded_rolls")]
    pub excluded_rolls: Vec<String>,
    #[serde(default)]
    pub excluded_roll_prefixes: Vec<String>,
    #[serde(default)]
    pub columns: ColumnNames
}


impl FilterConfig {
    pub fn new(cert_path: impl Into<PathBuf>) -> Self {
        Self {
            cert_path: cert_path.into(),
            run_blacklist_path: None,
            roll_blacklist_path: None,
            excluded_rolls: default_excluded_rolls(),
            excluded_roll_prefixes: Vec::new(),
            columns: ColumnNames::default()
        }
    }

    pub fn read_config_file(file: impl AsRef<Path>) -> anyhow::Result<Self> {
        let file = file.as_ref();
        let reader = std::fs::File::open(file).map(std::io::BufReader::new).with_context(|| {
            format!("failed to open filter config {}", file.display())
        })?;
        let config = serde_json::from_reader(reader).with_context(|| {
            format!("invalid filter config {}", file.display())
        })?;
        Ok(config)
    }

    /// Per-event columns repeated onto every hit by [`crate::flatten_hits`].
    pub fn per_event_columns(&self) -> [&str; 2] {
        [self.columns.run.as_str(), self.columns.event.as_str()]
    }

    pub fn load_mask(&self) -> anyhow::Result<LumiMask> {
        LumiMask::from_json_file(&self.cert_path)
    }

    /// Event level selection: certified lumi blocks of runs that are not blacklisted.
    pub fn event_filter(&self, mask: Arc<LumiMask>) -> anyhow::Result<EventFilter> {
        let mut predicates: Vec<EventPredicateRef> = vec![
            Arc::new(CertifiedLumiPredicate::new(&self.columns.run, &self.columns.lumi, mask))
        ];
        if let Some(path) = self.run_blacklist_path.as_ref() {
            let runs = Blacklist::read_file(path)?;
            predicates.push(Arc::new(BlacklistPredicate::new(&self.columns.run, Arc::new(runs))));
        }
        Ok(EventFilter::new(predicates))
    }

    /// Hit level selection: drops blacklisted and explicitly excluded rolls.
    pub fn hit_filter(&self) -> anyhow::Result<EventFilter> {
        let mut predicates: Vec<EventPredicateRef> = Vec::new();
        if let Some(path) = self.roll_blacklist_path.as_ref() {
            let rolls = Blacklist::read_file(path)?;
            predicates.push(Arc::new(BlacklistPredicate::new(&self.columns.roll_name, Arc::new(rolls))));
        }
        if !self.excluded_rolls.is_empty() {
            let rolls: Blacklist = self.excluded_rolls.iter().cloned().collect();
            predicates.push(Arc::new(BlacklistPredicate::new(&self.columns.roll_name, Arc::new(rolls))));
        }
        if !self.excluded_roll_prefixes.is_empty() {
            predicates.push(Arc::new(ExcludePrefixPredicate::new(
                &self.columns.roll_name,
                self.excluded_roll_prefixes.clone()
            )));
        }
        Ok(EventFilter::new(predicates))
    }
}
