use std::{
    fs::{self, File},
    io::Write,
    marker::PhantomData,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    core::reminders::ReminderLog,
    errors::PersistenceError,
    records::{DatedAmountRecord, Holding, IncomeSource, MonthlyIncomeSummary, TaxDeduction},
};

use super::{Repository, Result};

const TMP_SUFFIX: &str = "tmp";

pub const EXPENSES_FILE: &str = "expenses.json";
pub const SAVINGS_ENTRIES_FILE: &str = "savings_entries.json";
pub const INCOME_SUMMARIES_FILE: &str = "income_summaries.json";
pub const TAX_DEDUCTIONS_FILE: &str = "tax_deductions.json";
pub const INCOME_SOURCES_FILE: &str = "income_sources.json";
pub const HOLDINGS_FILE: &str = "holdings.json";
pub const REMINDER_LOG_FILE: &str = "reminder_log.json";

/// A collection persisted as one pretty-printed JSON array.
#[derive(Debug, Clone)]
pub struct JsonRepository<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonRepository<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> Repository<T> for JsonRepository<T>
where
    T: Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    fn store(&self, items: &[T]) -> Result<()> {
        let json = serde_json::to_string_pretty(items)?;
        write_atomic(&self.path, &json)
    }
}

/// Directory holding every persisted collection of the application.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn expenses(&self) -> JsonRepository<DatedAmountRecord> {
        JsonRepository::new(self.root.join(EXPENSES_FILE))
    }

    pub fn savings_entries(&self) -> JsonRepository<DatedAmountRecord> {
        JsonRepository::new(self.root.join(SAVINGS_ENTRIES_FILE))
    }

    pub fn income_summaries(&self) -> JsonRepository<MonthlyIncomeSummary> {
        JsonRepository::new(self.root.join(INCOME_SUMMARIES_FILE))
    }

    pub fn tax_deductions(&self) -> JsonRepository<TaxDeduction> {
        JsonRepository::new(self.root.join(TAX_DEDUCTIONS_FILE))
    }

    pub fn income_sources(&self) -> JsonRepository<IncomeSource> {
        JsonRepository::new(self.root.join(INCOME_SOURCES_FILE))
    }

    pub fn holdings(&self) -> JsonRepository<Holding> {
        JsonRepository::new(self.root.join(HOLDINGS_FILE))
    }

    pub fn load_reminder_log(&self) -> Result<ReminderLog> {
        let path = self.root.join(REMINDER_LOG_FILE);
        if !path.exists() {
            return Ok(ReminderLog::default());
        }
        let data = fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(ReminderLog::default());
        }
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save_reminder_log(&self, log: &ReminderLog) -> Result<()> {
        let json = serde_json::to_string_pretty(log)?;
        write_atomic(&self.root.join(REMINDER_LOG_FILE), &json)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

/// Writes `data` next to `path` and renames it into place.
pub(crate) fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(data.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path).map_err(PersistenceError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tmp_path_appends_suffix() {
        let tmp = tmp_path(Path::new("/data/expenses.json"));
        assert_eq!(tmp, PathBuf::from("/data/expenses.json.tmp"));
    }

    #[test]
    fn missing_file_loads_empty_collection() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::open(dir.path()).expect("open store");
        let expenses = store.expenses().load().expect("load");
        assert!(expenses.is_empty());
        assert!(store.load_reminder_log().expect("log").is_empty());
    }
}
