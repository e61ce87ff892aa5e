use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    rows: Vec<Vec<String>>,
    fetched_at: i64,
}

/// On-disk cache of spreadsheet range reads with a fixed time-to-live
pub struct RangeCache {
    db: sled::Db,
    ttl_secs: i64,
}

impl RangeCache {
    /// Open (or create) the cache at `dir`
    pub fn open(dir: &Path, ttl_secs: u64) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let db = sled::open(dir)?;
        Ok(Self {
            db,
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        })
    }

    /// Throwaway cache that lives only as long as the value
    pub fn temporary(ttl_secs: u64) -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self {
            db,
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        })
    }

    fn make_key(spreadsheet: &str, sheet: &str, range: &str) -> Vec<u8> {
        format!("{spreadsheet}:{sheet}!{range}").into_bytes()
    }

    /// Cached rows for a range, `None` when absent or expired
    pub fn get(&self, spreadsheet: &str, sheet: &str, range: &str) -> Result<Option<Vec<Vec<String>>>> {
        self.get_at(spreadsheet, sheet, range, Utc::now())
    }

    /// Same as [`RangeCache::get`] with an explicit clock
    pub fn get_at(
        &self,
        spreadsheet: &str,
        sheet: &str,
        range: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<Vec<String>>>> {
        let key = Self::make_key(spreadsheet, sheet, range);
        let Some(data) = self.db.get(&key)? else {
            return Ok(None);
        };
        let entry: CacheEntry = bincode::deserialize(&data)?;
        if now.timestamp() - entry.fetched_at >= self.ttl_secs {
            debug!(sheet, range, "Cached range expired");
            return Ok(None);
        }
        Ok(Some(entry.rows))
    }

    /// Store rows for a range, stamped now
    pub fn put(&self, spreadsheet: &str, sheet: &str, range: &str, rows: &[Vec<String>]) -> Result<()> {
        self.put_at(spreadsheet, sheet, range, rows, Utc::now())
    }

    /// Same as [`RangeCache::put`] with an explicit clock
    pub fn put_at(
        &self,
        spreadsheet: &str,
        sheet: &str,
        range: &str,
        rows: &[Vec<String>],
        now: DateTime<Utc>,
    ) -> Result<()> {
        let key = Self::make_key(spreadsheet, sheet, range);
        let entry = CacheEntry {
            rows: rows.to_vec(),
            fetched_at: now.timestamp(),
        };

        let data = bincode::serialize(&entry)?;
        self.db.insert(key, data)?;
        self.db.flush()?;

        Ok(())
    }

    /// Drop every cached range
    pub fn clear(&self) -> Result<()> {
        self.db.clear()?;
        self.db.flush()?;
        Ok(())
    }
}
