//! Append-only, hash-linked ledger persisted as a single JSON file.
//!
//! Storage: one top-level JSON array of records, each with the fields
//! `index, timestamp, data, previous_hash, hash`. The whole file is rewritten
//! on every append (temp file, fsync, rename) before the append returns.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::error::LedgerError;
use crate::record::{now_timestamp, verify_chain, ChainViolation, Payload, Record};
use crate::response::ResponseEntry;

/// Hash-linked journal owned by a single process
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    chain: Vec<Record>,
}

impl Ledger {
    /// Open the ledger at `path`, creating and persisting a genesis record
    /// when no chain exists yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();

        let chain = match Self::load(&path)? {
            Some(chain) => chain,
            None => {
                let ledger = Self {
                    path,
                    chain: vec![Record::genesis()],
                };
                ledger.save()?;
                info!(path = %ledger.path.display(), "created ledger with genesis record");
                return Ok(ledger);
            }
        };

        if let Err(violation) = verify_chain(&chain) {
            warn!(path = %path.display(), %violation, "ledger failed verification");
            return Err(LedgerError::broken_chain(&path, &violation));
        }

        debug!(path = %path.display(), records = chain.len(), "ledger loaded");
        Ok(Self { path, chain })
    }

    /// Read persisted records. `None` means there is no chain yet.
    fn load(path: &Path) -> Result<Option<Vec<Record>>, LedgerError> {
        if !path.exists() {
            return Ok(None);
        }

        let content =
            fs::read_to_string(path).map_err(|e| LedgerError::persistence(path, e))?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let chain: Vec<Record> = serde_json::from_str(&content)
            .map_err(|e| LedgerError::corrupt(path, format!("malformed ledger file: {}", e)))?;
        if chain.is_empty() {
            return Ok(None);
        }

        Ok(Some(chain))
    }

    /// Append a payload as a new record and persist the chain.
    pub fn append(&mut self, payload: Payload) -> Result<&Record, LedgerError> {
        let latest = self.latest();
        let record = Record::new(
            self.chain.len() as u64,
            now_timestamp(),
            payload,
            latest.hash().to_string(),
        );
        self.chain.push(record);

        if let Err(e) = self.save() {
            self.chain.pop();
            return Err(e);
        }

        let record = self.latest();
        debug!(index = record.index(), hash = record.hash(), "record appended");
        Ok(record)
    }

    /// Append a typed response.
    pub fn append_response(&mut self, entry: &ResponseEntry) -> Result<&Record, LedgerError> {
        self.append(entry.to_payload())
    }

    /// Last record. The genesis record guarantees one exists.
    pub fn latest(&self) -> &Record {
        // open() never yields an empty chain
        &self.chain[self.chain.len() - 1]
    }

    /// Recheck every record's seal and linkage.
    pub fn verify(&self) -> Result<(), ChainViolation> {
        verify_chain(&self.chain)
    }

    pub fn is_valid(&self) -> bool {
        self.verify().is_ok()
    }

    pub fn records(&self) -> &[Record] {
        &self.chain
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.chain.get(index)
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the whole chain durably.
    pub fn save(&self) -> Result<(), LedgerError> {
        let json = serde_json::to_string_pretty(&self.chain)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| LedgerError::persistence(&self.path, e))?;
            }
        }

        // Write to temp file then rename (atomic)
        let temp_path = self.path.with_extension("json.tmp");
        let write = || -> std::io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()?;
            fs::rename(&temp_path, &self.path)
        };
        write().map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            LedgerError::persistence(&self.path, e)
        })
    }

    /// Flush and release the ledger.
    pub fn close(self) -> Result<(), LedgerError> {
        self.save()?;
        info!(path = %self.path.display(), records = self.chain.len(), "ledger closed");
        Ok(())
    }
}

/// Ledger handle that serializes appends from several threads
#[derive(Debug, Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Ledger> {
        // A panic mid-append leaves the chain as last persisted
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append and return a copy of the new record.
    pub fn append(&self, payload: Payload) -> Result<Record, LedgerError> {
        self.lock().append(payload).cloned()
    }

    pub fn latest(&self) -> Record {
        self.lock().latest().clone()
    }

    pub fn verify(&self) -> Result<(), ChainViolation> {
        self.lock().verify()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Run `f` with exclusive access to the ledger.
    pub fn with<R>(&self, f: impl FnOnce(&mut Ledger) -> R) -> R {
        f(&mut self.lock())
    }
}
