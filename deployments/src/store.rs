//! Durable, per-network records of the contracts deployed by each task.
//!
//! Every record is a flat JSON object mapping a contract name to an address,
//! stored at `<root>/<task-id>/output/<network>.json`. Records only ever grow:
//! [`OutputStore::merge`] overwrites the keys it is given and leaves every other
//! key untouched. Writes go to a temporary file in the same directory which is
//! then renamed over the record, so a concurrent reader observes either the
//! previous or the merged record, never a partial one.

use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use alloy_primitives::{Address, TxHash};
use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::{
    constants::{DEPLOYMENT_TXS_DIR, JSON_EXTENSION, OUTPUT_DIR, TEST_OUTPUT_FILE_STEM},
    errors::DeployError,
    network::Network,
};

/// The deployed contracts of a task on a single network, keyed by contract name
pub type Output = BTreeMap<String, Address>;

/// Identifies which of a task's output records is being accessed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputTarget {
    /// The canonical record of a network
    Network(Network),
    /// The record written by test-mode runs
    Test,
}

impl OutputTarget {
    /// The file stem of the record
    pub fn file_stem(&self) -> &'static str {
        match self {
            OutputTarget::Network(network) => network.name(),
            OutputTarget::Test => TEST_OUTPUT_FILE_STEM,
        }
    }
}

impl Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::Network(network) => write!(f, "{network}"),
            OutputTarget::Test => write!(f, "test"),
        }
    }
}

/// The store of all task output records under a deployments directory.
///
/// The store is the only component that reads or writes record files. Reads
/// always go to disk, so merges made by other processes are observed; merges
/// within this process are serialized so no read-modify-write is lost.
#[derive(Debug)]
pub struct OutputStore {
    /// The deployments directory
    root: PathBuf,
    /// Held across every read-modify-write of a record file
    write_lock: Mutex<()>,
}

impl OutputStore {
    /// Create a store rooted at the given deployments directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The deployments directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The directory of the given task
    pub fn task_dir(&self, task_id: &str) -> PathBuf {
        self.root.join(task_id)
    }

    /// The path of a task's output record. This is the only mapping from
    /// `(task, target)` to storage.
    pub fn output_path(&self, task_id: &str, target: OutputTarget) -> PathBuf {
        self.task_dir(task_id)
            .join(OUTPUT_DIR)
            .join(target.file_stem())
            .with_extension(JSON_EXTENSION)
    }

    /// The path of a task's deployment transaction record on a network
    pub fn transactions_path(&self, task_id: &str, network: Network) -> PathBuf {
        self.task_dir(task_id)
            .join(DEPLOYMENT_TXS_DIR)
            .join(network.name())
            .with_extension(JSON_EXTENSION)
    }

    /// Read a task's output record.
    ///
    /// When no record exists, fails with [`DeployError::NotFound`] if `ensure`
    /// is set and returns an empty output otherwise.
    pub fn read(
        &self,
        task_id: &str,
        target: OutputTarget,
        ensure: bool,
    ) -> Result<Output, DeployError> {
        let path = self.output_path(task_id, target);
        match read_record::<Address>(&path)? {
            Some(output) => {
                debug!("read {} entries from {}", output.len(), path.display());
                Ok(output)
            }
            None if ensure => Err(DeployError::NotFound {
                task: task_id.to_string(),
                target,
            }),
            None => Ok(Output::new()),
        }
    }

    /// Merge the given entries into a task's output record, returning the merged record.
    ///
    /// Keys present in `partial` are overwritten; all other keys are preserved.
    pub fn merge(
        &self,
        task_id: &str,
        target: OutputTarget,
        partial: &Output,
    ) -> Result<Output, DeployError> {
        let path = self.output_path(task_id, target);
        let _guard = self.lock_writes();

        let mut output = read_record::<Address>(&path)?.unwrap_or_default();
        output.extend(partial.iter().map(|(k, v)| (k.clone(), *v)));
        write_record(&path, &output)?;

        debug!("merged {:?} into {}", partial.keys(), path.display());
        Ok(output)
    }

    /// Record the hash of the transaction that deployed a contract
    pub fn record_transaction(
        &self,
        task_id: &str,
        network: Network,
        contract: &str,
        tx_hash: TxHash,
    ) -> Result<(), DeployError> {
        let path = self.transactions_path(task_id, network);
        let _guard = self.lock_writes();

        let mut txs = read_record::<TxHash>(&path)?.unwrap_or_default();
        txs.insert(contract.to_string(), tx_hash);
        write_record(&path, &txs)
    }

    /// Read a task's deployment transaction record, empty if there is none
    pub fn transactions(
        &self,
        task_id: &str,
        network: Network,
    ) -> Result<BTreeMap<String, TxHash>, DeployError> {
        Ok(read_record(&self.transactions_path(task_id, network))?.unwrap_or_default())
    }

    /// Serialize record writes within this process
    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        // A panic while holding the lock cannot leave a half-written record on disk
        self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Read a flat JSON record, returning `None` if the file does not exist
fn read_record<V: DeserializeOwned>(
    path: &Path,
) -> Result<Option<BTreeMap<String, V>>, DeployError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(DeployError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|source| DeployError::Serde {
            path: path.to_path_buf(),
            source,
        })
}

/// Atomically replace a record file with the given contents
fn write_record<V: Serialize>(
    path: &Path,
    record: &BTreeMap<String, V>,
) -> Result<(), DeployError> {
    let io_err = |source| DeployError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(io_err)?;

    let mut contents = serde_json::to_string_pretty(record).map_err(|source| DeployError::Serde {
        path: path.to_path_buf(),
        source,
    })?;
    contents.push('\n');

    let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
    file.write_all(contents.as_bytes()).map_err(io_err)?;
    file.as_file().sync_all().map_err(io_err)?;
    file.persist(path).map_err(|e| io_err(e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use alloy_primitives::{address, b256, Address};
    use tempfile::tempdir;

    use super::{Output, OutputStore, OutputTarget};
    use crate::{errors::DeployError, network::Network};

    const VAULT: Address = address!("ba12222222228d8ba445958a75a0704d566bf2c8");
    const FACTORY: Address = address!("897888115ada5773e02aa29f775430bfb5f34c51");

    fn output(entries: &[(&str, Address)]) -> Output {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_read_missing_record() {
        let dir = tempdir().unwrap();
        let store = OutputStore::new(dir.path());
        let target = OutputTarget::Network(Network::Goerli);

        assert!(store.read("20230117-vault", target, false).unwrap().is_empty());
        assert!(matches!(
            store.read("20230117-vault", target, true),
            Err(DeployError::NotFound { .. })
        ));
    }

    #[test]
    fn test_merge_preserves_existing_keys() {
        let dir = tempdir().unwrap();
        let store = OutputStore::new(dir.path());
        let target = OutputTarget::Network(Network::Goerli);

        store.merge("t", target, &output(&[("Vault", VAULT)])).unwrap();
        let merged = store
            .merge("t", target, &output(&[("WeightedPoolFactory", FACTORY)]))
            .unwrap();

        assert_eq!(
            merged,
            output(&[("Vault", VAULT), ("WeightedPoolFactory", FACTORY)])
        );
        // A fresh store observes the same record on disk
        let reread = OutputStore::new(dir.path()).read("t", target, true).unwrap();
        assert_eq!(reread, merged);
    }

    #[test]
    fn test_merge_overwrites_given_keys() {
        let dir = tempdir().unwrap();
        let store = OutputStore::new(dir.path());
        let target = OutputTarget::Network(Network::Bsc);

        store.merge("t", target, &output(&[("Vault", VAULT)])).unwrap();
        store.merge("t", target, &output(&[("Vault", FACTORY)])).unwrap();

        assert_eq!(store.read("t", target, true).unwrap()["Vault"], FACTORY);
    }

    #[test]
    fn test_records_are_scoped_by_target() {
        let dir = tempdir().unwrap();
        let store = OutputStore::new(dir.path());

        store
            .merge("t", OutputTarget::Test, &output(&[("Vault", VAULT)]))
            .unwrap();

        let goerli = OutputTarget::Network(Network::Goerli);
        assert!(store.read("t", goerli, false).unwrap().is_empty());
        assert_eq!(
            store.output_path("t", OutputTarget::Test),
            dir.path().join("t").join("output").join("test.json")
        );
        assert_eq!(
            store.output_path("t", goerli),
            dir.path().join("t").join("output").join("goerli.json")
        );
    }

    #[test]
    fn test_record_is_human_readable() {
        let dir = tempdir().unwrap();
        let store = OutputStore::new(dir.path());
        let target = OutputTarget::Network(Network::Goerli);

        store.merge("t", target, &output(&[("Vault", VAULT)])).unwrap();

        let contents = fs::read_to_string(store.output_path("t", target)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        let addr = parsed["Vault"].as_str().unwrap();
        assert_eq!(addr.parse::<Address>().unwrap(), VAULT);
        // No temporary files are left behind
        let entries = fs::read_dir(dir.path().join("t").join("output")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_reads_observe_merges_from_other_stores() {
        let dir = tempdir().unwrap();
        let reader = OutputStore::new(dir.path());
        let writer = OutputStore::new(dir.path());
        let target = OutputTarget::Network(Network::Goerli);

        writer.merge("t", target, &output(&[("Vault", VAULT)])).unwrap();
        assert_eq!(reader.read("t", target, true).unwrap(), output(&[("Vault", VAULT)]));

        writer
            .merge("t", target, &output(&[("WeightedPoolFactory", FACTORY)]))
            .unwrap();
        assert_eq!(
            reader.read("t", target, true).unwrap(),
            output(&[("Vault", VAULT), ("WeightedPoolFactory", FACTORY)])
        );
    }

    #[test]
    fn test_record_transaction() {
        let dir = tempdir().unwrap();
        let store = OutputStore::new(dir.path());
        let hash = b256!("0101010101010101010101010101010101010101010101010101010101010101");

        store
            .record_transaction("t", Network::Goerli, "Vault", hash)
            .unwrap();

        let txs = store.transactions("t", Network::Goerli).unwrap();
        assert_eq!(txs["Vault"], hash);
        assert!(store.transactions("t", Network::Bsc).unwrap().is_empty());
    }
}
