// src/store.rs
use crate::codec;
use crate::error::{StoreError, StoreResult};
use crate::models::{MatchPolicy, Record};
use log;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const STORE_FILENAME: &str = "saved_passwords.txt";
pub const TEMP_FILENAME: &str = "temp_passwords.txt";

/// Plain-text credential store, one record per line, in insertion order.
///
/// Search returns every matching line; update and delete touch only the first.
/// Both rewrites go through a temporary file that replaces the store with a
/// single rename, and that temporary file never outlives the call.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    temp_path: PathBuf,
    policy: MatchPolicy,
}

impl RecordStore {
    /// Store at `path`, with its temporary file alongside it.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let temp_path = temp_path_beside(&path, Path::new(TEMP_FILENAME));
        RecordStore {
            path,
            temp_path,
            policy: MatchPolicy::default(),
        }
    }

    pub fn with_temp_path(mut self, temp_path: impl Into<PathBuf>) -> Self {
        self.temp_path = temp_path.into();
        self
    }

    pub fn with_match_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Appends one encoded record to the end of the store, creating it if needed.
    pub fn append(&self, record: &Record) -> StoreResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                log::error!("Failed to open {:?} for appending: {:?}", self.path, e);
                StoreError::Io(e)
            })?;
        file.write_all(codec::encode(record).as_bytes()).map_err(|e| {
            log::error!("Failed to append record to {:?}: {:?}", self.path, e);
            StoreError::Io(e)
        })?;
        log::info!("Appended record with label '{}' to {:?}", record.label, self.path);
        Ok(())
    }

    /// Every stored line in file order, without line terminators.
    /// A missing file is an empty store.
    pub fn list(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .read_raw_lines()?
            .unwrap_or_default()
            .iter()
            .map(|raw| display_line(raw))
            .collect())
    }

    pub fn count(&self) -> StoreResult<usize> {
        Ok(self.read_raw_lines()?.map_or(0, |lines| lines.len()))
    }

    /// Every line matching `query`, in file order.
    pub fn find_by_label_substring(&self, query: &str) -> StoreResult<Vec<String>> {
        ensure_query(query)?;
        let found: Vec<String> = self
            .list()?
            .into_iter()
            .filter(|line| codec::matches(line, query, self.policy))
            .collect();
        log::debug!("Search for '{}' matched {} line(s)", query, found.len());
        Ok(found)
    }

    /// The line that `replace_first_match` / `delete_first_match` would act on.
    pub fn first_match(&self, query: &str) -> StoreResult<Option<String>> {
        ensure_query(query)?;
        Ok(self
            .list()?
            .into_iter()
            .find(|line| codec::matches(line, query, self.policy)))
    }

    /// Replaces the first matching record with a fresh timestamp and secret.
    ///
    /// Under [`MatchPolicy::Line`] the rewritten label is the query text itself,
    /// which keeps files written by earlier versions readable the same way.
    /// Under [`MatchPolicy::Label`] the record keeps its own label.
    pub fn replace_first_match(&self, query: &str, new_timestamp: &str, new_secret: &str) -> StoreResult<bool> {
        ensure_query(query)?;
        let template = Record::new(new_timestamp, query, new_secret)?;
        let policy = self.policy;
        let found = self.rewrite_first_match(query, |matched| {
            let label = match policy {
                MatchPolicy::Line => template.label.clone(),
                MatchPolicy::Label => codec::decode(matched).map_or_else(|| template.label.clone(), |r| r.label),
            };
            Some(codec::encode(&Record {
                label,
                ..template.clone()
            }))
        })?;
        if found {
            log::info!("Replaced first record matching '{}' in {:?}", query, self.path);
        }
        Ok(found)
    }

    /// Removes the first matching record; later records move up by one.
    pub fn delete_first_match(&self, query: &str) -> StoreResult<bool> {
        let found = self.rewrite_first_match(query, |_| None)?;
        if found {
            log::info!("Deleted first record matching '{}' from {:?}", query, self.path);
        }
        Ok(found)
    }

    /// Removes the whole store file. `Ok(false)` means there was nothing to remove.
    pub fn delete_all(&self) -> StoreResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                log::info!("Deleted store file {:?}", self.path);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("Store file {:?} does not exist, nothing to delete", self.path);
                Ok(false)
            }
            Err(e) => {
                log::error!("Failed to delete store file {:?}: {:?}", self.path, e);
                Err(StoreError::Io(e))
            }
        }
    }

    /// Copies the store into the temporary file, passing the first matching line
    /// through `transform` (`None` drops it), then renames the temporary file over
    /// the store. Without a match the store is left untouched.
    fn rewrite_first_match<F>(&self, query: &str, transform: F) -> StoreResult<bool>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        ensure_query(query)?;
        if same_location(&self.temp_path, &self.path) {
            log::error!("Temp file {:?} is the store {:?}, refusing to rewrite", self.temp_path, self.path);
            return Err(StoreError::TempIsStore(self.temp_path.clone()));
        }

        let source = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("Store file {:?} does not exist, no record to rewrite", self.path);
                return Ok(false);
            }
            Err(e) => {
                log::error!("Failed to open store {:?} for reading: {:?}", self.path, e);
                return Err(StoreError::Io(e));
            }
        };

        let temp = File::create(&self.temp_path).map_err(|e| {
            log::error!("Failed to create temp file {:?}: {:?}", self.temp_path, e);
            StoreError::Io(e)
        })?;
        let mut guard = TempFileGuard::new(&self.temp_path);

        let mut reader = BufReader::new(source);
        let mut writer = BufWriter::new(temp);
        let mut transform = Some(transform);
        let mut found = false;
        let mut raw = Vec::new();

        loop {
            raw.clear();
            if reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            if !found {
                let line = display_line(&raw);
                if codec::matches(&line, query, self.policy) {
                    found = true;
                    log::debug!("First match for '{}' found", query);
                    if let Some(replacement) = transform.take().and_then(|f| f(&line)) {
                        writer.write_all(replacement.as_bytes())?;
                    }
                    continue;
                }
            }
            writer.write_all(&raw)?;
        }

        let temp = writer.into_inner().map_err(|e| StoreError::Io(e.into_error()))?;
        temp.sync_all()?;
        drop(temp);
        drop(reader);

        if !found {
            log::info!("No record matches '{}', store left unchanged", query);
            return Ok(false);
        }

        fs::rename(&self.temp_path, &self.path).map_err(|e| {
            log::error!("Failed to move {:?} over {:?}: {:?}", self.temp_path, self.path, e);
            StoreError::Io(e)
        })?;
        guard.disarm();
        Ok(true)
    }

    fn read_raw_lines(&self) -> StoreResult<Option<Vec<Vec<u8>>>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("Store file {:?} not found, treating as empty", self.path);
                return Ok(None);
            }
            Err(e) => {
                log::error!("Failed to open store {:?}: {:?}", self.path, e);
                return Err(StoreError::Io(e));
            }
        };

        let mut reader = BufReader::new(file);
        let mut lines = Vec::new();
        loop {
            let mut raw = Vec::new();
            if reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            lines.push(raw);
        }
        Ok(Some(lines))
    }
}

/// Where the temp file named `temp_name` goes for the store at `path`.
///
/// Relative names sit in the store's directory. A name that lands on the store
/// itself is replaced by the store's file name with `.tmp` appended.
pub fn temp_path_beside(path: &Path, temp_name: &Path) -> PathBuf {
    let temp_path = match path.parent() {
        Some(dir) if !temp_name.is_absolute() => dir.join(temp_name),
        _ => temp_name.to_path_buf(),
    };
    if !same_location(&temp_path, path) {
        return temp_path;
    }
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    let fallback = path.with_file_name(name);
    log::warn!("Temp file {:?} would overwrite the store, using {:?} instead", temp_path, fallback);
    fallback
}

/// Whether two paths name the same file, comparing through the parent
/// directories when both exist.
fn same_location(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    fn resolve(path: &Path) -> Option<PathBuf> {
        let name = path.file_name()?;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        Some(fs::canonicalize(dir).ok()?.join(name))
    }
    match (resolve(a), resolve(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn ensure_query(query: &str) -> StoreResult<()> {
    if query.is_empty() {
        return Err(StoreError::EmptyQuery);
    }
    Ok(())
}

fn display_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

/// Removes the temporary file when dropped unless disarmed.
struct TempFileGuard<'a> {
    path: &'a Path,
    armed: bool,
}

impl<'a> TempFileGuard<'a> {
    fn new(path: &'a Path) -> Self {
        TempFileGuard { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempFileGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match fs::remove_file(self.path) {
            Ok(()) => log::debug!("Removed temp file {:?}", self.path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove temp file {:?}: {:?}", self.path, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn record(timestamp: &str, label: &str, secret: &str) -> Record {
        Record::new(timestamp, label, secret).unwrap()
    }

    fn store_with(records: &[Record]) -> (TempDir, RecordStore) {
        let dir = tempdir().expect("Failed to create temp dir");
        let store = RecordStore::new(dir.path().join(STORE_FILENAME));
        for r in records {
            store.append(r).expect("append failed");
        }
        (dir, store)
    }

    fn abc() -> Vec<Record> {
        vec![
            record("2024-01-01 00:00:00", "Alpha", "a1"),
            record("2024-01-02 00:00:00", "Bravo", "b2"),
            record("2024-01-03 00:00:00", "Charlie", "c3"),
        ]
    }

    #[test]
    fn test_missing_store_is_empty() {
        let (_dir, store) = store_with(&[]);
        assert!(store.list().unwrap().is_empty());
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.find_by_label_substring("Gmail").unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_append_and_list_keep_order() {
        let (_dir, store) = store_with(&abc());
        let lines = store.list().unwrap();
        assert_eq!(
            lines,
            vec![
                "[2024-01-01 00:00:00] [Alpha] a1",
                "[2024-01-02 00:00:00] [Bravo] b2",
                "[2024-01-03 00:00:00] [Charlie] c3",
            ]
        );
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_search_returns_every_match() {
        let (_dir, store) = store_with(&[
            record("2024-01-01 00:00:00", "Gmail", "one"),
            record("2024-01-02 00:00:00", "Facebook", "two"),
            record("2024-01-03 00:00:00", "Gmail work", "three"),
        ]);
        let found = store.find_by_label_substring("Gmail").unwrap();
        assert_eq!(found.len(), 2);
        assert!(found[0].ends_with("one"));
        assert!(found[1].ends_with("three"));
    }

    #[test]
    fn test_search_exact_label_round_trip() {
        let (_dir, store) = store_with(&abc());
        let found = store.find_by_label_substring("Bravo").unwrap();
        assert_eq!(found, vec!["[2024-01-02 00:00:00] [Bravo] b2"]);
    }

    #[test]
    fn test_empty_query_is_rejected() {
        let (_dir, store) = store_with(&abc());
        assert!(matches!(store.find_by_label_substring(""), Err(StoreError::EmptyQuery)));
        assert!(matches!(store.delete_first_match(""), Err(StoreError::EmptyQuery)));
        assert!(matches!(
            store.replace_first_match("", "2024-02-02 00:00:00", "x"),
            Err(StoreError::EmptyQuery)
        ));
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_replace_first_match_in_place() {
        let (_dir, store) = store_with(&abc());
        let found = store.replace_first_match("Bravo", "2024-06-01 12:00:00", "newsecret").unwrap();
        assert!(found);
        assert_eq!(
            store.list().unwrap(),
            vec![
                "[2024-01-01 00:00:00] [Alpha] a1",
                "[2024-06-01 12:00:00] [Bravo] newsecret",
                "[2024-01-03 00:00:00] [Charlie] c3",
            ]
        );
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_replace_uses_query_as_label_under_line_policy() {
        let (_dir, store) = store_with(&[record("2024-01-01 00:00:00", "Gmail personal", "old")]);
        assert!(store.replace_first_match("Gmail", "2024-06-01 12:00:00", "new").unwrap());
        assert_eq!(store.list().unwrap(), vec!["[2024-06-01 12:00:00] [Gmail] new"]);
    }

    #[test]
    fn test_replace_keeps_label_under_label_policy() {
        let (dir, _) = store_with(&[]);
        let store = RecordStore::new(dir.path().join(STORE_FILENAME)).with_match_policy(MatchPolicy::Label);
        store.append(&record("2024-01-01 00:00:00", "Gmail personal", "old")).unwrap();
        assert!(store.replace_first_match("Gmail", "2024-06-01 12:00:00", "new").unwrap());
        assert_eq!(store.list().unwrap(), vec!["[2024-06-01 12:00:00] [Gmail personal] new"]);
    }

    #[test]
    fn test_replace_without_match_leaves_file_untouched() {
        let (_dir, store) = store_with(&abc());
        let before = fs::read(store.path()).unwrap();
        let found = store.replace_first_match("Zulu", "2024-06-01 12:00:00", "x").unwrap();
        assert!(!found);
        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_replace_rejects_secret_with_newline() {
        let (_dir, store) = store_with(&abc());
        let before = fs::read(store.path()).unwrap();
        let result = store.replace_first_match("Alpha", "2024-06-01 12:00:00", "bad\nsecret");
        assert!(matches!(result, Err(StoreError::InvalidRecord(_))));
        assert_eq!(fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn test_delete_first_match_only_removes_first_duplicate() {
        let (_dir, store) = store_with(&[
            record("2024-01-01 00:00:00", "Alpha", "a1"),
            record("2024-01-02 00:00:00", "Gmail", "first"),
            record("2024-01-03 00:00:00", "Gmail", "second"),
        ]);
        assert!(store.delete_first_match("Gmail").unwrap());
        assert_eq!(
            store.list().unwrap(),
            vec!["[2024-01-01 00:00:00] [Alpha] a1", "[2024-01-03 00:00:00] [Gmail] second"]
        );
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_delete_without_match() {
        let (_dir, store) = store_with(&abc());
        let before = fs::read(store.path()).unwrap();
        assert!(!store.delete_first_match("Zulu").unwrap());
        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_rewrite_on_missing_store() {
        let (_dir, store) = store_with(&[]);
        assert!(!store.delete_first_match("Gmail").unwrap());
        assert!(!store.replace_first_match("Gmail", "2024-06-01 12:00:00", "x").unwrap());
        assert!(!store.path().exists());
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_line_policy_matches_inside_timestamp() {
        let (_dir, store) = store_with(&abc());
        // "01-02" only appears in Bravo's timestamp
        assert!(store.delete_first_match("01-02").unwrap());
        assert_eq!(store.count().unwrap(), 2);
        assert!(store.find_by_label_substring("Bravo").unwrap().is_empty());
    }

    #[test]
    fn test_label_policy_ignores_timestamp_and_secret() {
        let (dir, _) = store_with(&[]);
        let store = RecordStore::new(dir.path().join(STORE_FILENAME)).with_match_policy(MatchPolicy::Label);
        for r in abc() {
            store.append(&r).unwrap();
        }
        assert!(store.find_by_label_substring("01-02").unwrap().is_empty());
        assert!(!store.delete_first_match("b2").unwrap());
        assert!(store.delete_first_match("Brav").unwrap());
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_rewrite_preserves_untouched_bytes() {
        let (_dir, store) = store_with(&[]);
        let mut content = b"[2024-01-01 00:00:00] [Alpha] a1\n".to_vec();
        content.extend_from_slice(b"[2024-01-02 00:00:00] [Caf\xe9] \xff\xfe\r\n");
        content.extend_from_slice(b"[2024-01-03 00:00:00] [Charlie] c3");
        fs::write(store.path(), &content).unwrap();

        assert!(store.delete_first_match("Alpha").unwrap());

        let mut expected = b"[2024-01-02 00:00:00] [Caf\xe9] \xff\xfe\r\n".to_vec();
        expected.extend_from_slice(b"[2024-01-03 00:00:00] [Charlie] c3");
        assert_eq!(fs::read(store.path()).unwrap(), expected);
    }

    #[test]
    fn test_temp_file_removed_when_rewrite_fails() {
        let (dir, _) = store_with(&[]);
        // a directory opens fine but cannot be read line by line
        let store_path = dir.path().join("not_a_file");
        fs::create_dir(&store_path).unwrap();
        let store = RecordStore::new(&store_path);

        assert!(matches!(store.delete_first_match("Alpha"), Err(StoreError::Io(_))));
        assert!(!store.temp_path().exists());
        assert!(store_path.is_dir());
    }

    #[test]
    fn test_temp_file_creation_failure_is_io_error() {
        let (dir, store) = store_with(&abc());
        let store = store.with_temp_path(dir.path().join("no_such_dir").join(TEMP_FILENAME));
        let before = fs::read(store.path()).unwrap();
        assert!(matches!(store.delete_first_match("Alpha"), Err(StoreError::Io(_))));
        assert_eq!(fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn test_temp_path_equal_to_store_path_is_rejected() {
        let (dir, store) = store_with(&abc());
        let store = store.with_temp_path(dir.path().join(".").join(STORE_FILENAME));
        let before = fs::read(store.path()).unwrap();

        assert!(matches!(store.delete_first_match("Alpha"), Err(StoreError::TempIsStore(_))));
        assert!(matches!(
            store.replace_first_match("Alpha", "2024-06-01 12:00:00", "x"),
            Err(StoreError::TempIsStore(_))
        ));
        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_store_named_like_temp_file_keeps_records() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path().join(TEMP_FILENAME));
        assert_ne!(store.temp_path(), store.path());
        assert_eq!(store.temp_path(), dir.path().join("temp_passwords.txt.tmp").as_path());

        store.append(&record("2024-01-01 00:00:00", "Alpha", "a1")).unwrap();
        store.append(&record("2024-01-02 00:00:00", "Bravo", "b2")).unwrap();
        assert!(store.delete_first_match("Alpha").unwrap());
        assert_eq!(store.list().unwrap(), vec!["[2024-01-02 00:00:00] [Bravo] b2"]);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_label_policy_rejects_secret_that_looks_like_label() {
        let (dir, _) = store_with(&[]);
        let store = RecordStore::new(dir.path().join(STORE_FILENAME)).with_match_policy(MatchPolicy::Label);
        store.append(&record("2024-01-01 00:00:00", "Bank", "Gmail]z")).unwrap();
        let before = fs::read(store.path()).unwrap();

        assert!(store.find_by_label_substring("Gmail").unwrap().is_empty());
        assert!(matches!(
            store.replace_first_match("Bank", "2024-06-01 00:00:00", "Gmail] new"),
            Err(StoreError::InvalidRecord(_))
        ));
        assert_eq!(fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn test_delete_all() {
        let (_dir, store) = store_with(&abc());
        assert!(store.delete_all().unwrap());
        assert!(!store.path().exists());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_delete_all_on_absent_store() {
        let (_dir, store) = store_with(&[]);
        assert!(!store.delete_all().unwrap());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_gmail_end_to_end() {
        let (_dir, store) = store_with(&[]);
        store.append(&record("2024-01-01 00:00:00", "Gmail", "abc123")).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.find_by_label_substring("Gmail").unwrap().len(), 1);
        assert!(store.delete_first_match("Gmail").unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }
}
