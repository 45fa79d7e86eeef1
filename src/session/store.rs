use crate::api::Admin;
use anyhow::Context;
use log::warn;
use std::collections::BTreeMap;
use std::fs::{create_dir_all, OpenOptions};
use std::io::Read;
use std::path::Path;

pub const TOKEN_KEY: &str = "adminToken";
pub const ADMIN_KEY: &str = "adminInfo";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredSession {
    pub token: Option<String>,
    pub admin: Option<Admin>,
}

#[cfg_attr(test, mockall::automock)]
pub trait SessionStore {
    fn load(&mut self) -> anyhow::Result<StoredSession>;
    fn save(&mut self, token: &str, admin: &Admin) -> anyhow::Result<()>;
    fn clear(&mut self) -> anyhow::Result<()>;
}

type Entries = BTreeMap<String, String>;

fn read_entries<P: AsRef<Path>>(path: P) -> anyhow::Result<Entries> {
    if !path.as_ref().exists() {
        return Ok(Entries::default());
    }
    let mut file = OpenOptions::new()
        .read(true)
        .open(path.as_ref())
        .context("Failed to open session file")?;
    let mut file_content = String::new();
    file.read_to_string(&mut file_content)
        .context("Failed to read from session file")?;
    if file_content.trim().is_empty() {
        return Ok(Entries::default());
    }
    // Unparseable content is replaced on the next save or clear.
    Ok(serde_json::from_str(&file_content).unwrap_or_else(|e| {
        warn!("Ignoring unreadable session file {}: {e}", path.as_ref().display());
        Entries::default()
    }))
}

fn write_entries<P: AsRef<Path>>(path: P, entries: &Entries) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        create_dir_all(parent).context("Failed to create parent directories")?;
    }
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .context("Failed to open session file")?;
    serde_json::to_writer_pretty(file, entries).context("Failed to write session file")?;
    Ok(())
}

/// Two string entries in a JSON file: the bearer token and the serialized admin.
#[derive(Debug, Clone)]
pub struct SessionFile<P>(pub P);

impl<P: AsRef<Path>> SessionStore for SessionFile<P> {
    fn load(&mut self) -> anyhow::Result<StoredSession> {
        let mut entries = read_entries(self.0.as_ref())?;
        let token = entries.get(TOKEN_KEY).filter(|t| !t.is_empty()).cloned();
        let admin = match entries.get(ADMIN_KEY) {
            None => None,
            Some(raw) => match serde_json::from_str::<Admin>(raw) {
                Ok(admin) => Some(admin),
                Err(e) => {
                    warn!("Discarding unreadable stored admin: {e}");
                    entries.remove(ADMIN_KEY);
                    write_entries(self.0.as_ref(), &entries)?;
                    None
                }
            },
        };
        Ok(StoredSession { token, admin })
    }

    fn save(&mut self, token: &str, admin: &Admin) -> anyhow::Result<()> {
        let mut entries = read_entries(self.0.as_ref()).unwrap_or_default();
        entries.insert(TOKEN_KEY.to_string(), token.to_string());
        entries.insert(
            ADMIN_KEY.to_string(),
            serde_json::to_string(admin).context("Failed to serialize admin")?,
        );
        write_entries(self.0.as_ref(), &entries)
    }

    fn clear(&mut self) -> anyhow::Result<()> {
        let mut entries = read_entries(self.0.as_ref()).unwrap_or_default();
        entries.remove(TOKEN_KEY);
        entries.remove(ADMIN_KEY);
        write_entries(self.0.as_ref(), &entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_file_is_an_empty_session() {
        let mut store = SessionFile(Path::new("/does/not/exist/session.json"));
        assert_eq!(store.load().unwrap(), StoredSession::default());
    }

    #[test]
    fn save_then_load() {
        let file = NamedTempFile::new().unwrap();
        let mut store = SessionFile(file.path());
        store.save("tok-1", &Admin::with_email("root@example.com")).unwrap();

        let session = store.load().unwrap();
        assert_eq!(session.token.as_deref(), Some("tok-1"));
        assert_eq!(session.admin, Some(Admin::with_email("root@example.com")));
    }

    #[test]
    fn entries_are_plain_strings() {
        let file = NamedTempFile::new().unwrap();
        let mut store = SessionFile(file.path());
        store.save("tok-1", &Admin::with_email("root@example.com")).unwrap();

        let entries: Entries = serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(entries.get(TOKEN_KEY).map(String::as_str), Some("tok-1"));
        assert_eq!(
            entries.get(ADMIN_KEY).map(String::as_str),
            Some("{\"email\":\"root@example.com\"}")
        );
    }

    #[test]
    fn corrupt_admin_entry_is_dropped() {
        let file = file_with("{\"adminToken\": \"tok\", \"adminInfo\": \"{not json\"}");
        let mut store = SessionFile(file.path());

        let session = store.load().unwrap();
        assert_eq!(session.token.as_deref(), Some("tok"));
        assert!(session.admin.is_none());

        let entries: Entries = serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert!(!entries.contains_key(ADMIN_KEY));
    }

    #[test]
    fn malformed_file_is_an_empty_session_until_next_save() {
        let file = file_with("{\"adminToken\": ");
        let mut store = SessionFile(file.path());
        assert_eq!(store.load().unwrap(), StoredSession::default());

        store.save("tok-2", &Admin::with_email("root@example.com")).unwrap();
        assert_eq!(store.load().unwrap().token.as_deref(), Some("tok-2"));
    }

    #[test]
    fn clear_removes_both_entries_only() {
        let file = file_with("{\"adminToken\": \"tok\", \"adminInfo\": \"{}\", \"theme\": \"dark\"}");
        let mut store = SessionFile(file.path());
        store.clear().unwrap();

        let entries: Entries = serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(store.load().unwrap(), StoredSession::default());
    }
}
