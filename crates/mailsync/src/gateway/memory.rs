//! In-memory gateway implementation
//!
//! A complete mailbox store held in memory. Used as the test double for
//! the synchronization engine and as a stub endpoint before a real
//! transport is wired in. Scripted fault queues let tests drive the
//! retry and abort paths deterministically.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use super::traits::{
    ConnectionGateway, EndpointCapabilities, FolderHandle, GatewayError, GatewayResult,
};
use crate::models::{Folder, FolderPath, MessageMeta, MessageRef};

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredMessage {
    uid: u32,
    content: Vec<u8>,
    flags: Vec<String>,
    internal_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct MailboxFolder {
    subscribed: bool,
    next_uid: u32,
    messages: Vec<StoredMessage>,
}

impl MailboxFolder {
    fn new(subscribed: bool) -> Self {
        Self {
            subscribed,
            next_uid: 1,
            messages: Vec::new(),
        }
    }
}

/// Scripted errors consumed once per matching operation, oldest first.
#[derive(Debug, Default)]
struct FaultPlan {
    list: VecDeque<GatewayError>,
    fetch: VecDeque<GatewayError>,
    append: VecDeque<GatewayError>,
}

pub struct InMemoryGateway {
    folders: BTreeMap<FolderPath, MailboxFolder>,
    capabilities: EndpointCapabilities,
    operation_timeout: Duration,
    faults: FaultPlan,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self {
            folders: BTreeMap::new(),
            capabilities: EndpointCapabilities::default(),
            operation_timeout: Duration::from_secs(30),
            faults: FaultPlan::default(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: EndpointCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Add an empty folder. Missing ancestors are created as well.
    pub fn add_folder(&mut self, path: &str, subscribed: bool) {
        let path = FolderPath::parse(path);
        for ancestor in path.ancestors().collect::<Vec<_>>().into_iter().rev() {
            self.folders
                .entry(ancestor)
                .or_insert_with(|| MailboxFolder::new(subscribed));
        }
        self.folders
            .entry(path)
            .or_insert_with(|| MailboxFolder::new(subscribed));
    }

    /// Store a message, creating the folder if needed. Returns the
    /// assigned uid.
    pub fn add_message(
        &mut self,
        path: &str,
        content: &[u8],
        flags: &[&str],
        internal_date: DateTime<Utc>,
    ) -> u32 {
        self.add_folder(path, true);
        let folder = self
            .folders
            .get_mut(&FolderPath::parse(path))
            .expect("folder just created");
        let uid = folder.next_uid;
        folder.next_uid += 1;
        folder.messages.push(StoredMessage {
            uid,
            content: content.to_vec(),
            flags: flags.iter().map(|f| f.to_string()).collect(),
            internal_date,
        });
        uid
    }

    /// Queue an error for the next `enumerate_messages`/`list_folders`.
    pub fn fail_next_list(&mut self, error: GatewayError) {
        self.faults.list.push_back(error);
    }

    /// Queue an error for the next `fetch_content`.
    pub fn fail_next_fetch(&mut self, error: GatewayError) {
        self.faults.fetch.push_back(error);
    }

    /// Queue an error for the next `append`.
    pub fn fail_next_append(&mut self, error: GatewayError) {
        self.faults.append.push_back(error);
    }

    pub fn folder_paths(&self) -> Vec<FolderPath> {
        self.folders.keys().cloned().collect()
    }

    pub fn message_count(&self, path: &str) -> usize {
        self.folders
            .get(&FolderPath::parse(path))
            .map(|f| f.messages.len())
            .unwrap_or(0)
    }

    /// Full observable store state: folder path to (content, flags)
    /// pairs. Lets tests assert a dry run left the store untouched.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<(Vec<u8>, Vec<String>)>> {
        self.folders
            .iter()
            .map(|(path, folder)| {
                let messages = folder
                    .messages
                    .iter()
                    .map(|m| (m.content.clone(), m.flags.clone()))
                    .collect();
                (path.to_string(), messages)
            })
            .collect()
    }

    fn folder(&self, path: &FolderPath) -> GatewayResult<&MailboxFolder> {
        self.folders
            .get(path)
            .ok_or_else(|| GatewayError::NotFound(format!("no such folder: {path}")))
    }
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionGateway for InMemoryGateway {
    fn capabilities(&self) -> EndpointCapabilities {
        self.capabilities
    }

    fn set_operation_timeout(&mut self, timeout: Duration) {
        self.operation_timeout = timeout;
    }

    fn list_folders(
        &mut self,
        root: &FolderPath,
        subscribed_only: bool,
    ) -> GatewayResult<Vec<Folder>> {
        if let Some(err) = self.faults.list.pop_front() {
            return Err(err);
        }
        Ok(self
            .folders
            .iter()
            .filter(|(path, folder)| {
                path.starts_with(root) && !path.is_root() && (!subscribed_only || folder.subscribed)
            })
            .map(|(path, folder)| Folder {
                path: path.clone(),
                subscribed: folder.subscribed,
                message_count: Some(folder.messages.len()),
            })
            .collect())
    }

    fn folder_exists(&mut self, path: &FolderPath) -> GatewayResult<bool> {
        Ok(self.folders.contains_key(path))
    }

    fn create_folder(&mut self, path: &FolderPath) -> GatewayResult<()> {
        if !self.capabilities.create_folders {
            return Err(GatewayError::PermissionDenied(
                "store does not support folder creation".to_string(),
            ));
        }
        for ancestor in path.ancestors().collect::<Vec<_>>().into_iter().rev() {
            self.folders
                .entry(ancestor)
                .or_insert_with(|| MailboxFolder::new(true));
        }
        self.folders
            .entry(path.clone())
            .or_insert_with(|| MailboxFolder::new(true));
        Ok(())
    }

    fn select_folder(&mut self, path: &FolderPath) -> GatewayResult<FolderHandle> {
        self.folder(path)?;
        Ok(FolderHandle { path: path.clone() })
    }

    fn enumerate_messages(&mut self, folder: &FolderHandle) -> GatewayResult<Vec<MessageMeta>> {
        if let Some(err) = self.faults.list.pop_front() {
            return Err(err);
        }
        Ok(self
            .folder(&folder.path)?
            .messages
            .iter()
            .map(|m| {
                MessageMeta::new(MessageRef::new(m.uid), m.content.len(), m.internal_date)
                    .with_flags(m.flags.clone())
            })
            .collect())
    }

    fn fetch_content(
        &mut self,
        folder: &FolderHandle,
        message: &MessageRef,
    ) -> GatewayResult<Vec<u8>> {
        if let Some(err) = self.faults.fetch.pop_front() {
            return Err(err);
        }
        self.folder(&folder.path)?
            .messages
            .iter()
            .find(|m| m.uid == message.uid())
            .map(|m| m.content.clone())
            .ok_or_else(|| {
                GatewayError::NotFound(format!(
                    "message {} gone from {}",
                    message.uid(),
                    folder.path
                ))
            })
    }

    fn append(
        &mut self,
        folder: &FolderHandle,
        content: &[u8],
        flags: &[String],
        internal_date: DateTime<Utc>,
    ) -> GatewayResult<MessageRef> {
        if let Some(err) = self.faults.append.pop_front() {
            return Err(err);
        }
        let mailbox = self
            .folders
            .get_mut(&folder.path)
            .ok_or_else(|| GatewayError::NotFound(format!("no such folder: {}", folder.path)))?;
        let uid = mailbox.next_uid;
        mailbox.next_uid += 1;
        mailbox.messages.push(StoredMessage {
            uid,
            content: content.to_vec(),
            flags: flags.to_vec(),
            internal_date,
        });
        Ok(MessageRef::new(uid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(ts: i64) -> DateTime<Utc> {
        chrono::TimeZone::timestamp_opt(&Utc, ts, 0).unwrap()
    }

    #[test]
    fn test_add_and_list_folders() {
        let mut gw = InMemoryGateway::new();
        gw.add_folder("INBOX", true);
        gw.add_folder("Lists/rust", false);

        let all = gw.list_folders(&FolderPath::root(), false).unwrap();
        let names: Vec<String> = all.iter().map(|f| f.path.to_string()).collect();
        assert_eq!(names, vec!["INBOX", "Lists", "Lists/rust"]);

        let subscribed = gw.list_folders(&FolderPath::root(), true).unwrap();
        assert!(subscribed.iter().all(|f| f.subscribed));
    }

    #[test]
    fn test_list_folders_scoped_to_root() {
        let mut gw = InMemoryGateway::new();
        gw.add_folder("INBOX/Sub", true);
        gw.add_folder("Archive", true);

        let under_inbox = gw.list_folders(&FolderPath::parse("INBOX"), false).unwrap();
        let names: Vec<String> = under_inbox.iter().map(|f| f.path.to_string()).collect();
        assert_eq!(names, vec!["INBOX", "INBOX/Sub"]);
    }

    #[test]
    fn test_append_and_fetch_round_trip() {
        let mut gw = InMemoryGateway::new();
        gw.add_folder("INBOX", true);
        let handle = gw.select_folder(&FolderPath::parse("INBOX")).unwrap();

        let flags = vec!["\\Seen".to_string()];
        let uid = gw.append(&handle, b"hello", &flags, date(1_700_000_000)).unwrap();

        let metas = gw.enumerate_messages(&handle).unwrap();
        assert_eq!(metas.len(), 1);
        assert_eq!(metas[0].size, 5);
        assert_eq!(metas[0].flags, flags);

        assert_eq!(gw.fetch_content(&handle, &uid).unwrap(), b"hello");
    }

    #[test]
    fn test_select_missing_folder() {
        let mut gw = InMemoryGateway::new();
        let err = gw.select_folder(&FolderPath::parse("Nope")).unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[test]
    fn test_fetch_missing_message() {
        let mut gw = InMemoryGateway::new();
        gw.add_folder("INBOX", true);
        let handle = gw.select_folder(&FolderPath::parse("INBOX")).unwrap();
        let err = gw.fetch_content(&handle, &MessageRef::new(99)).unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[test]
    fn test_create_folder_makes_ancestors() {
        let mut gw = InMemoryGateway::new();
        gw.create_folder(&FolderPath::parse("a/b/c")).unwrap();
        assert!(gw.folder_exists(&FolderPath::parse("a")).unwrap());
        assert!(gw.folder_exists(&FolderPath::parse("a/b")).unwrap());
        assert!(gw.folder_exists(&FolderPath::parse("a/b/c")).unwrap());
    }

    #[test]
    fn test_create_folder_denied_without_capability() {
        let mut gw = InMemoryGateway::new().with_capabilities(EndpointCapabilities {
            create_folders: false,
            ..Default::default()
        });
        let err = gw.create_folder(&FolderPath::parse("New")).unwrap_err();
        assert!(matches!(err, GatewayError::PermissionDenied(_)));
    }

    #[test]
    fn test_fault_injection_consumed_in_order() {
        let mut gw = InMemoryGateway::new();
        gw.add_message("INBOX", b"msg", &[], date(1_700_000_000));
        let handle = gw.select_folder(&FolderPath::parse("INBOX")).unwrap();

        gw.fail_next_fetch(GatewayError::Transient("flaky".into()));
        assert!(gw.fetch_content(&handle, &MessageRef::new(1)).is_err());
        // Queue drained; next call succeeds.
        assert_eq!(gw.fetch_content(&handle, &MessageRef::new(1)).unwrap(), b"msg");
    }
}
