//! Dry-run overlay gateway
//!
//! Wraps a real destination session and absorbs its mutating calls
//! (`create_folder`, `append`) into an in-memory shadow. Read calls
//! consult the shadow first, then the wrapped session, so the decision
//! logic sees exactly the state a real run would have produced while
//! the underlying store is never touched.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use super::traits::{
    ConnectionGateway, EndpointCapabilities, FolderHandle, GatewayError, GatewayResult,
};
use crate::models::{Folder, FolderPath, MessageMeta, MessageRef};

/// Shadow uids start above any plausible real uid so `fetch_content`
/// can route a ref back to the overlay.
const SHADOW_UID_BASE: u32 = 0x8000_0000;

struct ShadowMessage {
    uid: u32,
    content: Vec<u8>,
    flags: Vec<String>,
    internal_date: DateTime<Utc>,
}

pub struct DryRunGateway<'a> {
    inner: &'a mut dyn ConnectionGateway,
    created: BTreeSet<FolderPath>,
    appended: BTreeMap<FolderPath, Vec<ShadowMessage>>,
    next_uid: u32,
}

impl<'a> DryRunGateway<'a> {
    pub fn new(inner: &'a mut dyn ConnectionGateway) -> Self {
        Self {
            inner,
            created: BTreeSet::new(),
            appended: BTreeMap::new(),
            next_uid: SHADOW_UID_BASE,
        }
    }

    /// Folders the simulated run would have created.
    pub fn simulated_folders(&self) -> Vec<FolderPath> {
        self.created.iter().cloned().collect()
    }

    /// Number of messages the simulated run would have appended.
    pub fn simulated_appends(&self) -> usize {
        self.appended.values().map(|v| v.len()).sum()
    }

    fn shadow_only(&self, path: &FolderPath) -> bool {
        self.created.contains(path)
    }
}

impl ConnectionGateway for DryRunGateway<'_> {
    fn capabilities(&self) -> EndpointCapabilities {
        self.inner.capabilities()
    }

    fn set_operation_timeout(&mut self, timeout: Duration) {
        self.inner.set_operation_timeout(timeout);
    }

    fn list_folders(
        &mut self,
        root: &FolderPath,
        subscribed_only: bool,
    ) -> GatewayResult<Vec<Folder>> {
        let mut folders = self.inner.list_folders(root, subscribed_only)?;
        for path in &self.created {
            if path.starts_with(root) && !folders.iter().any(|f| &f.path == path) {
                folders.push(Folder {
                    path: path.clone(),
                    subscribed: true,
                    message_count: Some(
                        self.appended.get(path).map(|m| m.len()).unwrap_or(0),
                    ),
                });
            }
        }
        folders.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(folders)
    }

    fn folder_exists(&mut self, path: &FolderPath) -> GatewayResult<bool> {
        if self.created.contains(path) {
            return Ok(true);
        }
        self.inner.folder_exists(path)
    }

    fn create_folder(&mut self, path: &FolderPath) -> GatewayResult<()> {
        for ancestor in path.ancestors() {
            if !self.inner.folder_exists(&ancestor)? {
                self.created.insert(ancestor);
            }
        }
        self.created.insert(path.clone());
        Ok(())
    }

    fn select_folder(&mut self, path: &FolderPath) -> GatewayResult<FolderHandle> {
        if self.shadow_only(path) {
            return Ok(FolderHandle { path: path.clone() });
        }
        self.inner.select_folder(path)
    }

    fn enumerate_messages(&mut self, folder: &FolderHandle) -> GatewayResult<Vec<MessageMeta>> {
        let mut metas = if self.shadow_only(&folder.path) {
            Vec::new()
        } else {
            self.inner.enumerate_messages(folder)?
        };
        if let Some(shadow) = self.appended.get(&folder.path) {
            metas.extend(shadow.iter().map(|m| {
                MessageMeta::new(MessageRef::new(m.uid), m.content.len(), m.internal_date)
                    .with_flags(m.flags.clone())
            }));
        }
        Ok(metas)
    }

    fn fetch_content(
        &mut self,
        folder: &FolderHandle,
        message: &MessageRef,
    ) -> GatewayResult<Vec<u8>> {
        if message.uid() >= SHADOW_UID_BASE {
            return self
                .appended
                .get(&folder.path)
                .and_then(|msgs| msgs.iter().find(|m| m.uid == message.uid()))
                .map(|m| m.content.clone())
                .ok_or_else(|| {
                    GatewayError::NotFound(format!(
                        "simulated message {} not in {}",
                        message.uid(),
                        folder.path
                    ))
                });
        }
        self.inner.fetch_content(folder, message)
    }

    fn append(
        &mut self,
        folder: &FolderHandle,
        content: &[u8],
        flags: &[String],
        internal_date: DateTime<Utc>,
    ) -> GatewayResult<MessageRef> {
        let uid = self.next_uid;
        self.next_uid += 1;
        self.appended
            .entry(folder.path.clone())
            .or_default()
            .push(ShadowMessage {
                uid,
                content: content.to_vec(),
                flags: flags.to_vec(),
                internal_date,
            });
        Ok(MessageRef::new(uid))
    }
}
