//! Fixtures wiring devices, storage and syncer together.

use crate::server::{DeviceSession, InMemoryServer};
use sealfs_client::{LocalStorage, MemoryStorage, Syncer, SyncerConfig};
use sealfs_types::{
    DeviceId, EntryId, LocalFolderManifest, ManifestAccess, SigningKey, Timestamp,
};
use std::sync::Arc;

/// A device with a keypair registered in the server's directory.
pub struct TestDevice {
    /// The device's identity.
    pub device_id: DeviceId,
    /// The device's signing key.
    pub signing_key: SigningKey,
}

impl TestDevice {
    /// Creates a device and registers its verification key.
    pub fn register(server: &InMemoryServer, name: &str) -> Self {
        let signing_key = SigningKey::generate();
        let device_id = DeviceId::new(name);
        server.register_device(device_id.clone(), signing_key.verify_key());
        Self {
            device_id,
            signing_key,
        }
    }
}

/// A fully wired client: device, local storage and syncer over one session.
pub struct TestClient {
    /// The client's device.
    pub device: TestDevice,
    /// The client's local cache.
    pub storage: Arc<MemoryStorage>,
    /// The syncer under test.
    pub syncer: Syncer<DeviceSession, DeviceSession, DeviceSession, MemoryStorage>,
}

impl TestClient {
    /// Seeds a placeholder folder into the local cache and returns its
    /// access.
    pub fn create_placeholder_folder(&self) -> ManifestAccess {
        let access = ManifestAccess::generate();
        let manifest = LocalFolderManifest::new_placeholder(
            access.id,
            self.device.device_id.clone(),
            Timestamp::now(),
        );
        self.storage.set_manifest(access.id, manifest.into());
        access
    }

    /// Seeds a placeholder folder under a fixed entry id.
    ///
    /// Used when two clients must contend on the same entry: both seed the
    /// same id and key, as if the access had been shared through a parent
    /// folder.
    pub fn adopt_placeholder_folder(&self, access: &ManifestAccess) {
        let manifest = LocalFolderManifest::new_placeholder(
            access.id,
            self.device.device_id.clone(),
            Timestamp::now(),
        );
        self.storage.set_manifest(access.id, manifest.into());
    }

    /// Returns the local folder manifest of an entry.
    ///
    /// # Panics
    ///
    /// Panics if the entry is missing or not a folder.
    #[must_use]
    pub fn folder(&self, id: EntryId) -> LocalFolderManifest {
        match self.storage.get_manifest(id).expect("entry in cache") {
            sealfs_types::LocalManifest::Folder(folder) => folder,
            sealfs_types::LocalManifest::File(_) => panic!("expected folder"),
        }
    }
}

/// Wires a client onto a server: registers a device, opens a session, and
/// builds a syncer over an empty in-memory cache.
pub fn wired_client(server: &Arc<InMemoryServer>, name: &str) -> TestClient {
    let device = TestDevice::register(server, name);
    let session = server.session(device.device_id.clone());
    let storage = Arc::new(MemoryStorage::new());
    let syncer = Syncer::new(
        SyncerConfig::new(device.device_id.clone()),
        device.signing_key.clone(),
        Arc::clone(&session),
        Arc::clone(&session),
        Arc::clone(&session),
        Arc::clone(&storage),
    );
    TestClient {
        device,
        storage,
        syncer,
    }
}
