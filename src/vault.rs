//! Encrypted persistent mapping vault.
//!
//! A SQLite store binding `(column, seed, original) → anonymized`.
//! Lookup is keyed by a deterministic salted fingerprint
//! (`SHA-256("<seed>:<column>:<original>")`); both values are held only
//! as AES-256-GCM ciphertexts with a random nonce per message, so equal
//! plaintexts never produce equal blobs and nothing legible ever reaches
//! disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::detect::DataType;
use crate::error::{Error, Result};

/// Version tag recorded with every stored mapping.
pub const RULE_VERSION: &str = "1.0";

const PBKDF2_ROUNDS: u32 = 100_000;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS mappings (
    hash_key TEXT PRIMARY KEY,
    original_value TEXT,
    anonymized_value TEXT,
    data_type TEXT,
    column_name TEXT,
    rule_version TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_column_type ON mappings(column_name, data_type);
CREATE TABLE IF NOT EXISTS vault_meta (
    key TEXT PRIMARY KEY,
    value TEXT
);
";

pub struct MappingVault {
    path: PathBuf,
    conn: Mutex<Connection>,
    key: Mutex<[u8; 32]>,
}

/// On-disk key backup: `{ "encryption_key": "<base64>", "vault_path": "..." }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyFile {
    pub encryption_key: String,
    pub vault_path: String,
}

#[derive(Debug, Serialize)]
pub struct VaultStatistics {
    pub total: u64,
    pub per_type: BTreeMap<String, u64>,
    pub per_column: BTreeMap<String, u64>,
    /// Columns where collision retries were exhausted at least once.
    pub weak_uniqueness: Vec<String>,
}

impl MappingVault {
    /// Create or open a vault at `path`.
    ///
    /// With a password, the key is derived via PBKDF2-HMAC-SHA256
    /// (100 000 iterations) over a random per-vault salt persisted in
    /// `vault_meta`. Without one, a random key is generated; it must be
    /// exported with [`MappingVault::export_key`] or the vault contents
    /// are unrecoverable after the process exits.
    pub fn open(path: &Path, password: Option<&str>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;

        let key = match password {
            Some(password) => {
                let salt = load_or_create_salt(&conn)?;
                let mut key = [0u8; 32];
                pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ROUNDS, &mut key);
                key
            }
            None => {
                let mut key = [0u8; 32];
                OsRng.fill_bytes(&mut key);
                key
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
            key: Mutex::new(key),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::VaultUnavailable("vault lock poisoned".to_string()))
    }

    fn current_key(&self) -> Result<[u8; 32]> {
        self.key
            .lock()
            .map(|k| *k)
            .map_err(|_| Error::VaultUnavailable("vault key lock poisoned".to_string()))
    }

    /// Deterministic lookup fingerprint. The seed is rendered as the
    /// empty string when absent.
    pub fn hash_key(original: &str, column: &str, seed: Option<&str>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(seed.unwrap_or("").as_bytes());
        hasher.update(b":");
        hasher.update(column.as_bytes());
        hasher.update(b":");
        hasher.update(original.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn encrypt(&self, plaintext: &str) -> Result<String> {
        let key = self.current_key()?;
        let cipher =
            Aes256Gcm::new_from_slice(&key).map_err(|_| Error::CryptoKeyMismatch)?;
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| Error::CryptoKeyMismatch)?;
        let mut blob = nonce.to_vec();
        blob.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(blob))
    }

    fn decrypt(&self, blob: &str) -> Result<String> {
        let bytes = BASE64.decode(blob).map_err(|_| Error::CryptoKeyMismatch)?;
        if bytes.len() <= NONCE_LEN {
            return Err(Error::CryptoKeyMismatch);
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let key = self.current_key()?;
        let cipher =
            Aes256Gcm::new_from_slice(&key).map_err(|_| Error::CryptoKeyMismatch)?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| Error::CryptoKeyMismatch)?;
        String::from_utf8(plaintext).map_err(|_| Error::CryptoKeyMismatch)
    }

    /// Upsert a mapping. Idempotent on the fingerprint: storing a second
    /// anonymized value for the same original replaces the first.
    pub fn store(
        &self,
        original: &str,
        anonymized: &str,
        data_type: DataType,
        column: &str,
        rule_version: &str,
        seed: Option<&str>,
    ) -> Result<()> {
        let hash_key = Self::hash_key(original, column, seed);
        let enc_original = self.encrypt(original)?;
        let enc_anonymized = self.encrypt(anonymized)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO mappings
             (hash_key, original_value, anonymized_value, data_type, column_name, rule_version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                hash_key,
                enc_original,
                enc_anonymized,
                data_type.to_string(),
                column,
                rule_version
            ],
        )?;
        Ok(())
    }

    /// Forward lookup. Returns `None` on a miss, and also when the row
    /// cannot be decrypted with the in-memory key.
    pub fn lookup(&self, original: &str, column: &str, seed: Option<&str>) -> Result<Option<String>> {
        let hash_key = Self::hash_key(original, column, seed);
        let blob: Option<String> = {
            let conn = self.conn()?;
            conn.query_row(
                "SELECT anonymized_value FROM mappings WHERE hash_key = ?1",
                params![hash_key],
                |row| row.get(0),
            )
            .optional()?
        };
        match blob {
            Some(blob) => match self.decrypt(&blob) {
                Ok(value) => Ok(Some(value)),
                Err(Error::CryptoKeyMismatch) => Ok(None),
                Err(e) => Err(e),
            },
            None => Ok(None),
        }
    }

    /// Reverse lookup: scan the column, decrypting each row, and return
    /// the original whose anonymized value matches. O(column size).
    pub fn reverse(
        &self,
        anonymized: &str,
        column: &str,
        _seed: Option<&str>,
    ) -> Result<Option<String>> {
        let rows: Vec<(String, String)> = {
            let conn = self.conn()?;
            let mut stmt = conn.prepare(
                "SELECT original_value, anonymized_value FROM mappings WHERE column_name = ?1",
            )?;
            let mapped = stmt
                .query_map(params![column], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<std::result::Result<_, _>>()?;
            mapped
        };
        for (enc_original, enc_anonymized) in rows {
            let decrypted = match self.decrypt(&enc_anonymized) {
                Ok(v) => v,
                Err(Error::CryptoKeyMismatch) => continue,
                Err(e) => return Err(e),
            };
            if decrypted == anonymized {
                return match self.decrypt(&enc_original) {
                    Ok(v) => Ok(Some(v)),
                    Err(Error::CryptoKeyMismatch) => Ok(None),
                    Err(e) => Err(e),
                };
            }
        }
        Ok(None)
    }

    /// Whether `candidate` is already taken by a *different* original in
    /// this column.
    pub fn check_collision(
        &self,
        candidate: &str,
        original: &str,
        column: &str,
        seed: Option<&str>,
    ) -> Result<bool> {
        let own_key = Self::hash_key(original, column, seed);
        let conn = self.conn()?;
        self.collision_locked(&conn, candidate, &own_key, column)
    }

    fn collision_locked(
        &self,
        conn: &Connection,
        candidate: &str,
        own_hash_key: &str,
        column: &str,
    ) -> Result<bool> {
        let mut stmt = conn.prepare(
            "SELECT hash_key, anonymized_value FROM mappings WHERE column_name = ?1",
        )?;
        let rows: Vec<(String, String)> = stmt
            .query_map(params![column], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<_, _>>()?;
        for (hash_key, enc_anonymized) in rows {
            if hash_key == own_hash_key {
                continue;
            }
            match self.decrypt(&enc_anonymized) {
                Ok(v) if v == candidate => return Ok(true),
                Ok(_) => {}
                Err(Error::CryptoKeyMismatch) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(false)
    }

    /// Collision probe and upsert under a single lock scope, so two
    /// engines sharing this vault cannot both claim one candidate.
    /// Returns `false` (and stores nothing) on a collision.
    pub fn store_unique(
        &self,
        original: &str,
        anonymized: &str,
        data_type: DataType,
        column: &str,
        rule_version: &str,
        seed: Option<&str>,
    ) -> Result<bool> {
        let hash_key = Self::hash_key(original, column, seed);
        let enc_original = self.encrypt(original)?;
        let enc_anonymized = self.encrypt(anonymized)?;
        let conn = self.conn()?;
        if self.collision_locked(&conn, anonymized, &hash_key, column)? {
            return Ok(false);
        }
        conn.execute(
            "INSERT OR REPLACE INTO mappings
             (hash_key, original_value, anonymized_value, data_type, column_name, rule_version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                hash_key,
                enc_original,
                enc_anonymized,
                data_type.to_string(),
                column,
                rule_version
            ],
        )?;
        Ok(true)
    }

    /// Record that collision retries were exhausted for a column.
    pub fn mark_weak_uniqueness(&self, column: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO vault_meta (key, value) VALUES (?1, '1')",
            params![format!("weak:{}", column)],
        )?;
        Ok(())
    }

    /// Write the in-memory key to a JSON file for backup or recovery.
    pub fn export_key(&self, export_path: &Path) -> Result<()> {
        let key = self.current_key()?;
        let vault_path = fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone());
        let key_file = KeyFile {
            encryption_key: BASE64.encode(key),
            vault_path: vault_path.to_string_lossy().into_owned(),
        };
        let json = serde_json::to_string_pretty(&key_file)
            .map_err(|e| Error::KeyFile(e.to_string()))?;
        fs::write(export_path, json)?;
        Ok(())
    }

    /// Replace the in-memory key from a previously exported key file.
    pub fn load_key(&self, key_path: &Path) -> Result<()> {
        let contents = fs::read_to_string(key_path)?;
        let key_file: KeyFile =
            serde_json::from_str(&contents).map_err(|e| Error::KeyFile(e.to_string()))?;
        let bytes = BASE64
            .decode(&key_file.encryption_key)
            .map_err(|e| Error::KeyFile(e.to_string()))?;
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::KeyFile("encryption key must be 32 bytes".to_string()))?;
        let mut guard = self
            .key
            .lock()
            .map_err(|_| Error::VaultUnavailable("vault key lock poisoned".to_string()))?;
        *guard = key;
        Ok(())
    }

    pub fn statistics(&self) -> Result<VaultStatistics> {
        let conn = self.conn()?;
        let total: u64 = conn.query_row("SELECT COUNT(*) FROM mappings", [], |row| row.get(0))?;

        let mut per_type = BTreeMap::new();
        let mut stmt =
            conn.prepare("SELECT data_type, COUNT(*) FROM mappings GROUP BY data_type")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?)))?;
        for row in rows {
            let (data_type, count) = row?;
            per_type.insert(data_type, count);
        }

        let mut per_column = BTreeMap::new();
        let mut stmt =
            conn.prepare("SELECT column_name, COUNT(*) FROM mappings GROUP BY column_name")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?)))?;
        for row in rows {
            let (column, count) = row?;
            per_column.insert(column, count);
        }

        let mut weak_uniqueness = Vec::new();
        let mut stmt =
            conn.prepare("SELECT key FROM vault_meta WHERE key LIKE 'weak:%' ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        for row in rows {
            let key = row?;
            weak_uniqueness.push(key.trim_start_matches("weak:").to_string());
        }

        Ok(VaultStatistics {
            total,
            per_type,
            per_column,
            weak_uniqueness,
        })
    }
}

fn load_or_create_salt(conn: &Connection) -> Result<[u8; SALT_LEN]> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT value FROM vault_meta WHERE key = 'kdf_salt'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(encoded) = existing {
        let bytes = hex::decode(&encoded)
            .map_err(|_| Error::VaultUnavailable("corrupt kdf salt".to_string()))?;
        return bytes
            .try_into()
            .map_err(|_| Error::VaultUnavailable("corrupt kdf salt".to_string()));
    }
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    conn.execute(
        "INSERT INTO vault_meta (key, value) VALUES ('kdf_salt', ?1)",
        params![hex::encode(salt)],
    )?;
    Ok(salt)
}
