//! The versioned register
//!
//! Owns the storage adapter, the secondary indexes, the audit log and the
//! per-id lock table. Adapter calls are the only suspension points; index and
//! audit locks are synchronous and never held across one.

use crate::audit::{AuditLog, AuditQuery};
use crate::config::RegisterConfig;
use crate::error::RegisterError;
use crate::index::Indexes;
use crate::locks::IdLocks;
use crate::options::{
    AddOptions, ArchiveOptions, EntrySummary, ExportOptions, GetOptions, ImportOptions,
    ListOptions, Page, RegisterStats, SearchHit, SearchOptions, UpdateOptions,
};
use crate::temporal::TemporalResolver;
use crate::transfer::{decode_audit, split_payload, ExportPayload, ImportItem, ImportReport};
use chrono::Utc;
use docket_domain::{
    AuditAction, AuditLogEntry, EffectiveInterval, Entry, EntryId, HistoryRecord, Metadata,
    Query, Record, StorageAdapter, VersionView,
};
use futures::stream::{self, StreamExt, TryStreamExt};
use parking_lot::{Mutex, RwLock};
use serde_json::json;
use std::collections::HashSet;
use tracing::{debug, info};

/// Result type for register operations over adapter `S`
pub type RegisterResult<T, S> = Result<T, RegisterError<<S as StorageAdapter>::Error>>;

/// Versioned, effective-dated record register
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use docket_domain::{value::fields_from_json, Record};
/// use docket_register::{AddOptions, GetOptions, RegisterConfig, UpdateOptions, VersionedRegister};
/// use docket_store::MemoryStore;
/// use serde_json::json;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let register = VersionedRegister::open(MemoryStore::new(), RegisterConfig::default()).await?;
///
/// let jan = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let jun = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
///
/// let data = fields_from_json(json!({ "amount": 100 })).unwrap();
/// let entry = register.add(Record::new(data), AddOptions::default().effective_from(jan)).await?;
///
/// let data = fields_from_json(json!({ "amount": 150 })).unwrap();
/// register.update(&entry.id, Record::new(data), UpdateOptions::effective_from(jun)).await?;
///
/// let march = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
/// let view = register.get(&entry.id, GetOptions::as_of(march)).await?.unwrap();
/// assert_eq!(view.version, 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// # }).unwrap();
/// ```
pub struct VersionedRegister<S: StorageAdapter> {
    store: S,
    config: RegisterConfig,
    indexes: RwLock<Indexes>,
    audit: Mutex<AuditLog>,
    locks: IdLocks,
}

impl<S: StorageAdapter> VersionedRegister<S> {
    /// Open a register over `store`
    ///
    /// Validates the config and rebuilds the category and tag indexes from
    /// every stored entry. The audit log starts empty.
    pub async fn open(store: S, config: RegisterConfig) -> RegisterResult<Self, S> {
        config.validate().map_err(RegisterError::Config)?;

        let entries = store.list().await.map_err(RegisterError::Storage)?;
        let indexes = Indexes::rebuild(&entries);
        debug!("Rebuilt indexes from {} stored entries", entries.len());

        Ok(Self {
            store,
            audit: Mutex::new(AuditLog::new(config.audit_capacity)),
            config,
            indexes: RwLock::new(indexes),
            locks: IdLocks::default(),
        })
    }

    /// The storage adapter
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The active configuration
    pub fn config(&self) -> &RegisterConfig {
        &self.config
    }

    /// Create version 1 of a new entry
    ///
    /// `effective_from` defaults to now. A caller-supplied id that already
    /// exists fails with [`RegisterError::DuplicateEntry`].
    pub async fn add(&self, record: Record, options: AddOptions) -> RegisterResult<Entry, S> {
        let now = Utc::now();

        let (id, _guard) = match options.id {
            Some(id) => {
                let guard = self.locks.acquire(&id).await;
                if self.read(&id).await?.is_some() {
                    return Err(RegisterError::DuplicateEntry(id));
                }
                (id, Some(guard))
            }
            None => (EntryId::generate(), None),
        };

        let interval =
            EffectiveInterval::new(options.effective_from.unwrap_or(now), options.effective_to);
        let entry = Entry::new(id, record, interval, now);

        self.write(&entry).await?;
        self.index_insert(&entry);
        self.record_audit(AuditAction::Add, &entry.id, json!({ "version": entry.version }));

        info!("Added entry {} effective from {}", entry.id, entry.effective_from);
        Ok(entry)
    }

    /// Supersede the head version of an entry
    ///
    /// The previous head moves to history with its validity closed at
    /// `supersede_at` (default now). Data is replaced, metadata merged and
    /// status left as it was.
    pub async fn update(
        &self,
        id: &EntryId,
        record: Record,
        options: UpdateOptions,
    ) -> RegisterResult<Entry, S> {
        let _guard = self.locks.acquire(id).await;
        let mut entry = self.load(id).await?;

        let now = Utc::now();
        let old_metadata = entry.metadata.clone();
        let interval =
            EffectiveInterval::new(options.effective_from.unwrap_or(now), options.effective_to);
        let previous = entry.supersede(record, interval, options.supersede_at.unwrap_or(now), now);

        self.write(&entry).await?;
        self.reindex(id, &old_metadata, &entry.metadata);
        self.record_audit(
            AuditAction::Update,
            id,
            json!({ "previousVersion": previous, "newVersion": entry.version }),
        );

        info!("Updated entry {} from version {} to {}", id, previous, entry.version);
        Ok(entry)
    }

    /// Fetch one version of an entry
    ///
    /// - no options: the head, always `Some`
    /// - `version`: that version, or [`RegisterError::VersionNotFound`]
    /// - `as_of`: the version in force then, `None` when there was none
    pub async fn get(
        &self,
        id: &EntryId,
        options: GetOptions,
    ) -> RegisterResult<Option<VersionView>, S> {
        let entry = self.load(id).await?;

        if let Some(version) = options.version {
            return entry
                .view_of(version)
                .map(Some)
                .ok_or_else(|| RegisterError::VersionNotFound {
                    id: id.clone(),
                    version,
                });
        }

        if let Some(as_of) = options.as_of {
            let view = TemporalResolver::resolve(&entry, as_of);
            if view.is_none() {
                debug!("No version of {} in force at {}", id, as_of);
            }
            return Ok(view);
        }

        Ok(Some(entry.current_view()))
    }

    /// Fetch an entry with its full history
    pub async fn entry(&self, id: &EntryId) -> RegisterResult<Entry, S> {
        self.load(id).await
    }

    /// Superseded versions of an entry, oldest first
    pub async fn history(&self, id: &EntryId) -> RegisterResult<Vec<HistoryRecord>, S> {
        Ok(self.load(id).await?.history)
    }

    /// Mark an entry archived
    ///
    /// The version is unchanged and the entry stays retrievable. Archiving an
    /// archived entry returns it unchanged without a new audit record.
    pub async fn archive(&self, id: &EntryId, options: ArchiveOptions) -> RegisterResult<Entry, S> {
        let _guard = self.locks.acquire(id).await;
        let mut entry = self.load(id).await?;

        if !entry.is_active() {
            debug!("Entry {} already archived", id);
            return Ok(entry);
        }

        entry.archive(Utc::now(), options.effective_to);
        self.write(&entry).await?;
        self.record_audit(
            AuditAction::Archive,
            id,
            json!({ "version": entry.version, "reason": options.reason }),
        );

        info!("Archived entry {} at version {}", id, entry.version);
        Ok(entry)
    }

    /// List head versions
    ///
    /// Category and tag filters are resolved through the indexes; status and
    /// `effective_at` are checked per entry.
    pub async fn list(&self, options: ListOptions) -> RegisterResult<Page<EntrySummary>, S> {
        let mut entries = match self.index_candidates(&options) {
            Some(ids) => self.read_many(ids).await?,
            None => self.store.list().await.map_err(RegisterError::Storage)?,
        };
        entries.retain(|entry| options.matches(entry));
        options.sort_entries(&mut entries);

        let total = entries.len();
        let limit = options.limit.unwrap_or(self.config.default_page_limit);
        let items = entries
            .iter()
            .skip(options.offset)
            .take(limit)
            .map(|entry| EntrySummary::from_entry(entry, options.include_data))
            .collect();

        Ok(Page {
            items,
            total,
            offset: options.offset,
            limit,
        })
    }

    /// Rank entries against a query
    ///
    /// Linear scan over head data. Entries scoring zero are dropped; hits are
    /// ordered by score, highest first, then by id.
    pub async fn search(
        &self,
        query: &Query,
        options: SearchOptions,
    ) -> RegisterResult<Vec<SearchHit>, S> {
        let entries = self.store.list().await.map_err(RegisterError::Storage)?;

        let mut hits: Vec<SearchHit> = entries
            .iter()
            .filter(|entry| options.status.is_none_or(|status| entry.status == status))
            .filter_map(|entry| {
                let found = query.evaluate(&entry.data);
                let keep = found.score > 0.0
                    && options.min_score.is_none_or(|min| found.score >= min);
                keep.then(|| SearchHit {
                    entry: EntrySummary::from_entry(entry, true),
                    score: found.score,
                    matched_fields: found.matched_fields,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.entry.id.cmp(&b.entry.id))
        });
        if let Some(limit) = options.limit {
            hits.truncate(limit);
        }

        debug!("Search over {} entries returned {} hits", entries.len(), hits.len());
        Ok(hits)
    }

    /// Parse a JSON query and run it
    pub async fn search_json(
        &self,
        query: serde_json::Value,
        options: SearchOptions,
    ) -> RegisterResult<Vec<SearchHit>, S> {
        let query = Query::from_json(query)?;
        self.search(&query, options).await
    }

    /// Snapshot every entry with full history
    pub async fn export(&self, options: ExportOptions) -> RegisterResult<ExportPayload, S> {
        let mut entries = self.store.list().await.map_err(RegisterError::Storage)?;
        entries.sort_by(|a, b| a.id.cmp(&b.id));

        let audit_log = options.include_audit_log.then(|| self.audit.lock().entries());

        info!("Exported {} entries from {}", entries.len(), self.config.register_name);
        Ok(ExportPayload {
            register_name: self.config.register_name.clone(),
            schema_id: self.config.schema_id.clone(),
            exported_at: Utc::now(),
            total_entries: entries.len(),
            entries,
            audit_log,
        })
    }

    /// Restore entries from an export payload or a bare array of entries
    ///
    /// Items that cannot be decoded, collide with an existing id (unless
    /// `skip_existing`) or carry inconsistent versions are reported in the
    /// returned [`ImportReport`]. Adapter failures abort the import; items
    /// written before the failure stay written.
    pub async fn import(
        &self,
        payload: serde_json::Value,
        options: ImportOptions,
    ) -> RegisterResult<ImportReport, S> {
        let (items, raw_audit) = split_payload(payload).map_err(RegisterError::Serialization)?;

        let mut report = ImportReport::default();
        if options.include_audit_log && !raw_audit.is_empty() {
            let audit_records = decode_audit(raw_audit, &mut report);
            debug!("Restoring {} audit records", audit_records.len());
            self.audit.lock().extend(audit_records);
        }

        for (index, raw) in items.into_iter().enumerate() {
            let item: ImportItem = match serde_json::from_value(raw) {
                Ok(item) => item,
                Err(e) => {
                    report.fail(index, None, e.to_string());
                    continue;
                }
            };

            let id = item.id.clone().unwrap_or_else(EntryId::generate);
            let _guard = self.locks.acquire(&id).await;

            if self.read(&id).await?.is_some() {
                if options.skip_existing {
                    debug!("Skipping existing entry {}", id);
                    report.skipped += 1;
                } else {
                    report.fail(index, Some(id), "entry already exists");
                }
                continue;
            }

            let entry = match item.into_entry(id.clone(), Utc::now()) {
                Ok(entry) => entry,
                Err(message) => {
                    report.fail(index, Some(id), message);
                    continue;
                }
            };

            self.write(&entry).await?;
            self.index_insert(&entry);
            self.record_audit(
                AuditAction::Add,
                &entry.id,
                json!({ "imported": true, "version": entry.version }),
            );
            report.imported += 1;
        }

        info!(
            "Imported {} entries ({} skipped, {} failed)",
            report.imported,
            report.skipped,
            report.errors.len()
        );
        Ok(report)
    }

    /// Parse a JSON string payload and import it
    pub async fn import_str(
        &self,
        payload: &str,
        options: ImportOptions,
    ) -> RegisterResult<ImportReport, S> {
        let payload = serde_json::from_str(payload)
            .map_err(|e| RegisterError::Serialization(e.to_string()))?;
        self.import(payload, options).await
    }

    /// Audit records matching a query, oldest first
    pub fn audit_log(&self, query: &AuditQuery) -> Vec<AuditLogEntry> {
        self.audit.lock().query(query)
    }

    /// Entry and audit counts
    pub async fn stats(&self) -> RegisterResult<RegisterStats, S> {
        let entries = self.store.list().await.map_err(RegisterError::Storage)?;
        let active = entries.iter().filter(|entry| entry.is_active()).count();

        Ok(RegisterStats {
            total: entries.len(),
            active,
            archived: entries.len() - active,
            by_category: self.indexes.read().category_counts(),
            audit_records: self.audit.lock().len(),
        })
    }

    pub(crate) async fn read(&self, id: &EntryId) -> RegisterResult<Option<Entry>, S> {
        self.store
            .read(id.as_str())
            .await
            .map_err(RegisterError::Storage)
    }

    pub(crate) async fn load(&self, id: &EntryId) -> RegisterResult<Entry, S> {
        self.read(id)
            .await?
            .ok_or_else(|| RegisterError::EntryNotFound(id.clone()))
    }

    async fn write(&self, entry: &Entry) -> RegisterResult<(), S> {
        self.store
            .write(entry.id.as_str(), entry)
            .await
            .map_err(RegisterError::Storage)
    }

    /// Read indexed ids, skipping any the adapter no longer holds
    async fn read_many(&self, ids: HashSet<EntryId>) -> RegisterResult<Vec<Entry>, S> {
        let found: Vec<Option<Entry>> = stream::iter(ids)
            .map(|id| async move { self.read(&id).await })
            .buffered(self.config.max_concurrency)
            .try_collect()
            .await?;
        Ok(found.into_iter().flatten().collect())
    }

    fn index_candidates(&self, options: &ListOptions) -> Option<HashSet<EntryId>> {
        self.indexes
            .read()
            .candidates(options.category.as_deref(), &options.tags)
    }

    fn index_insert(&self, entry: &Entry) {
        self.indexes.write().insert(&entry.id, &entry.metadata);
    }

    fn reindex(&self, id: &EntryId, old: &Metadata, new: &Metadata) {
        self.indexes.write().reindex(id, old, new);
    }

    fn record_audit(&self, action: AuditAction, id: &EntryId, details: serde_json::Value) {
        let record = AuditLogEntry::new(Utc::now(), action, id.clone(), details);
        self.audit.lock().record(record);
    }
}
