//! JSON-file document store.
//!
//! Layout under the root directory:
//! - `items/<id>.json` - one stored item record
//! - `tables/<id>.json` - table header
//! - `tables/<id>.results.json` - embedded result rows, appended per call

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};

use lootforge_domain::{
    ItemRecord, RecordId, RollTable, StoredItem, StoredTable, TableId, TableResult,
};

use crate::infrastructure::ports::{DocumentStorePort, StoreError};

pub struct JsonFileDocumentStore {
    root: PathBuf,
}

impl JsonFileDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn items_dir(&self) -> PathBuf {
        self.root.join("items")
    }

    fn tables_dir(&self) -> PathBuf {
        self.root.join("tables")
    }

    async fn write_json<T: Serialize>(
        operation: &'static str,
        path: &Path,
        value: &T,
    ) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(value).map_err(StoreError::serialization)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::write(operation, e))?;
        }
        tokio::fs::write(path, body)
            .await
            .map_err(|e| StoreError::write(operation, e))
    }
}

#[async_trait]
impl DocumentStorePort for JsonFileDocumentStore {
    async fn create_item(&self, record: ItemRecord) -> Result<StoredItem, StoreError> {
        let stored = StoredItem {
            id: RecordId::new(),
            record,
        };
        let path = self.items_dir().join(format!("{}.json", stored.id));
        Self::write_json("create_item", &path, &stored).await?;
        tracing::info!(id = %stored.id, name = %stored.record.name, "Created item document");
        Ok(stored)
    }

    async fn create_table(&self, table: RollTable) -> Result<StoredTable, StoreError> {
        let stored = StoredTable {
            id: TableId::new(),
            table,
        };
        let path = self.tables_dir().join(format!("{}.json", stored.id));
        Self::write_json("create_table", &path, &stored).await?;
        tracing::info!(id = %stored.id, name = %stored.table.name, "Created roll table");
        Ok(stored)
    }

    async fn create_table_results(
        &self,
        table_id: TableId,
        results: Vec<TableResult>,
    ) -> Result<(), StoreError> {
        let header = self.tables_dir().join(format!("{}.json", table_id));
        if !tokio::fs::try_exists(&header)
            .await
            .map_err(|e| StoreError::write("create_table_results", e))?
        {
            return Err(StoreError::write(
                "create_table_results",
                format!("table {} does not exist", table_id),
            ));
        }

        let path = self
            .tables_dir()
            .join(format!("{}.results.json", table_id));
        let mut rows: Vec<TableResult> = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(StoreError::serialization)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(StoreError::write("create_table_results", e)),
        };
        let added = results.len();
        rows.extend(results);
        Self::write_json("create_table_results", &path, &rows).await?;
        tracing::debug!(table_id = %table_id, added, total = rows.len(), "Embedded table results");
        Ok(())
    }
}
